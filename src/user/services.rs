use std::sync::Arc;

use super::UserCache;
use crate::{
    auth::{AclService, SessionStore},
    lang::{Catalog, Localizer},
    store::UserRowStore,
};

/// Набор зависимостей, общих для всех [`UserAccount`](super::UserAccount)
/// одного контекста: порты и кеш загруженных пользователей.
pub struct UserServices {
    pub store: Arc<dyn UserRowStore>,
    pub session: Arc<dyn SessionStore>,
    pub acl: Arc<dyn AclService>,
    pub localizer: Arc<dyn Localizer>,
    pub cache: UserCache,
}

impl UserServices {
    /// Собирает сервисы с английским каталогом сообщений.
    pub fn new(
        store: Arc<dyn UserRowStore>,
        session: Arc<dyn SessionStore>,
        acl: Arc<dyn AclService>,
    ) -> Self {
        Self::with_localizer(store, session, acl, Arc::new(Catalog::english()))
    }

    pub fn with_localizer(
        store: Arc<dyn UserRowStore>,
        session: Arc<dyn SessionStore>,
        acl: Arc<dyn AclService>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            store,
            session,
            acl,
            localizer,
            cache: UserCache::new(),
        }
    }

    pub fn cache(&self) -> &UserCache {
        &self.cache
    }
}

impl std::fmt::Debug for UserServices {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("UserServices")
            .field("cached_users", &self.cache.len())
            .finish_non_exhaustive()
    }
}
