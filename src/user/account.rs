use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use usergate_error::{ResultExt, UserError, UserResult};

use super::{Params, Profile, UserServices};
use crate::{
    auth::{self, coerce_user_id, USER_ID_KEY},
    lang::USER_ERROR_UNABLE_TO_LOAD_USER,
    store::UserRecord,
};

/// Неизменяемые данные загруженного пользователя.
///
/// Разделяются через `Arc` между кешем и всеми [`UserAccount`], которые
/// получили этого пользователя.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdentity {
    /// 0 означает «не загружен» (гость).
    pub id: u64,
    /// `None` или `Some(true)` означают гостя.
    pub guest: Option<bool>,
    pub send_email: bool,
    pub params: Params,
    pub profile: Profile,
    /// После загрузки всегда пуст.
    #[serde(skip)]
    pub password: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub block: bool,
    pub register_date: Option<i64>,
    pub last_visit_date: Option<i64>,
}

/// Учётная запись пользователя: дескриптор, связывающий общие сервисы с
/// данными конкретного пользователя.
///
/// Клонирование дешёвое. Два дескриптора, полученные из кеша для одного id,
/// указывают на один и тот же экземпляр данных (см.
/// [`UserAccount::same_instance`]).
#[derive(Debug, Clone)]
pub struct UserAccount {
    services: Arc<UserServices>,
    identity: Arc<UserIdentity>,
}

////////////////////////////////////////////////////////////////////////////////
// UserIdentity
////////////////////////////////////////////////////////////////////////////////

impl UserIdentity {
    /// Состояние гостя: id 0, без рассылки, пустые параметры и профиль.
    pub fn guest() -> Self {
        Self {
            id: 0,
            guest: Some(true),
            send_email: false,
            params: Params::new(),
            profile: Profile::default(),
            password: String::new(),
            name: String::new(),
            username: String::new(),
            email: String::new(),
            block: false,
            register_date: None,
            last_visit_date: None,
        }
    }

    /// Нормализует строку таблицы: пользователь становится не гостем,
    /// параметры и профиль приводятся к своим типам, пароль отбрасывается.
    pub fn from_record(record: UserRecord) -> UserResult<Self> {
        let params = Params::from_raw(record.params)
            .with_context(|| format!("Decoding params of user {}", record.id))?;
        Ok(Self {
            id: record.id,
            guest: Some(false),
            send_email: record.send_email,
            params,
            profile: Profile::from_raw(record.profile),
            password: String::new(),
            name: record.name,
            username: record.username,
            email: record.email,
            block: record.block,
            register_date: record.register_date,
            last_visit_date: record.last_visit_date,
        })
    }

    pub fn is_guest(&self) -> bool {
        self.guest.unwrap_or(true)
    }
}

impl Default for UserIdentity {
    fn default() -> Self {
        Self::guest()
    }
}

////////////////////////////////////////////////////////////////////////////////
// UserAccount
////////////////////////////////////////////////////////////////////////////////

impl UserAccount {
    /// Гостевая учётная запись.
    pub fn new(services: Arc<UserServices>) -> Self {
        Self {
            services,
            identity: Arc::new(UserIdentity::guest()),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.identity.is_guest()
    }

    /// Проверяет право пользователя через ACL.
    ///
    /// Если `section` содержит точку, она делится по первой точке на
    /// раздел и действие, а переданный `action` игнорируется.
    pub fn authorise(
        &self,
        section: &str,
        action: &str,
    ) -> UserResult<bool> {
        let (section, action) = section.split_once('.').unwrap_or((section, action));
        self.services
            .acl
            .check_user(self.identity.id, section, action)
    }

    /// Обновляет время последнего визита. `None` означает «сейчас».
    pub fn set_last_visit(
        &self,
        timestamp: Option<i64>,
    ) -> UserResult<bool> {
        self.services
            .store
            .set_last_visit(timestamp, self.identity.id)
    }

    /// Загружает пользователя.
    ///
    /// Без id (или с id 0) берётся `user_id` из сессии; если и там пусто,
    /// текущая запись сбрасывается в гостя и возвращается она же. Иначе
    /// пользователь берётся из кеша или, при промахе либо `force`, из
    /// хранилища.
    pub fn load(
        &mut self,
        id: Option<u64>,
        force: bool,
    ) -> UserResult<UserAccount> {
        let id = match id.filter(|&id| id != 0) {
            Some(id) => id,
            None => self.session_user_id()?,
        };

        if id == 0 {
            debug!("No user id in session, resetting to guest");
            self.clear();
            return Ok(self.clone());
        }

        let cache = self.services.cache();
        if !force {
            if let Some(hit) = cache.get(id) {
                debug!(user_id = id, "User cache hit");
                return Ok(self.with_identity(hit));
            }
        }

        let fetch = || self.fetch(id);
        let identity = if force {
            cache.try_replace_with(id, fetch)?
        } else {
            cache.get_or_try_insert_with(id, fetch)?
        };
        Ok(self.with_identity(identity))
    }

    /// Генерирует случайный пароль из `[a-zA-Z0-9]`.
    pub fn gen_random_password(length: usize) -> String {
        auth::gen_random_password(length)
    }

    pub fn id(&self) -> u64 {
        self.identity.id
    }

    pub fn send_email(&self) -> bool {
        self.identity.send_email
    }

    pub fn params(&self) -> &Params {
        &self.identity.params
    }

    pub fn profile(&self) -> &Profile {
        &self.identity.profile
    }

    pub fn identity(&self) -> &Arc<UserIdentity> {
        &self.identity
    }

    pub fn services(&self) -> &Arc<UserServices> {
        &self.services
    }

    /// `true`, если оба дескриптора разделяют один экземпляр данных.
    pub fn same_instance(
        &self,
        other: &UserAccount,
    ) -> bool {
        Arc::ptr_eq(&self.identity, &other.identity)
    }

    pub(crate) fn clear(&mut self) {
        self.identity = Arc::new(UserIdentity::guest());
    }

    fn with_identity(
        &self,
        identity: Arc<UserIdentity>,
    ) -> UserAccount {
        UserAccount {
            services: Arc::clone(&self.services),
            identity,
        }
    }

    fn session_user_id(&self) -> UserResult<u64> {
        let value = self.services.session.get(USER_ID_KEY)?;
        let id = value.as_ref().map_or(0, coerce_user_id);
        debug!(user_id = id, "Resolved user id from session");
        Ok(id)
    }

    fn fetch(
        &self,
        id: u64,
    ) -> UserResult<UserIdentity> {
        debug!(user_id = id, "User cache miss, loading from store");
        let Some(record) = self.services.store.load(id)? else {
            let message = self
                .services
                .localizer
                .format_message(USER_ERROR_UNABLE_TO_LOAD_USER, &[&id]);
            warn!(user_id = id, "{message}");
            return Err(UserError::NotFound { id, message }.into());
        };

        let mut identity = UserIdentity::from_record(record)?;
        identity.id = id;
        info!(user_id = id, username = %identity.username, "User loaded");
        Ok(identity)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        auth::{MemoryAcl, MemorySession},
        store::MemoryUserStore,
    };

    fn services_with(session: MemorySession) -> Arc<UserServices> {
        let store = MemoryUserStore::new();
        let mut row = UserRecord::new(5);
        row.username = "jane".into();
        row.password = "$2y$10$secret".into();
        row.send_email = true;
        row.params = json!("{\"language\":\"fr-FR\"}");
        row.profile = json!(["Lyon"]);
        store.insert(row);

        Arc::new(UserServices::new(
            Arc::new(store),
            Arc::new(session),
            Arc::new(MemoryAcl::default()),
        ))
    }

    #[test]
    fn test_new_is_guest() {
        let account = UserAccount::new(services_with(MemorySession::new()));
        assert!(account.is_guest());
        assert_eq!(account.id(), 0);
        assert!(!account.send_email());
        assert!(account.params().is_empty());
        assert!(account.profile().is_empty());
    }

    #[test]
    fn test_guest_flag_semantics() {
        let mut identity = UserIdentity::guest();
        identity.guest = None;
        assert!(identity.is_guest());
        identity.guest = Some(false);
        assert!(!identity.is_guest());
    }

    #[test]
    fn test_load_normalizes_row() {
        let mut account = UserAccount::new(services_with(MemorySession::new()));
        let user = account.load(Some(5), false).unwrap();

        assert!(!user.is_guest());
        assert_eq!(user.id(), 5);
        assert!(user.send_email());
        assert!(user.identity().password.is_empty());
        assert_eq!(user.params().get("language"), Some(&json!("fr-FR")));
        assert_eq!(user.profile().get("0"), Some(&json!("Lyon")));
        // сама запись остаётся гостем
        assert!(account.is_guest());
    }

    #[test]
    fn test_load_from_session() {
        let mut account = UserAccount::new(services_with(MemorySession::with_user(5)));
        let user = account.load(None, false).unwrap();
        assert_eq!(user.id(), 5);

        let again = account.load(Some(0), false).unwrap();
        assert!(user.same_instance(&again));
    }

    #[test]
    fn test_load_without_session_user_resets_to_guest() {
        let mut account = UserAccount::new(services_with(MemorySession::new()));
        let before = account.clone();
        let guest = account.load(None, false).unwrap();

        assert!(guest.is_guest());
        assert!(guest.same_instance(&account));
        assert!(!account.same_instance(&before));
        assert!(account.services().cache().is_empty());
    }

    #[test]
    fn test_broken_params_are_rejected_with_context() {
        let mut row = UserRecord::new(8);
        row.params = json!("{not json");
        let err = UserIdentity::from_record(row).unwrap_err();
        assert_eq!(err.status_code(), usergate_error::StatusCode::InvalidData);
        assert_eq!(err.contexts()[0].message, "Decoding params of user 8");
    }

    #[test]
    fn test_identity_serializes_without_password() {
        let mut identity = UserIdentity::guest();
        identity.password = "secret".into();
        let value = serde_json::to_value(&identity).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["id"], json!(0));
    }
}
