use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, RwLock};
use usergate_error::UserResult;

use super::UserIdentity;

/// Кеш загруженных пользователей одного контекста (процесса, запроса).
///
/// Чтения идут под `RwLock`; путь промаха (повторная проверка, загрузка,
/// вставка) сериализуется отдельным мьютексом, поэтому один id не
/// загружается дважды при конкурентных обращениях.
#[derive(Debug, Default)]
pub struct UserCache {
    entries: RwLock<HashMap<u64, Arc<UserIdentity>>>,
    loading: Mutex<()>,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        id: u64,
    ) -> Option<Arc<UserIdentity>> {
        self.entries.read().get(&id).cloned()
    }

    pub fn contains(
        &self,
        id: u64,
    ) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Вставляет (или перезаписывает) запись под её собственным id.
    pub fn insert(
        &self,
        identity: Arc<UserIdentity>,
    ) -> Option<Arc<UserIdentity>> {
        self.entries.write().insert(identity.id, identity)
    }

    /// Возвращает запись из кеша либо загружает её через `load` и кладёт в
    /// кеш. Ошибка `load` возвращается как есть, кеш не меняется.
    pub fn get_or_try_insert_with<F>(
        &self,
        id: u64,
        load: F,
    ) -> UserResult<Arc<UserIdentity>>
    where
        F: FnOnce() -> UserResult<UserIdentity>,
    {
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }

        let _guard = self.loading.lock();
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }

        let identity = Arc::new(load()?);
        self.entries.write().insert(id, Arc::clone(&identity));
        Ok(identity)
    }

    /// Принудительная перезагрузка: `load` выполняется всегда, запись
    /// перезаписывается (последний писатель выигрывает).
    pub fn try_replace_with<F>(
        &self,
        id: u64,
        load: F,
    ) -> UserResult<Arc<UserIdentity>>
    where
        F: FnOnce() -> UserResult<UserIdentity>,
    {
        let _guard = self.loading.lock();
        let identity = Arc::new(load()?);
        self.entries.write().insert(id, Arc::clone(&identity));
        Ok(identity)
    }

    /// Убирает запись; следующая загрузка пойдёт в хранилище.
    pub fn invalidate(
        &self,
        id: u64,
    ) -> Option<Arc<UserIdentity>> {
        self.entries.write().remove(&id)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
