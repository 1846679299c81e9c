//! Порты хранилищ пользователей и групп и их реализации в памяти.

pub mod memory;
pub mod record;

pub use memory::*;
pub use record::*;

use usergate_error::UserResult;

/// Таблица пользователей.
pub trait UserRowStore: Send + Sync {
    /// Читает строку пользователя; `None`, если такого id нет.
    fn load(
        &self,
        id: u64,
    ) -> UserResult<Option<UserRecord>>;

    /// Обновляет время последнего визита. `None` означает «сейчас».
    /// Возвращает `false`, если строка не найдена.
    fn set_last_visit(
        &self,
        timestamp: Option<i64>,
        id: u64,
    ) -> UserResult<bool>;
}

/// Таблица групп пользователей (nested-set).
pub trait GroupStore: Send + Sync {
    fn load_groups(&self) -> UserResult<Vec<GroupRow>>;
}
