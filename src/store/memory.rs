use std::collections::HashMap;

use parking_lot::RwLock;
use usergate_error::{StoreError, UserResult};

use super::{GroupRow, GroupStore, UserRecord, UserRowStore};

/// Таблица пользователей в памяти.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    rows: RwLock<HashMap<u64, UserRecord>>,
}

/// Таблица групп в памяти.
#[derive(Debug, Default)]
pub struct MemoryGroupStore {
    rows: RwLock<Vec<GroupRow>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Загружает строки из JSON-массива.
    pub fn from_json(json: &str) -> UserResult<Self> {
        let rows: Vec<UserRecord> =
            serde_json::from_str(json).map_err(|e| StoreError::Decode {
                reason: e.to_string(),
            })?;
        let store = Self::new();
        for row in rows {
            store.insert(row);
        }
        Ok(store)
    }

    /// Вставляет или заменяет строку. Возвращает прежнюю строку.
    pub fn insert(
        &self,
        row: UserRecord,
    ) -> Option<UserRecord> {
        self.rows.write().insert(row.id, row)
    }

    pub fn remove(
        &self,
        id: u64,
    ) -> Option<UserRecord> {
        self.rows.write().remove(&id)
    }

    /// Читает строку как есть, включая пароль.
    pub fn row(
        &self,
        id: u64,
    ) -> Option<UserRecord> {
        self.rows.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl MemoryGroupStore {
    pub fn new(rows: Vec<GroupRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub fn from_json(json: &str) -> UserResult<Self> {
        let rows: Vec<GroupRow> = serde_json::from_str(json).map_err(|e| StoreError::Decode {
            reason: e.to_string(),
        })?;
        Ok(Self::new(rows))
    }

    pub fn insert(
        &self,
        row: GroupRow,
    ) {
        let mut rows = self.rows.write();
        rows.retain(|r| r.id != row.id);
        rows.push(row);
    }
}

////////////////////////////////////////////////////////////////////////////////
// Реализации портов
////////////////////////////////////////////////////////////////////////////////

impl UserRowStore for MemoryUserStore {
    fn load(
        &self,
        id: u64,
    ) -> UserResult<Option<UserRecord>> {
        Ok(self.row(id))
    }

    fn set_last_visit(
        &self,
        timestamp: Option<i64>,
        id: u64,
    ) -> UserResult<bool> {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(&id) else {
            return Ok(false);
        };
        row.last_visit_date = Some(timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp()));
        Ok(true)
    }
}

impl GroupStore for MemoryGroupStore {
    fn load_groups(&self) -> UserResult<Vec<GroupRow>> {
        Ok(self.rows.read().clone())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use usergate_error::StatusCode;

    use super::*;

    #[test]
    fn test_insert_and_load() {
        let store = MemoryUserStore::new();
        assert!(store.is_empty());
        store.insert(UserRecord::new(5));
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(5).unwrap().map(|r| r.id), Some(5));
        assert!(store.load(6).unwrap().is_none());
    }

    #[test]
    fn test_set_last_visit() {
        let store = MemoryUserStore::new();
        store.insert(UserRecord::new(5));

        assert!(store.set_last_visit(Some(1_700_000_000), 5).unwrap());
        assert_eq!(store.row(5).unwrap().last_visit_date, Some(1_700_000_000));

        let before = chrono::Utc::now().timestamp();
        assert!(store.set_last_visit(None, 5).unwrap());
        assert!(store.row(5).unwrap().last_visit_date.unwrap() >= before);

        assert!(!store.set_last_visit(None, 99).unwrap());
    }

    #[test]
    fn test_from_json() {
        let store = MemoryUserStore::from_json(r#"[{"id": 1, "username": "admin"}, {"id": 2}]"#)
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.row(1).unwrap().username, "admin");

        let err = MemoryUserStore::from_json(r#"[{"id": 1, "bogus": true}]"#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::DeserializationFailed);
    }

    #[test]
    fn test_group_store_replace() {
        let store = MemoryGroupStore::new(vec![GroupRow::new(1, "Public", 1, 4, 0)]);
        store.insert(GroupRow::new(1, "Everyone", 1, 4, 0));
        store.insert(GroupRow::new(2, "Registered", 2, 3, 1));

        let groups = store.load_groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().any(|g| g.title == "Everyone"));
    }
}
