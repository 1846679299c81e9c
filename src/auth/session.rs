use dashmap::DashMap;
use serde_json::Value;
use usergate_error::UserResult;

/// Ключ сессии, под которым хранится id вошедшего пользователя.
pub const USER_ID_KEY: &str = "user_id";

/// Порт хранилища сессии текущего запроса.
pub trait SessionStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> UserResult<Option<Value>>;

    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> UserResult<()>;

    /// Удаляет ключ и возвращает прежнее значение.
    fn remove(
        &self,
        key: &str,
    ) -> UserResult<Option<Value>>;
}

/// Сессия в памяти.
#[derive(Debug, Default)]
pub struct MemorySession {
    data: DashMap<String, Value>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сессия, в которой уже выполнен вход пользователя `user_id`.
    pub fn with_user(user_id: u64) -> Self {
        let session = Self::new();
        session.data.insert(USER_ID_KEY.to_string(), Value::from(user_id));
        session
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn get(
        &self,
        key: &str,
    ) -> UserResult<Option<Value>> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> UserResult<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(
        &self,
        key: &str,
    ) -> UserResult<Option<Value>> {
        Ok(self.data.remove(key).map(|(_, v)| v))
    }
}

/// Приводит значение из сессии к id пользователя.
///
/// Числа и числовые строки (с ведущими пробелами и знаком) дают своё
/// значение; отрицательные, дробные части отбрасываются; всё остальное
/// даёт 0.
pub fn coerce_user_id(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim_start();
            let s = s.strip_prefix('+').unwrap_or(s);
            let digits: &str = &s[..s.bytes().take_while(u8::is_ascii_digit).count()];
            digits.parse().unwrap_or(0)
        }
        Value::Bool(true) => 1,
        _ => 0,
    }
}
