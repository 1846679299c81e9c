use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Строка таблицы пользователей в типизированном виде.
///
/// Неизвестные поля при декодировании отвергаются.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "flag")]
    pub block: bool,
    #[serde(default, rename = "sendEmail", alias = "send_email", deserialize_with = "flag")]
    pub send_email: bool,
    #[serde(default, deserialize_with = "optional_flag")]
    pub guest: Option<bool>,
    /// Unix timestamp регистрации.
    #[serde(default, rename = "registerDate", alias = "register_date")]
    pub register_date: Option<i64>,
    /// Unix timestamp последнего визита.
    #[serde(default, rename = "lastvisitDate", alias = "last_visit_date")]
    pub last_visit_date: Option<i64>,
    /// Сырые параметры: объект, JSON-строка или null.
    #[serde(default)]
    pub params: Value,
    /// Сырой профиль: объект, массив или null.
    #[serde(default)]
    pub profile: Value,
}

/// Строка таблицы групп.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRow {
    pub id: u64,
    pub title: String,
    pub lft: i64,
    pub rgt: i64,
    #[serde(default)]
    pub parent_id: u64,
}

impl UserRecord {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

impl GroupRow {
    pub fn new(
        id: u64,
        title: impl Into<String>,
        lft: i64,
        rgt: i64,
        parent_id: u64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            lft,
            rgt,
            parent_id,
        }
    }
}

/// Флаги в таблицах хранятся как 0/1, "0"/"1" или true/false.
fn parse_flag<E: de::Error>(value: Value) -> Result<Option<bool>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b)),
        Value::Number(n) => Ok(Some(n.as_f64().unwrap_or(0.0) != 0.0)),
        Value::String(s) => match s.trim() {
            "" | "0" | "false" => Ok(Some(false)),
            _ => Ok(Some(true)),
        },
        other => Err(E::custom(format!("expected a flag, got {other}"))),
    }
}

fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(parse_flag(Value::deserialize(d)?)?.unwrap_or(false))
}

fn optional_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    parse_flag(Value::deserialize(d)?)
}
