use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use usergate_error::{UserError, UserResult};

/// Реестр параметров пользователя: вложенный JSON-объект с доступом по
/// путям через точку (`"editor.theme"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    data: Map<String, Value>,
}

/// Профиль пользователя: произвольная структура, этим слоем не
/// типизируется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Value);

////////////////////////////////////////////////////////////////////////////////
// Params
////////////////////////////////////////////////////////////////////////////////

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Строит реестр из сырого значения строки таблицы.
    ///
    /// `null` и пустая строка дают пустой реестр, объект берётся как есть,
    /// массив становится объектом с ключами-индексами (`[]` пустым
    /// реестром), строка разбирается как JSON с теми же правилами.
    pub fn from_raw(raw: Value) -> UserResult<Self> {
        match raw {
            Value::Null => Ok(Self::new()),
            Value::Object(data) => Ok(Self { data }),
            Value::Array(items) => Ok(Self {
                data: index_keyed(items),
            }),
            Value::String(s) if s.trim().is_empty() => Ok(Self::new()),
            Value::String(s) => match serde_json::from_str::<Value>(&s) {
                Ok(Value::Null) => Ok(Self::new()),
                Ok(Value::Object(data)) => Ok(Self { data }),
                Ok(Value::Array(items)) => Ok(Self {
                    data: index_keyed(items),
                }),
                Ok(other) => Err(invalid(format!("expected a JSON object, got {other}"))),
                Err(e) => Err(invalid(e.to_string())),
            },
            other => Err(invalid(format!("expected an object, got {other}"))),
        }
    }

    /// Значение по пути.
    pub fn get(
        &self,
        path: &str,
    ) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut node = self.data.get(first)?;
        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Значение по пути, приведённое к `T`, либо `default`.
    pub fn get_or<T>(
        &self,
        path: &str,
        default: T,
    ) -> T
    where
        T: for<'de> Deserialize<'de>,
    {
        self.get(path)
            .and_then(|v| T::deserialize(v).ok())
            .unwrap_or(default)
    }

    pub fn exists(
        &self,
        path: &str,
    ) -> bool {
        self.get(path).is_some()
    }

    /// Записывает значение по пути, создавая промежуточные объекты.
    /// Возвращает прежнее значение.
    pub fn set(
        &mut self,
        path: &str,
        value: impl Into<Value>,
    ) -> Option<Value> {
        let (parents, leaf) = match path.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, path),
        };

        let mut node = &mut self.data;
        for segment in parents.into_iter().flat_map(|p| p.split('.')) {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just replaced by an object"),
            };
        }
        node.insert(leaf.to_string(), value.into())
    }

    /// Удаляет значение по пути.
    pub fn remove(
        &mut self,
        path: &str,
    ) -> Option<Value> {
        match path.rsplit_once('.') {
            None => self.data.remove(path),
            Some((parents, leaf)) => {
                let mut node = &mut self.data;
                for segment in parents.split('.') {
                    node = node.get_mut(segment)?.as_object_mut()?;
                }
                node.remove(leaf)
            }
        }
    }

    /// Рекурсивно сливает `other` поверх текущих значений.
    pub fn merge(
        &mut self,
        other: &Params,
    ) {
        merge_maps(&mut self.data, &other.data);
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

fn merge_maps(
    target: &mut Map<String, Value>,
    source: &Map<String, Value>,
) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(dst)), Value::Object(src)) => merge_maps(dst, src),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn index_keyed(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

/// Рекурсивно превращает массивы в объекты с ключами-индексами.
fn to_object(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            Value::Object(index_keyed(items.into_iter().map(to_object).collect()))
        }
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, to_object(v))).collect())
        }
        other => other,
    }
}

fn invalid(reason: String) -> usergate_error::StackError {
    UserError::InvalidParams { reason }.into()
}

////////////////////////////////////////////////////////////////////////////////
// Profile
////////////////////////////////////////////////////////////////////////////////

impl Profile {
    /// Нормализует сырой профиль: массивы на любой глубине становятся
    /// объектами с ключами-индексами, `null` пустым объектом, скаляры
    /// остаются как есть.
    pub fn from_raw(raw: Value) -> Self {
        match raw {
            Value::Null => Self::default(),
            other => Self(to_object(other)),
        }
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.0.as_object()?.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use serde_json::json;
    use usergate_error::StatusCode;

    use super::*;

    #[test]
    fn test_from_raw_shapes() {
        assert!(Params::from_raw(Value::Null).unwrap().is_empty());
        assert!(Params::from_raw(json!("")).unwrap().is_empty());

        let params = Params::from_raw(json!({"language": "fr-FR"})).unwrap();
        assert_eq!(params.get("language"), Some(&json!("fr-FR")));

        let params = Params::from_raw(json!("{\"editor\":{\"theme\":\"dark\"}}")).unwrap();
        assert_eq!(params.get("editor.theme"), Some(&json!("dark")));
    }

    #[test]
    fn test_from_raw_rejects_scalars() {
        let err = Params::from_raw(json!(3)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidData);
        assert!(Params::from_raw(json!("\"text\"")).is_err());
        assert!(Params::from_raw(json!("{broken")).is_err());
        assert!(Params::from_raw(json!(true)).is_err());
    }

    #[test]
    fn test_from_raw_accepts_arrays() {
        assert!(Params::from_raw(json!("[]")).unwrap().is_empty());
        assert!(Params::from_raw(json!([])).unwrap().is_empty());
        assert!(Params::from_raw(json!("null")).unwrap().is_empty());

        let params = Params::from_raw(json!("[\"a\",{\"b\":1}]")).unwrap();
        assert_eq!(params.get("0"), Some(&json!("a")));
        assert_eq!(params.get("1.b"), Some(&json!(1)));

        let params = Params::from_raw(json!([1, 2])).unwrap();
        assert_eq!(params.to_value(), json!({"0": 1, "1": 2}));
    }

    #[test]
    fn test_get_or() {
        let params = Params::from_raw(json!({"page": {"limit": 20}})).unwrap();
        assert_eq!(params.get_or("page.limit", 10u32), 20);
        assert_eq!(params.get_or("page.offset", 0u32), 0);
        assert_eq!(params.get_or("page.limit", String::from("x")), "x");
        assert!(params.exists("page"));
        assert!(!params.exists("page.limit.deeper"));
    }

    #[test]
    fn test_set_creates_path() {
        let mut params = Params::new();
        assert_eq!(params.set("editor.theme", "dark"), None);
        assert_eq!(params.set("editor.theme", "light"), Some(json!("dark")));
        params.set("timezone", "Europe/Paris");

        assert_eq!(
            params.to_value(),
            json!({"editor": {"theme": "light"}, "timezone": "Europe/Paris"})
        );

        // скаляр на пути заменяется объектом
        params.set("timezone.offset", 1);
        assert_eq!(params.get("timezone.offset"), Some(&json!(1)));
    }

    #[test]
    fn test_remove() {
        let mut params = Params::from_raw(json!({"a": {"b": 1, "c": 2}, "d": 3})).unwrap();
        assert_eq!(params.remove("a.b"), Some(json!(1)));
        assert_eq!(params.remove("d"), Some(json!(3)));
        assert_eq!(params.remove("x.y"), None);
        assert_eq!(params.to_json(), r#"{"a":{"c":2}}"#);
    }

    #[test]
    fn test_merge() {
        let mut base = Params::from_raw(json!({"a": {"b": 1, "c": 2}, "d": 3})).unwrap();
        let over = Params::from_raw(json!({"a": {"c": 5}, "e": 6})).unwrap();
        base.merge(&over);
        assert_eq!(base.to_value(), json!({"a": {"b": 1, "c": 5}, "d": 3, "e": 6}));
    }

    #[test]
    fn test_profile_normalization() {
        assert!(Profile::from_raw(Value::Null).is_empty());

        let profile = Profile::from_raw(json!(["Lyon", "France"]));
        assert_eq!(profile.get("0"), Some(&json!("Lyon")));
        assert_eq!(profile.get("1"), Some(&json!("France")));

        let profile = Profile::from_raw(json!({"city": "Lyon"}));
        assert_eq!(profile.get("city"), Some(&json!("Lyon")));

        let profile = Profile::from_raw(json!({"links": ["a", {"tags": ["x"]}]}));
        assert_eq!(
            profile.as_value(),
            &json!({"links": {"0": "a", "1": {"tags": {"0": "x"}}}})
        );

        let profile = Profile::from_raw(json!([["nested"]]));
        assert_eq!(profile.get("0"), Some(&json!({"0": "nested"})));

        let profile = Profile::from_raw(json!("opaque"));
        assert_eq!(profile.as_value(), &json!("opaque"));
        assert!(!profile.is_empty());
    }
}
