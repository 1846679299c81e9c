//! Локализация сообщений.

use std::{collections::HashMap, fmt::Display};

use usergate_error::{bail, StatusCode, UserResult};

/// Ключ сообщения о невозможности загрузить пользователя.
pub const USER_ERROR_UNABLE_TO_LOAD_USER: &str = "USER_ERROR_UNABLE_TO_LOAD_USER";

/// Порт локализации.
pub trait Localizer: Send + Sync {
    /// Форматирует сообщение `key`, подставляя `args`.
    fn format_message(
        &self,
        key: &str,
        args: &[&dyn Display],
    ) -> String;
}

/// Каталог сообщений с printf-шаблонами.
///
/// Поддерживаются `%s`, `%d`, `%u`, позиционные `%1$s` и `%%`.
/// Неизвестный ключ форматируется как сам шаблон, то есть выводит ключ.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Пустой каталог.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Английские сообщения пакета.
    pub fn english() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(
            USER_ERROR_UNABLE_TO_LOAD_USER,
            "Unable to load the user with id %d",
        );
        catalog
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        template: impl Into<String>,
    ) -> &mut Self {
        self.messages.insert(key.into(), template.into());
        self
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Загружает строки формата `KEY="value"`; строки с `;` и пустые
    /// пропускаются.
    pub fn load_ini(
        &mut self,
        source: &str,
    ) -> UserResult<usize> {
        let mut loaded = 0;
        for (n, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                bail!(
                    StatusCode::InvalidData,
                    "Language line {}: missing '='",
                    n + 1
                );
            };
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            self.insert(key.trim(), value.replace("\\\"", "\""));
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl Localizer for Catalog {
    fn format_message(
        &self,
        key: &str,
        args: &[&dyn Display],
    ) -> String {
        sprintf(self.get(key).unwrap_or(key), args)
    }
}

/// Минимальная реализация printf-подстановки.
pub fn sprintf(
    template: &str,
    args: &[&dyn Display],
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut next = 0;
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }

        // %1$s
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && after[digits..].starts_with('$') {
            let conv = after[digits + 1..].chars().next();
            if let (Ok(index), Some('s' | 'd' | 'u')) = (after[..digits].parse::<usize>(), conv) {
                if let Some(arg) = index.checked_sub(1).and_then(|i| args.get(i)) {
                    out.push_str(&arg.to_string());
                }
                rest = &after[digits + 2..];
                continue;
            }
        }

        match after.chars().next() {
            Some('s' | 'd' | 'u') => {
                if let Some(arg) = args.get(next) {
                    out.push_str(&arg.to_string());
                }
                next += 1;
                rest = &after[1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
