use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{
        HashAlgorithm, HashOptions, MemoryAcl, PasswordPolicy, DEFAULT_ARGON2_MEMORY_KIB,
        DEFAULT_ARGON2_THREADS, DEFAULT_ARGON2_TIME_COST, DEFAULT_BCRYPT_COST,
        DEFAULT_GUEST_GROUP, DEFAULT_PASSWORD_LENGTH,
    },
    logging::{LogFormat, LoggingConfig},
};

/// Настройки пакета.
///
/// Источники по возрастанию приоритета: значения по умолчанию, переменные
/// окружения `USERGATE_<SECTION>__<KEY>` (например
/// `USERGATE_PASSWORD__BCRYPT_COST=12`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub password: PasswordSettings,
    pub acl: AclSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordSettings {
    /// Длина генерируемых паролей.
    pub length: usize,
    pub algorithm: HashAlgorithm,
    pub bcrypt_cost: u32,
    pub argon2_memory_kib: u32,
    pub argon2_time_cost: u32,
    pub argon2_threads: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclSettings {
    /// Группа, в которой состоят неаутентифицированные пользователи.
    pub guest_group: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            // Значения по умолчанию
            .set_default("password.length", DEFAULT_PASSWORD_LENGTH as i64)?
            .set_default("password.algorithm", HashAlgorithm::Bcrypt.as_str())?
            .set_default("password.bcrypt_cost", i64::from(DEFAULT_BCRYPT_COST))?
            .set_default("password.argon2_memory_kib", i64::from(DEFAULT_ARGON2_MEMORY_KIB))?
            .set_default("password.argon2_time_cost", i64::from(DEFAULT_ARGON2_TIME_COST))?
            .set_default("password.argon2_threads", i64::from(DEFAULT_ARGON2_THREADS))?
            .set_default("acl.guest_group", DEFAULT_GUEST_GROUP as i64)?
            .set_default("log.level", "info")?
            .set_default("log.format", LogFormat::Compact.as_str())?
            // Переменные окружения с префиксом USERGATE_
            .add_source(
                Environment::with_prefix("USERGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        cfg.try_deserialize()
    }

    /// Политика паролей для [`UserDirectoryHelper`](crate::user::UserDirectoryHelper).
    pub fn password_policy(&self) -> PasswordPolicy {
        let p = &self.password;
        PasswordPolicy {
            algorithm: p.algorithm,
            options: HashOptions {
                cost: p.bcrypt_cost,
                memory_cost: p.argon2_memory_kib,
                time_cost: p.argon2_time_cost,
                threads: p.argon2_threads,
            },
            random_length: p.length,
        }
    }

    /// Пустой in-memory ACL с гостевой группой из `acl.guest_group`.
    pub fn memory_acl(&self) -> MemoryAcl {
        MemoryAcl::new(self.acl.guest_group)
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log.level.clone(),
            format: self.log.format,
            ..LoggingConfig::default()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            password: PasswordSettings {
                length: DEFAULT_PASSWORD_LENGTH,
                algorithm: HashAlgorithm::Bcrypt,
                bcrypt_cost: DEFAULT_BCRYPT_COST,
                argon2_memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
                argon2_time_cost: DEFAULT_ARGON2_TIME_COST,
                argon2_threads: DEFAULT_ARGON2_THREADS,
            },
            acl: AclSettings {
                guest_group: DEFAULT_GUEST_GROUP,
            },
            log: LogSettings {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    const VARS: &[&str] = &[
        "USERGATE_PASSWORD__LENGTH",
        "USERGATE_PASSWORD__ALGORITHM",
        "USERGATE_PASSWORD__BCRYPT_COST",
        "USERGATE_LOG__FORMAT",
        "USERGATE_LOG__LEVEL",
        "USERGATE_ACL__GUEST_GROUP",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        let settings = Settings::load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.password_policy(), PasswordPolicy::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("USERGATE_PASSWORD__LENGTH", "16");
        env::set_var("USERGATE_PASSWORD__ALGORITHM", "argon2id");
        env::set_var("USERGATE_PASSWORD__BCRYPT_COST", "12");
        env::set_var("USERGATE_LOG__FORMAT", "json");

        let settings = Settings::load();
        clear_env();
        let settings = settings.unwrap();

        assert_eq!(settings.password.length, 16);
        assert_eq!(settings.password.algorithm, HashAlgorithm::Argon2id);

        let policy = settings.password_policy();
        assert_eq!(policy.options.cost, 12);
        assert_eq!(policy.random_length, 16);
        assert_eq!(settings.logging().format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_guest_group_from_env_reaches_acl() {
        use crate::auth::AclService;

        clear_env();
        env::set_var("USERGATE_ACL__GUEST_GROUP", "7");
        let settings = Settings::load();
        clear_env();
        let settings = settings.unwrap();

        assert_eq!(settings.acl.guest_group, 7);
        let acl = settings.memory_acl();
        assert_eq!(acl.guest_group(), 7);

        acl.add_group(1, 1, 4).unwrap();
        acl.add_group(7, 2, 3).unwrap();
        acl.allow(7, "site.view").unwrap();
        assert!(acl.check_user(0, "site", "view").unwrap());
    }

    #[test]
    #[serial]
    fn test_default_acl_uses_default_guest_group() {
        assert_eq!(
            Settings::default().memory_acl().guest_group(),
            DEFAULT_GUEST_GROUP
        );
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        clear_env();
        env::set_var("USERGATE_PASSWORD__ALGORITHM", "md5");
        let res = Settings::load();
        clear_env();
        assert!(res.is_err());
    }
}
