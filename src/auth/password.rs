use std::{fmt, str::FromStr};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use usergate_error::{UserError, UserResult};

use super::random::DEFAULT_PASSWORD_LENGTH;

/// Стоимость bcrypt по умолчанию.
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const BCRYPT_MIN_COST: u32 = 4;
pub const BCRYPT_MAX_COST: u32 = 31;
/// Память argon2 по умолчанию (KiB).
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;
/// Число итераций argon2 по умолчанию.
pub const DEFAULT_ARGON2_TIME_COST: u32 = Params::DEFAULT_T_COST;
/// Число потоков argon2 по умолчанию.
pub const DEFAULT_ARGON2_THREADS: u32 = Params::DEFAULT_P_COST;

/// Семейство алгоритмов хеширования паролей.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Bcrypt,
    Argon2i,
    Argon2id,
}

/// Параметры алгоритма. `cost` относится к bcrypt, остальные поля к argon2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashOptions {
    pub cost: u32,
    pub memory_cost: u32,
    pub time_cost: u32,
    pub threads: u32,
}

/// Политика паролей: алгоритм и параметры хеширования плюс длина
/// генерируемых паролей.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub algorithm: HashAlgorithm,
    pub options: HashOptions,
    pub random_length: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bcrypt => "bcrypt",
            Self::Argon2i => "argon2i",
            Self::Argon2id => "argon2id",
        }
    }

    /// Определяет алгоритм по префиксу закодированного хеша.
    pub fn identify(hash: &str) -> Option<Self> {
        if ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|p| hash.starts_with(p))
        {
            Some(Self::Bcrypt)
        } else if hash.starts_with("$argon2id$") {
            Some(Self::Argon2id)
        } else if hash.starts_with("$argon2i$") {
            Some(Self::Argon2i)
        } else {
            None
        }
    }

    fn argon2_variant(&self) -> Option<Algorithm> {
        match self {
            Self::Bcrypt => None,
            Self::Argon2i => Some(Algorithm::Argon2i),
            Self::Argon2id => Some(Algorithm::Argon2id),
        }
    }
}

impl HashOptions {
    /// Параметры bcrypt с заданной стоимостью, argon2 по умолчанию.
    pub fn bcrypt(cost: u32) -> Self {
        Self {
            cost,
            ..Self::default()
        }
    }

    /// Параметры argon2, стоимость bcrypt по умолчанию.
    pub fn argon2(
        memory_cost: u32,
        time_cost: u32,
        threads: u32,
    ) -> Self {
        Self {
            memory_cost,
            time_cost,
            threads,
            ..Self::default()
        }
    }

    fn argon2_params(&self) -> UserResult<Params> {
        Params::new(self.memory_cost, self.time_cost, self.threads, None).map_err(|e| {
            UserError::InvalidHashOptions {
                reason: format!("argon2: {e}"),
            }
            .into()
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Хеширование и проверка
////////////////////////////////////////////////////////////////////////////////

/// Хеширует пароль выбранным алгоритмом.
///
/// Результат содержит тег алгоритма, параметры и соль. bcrypt-хеши
/// кодируются с префиксом `$2y$`.
pub fn crypt_password(
    password: &str,
    algorithm: HashAlgorithm,
    options: &HashOptions,
) -> UserResult<String> {
    match algorithm.argon2_variant() {
        None => crypt_bcrypt(password, options.cost),
        Some(variant) => crypt_argon2(password, variant, options),
    }
}

fn crypt_bcrypt(
    password: &str,
    cost: u32,
) -> UserResult<String> {
    if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&cost) {
        return Err(UserError::InvalidHashOptions {
            reason: format!(
                "bcrypt cost {cost} outside {}..={}",
                BCRYPT_MIN_COST,
                BCRYPT_MAX_COST
            ),
        }
        .into());
    }

    bcrypt::hash_with_result(password, cost)
        .map(|parts| parts.format_for_version(bcrypt::Version::TwoY))
        .map_err(|e| {
            UserError::PasswordHashFailed {
                reason: e.to_string(),
            }
            .into()
        })
}

fn crypt_argon2(
    password: &str,
    variant: Algorithm,
    options: &HashOptions,
) -> UserResult<String> {
    let params = options.argon2_params()?;
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(variant, Version::V0x13, params);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            UserError::PasswordHashFailed {
                reason: e.to_string(),
            }
            .into()
        })
}

/// Проверяет пароль по хешу любого поддерживаемого алгоритма.
///
/// Неизвестный или повреждённый хеш даёт `false`.
pub fn verify_password(
    password: &str,
    hash: &str,
) -> bool {
    match HashAlgorithm::identify(hash) {
        Some(HashAlgorithm::Bcrypt) => match bcrypt::verify(password, hash) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!(error = %e, "Malformed bcrypt hash");
                false
            }
        },
        Some(_) => match PasswordHash::new(hash) {
            // Алгоритм и параметры берутся из самого хеша.
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed argon2 hash");
                false
            }
        },
        None => {
            tracing::debug!("Unrecognized password hash format");
            false
        }
    }
}

/// `true`, если хеш получен не тем алгоритмом или не с теми параметрами,
/// что заданы в `algorithm`/`options`.
pub fn needs_rehash(
    hash: &str,
    algorithm: HashAlgorithm,
    options: &HashOptions,
) -> bool {
    if HashAlgorithm::identify(hash) != Some(algorithm) {
        return true;
    }

    match algorithm {
        // $2y$10$<salt+hash>
        HashAlgorithm::Bcrypt => hash
            .split('$')
            .nth(2)
            .and_then(|c| c.parse::<u32>().ok())
            .map_or(true, |cost| cost != options.cost),
        HashAlgorithm::Argon2i | HashAlgorithm::Argon2id => {
            let Ok(parsed) = PasswordHash::new(hash) else {
                return true;
            };
            match Params::try_from(&parsed) {
                Ok(p) => {
                    p.m_cost() != options.memory_cost
                        || p.t_cost() != options.time_cost
                        || p.p_cost() != options.threads
                }
                Err(_) => true,
            }
        }
    }
}

impl PasswordPolicy {
    pub fn crypt(
        &self,
        password: &str,
    ) -> UserResult<String> {
        crypt_password(password, self.algorithm, &self.options)
    }

    pub fn needs_rehash(
        &self,
        hash: &str,
    ) -> bool {
        needs_rehash(hash, self.algorithm, &self.options)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for HashOptions {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
            memory_cost: DEFAULT_ARGON2_MEMORY_KIB,
            time_cost: DEFAULT_ARGON2_TIME_COST,
            threads: DEFAULT_ARGON2_THREADS,
        }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            options: HashOptions::default(),
            random_length: DEFAULT_PASSWORD_LENGTH,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bcrypt" | "2y" | "default" => Ok(Self::Bcrypt),
            "argon2i" => Ok(Self::Argon2i),
            "argon2id" => Ok(Self::Argon2id),
            other => Err(UserError::InvalidHashOptions {
                reason: format!("unknown algorithm '{other}'"),
            }),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use usergate_error::StatusCode;

    use super::*;

    fn fast_bcrypt() -> HashOptions {
        HashOptions::bcrypt(4)
    }

    fn fast_argon2() -> HashOptions {
        HashOptions::argon2(1024, 1, 1)
    }

    #[test]
    fn test_bcrypt_hash_and_verify() {
        let hash = crypt_password("my_secret_password", HashAlgorithm::Bcrypt, &fast_bcrypt())
            .expect("Hashing should succeed");
        assert!(hash.starts_with("$2y$04$"), "got {hash}");
        assert!(verify_password("my_secret_password", &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_argon2id_hash_and_verify() {
        let hash =
            crypt_password("my_secret_password", HashAlgorithm::Argon2id, &fast_argon2()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("my_secret_password", &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_argon2i_hash_and_verify() {
        let hash = crypt_password("pässwörd", HashAlgorithm::Argon2i, &fast_argon2()).unwrap();
        assert!(hash.starts_with("$argon2i$"));
        assert!(verify_password("pässwörd", &hash));
    }

    #[test]
    fn test_verify_legacy_bcrypt_prefix() {
        // хеш в формате $2b$, как у других реализаций bcrypt
        let parts = bcrypt::hash_with_result("legacy", 4).unwrap();
        let hash = parts.format_for_version(bcrypt::Version::TwoB);
        assert!(verify_password("legacy", &hash));
    }

    #[test]
    fn test_verify_invalid_hash() {
        assert!(!verify_password("password", "invalid_hash"));
        assert!(!verify_password("password", "$2y$10$short"));
        assert!(!verify_password("password", "$argon2id$garbage"));
        assert!(!verify_password("password", ""));
    }

    #[test]
    fn test_invalid_bcrypt_cost() {
        let err = crypt_password("x", HashAlgorithm::Bcrypt, &HashOptions::bcrypt(3)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
    }

    #[test]
    fn test_invalid_argon2_params() {
        let err = crypt_password("x", HashAlgorithm::Argon2id, &HashOptions::argon2(1024, 1, 0))
            .unwrap_err();
        assert!(err.to_string().contains("argon2"));
    }

    #[test]
    fn test_identify() {
        assert_eq!(HashAlgorithm::identify("$2y$10$abc"), Some(HashAlgorithm::Bcrypt));
        assert_eq!(HashAlgorithm::identify("$2a$10$abc"), Some(HashAlgorithm::Bcrypt));
        assert_eq!(
            HashAlgorithm::identify("$argon2id$v=19$..."),
            Some(HashAlgorithm::Argon2id)
        );
        assert_eq!(
            HashAlgorithm::identify("$argon2i$v=19$..."),
            Some(HashAlgorithm::Argon2i)
        );
        assert_eq!(HashAlgorithm::identify("5f4dcc3b5aa765d61d8327deb882cf99"), None);
    }

    #[test]
    fn test_needs_rehash() {
        let hash = crypt_password("pw", HashAlgorithm::Bcrypt, &fast_bcrypt()).unwrap();
        assert!(!needs_rehash(&hash, HashAlgorithm::Bcrypt, &fast_bcrypt()));
        assert!(needs_rehash(&hash, HashAlgorithm::Bcrypt, &HashOptions::bcrypt(5)));
        assert!(needs_rehash(&hash, HashAlgorithm::Argon2id, &fast_argon2()));

        let hash = crypt_password("pw", HashAlgorithm::Argon2id, &fast_argon2()).unwrap();
        assert!(!needs_rehash(&hash, HashAlgorithm::Argon2id, &fast_argon2()));
        assert!(needs_rehash(
            &hash,
            HashAlgorithm::Argon2id,
            &HashOptions::argon2(2048, 1, 1)
        ));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("BCRYPT".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Bcrypt);
        assert_eq!(
            "argon2id".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Argon2id
        );
        assert!("md5".parse::<HashAlgorithm>().is_err());
        assert_eq!(HashAlgorithm::Argon2i.to_string(), "argon2i");
    }

    #[test]
    fn test_policy_defaults() {
        let policy = PasswordPolicy::default();
        assert_eq!(policy.algorithm, HashAlgorithm::Bcrypt);
        assert_eq!(policy.options.cost, DEFAULT_BCRYPT_COST);
        assert_eq!(policy.random_length, 8);
    }
}
