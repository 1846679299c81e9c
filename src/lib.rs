/// Authentication primitives: password hashing, random passwords, ACL and
/// session ports with in-memory adapters.
pub mod auth;
/// Settings loading (defaults + `USERGATE_*` environment).
pub mod config;
/// Message catalog and the localizer port.
pub mod lang;
/// Logging initialisation (filters, formats).
pub mod logging;
/// User and group table ports, typed rows and in-memory adapters.
pub mod store;
/// User accounts, the loaded-user cache and the directory helper.
pub mod user;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Password hashing, verification and generation; ACL and session ports.
pub use auth::{
    crypt_password, gen_random_password, gen_random_password_with, needs_rehash,
    verify_password, AclService, HashAlgorithm, HashOptions, MemoryAcl, MemorySession,
    OsSecureRandom, PasswordPolicy, SecureRandom, SessionStore,
};
/// config
pub use config::Settings;
/// Localization.
pub use lang::{Catalog, Localizer};
/// Logging.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Storage ports and rows.
pub use store::{GroupRow, GroupStore, MemoryGroupStore, MemoryUserStore, UserRecord, UserRowStore};
/// Accounts and the directory helper.
pub use user::{
    Group, Params, Profile, UserAccount, UserCache, UserDirectoryHelper, UserIdentity,
    UserServices,
};
/// Error types and result alias.
pub use usergate_error::{StackError, StatusCode, UserError, UserResult};
