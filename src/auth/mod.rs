pub mod acl;
pub mod password;
pub mod random;
pub mod session;

pub use acl::*;
pub use password::*;
pub use random::*;
pub use session::*;
