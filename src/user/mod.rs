//! Учётные записи пользователей и справочник групп.

pub mod account;
pub mod cache;
pub mod group;
pub mod helper;
pub mod params;
pub mod services;

pub use account::*;
pub use cache::*;
pub use group::*;
pub use helper::*;
pub use params::*;
pub use services::*;
