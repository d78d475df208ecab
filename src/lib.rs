pub mod config;
pub mod db;
pub mod error;

pub use config::Config;
pub use db::{SessionStorage, SqliteStorage, UserStorage};
pub use error::{BounceError, Result};
