//! Database module: statement templating, storage interfaces and the SQLite
//! backend.
//!
//! Layout:
//! - `template.rs`: `$NAME$` placeholder substitution
//! - `schema.rs`: statement skeletons (SQLite-first)
//! - `queries.rs`: resolved statements and the selective update builder
//! - `bridge.rs`: time conversion and error classification per engine
//! - `storage.rs`: storage traits and the generic SQL implementation
//! - `sqlite.rs`: the SQLite facade

pub mod bridge;
pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod storage;
pub mod template;

pub use bridge::{SqlBridge, SqliteBridge};
pub use models::{RowNames, SessionEntry, SqlValue, UserId, UserModel};
pub use queries::{QueryOptions, SessionQueries, SqliteQueries, UserQueries};
pub use sqlite::SqliteStorage;
pub use storage::{SessionStorage, SqlStorage, SqlitePool, UserStorage};
pub use template::SqlTemplateReplacer;
