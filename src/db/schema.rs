//! Statement skeletons for the SQLite backend.
//!
//! Placeholders are resolved by [`SqlTemplateReplacer`](super::template::SqlTemplateReplacer).
//! Positional parameters bind in `UserModel` field order, with the id last
//! for updates and deletes.

/// Users table. `$EMAIL_UNIQUE$` is `UNIQUE` or empty.
pub const SQLITE_USERS_INIT: &str = r#"CREATE TABLE IF NOT EXISTS $USERS_TABLE_NAME$ (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(150) NOT NULL UNIQUE,
    password VARCHAR(270) NOT NULL,
    email VARCHAR(254) NOT NULL $EMAIL_UNIQUE$,
    first_name VARCHAR(50) NOT NULL,
    last_name VARCHAR(150) NOT NULL,
    is_superuser BOOL NOT NULL,
    is_staff BOOL NOT NULL,
    is_active BOOL NOT NULL,
    date_joined DATETIME NOT NULL,
    last_login DATETIME NOT NULL
);"#;

pub const SQLITE_USERNAME_INDEX: &str = r#"CREATE UNIQUE INDEX IF NOT EXISTS
idx_$USERS_TABLE_NAME$_username ON $USERS_TABLE_NAME$(username);"#;

pub const SQLITE_USER_EMAIL_INDEX: &str = r#"CREATE $EMAIL_UNIQUE$ INDEX IF NOT EXISTS
idx_$USERS_TABLE_NAME$_email ON $USERS_TABLE_NAME$(email);"#;

pub const SQLITE_QUERY_USERID: &str = "SELECT * FROM $USERS_TABLE_NAME$ WHERE id=?;";

pub const SQLITE_QUERY_USERNAME: &str = "SELECT * FROM $USERS_TABLE_NAME$ WHERE username=?;";

pub const SQLITE_QUERY_USERMAIL: &str = "SELECT * FROM $USERS_TABLE_NAME$ WHERE email=?;";

pub const SQLITE_INSERT_USER: &str = r#"INSERT INTO $USERS_TABLE_NAME$(
    username, password, email, first_name, last_name, is_superuser, is_staff,
    is_active, date_joined, last_login)
VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?);"#;

pub const SQLITE_UPDATE_USER: &str = r#"UPDATE $USERS_TABLE_NAME$
SET username=?, password=?, email=?, first_name=?, last_name=?,
    is_superuser=?, is_staff=?, is_active=?, date_joined=?, last_login=?
WHERE id=?;"#;

pub const SQLITE_DELETE_USER: &str = "DELETE FROM $USERS_TABLE_NAME$ WHERE id=?;";

/// Token filled per call with the `SET` clause list.
pub const UPDATE_CONTENT: &str = "$UPDATE_CONTENT$";

pub const SQLITE_UPDATE_USER_FIELDS: &str =
    "UPDATE $USERS_TABLE_NAME$ SET $UPDATE_CONTENT$ WHERE id = ?;";

pub const SQLITE_SESSIONS_INIT: &str = r#"CREATE TABLE IF NOT EXISTS $SESSIONS_TABLE_NAME$ (
    session_key CHAR(64) NOT NULL PRIMARY KEY,
    user_id INTEGER NOT NULL,
    expire_date DATETIME NOT NULL
);"#;

pub const SQLITE_SESSION_USER_INDEX: &str = r#"CREATE INDEX IF NOT EXISTS
idx_$SESSIONS_TABLE_NAME$_user ON $SESSIONS_TABLE_NAME$(user_id);"#;

pub const SQLITE_INSERT_SESSION: &str =
    "INSERT INTO $SESSIONS_TABLE_NAME$(session_key, user_id, expire_date) VALUES(?, ?, ?);";

pub const SQLITE_QUERY_SESSION: &str =
    "SELECT * FROM $SESSIONS_TABLE_NAME$ WHERE session_key=?;";

pub const SQLITE_DELETE_SESSION: &str =
    "DELETE FROM $SESSIONS_TABLE_NAME$ WHERE session_key=?;";

pub const SQLITE_DELETE_SESSIONS_FOR_USER: &str =
    "DELETE FROM $SESSIONS_TABLE_NAME$ WHERE user_id=?;";

pub const SQLITE_CLEANUP_SESSIONS: &str =
    "DELETE FROM $SESSIONS_TABLE_NAME$ WHERE expire_date <= ?;";
