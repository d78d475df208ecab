//! Engine-specific conversions used by the generic SQL storage.

use crate::db::models::SqlValue;
use crate::error::BounceError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;

/// SQLite extended result codes for constraint violations on keys.
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

pub trait SqlBridge: Send + Sync {
    /// Read a timestamp column in whatever form the driver hands it out.
    fn scan_time(&self, row: &SqliteRow, column: &str) -> Result<SqlValue, sqlx::Error>;

    /// Turn a value read by [`scan_time`](Self::scan_time) into a timestamp.
    fn resolve_scanned_time(&self, value: SqlValue) -> Result<DateTime<Utc>, BounceError>;

    /// Value to bind for a timestamp parameter.
    fn marshal_time(&self, t: DateTime<Utc>) -> SqlValue;

    fn is_duplicate_insert(&self, err: &sqlx::Error) -> bool;

    fn is_duplicate_update(&self, err: &sqlx::Error) -> bool;

    fn classify_insert_failure(&self, err: sqlx::Error) -> BounceError {
        if self.is_duplicate_insert(&err) {
            BounceError::DuplicateKey
        } else {
            BounceError::Database(err)
        }
    }

    /// A key violation on update means the new values collide with another
    /// row, reported as [`BounceError::AmbiguousCredential`].
    fn classify_update_failure(&self, err: sqlx::Error) -> BounceError {
        if self.is_duplicate_update(&err) {
            BounceError::AmbiguousCredential
        } else {
            BounceError::Database(err)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteBridge;

impl SqliteBridge {
    pub fn new() -> Self {
        Self
    }
}

fn is_key_violation(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    if matches!(db_err.kind(), ErrorKind::UniqueViolation) {
        return true;
    }
    matches!(
        db_err.code().as_deref(),
        Some(SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE)
    )
}

impl SqlBridge for SqliteBridge {
    fn scan_time(&self, row: &SqliteRow, column: &str) -> Result<SqlValue, sqlx::Error> {
        let t: DateTime<Utc> = row.try_get(column)?;
        Ok(SqlValue::Time(t))
    }

    fn resolve_scanned_time(&self, value: SqlValue) -> Result<DateTime<Utc>, BounceError> {
        match value {
            SqlValue::Time(t) => Ok(t),
            other => Err(BounceError::TypeMismatch {
                expected: "timestamp",
                found: other.kind(),
            }),
        }
    }

    fn marshal_time(&self, t: DateTime<Utc>) -> SqlValue {
        SqlValue::Time(t)
    }

    fn is_duplicate_insert(&self, err: &sqlx::Error) -> bool {
        is_key_violation(err)
    }

    fn is_duplicate_update(&self, err: &sqlx::Error) -> bool {
        is_key_violation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resolve_accepts_only_timestamps() {
        let b = SqliteBridge::new();
        let t = Utc.with_ymd_and_hms(2022, 2, 22, 22, 22, 22).unwrap();
        assert_eq!(b.resolve_scanned_time(b.marshal_time(t)).unwrap(), t);

        let err = b
            .resolve_scanned_time(SqlValue::Text("2022-02-22".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            BounceError::TypeMismatch {
                expected: "timestamp",
                found: "text"
            }
        ));
    }

    #[test]
    fn non_database_errors_pass_through() {
        let b = SqliteBridge::new();
        assert!(matches!(
            b.classify_insert_failure(sqlx::Error::RowNotFound),
            BounceError::Database(sqlx::Error::RowNotFound)
        ));
        assert!(matches!(
            b.classify_update_failure(sqlx::Error::PoolTimedOut),
            BounceError::Database(sqlx::Error::PoolTimedOut)
        ));
    }
}
