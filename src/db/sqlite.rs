use crate::config::Config;
use crate::db::bridge::{SqlBridge, SqliteBridge};
use crate::db::models::{RowNames, SessionEntry, SqlValue, UserId, UserModel};
use crate::db::queries::{QueryOptions, SqliteQueries, UserQueries};
use crate::db::storage::{SessionStorage, SqlStorage, SqlitePool, UserStorage, bind_value};
use crate::error::{BounceError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// SQLite user and session storage.
///
/// Everything is forwarded to [`SqlStorage`] except [`UserStorage::update_user`]
/// with a non-empty field list, which only writes the requested columns.
pub struct SqliteStorage {
    inner: SqlStorage<SqliteQueries, SqliteBridge>,
}

impl SqliteStorage {
    /// Storage with the default row names and selective updates enabled.
    /// `replace_mapping` overrides entries of the default placeholder
    /// dictionary.
    pub fn new(pool: SqlitePool, replace_mapping: Option<HashMap<String, String>>) -> Result<Self> {
        let queries = SqliteQueries::new(replace_mapping, RowNames::default(), QueryOptions::default())?;
        Ok(Self::with_queries(pool, queries))
    }

    pub fn from_config(pool: SqlitePool, cfg: &Config) -> Result<Self> {
        let queries = SqliteQueries::new(
            Some(cfg.replace_mapping()),
            RowNames::default(),
            QueryOptions {
                selective_updates: cfg.selective_updates,
            },
        )?;
        Ok(Self::with_queries(pool, queries))
    }

    pub fn with_queries(pool: SqlitePool, queries: SqliteQueries) -> Self {
        Self {
            inner: SqlStorage::new(pool, queries, SqliteBridge::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.inner.pool()
    }

    pub fn queries(&self) -> &SqliteQueries {
        self.inner.queries()
    }
}

#[async_trait]
impl UserStorage for SqliteStorage {
    async fn init_users(&self) -> Result<()> {
        self.inner.init_users().await
    }

    async fn get_user(&self, id: UserId) -> Result<UserModel> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_name(&self, username: &str) -> Result<UserModel> {
        self.inner.get_user_by_name(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserModel> {
        self.inner.get_user_by_email(email).await
    }

    async fn insert_user(&self, user: &UserModel) -> Result<UserId> {
        self.inner.insert_user(user).await
    }

    async fn update_user(&self, user: &UserModel, fields: &[&str]) -> Result<()> {
        let queries = self.inner.queries();
        if fields.is_empty() || !queries.supports_user_fields() {
            return self.inner.update_user(user, fields).await;
        }
        let bridge = self.inner.bridge();
        let stmt = queries.update_user(fields)?;

        // Arguments follow the clause order of `stmt`; the id goes last.
        let mut query = sqlx::query(&stmt);
        for field in fields {
            let value = match user.field_value(field) {
                Some(SqlValue::Time(t)) => bridge.marshal_time(t),
                Some(v) => v,
                None => return Err(BounceError::UnknownField(field.to_string())),
            };
            query = bind_value(query, value);
        }
        let res = query
            .bind(user.id)
            .execute(self.inner.pool())
            .await
            .map_err(|e| bridge.classify_update_failure(e))?;
        if res.rows_affected() == 0 {
            return Err(BounceError::NoSuchUser {
                by: "id",
                key: user.id.to_string(),
            });
        }
        debug!(id = user.id, ?fields, "user fields updated");
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        self.inner.delete_user(id).await
    }
}

#[async_trait]
impl SessionStorage for SqliteStorage {
    async fn init_sessions(&self) -> Result<()> {
        self.inner.init_sessions().await
    }

    async fn insert_session(&self, session: &SessionEntry) -> Result<()> {
        self.inner.insert_session(session).await
    }

    async fn get_session(&self, key: &str) -> Result<SessionEntry> {
        self.inner.get_session(key).await
    }

    async fn delete_session(&self, key: &str) -> Result<()> {
        self.inner.delete_session(key).await
    }

    async fn delete_sessions_for_user(&self, user: UserId) -> Result<u64> {
        self.inner.delete_sessions_for_user(user).await
    }

    async fn cleanup_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.inner.cleanup_sessions(now).await
    }
}
