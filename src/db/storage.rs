//! Storage interfaces for users and sessions, and a SQL implementation
//! generic over statement provider and engine bridge.

use crate::db::bridge::SqlBridge;
use crate::db::models::{SessionEntry, SqlValue, UserId, UserModel};
use crate::db::queries::{SessionQueries, UserQueries};
use crate::error::{BounceError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};
use tracing::{debug, warn};

pub type SqlitePool = sqlx::Pool<Sqlite>;

#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Create the users table and its indexes if missing.
    async fn init_users(&self) -> Result<()>;
    async fn get_user(&self, id: UserId) -> Result<UserModel>;
    async fn get_user_by_name(&self, username: &str) -> Result<UserModel>;
    async fn get_user_by_email(&self, email: &str) -> Result<UserModel>;
    /// Insert `user`, ignoring its id. Returns the id assigned by the engine.
    async fn insert_user(&self, user: &UserModel) -> Result<UserId>;
    /// Update the row with id `user.id`. `fields` names the columns to
    /// write; empty means all of them.
    async fn update_user(&self, user: &UserModel, fields: &[&str]) -> Result<()>;
    /// Delete a user. Deleting a missing id is not an error.
    async fn delete_user(&self, id: UserId) -> Result<()>;
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn init_sessions(&self) -> Result<()>;
    async fn insert_session(&self, session: &SessionEntry) -> Result<()>;
    async fn get_session(&self, key: &str) -> Result<SessionEntry>;
    async fn delete_session(&self, key: &str) -> Result<()>;
    /// Returns the number of sessions removed.
    async fn delete_sessions_for_user(&self, user: UserId) -> Result<u64>;
    /// Remove every session expired at `now`. Returns the number removed.
    async fn cleanup_sessions(&self, now: DateTime<Utc>) -> Result<u64>;
}

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

pub(crate) fn bind_value(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Time(v) => query.bind(v),
    }
}

/// User and session storage on top of any statement provider and bridge.
pub struct SqlStorage<Q, B> {
    pool: SqlitePool,
    queries: Q,
    bridge: B,
}

impl<Q, B> SqlStorage<Q, B>
where
    Q: UserQueries + SessionQueries,
    B: SqlBridge,
{
    pub fn new(pool: SqlitePool, queries: Q, bridge: B) -> Self {
        Self {
            pool,
            queries,
            bridge,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn queries(&self) -> &Q {
        &self.queries
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    async fn run_init(&self, statements: &[String]) -> Result<()> {
        for stmt in statements {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn fetch_user(&self, stmt: &str, by: &'static str, key: SqlValue) -> Result<UserModel> {
        let shown = match &key {
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Text(v) => v.clone(),
            other => format!("{other:?}"),
        };
        let row = bind_value(sqlx::query(stmt), key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(BounceError::NoSuchUser { by, key: shown })?;
        self.row_to_user(&row)
    }

    fn time_column(&self, row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
        let scanned = self.bridge.scan_time(row, column)?;
        self.bridge.resolve_scanned_time(scanned)
    }

    fn row_to_user(&self, row: &SqliteRow) -> Result<UserModel> {
        Ok(UserModel {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            is_superuser: row.try_get("is_superuser")?,
            is_staff: row.try_get("is_staff")?,
            is_active: row.try_get("is_active")?,
            date_joined: self.time_column(row, "date_joined")?,
            last_login: self.time_column(row, "last_login")?,
        })
    }

    fn row_to_session(&self, row: &SqliteRow) -> Result<SessionEntry> {
        Ok(SessionEntry {
            key: row.try_get("session_key")?,
            user: row.try_get("user_id")?,
            expire_date: self.time_column(row, "expire_date")?,
        })
    }

    /// Bind the ten data columns of `user` in table order.
    fn bind_user<'q>(&self, query: SqliteQuery<'q>, user: &UserModel) -> SqliteQuery<'q> {
        let query = query
            .bind(user.username.clone())
            .bind(user.password_hash.clone())
            .bind(user.email.clone())
            .bind(user.first_name.clone())
            .bind(user.last_name.clone())
            .bind(user.is_superuser)
            .bind(user.is_staff)
            .bind(user.is_active);
        let query = bind_value(query, self.bridge.marshal_time(user.date_joined));
        bind_value(query, self.bridge.marshal_time(user.last_login))
    }
}

#[async_trait]
impl<Q, B> UserStorage for SqlStorage<Q, B>
where
    Q: UserQueries + SessionQueries,
    B: SqlBridge,
{
    async fn init_users(&self) -> Result<()> {
        self.run_init(self.queries.init_users()).await
    }

    async fn get_user(&self, id: UserId) -> Result<UserModel> {
        self.fetch_user(self.queries.get_user(), "id", SqlValue::Int(id))
            .await
    }

    async fn get_user_by_name(&self, username: &str) -> Result<UserModel> {
        self.fetch_user(
            self.queries.get_user_by_name(),
            "username",
            SqlValue::Text(username.to_string()),
        )
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserModel> {
        self.fetch_user(
            self.queries.get_user_by_email(),
            "email",
            SqlValue::Text(email.to_string()),
        )
        .await
    }

    async fn insert_user(&self, user: &UserModel) -> Result<UserId> {
        let res = self
            .bind_user(sqlx::query(self.queries.insert_user()), user)
            .execute(&self.pool)
            .await
            .map_err(|e| self.bridge.classify_insert_failure(e))?;
        let id = res.last_insert_rowid();
        debug!(id, username = %user.username, "user inserted");
        Ok(id)
    }

    /// Writes every column regardless of `fields`.
    async fn update_user(&self, user: &UserModel, fields: &[&str]) -> Result<()> {
        let stmt = self.queries.update_user(&[])?;
        let res = self
            .bind_user(sqlx::query(&stmt), user)
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(|e| self.bridge.classify_update_failure(e))?;
        if res.rows_affected() == 0 {
            return Err(BounceError::NoSuchUser {
                by: "id",
                key: user.id.to_string(),
            });
        }
        debug!(id = user.id, requested = fields.len(), "user fully updated");
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let res = sqlx::query(self.queries.delete_user())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            debug!(id, "delete of unknown user");
        }
        Ok(())
    }
}

#[async_trait]
impl<Q, B> SessionStorage for SqlStorage<Q, B>
where
    Q: UserQueries + SessionQueries,
    B: SqlBridge,
{
    async fn init_sessions(&self) -> Result<()> {
        self.run_init(self.queries.init_sessions()).await
    }

    async fn insert_session(&self, session: &SessionEntry) -> Result<()> {
        bind_value(
            sqlx::query(self.queries.insert_session())
                .bind(session.key.clone())
                .bind(session.user),
            self.bridge.marshal_time(session.expire_date),
        )
        .execute(&self.pool)
        .await
        .map_err(|e| self.bridge.classify_insert_failure(e))?;
        Ok(())
    }

    async fn get_session(&self, key: &str) -> Result<SessionEntry> {
        let row = sqlx::query(self.queries.get_session())
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(BounceError::NoSuchSession)?;
        self.row_to_session(&row)
    }

    async fn delete_session(&self, key: &str) -> Result<()> {
        sqlx::query(self.queries.delete_session())
            .bind(key.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user: UserId) -> Result<u64> {
        let res = sqlx::query(self.queries.delete_sessions_for_user())
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn cleanup_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let res = bind_value(
            sqlx::query(self.queries.cleanup_sessions()),
            self.bridge.marshal_time(now),
        )
        .execute(&self.pool)
        .await
        .inspect_err(|e| warn!(error = %e, "session cleanup failed"))?;
        Ok(res.rows_affected())
    }
}
