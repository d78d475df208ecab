//! Resolved statement text for the user and session tables.

use crate::db::models::RowNames;
use crate::db::schema::*;
use crate::db::template::SqlTemplateReplacer;
use crate::error::{BounceError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, error};

/// Statements a SQL backend provides for user records.
pub trait UserQueries: Send + Sync {
    /// DDL to run once, table first, then username and email indexes.
    fn init_users(&self) -> &[String];
    fn get_user(&self) -> &str;
    fn get_user_by_name(&self) -> &str;
    fn get_user_by_email(&self) -> &str;
    fn insert_user(&self) -> &str;
    /// Full update when `fields` is empty or selective updates are off,
    /// otherwise a statement setting exactly `fields`, in order, with the id
    /// as the last parameter.
    fn update_user(&self, fields: &[&str]) -> Result<Cow<'_, str>>;
    fn delete_user(&self) -> &str;
    fn supports_user_fields(&self) -> bool;
    /// Column for a canonical field name.
    fn column(&self, field: &str) -> Result<&str>;
}

/// Statements a SQL backend provides for session records.
pub trait SessionQueries: Send + Sync {
    fn init_sessions(&self) -> &[String];
    fn insert_session(&self) -> &str;
    fn get_session(&self) -> &str;
    fn delete_session(&self) -> &str;
    fn delete_sessions_for_user(&self) -> &str;
    fn cleanup_sessions(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub selective_updates: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            selective_updates: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteQueries {
    init_users: Vec<String>,
    get_user: String,
    get_user_by_name: String,
    get_user_by_email: String,
    insert_user: String,
    update_user: String,
    delete_user: String,
    update_fields: String,
    init_sessions: Vec<String>,
    insert_session: String,
    get_session: String,
    delete_session: String,
    delete_sessions_for_user: String,
    cleanup_sessions: String,
    row_names: RowNames,
    replacer: SqlTemplateReplacer,
}

impl SqliteQueries {
    /// Resolve every statement once. Fails if a statement still holds a
    /// placeholder the dictionary cannot fill.
    pub fn new(
        replace_mapping: Option<HashMap<String, String>>,
        row_names: RowNames,
        options: QueryOptions,
    ) -> Result<Self> {
        let replacer = SqlTemplateReplacer::new(replace_mapping);
        row_names.check_user_fields()?;
        let resolve = |skeleton: &str| resolve_statement(&replacer, skeleton);

        let update_fields = if options.selective_updates {
            resolve_update_fields(&replacer, SQLITE_UPDATE_USER_FIELDS)?
        } else {
            String::new()
        };

        let queries = Self {
            init_users: vec![
                resolve(SQLITE_USERS_INIT)?,
                resolve(SQLITE_USERNAME_INDEX)?,
                resolve(SQLITE_USER_EMAIL_INDEX)?,
            ],
            get_user: resolve(SQLITE_QUERY_USERID)?,
            get_user_by_name: resolve(SQLITE_QUERY_USERNAME)?,
            get_user_by_email: resolve(SQLITE_QUERY_USERMAIL)?,
            insert_user: resolve(SQLITE_INSERT_USER)?,
            update_user: resolve(SQLITE_UPDATE_USER)?,
            delete_user: resolve(SQLITE_DELETE_USER)?,
            update_fields,
            init_sessions: vec![
                resolve(SQLITE_SESSIONS_INIT)?,
                resolve(SQLITE_SESSION_USER_INDEX)?,
            ],
            insert_session: resolve(SQLITE_INSERT_SESSION)?,
            get_session: resolve(SQLITE_QUERY_SESSION)?,
            delete_session: resolve(SQLITE_DELETE_SESSION)?,
            delete_sessions_for_user: resolve(SQLITE_DELETE_SESSIONS_FOR_USER)?,
            cleanup_sessions: resolve(SQLITE_CLEANUP_SESSIONS)?,
            row_names,
            replacer,
        };
        debug!(
            users_table = ?queries.replacer.dict().get(crate::db::template::USERS_TABLE_NAME),
            selective_updates = queries.supports_user_fields(),
            "sqlite statements resolved"
        );
        Ok(queries)
    }

    pub fn replacer(&self) -> &SqlTemplateReplacer {
        &self.replacer
    }
}

/// Fill `skeleton`, failing if any placeholder is left unresolved.
fn resolve_statement(replacer: &SqlTemplateReplacer, skeleton: &str) -> Result<String> {
    let names = replacer.unresolved(skeleton);
    if !names.is_empty() {
        return Err(BounceError::UnresolvedPlaceholder {
            statement: skeleton.to_string(),
            names,
        });
    }
    Ok(replacer.apply(skeleton))
}

/// Like [`resolve_statement`], but `$UPDATE_CONTENT$` must survive for the
/// per-call substitution.
fn resolve_update_fields(replacer: &SqlTemplateReplacer, skeleton: &str) -> Result<String> {
    let stmt = replacer.apply(skeleton);
    if !stmt.contains(UPDATE_CONTENT) {
        return Err(BounceError::MissingUpdateContent);
    }
    let names: Vec<String> = replacer
        .unresolved(&stmt)
        .into_iter()
        .filter(|n| n.as_str() != UPDATE_CONTENT.trim_matches('$'))
        .collect();
    if !names.is_empty() {
        return Err(BounceError::UnresolvedPlaceholder {
            statement: skeleton.to_string(),
            names,
        });
    }
    Ok(stmt)
}

impl UserQueries for SqliteQueries {
    fn init_users(&self) -> &[String] {
        &self.init_users
    }

    fn get_user(&self) -> &str {
        &self.get_user
    }

    fn get_user_by_name(&self) -> &str {
        &self.get_user_by_name
    }

    fn get_user_by_email(&self) -> &str {
        &self.get_user_by_email
    }

    fn insert_user(&self) -> &str {
        &self.insert_user
    }

    fn update_user(&self, fields: &[&str]) -> Result<Cow<'_, str>> {
        if fields.is_empty() || !self.supports_user_fields() {
            return Ok(Cow::Borrowed(&self.update_user));
        }
        let updates = fields
            .iter()
            .map(|f| self.column(f).map(|col| format!("{col}=?")))
            .collect::<Result<Vec<_>>>()?;
        let stmt = self
            .update_fields
            .replacen(UPDATE_CONTENT, &updates.join(","), 1);
        Ok(Cow::Owned(stmt))
    }

    fn delete_user(&self) -> &str {
        &self.delete_user
    }

    fn supports_user_fields(&self) -> bool {
        !self.update_fields.is_empty()
    }

    fn column(&self, field: &str) -> Result<&str> {
        self.row_names.column(field).ok_or_else(|| {
            error!(field, "invalid field name for selective user update");
            BounceError::UnknownField(field.to_string())
        })
    }
}

impl SessionQueries for SqliteQueries {
    fn init_sessions(&self) -> &[String] {
        &self.init_sessions
    }

    fn insert_session(&self) -> &str {
        &self.insert_session
    }

    fn get_session(&self) -> &str {
        &self.get_session
    }

    fn delete_session(&self) -> &str {
        &self.delete_session
    }

    fn delete_sessions_for_user(&self) -> &str {
        &self.delete_sessions_for_user
    }

    fn cleanup_sessions(&self) -> &str {
        &self.cleanup_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::fields;
    use crate::db::template::{EMAIL_UNIQUE, USERS_TABLE_NAME};
    use proptest::prelude::*;

    fn accounts() -> SqliteQueries {
        SqliteQueries::new(
            Some(HashMap::from([(
                USERS_TABLE_NAME.to_string(),
                "accounts".to_string(),
            )])),
            RowNames::default(),
            QueryOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn select_by_id_uses_overridden_table() {
        assert_eq!(accounts().get_user(), "SELECT * FROM accounts WHERE id=?;");
    }

    #[test]
    fn selective_update_keeps_field_order() {
        let q = accounts();
        let stmt = q.update_user(&["Email", "LastLogin"]).unwrap();
        assert_eq!(stmt, "UPDATE accounts SET email=?,last_login=? WHERE id = ?;");

        let stmt = q.update_user(&["LastLogin", "Email"]).unwrap();
        assert_eq!(stmt, "UPDATE accounts SET last_login=?,email=? WHERE id = ?;");
    }

    proptest! {
        #[test]
        fn selective_update_has_one_clause_per_field(
            picked in prop::collection::vec(prop::sample::select(fields::ALL.to_vec()), 1..16)
        ) {
            let q = accounts();
            let stmt = q.update_user(&picked).unwrap();
            let set = stmt
                .strip_prefix("UPDATE accounts SET ")
                .and_then(|s| s.strip_suffix(" WHERE id = ?;"))
                .unwrap();
            let clauses: Vec<&str> = set.split(',').collect();
            prop_assert_eq!(clauses.len(), picked.len());
            let rows = RowNames::default();
            for (clause, field) in clauses.iter().zip(&picked) {
                prop_assert_eq!(clause.to_string(), format!("{}=?", rows.column(field).unwrap()));
            }
        }
    }

    #[test]
    fn empty_fields_fall_back_to_full_update() {
        let q = accounts();
        let disabled = SqliteQueries::new(
            Some(HashMap::from([(
                USERS_TABLE_NAME.to_string(),
                "accounts".to_string(),
            )])),
            RowNames::default(),
            QueryOptions {
                selective_updates: false,
            },
        )
        .unwrap();
        assert!(q.supports_user_fields());
        assert!(!disabled.supports_user_fields());

        let full = q.update_user(&[]).unwrap();
        assert_eq!(full, disabled.update_user(&[]).unwrap());
        assert_eq!(full, disabled.update_user(&["Email"]).unwrap());
        assert!(full.ends_with("WHERE id=?;"));
        assert!(full.contains("last_login=?"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let q = accounts();
        let err = q.update_user(&["Email", "email"]).unwrap_err();
        assert!(matches!(err, BounceError::UnknownField(ref f) if f == "email"));
        assert!(err.is_caller_error());
    }

    #[test]
    fn init_creates_table_before_indexes() {
        let q = accounts();
        let init = q.init_users();
        assert_eq!(init.len(), 3);
        assert!(init[0].starts_with("CREATE TABLE IF NOT EXISTS accounts"));
        assert!(init[1].contains("idx_accounts_username"));
        assert!(init[2].contains("idx_accounts_email"));
        assert!(q.init_sessions()[0].starts_with("CREATE TABLE IF NOT EXISTS auth_session"));
    }

    #[test]
    fn email_uniqueness_can_be_dropped() {
        let q = SqliteQueries::new(
            Some(HashMap::from([(EMAIL_UNIQUE.to_string(), String::new())])),
            RowNames::default(),
            QueryOptions::default(),
        )
        .unwrap();
        assert!(q.init_users()[2].starts_with("CREATE  INDEX IF NOT EXISTS"));
        assert!(q.init_users()[0].contains("email VARCHAR(254) NOT NULL ,"));
    }

    #[test]
    fn resolved_statements_hold_no_tokens() {
        let q = SqliteQueries::new(None, RowNames::default(), QueryOptions::default()).unwrap();
        let all = q
            .init_users()
            .iter()
            .chain(q.init_sessions())
            .map(String::as_str)
            .chain([
                q.get_user(),
                q.get_user_by_name(),
                q.get_user_by_email(),
                q.insert_user(),
                q.delete_user(),
                q.insert_session(),
                q.get_session(),
                q.delete_session(),
                q.delete_sessions_for_user(),
                q.cleanup_sessions(),
            ]);
        for stmt in all {
            assert!(!stmt.contains('$'), "unresolved token in {stmt}");
        }
    }

    #[test]
    fn renamed_columns_drive_the_set_clause() {
        let rows = RowNames::new(fields::ALL.iter().map(|f| {
            let col = if *f == fields::EMAIL { "mail" } else { "x" };
            (f.to_string(), col.to_string())
        }));
        let q = SqliteQueries::new(None, rows, QueryOptions::default()).unwrap();
        assert_eq!(
            q.update_user(&["Email"]).unwrap(),
            "UPDATE auth_user SET mail=? WHERE id = ?;"
        );
    }

    #[test]
    fn row_names_must_match_the_user_fields() {
        let partial = SqliteQueries::new(
            None,
            RowNames::new([("Email".to_string(), "email".to_string())]),
            QueryOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            partial,
            BounceError::InvalidRowNames { ref missing, .. } if missing.iter().any(|f| f == "LastLogin")
        ));
        assert!(partial.is_caller_error());

        let foreign = SqliteQueries::new(
            None,
            RowNames::new([("Nickname".to_string(), "nick".to_string())]),
            QueryOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            foreign,
            BounceError::InvalidRowNames { ref unknown, .. } if unknown == &["Nickname".to_string()]
        ));
    }

    #[test]
    fn overriding_update_content_is_rejected() {
        let err = SqliteQueries::new(
            Some(HashMap::from([("UPDATE_CONTENT".to_string(), "x".to_string())])),
            RowNames::default(),
            QueryOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BounceError::MissingUpdateContent));
        assert!(err.is_caller_error());

        SqliteQueries::new(
            Some(HashMap::from([("UPDATE_CONTENT".to_string(), "x".to_string())])),
            RowNames::default(),
            QueryOptions {
                selective_updates: false,
            },
        )
        .unwrap();
    }

    #[test]
    fn unknown_placeholder_fails_resolution() {
        let r = SqlTemplateReplacer::default();
        let err = resolve_statement(&r, "SELECT * FROM $SCHEMA$.$USERS_TABLE_NAME$;").unwrap_err();
        assert!(matches!(
            err,
            BounceError::UnresolvedPlaceholder { ref names, .. } if names == &["SCHEMA".to_string()]
        ));
        assert_eq!(
            resolve_statement(&r, SQLITE_QUERY_USERID).unwrap(),
            "SELECT * FROM auth_user WHERE id=?;"
        );

        let err = resolve_update_fields(&r, "UPDATE $NOPE$ SET $UPDATE_CONTENT$ WHERE id = ?;")
            .unwrap_err();
        assert!(matches!(
            err,
            BounceError::UnresolvedPlaceholder { ref names, .. } if names == &["NOPE".to_string()]
        ));
        assert!(matches!(
            resolve_update_fields(&r, "UPDATE $USERS_TABLE_NAME$ SET a=? WHERE id = ?;"),
            Err(BounceError::MissingUpdateContent)
        ));
    }
}
