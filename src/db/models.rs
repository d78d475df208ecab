use chrono::{DateTime, Utc};
use crate::error::BounceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type UserId = i64;

/// Canonical field names of [`UserModel`], as accepted by selective updates.
pub mod fields {
    pub const ID: &str = "ID";
    pub const USERNAME: &str = "Username";
    pub const PASSWORD_HASH: &str = "PasswordHash";
    pub const EMAIL: &str = "Email";
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
    pub const IS_SUPERUSER: &str = "IsSuperUser";
    pub const IS_STAFF: &str = "IsStaff";
    pub const IS_ACTIVE: &str = "IsActive";
    pub const DATE_JOINED: &str = "DateJoined";
    pub const LAST_LOGIN: &str = "LastLogin";

    pub const ALL: [&str; 11] = [
        ID,
        USERNAME,
        PASSWORD_HASH,
        EMAIL,
        FIRST_NAME,
        LAST_NAME,
        IS_SUPERUSER,
        IS_STAFF,
        IS_ACTIVE,
        DATE_JOINED,
        LAST_LOGIN,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserModel {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl UserModel {
    /// Value of the field with the given canonical name, `None` for names
    /// outside [`fields::ALL`]. Timestamps come back as [`SqlValue::Time`].
    pub fn field_value(&self, name: &str) -> Option<SqlValue> {
        let v = match name {
            fields::ID => SqlValue::Int(self.id),
            fields::USERNAME => SqlValue::Text(self.username.clone()),
            fields::PASSWORD_HASH => SqlValue::Text(self.password_hash.clone()),
            fields::EMAIL => SqlValue::Text(self.email.clone()),
            fields::FIRST_NAME => SqlValue::Text(self.first_name.clone()),
            fields::LAST_NAME => SqlValue::Text(self.last_name.clone()),
            fields::IS_SUPERUSER => SqlValue::Bool(self.is_superuser),
            fields::IS_STAFF => SqlValue::Bool(self.is_staff),
            fields::IS_ACTIVE => SqlValue::Bool(self.is_active),
            fields::DATE_JOINED => SqlValue::Time(self.date_joined),
            fields::LAST_LOGIN => SqlValue::Time(self.last_login),
            _ => return None,
        };
        Some(v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntry {
    pub key: String,
    pub user: UserId,
    pub expire_date: DateTime<Utc>,
}

/// A value handed to or read from the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Bool(bool),
    Text(String),
    Time(DateTime<Utc>),
}

impl SqlValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Int(_) => "integer",
            SqlValue::Bool(_) => "bool",
            SqlValue::Text(_) => "text",
            SqlValue::Time(_) => "timestamp",
        }
    }
}

/// Maps canonical [`UserModel`] field names to column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowNames {
    names: HashMap<String, String>,
}

impl Default for RowNames {
    fn default() -> Self {
        let columns = [
            "id",
            "username",
            "password",
            "email",
            "first_name",
            "last_name",
            "is_superuser",
            "is_staff",
            "is_active",
            "date_joined",
            "last_login",
        ];
        Self::new(
            fields::ALL
                .iter()
                .zip(columns)
                .map(|(f, c)| (f.to_string(), c.to_string())),
        )
    }
}

impl RowNames {
    pub fn new(names: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Fails unless the keys are exactly the canonical [`UserModel`] fields.
    pub fn check_user_fields(&self) -> Result<(), BounceError> {
        let missing: Vec<String> = fields::ALL
            .iter()
            .filter(|f| !self.names.contains_key(**f))
            .map(|f| f.to_string())
            .collect();
        let mut unknown: Vec<String> = self
            .names
            .keys()
            .filter(|k| !fields::ALL.contains(&k.as_str()))
            .cloned()
            .collect();
        unknown.sort();
        if missing.is_empty() && unknown.is_empty() {
            Ok(())
        } else {
            Err(BounceError::InvalidRowNames { missing, unknown })
        }
    }

    pub fn column(&self, field: &str) -> Option<&str> {
        self.names.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
