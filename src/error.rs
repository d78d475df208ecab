use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, BounceError>;

#[derive(Debug, ThisError)]
pub enum BounceError {
    #[error("invalid field name \"{0}\": must be a valid field name of UserModel")]
    UnknownField(String),

    #[error("row names must cover exactly the UserModel fields (missing: {missing:?}, unknown: {unknown:?})")]
    InvalidRowNames {
        missing: Vec<String>,
        unknown: Vec<String>,
    },

    #[error("update statement has no $UPDATE_CONTENT$ target")]
    MissingUpdateContent,

    #[error("unresolved placeholders {names:?} in statement: {statement}")]
    UnresolvedPlaceholder {
        statement: String,
        names: Vec<String>,
    },

    #[error("duplicate key: a record with the same unique values already exists")]
    DuplicateKey,

    #[error("updated values collide with the credentials of another user")]
    AmbiguousCredential,

    #[error("no user with {by} {key}")]
    NoSuchUser { by: &'static str, key: String },

    #[error("no session with the given key")]
    NoSuchSession,

    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Config error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for BounceError {
    fn from(e: figment::Error) -> Self {
        BounceError::Config(Box::new(e))
    }
}

impl BounceError {
    /// True for errors raised by callers handing over bad field names or
    /// statements, as opposed to failures reported by the engine.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            BounceError::UnknownField(_)
                | BounceError::InvalidRowNames { .. }
                | BounceError::MissingUpdateContent
                | BounceError::UnresolvedPlaceholder { .. }
        )
    }
}
