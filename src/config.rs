use crate::db::template::{EMAIL_UNIQUE, SESSIONS_TABLE_NAME, USERS_TABLE_NAME};
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime configuration, read from `BOUNCE_*` environment variables on top
/// of the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub loglevel: String,
    pub users_table_name: String,
    pub sessions_table_name: String,
    pub email_unique: bool,
    pub selective_updates: bool,
    /// Extra placeholder entries; these win over the named settings above.
    #[serde(default)]
    pub placeholders: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://bounce.db".to_string(),
            loglevel: "info".to_string(),
            users_table_name: "auth_user".to_string(),
            sessions_table_name: "auth_session".to_string(),
            email_unique: true,
            selective_updates: true,
            placeholders: HashMap::new(),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed("BOUNCE_"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Placeholder overrides for the statement templates.
    pub fn replace_mapping(&self) -> HashMap<String, String> {
        let mut mapping = HashMap::from([
            (USERS_TABLE_NAME.to_string(), self.users_table_name.clone()),
            (
                SESSIONS_TABLE_NAME.to_string(),
                self.sessions_table_name.clone(),
            ),
            (
                EMAIL_UNIQUE.to_string(),
                if self.email_unique { "UNIQUE" } else { "" }.to_string(),
            ),
        ]);
        mapping.extend(self.placeholders.clone());
        mapping
    }
}
