//! Textual `$NAME$` substitution for statement skeletons.

use std::collections::HashMap;

/// Name of the users table.
pub const USERS_TABLE_NAME: &str = "USERS_TABLE_NAME";
/// Name of the sessions table.
pub const SESSIONS_TABLE_NAME: &str = "SESSIONS_TABLE_NAME";
/// Either `UNIQUE` or empty; controls whether emails must be unique.
pub const EMAIL_UNIQUE: &str = "EMAIL_UNIQUE";

/// Built-in placeholder dictionary. Returned by value so every replacer owns
/// its own copy.
pub fn default_dict() -> HashMap<String, String> {
    HashMap::from([
        (USERS_TABLE_NAME.to_string(), "auth_user".to_string()),
        (SESSIONS_TABLE_NAME.to_string(), "auth_session".to_string()),
        (EMAIL_UNIQUE.to_string(), "UNIQUE".to_string()),
    ])
}

/// Replaces `$NAME$` tokens in a skeleton with entries of its dictionary.
///
/// The dictionary is fixed once the replacer is built; to change it, build a
/// new replacer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplateReplacer {
    dict: HashMap<String, String>,
}

impl Default for SqlTemplateReplacer {
    fn default() -> Self {
        Self { dict: default_dict() }
    }
}

impl SqlTemplateReplacer {
    /// Merge `overrides` onto the default dictionary. Matching keys are
    /// replaced, unknown keys are added.
    pub fn new(overrides: Option<HashMap<String, String>>) -> Self {
        let mut dict = default_dict();
        if let Some(overrides) = overrides {
            dict.extend(overrides);
        }
        Self { dict }
    }

    pub fn dict(&self) -> &HashMap<String, String> {
        &self.dict
    }

    /// Substitute every known token in one left-to-right pass. Substituted
    /// text is never rescanned and unknown tokens are copied verbatim.
    pub fn apply(&self, skeleton: &str) -> String {
        let mut out = String::with_capacity(skeleton.len());
        let mut rest = skeleton;
        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after
                .find('$')
                .and_then(|end| self.dict.get(&after[..end]).map(|v| (end, v)))
            {
                Some((end, value)) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('$');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Names of `$NAME$` tokens in `skeleton` this replacer cannot resolve.
    pub fn unresolved(&self, skeleton: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut rest = skeleton;
        while let Some(start) = rest.find('$') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('$') else {
                break;
            };
            let name = &after[..end];
            if is_token_name(name) {
                if !self.dict.contains_key(name) && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[end + 1..];
            } else {
                rest = after;
            }
        }
        names
    }
}

fn is_token_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
