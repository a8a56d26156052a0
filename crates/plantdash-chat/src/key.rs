//! Machine names used as transcript file names.

use std::fmt;

use crate::error::ChatError;

const MAX_KEY_CHARS: usize = 128;

/// A machine/device name that is safe to use as a file stem.
///
/// Letters, digits, space and `- _ . ( ) #` are accepted. Leading dots and
/// `..` are rejected so a key can never leave the history directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityKey(String);

impl EntityKey {
    /// Validate a raw machine name. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, ChatError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ChatError::InvalidKey("name is empty".to_string()));
        }
        if key.chars().count() > MAX_KEY_CHARS {
            return Err(ChatError::InvalidKey(format!(
                "name is longer than {} characters",
                MAX_KEY_CHARS
            )));
        }
        if key.starts_with('.') || key.contains("..") {
            return Err(ChatError::InvalidKey(key.to_string()));
        }
        let allowed =
            |c: char| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')' | '#');
        if !key.chars().all(allowed) {
            return Err(ChatError::InvalidKey(key.to_string()));
        }
        Ok(Self(key.to_string()))
    }

    /// Parse an optional query/body value; blank means "no machine selected".
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, ChatError> {
        match raw {
            Some(value) if !value.trim().is_empty() => Self::parse(value).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<name>.json`
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
