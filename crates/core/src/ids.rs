#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_ID_LEN: usize = 64;

/// Login name of an account. Students log in with their register number, so
/// the same validation backs [`RegisterNo`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        let trimmed = validate_id(&value)?;
        Ok(Self(trimmed.to_string()))
    }

    /// Last four characters, used as the prefix of stored document names.
    pub fn suffix(&self) -> &str {
        let count = self.0.chars().count();
        if count <= 4 {
            return &self.0;
        }
        let start = self
            .0
            .char_indices()
            .nth(count - 4)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.0[start..]
    }
}

impl TryFrom<String> for Username {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Register number of a student; the owning key of internship records.
pub type RegisterNo = Username;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier must not be empty")]
    Empty,
    #[error("identifier is too long (max {MAX_ID_LEN} characters)")]
    TooLong,
    #[error("identifier contains invalid character {ch:?} at index {index}")]
    InvalidChar { ch: char, index: usize },
}

fn validate_id(value: &str) -> Result<&str, IdError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    if trimmed.chars().count() > MAX_ID_LEN {
        return Err(IdError::TooLong);
    }
    for (index, ch) in trimmed.chars().enumerate() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            continue;
        }
        return Err(IdError::InvalidChar { ch, index });
    }
    Ok(trimmed)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}
