//! src/domain/registrant_id.rs
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("A registrant id must not be empty")]
    Empty,
    #[error("{0:?} is not a valid registrant id")]
    Invalid(String),
}

/// Primary key of a registrant row. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrantId(i64);

impl RegistrantId {
    pub fn parse(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Empty);
        }

        match s.parse::<i64>() {
            Ok(id) if id > 0 && s.chars().all(|c| c.is_ascii_digit()) => Ok(Self(id)),
            _ => Err(Error::Invalid(s.to_string())),
        }
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RegistrantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RegistrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
