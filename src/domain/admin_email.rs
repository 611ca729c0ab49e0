//! src/domain/admin_email.rs
use validator::validate_email;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Empty email")]
    Empty,
    #[error("Invalid email: {0}")]
    Invalid(String),
}

/// Login identity of an administrator. Stored lowercased.
#[derive(Debug, Clone)]
pub struct AdminEmail(String);

impl AdminEmail {
    pub fn parse(s: String) -> Result<Self, Error> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Err(Error::Empty);
        }

        if validate_email(&s) {
            Ok(Self(s))
        } else {
            Err(Error::Invalid(s))
        }
    }
}

impl AsRef<str> for AdminEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AdminEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}
