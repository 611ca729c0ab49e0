//! src/domain/registrant/name.rs
use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEMES: usize = 256;
// Markup and template delimiters.
const FORBIDDEN_CHARACTERS: [char; 5] = ['<', '>', '\\', '{', '}'];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("A name must not be empty")]
    Empty,
    #[error("A name must not be more than 256 graphemes long")]
    TooLong,
    #[error("A name must not contain any of the following characters: '<' '>' '\\' '{{' '}}'")]
    InvalidCharacters,
}

/// Registrant's full name as typed in the form, surrounding whitespace removed.
#[derive(Debug, Clone)]
pub struct Name(String);

impl Name {
    pub fn parse(s: String) -> Result<Self, Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::Empty);
        }

        // Counted in user-perceived characters: "ã" typed as `a` + combining
        // tilde is one grapheme, two chars.
        if trimmed.graphemes(true).count() > MAX_GRAPHEMES {
            return Err(Error::TooLong);
        }

        if trimmed.chars().any(|c| FORBIDDEN_CHARACTERS.contains(&c)) {
            return Err(Error::InvalidCharacters);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// First word of the name, sent to the payment provider as the payer's first name.
    pub fn first_name(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
