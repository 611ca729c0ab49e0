//! src/domain/cpf.rs
//!
//! Brazilian individual taxpayer number (CPF): eleven digits, the last two of
//! which are check digits computed from the ones before them.

const CPF_LENGTH: usize = 11;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The provided CPF is invalid.")]
    Invalid,
}

/// A CPF that passed [`is_valid`], stored as its eleven digits without formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpf(String);

impl Cpf {
    pub fn parse(s: String) -> Result<Self, Error> {
        if !is_valid(&s) {
            return Err(Error::Invalid);
        }

        Ok(Self(s.chars().filter(char::is_ascii_digit).collect()))
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cpf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = &self.0;
        write!(f, "{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }
}

/// Returns `true` when `raw` holds a well formed CPF.
///
/// Every non-digit character is ignored, so `123.456.789-09` and `12345678909`
/// give the same answer. Sequences of one repeated digit are rejected even
/// though they satisfy both check digit equations.
pub fn is_valid(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != CPF_LENGTH {
        return false;
    }

    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

// Weights run from `len + 1` down to 2; a remainder of 10 counts as 0.
fn check_digit(digits: &[u32]) -> u32 {
    let first_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();

    match (sum * 10) % 11 {
        10 => 0,
        remainder => remainder,
    }
}
