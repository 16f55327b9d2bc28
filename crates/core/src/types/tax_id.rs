//! Brazilian tax identifiers (CNPJ and CPF).
//!
//! A billing entity is keyed by its registered tax number: a 14-digit CNPJ
//! for companies, or an 11-digit CPF when the buyer invoices as an
//! individual. Both carry two mod-11 check digits which are validated on
//! parse, so a [`TaxId`] held anywhere in the system is known to be
//! structurally valid.

use core::fmt;

use serde::{Deserialize, Serialize, de};

/// Errors that can occur when parsing a [`TaxId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxIdError {
    /// The input string is empty.
    #[error("tax number cannot be empty")]
    Empty,
    /// The input contains characters other than digits and `. - /` separators.
    #[error("tax number contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The digit count matches neither CPF (11) nor CNPJ (14).
    #[error("tax number must have 11 (CPF) or 14 (CNPJ) digits, got {0}")]
    InvalidLength(usize),
    /// All digits are identical (e.g. `111.111.111-11`), which is never issued.
    #[error("tax number with repeated digits is not valid")]
    RepeatedDigits,
    /// The check digits do not match the registered number.
    #[error("tax number check digits do not match")]
    CheckDigits,
}

/// Whether a [`TaxId`] is a company (CNPJ) or individual (CPF) registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxIdKind {
    Cnpj,
    Cpf,
}

/// A validated CNPJ or CPF.
///
/// Stores the canonical digit string; [`fmt::Display`] renders the usual
/// punctuated form (`12.345.678/0001-90` or `123.456.789-09`).
///
/// ## Examples
///
/// ```
/// use pedidoflex_core::TaxId;
///
/// let cnpj = TaxId::parse("11.222.333/0001-81").unwrap();
/// assert_eq!(cnpj.digits(), "11222333000181");
/// assert_eq!(cnpj.to_string(), "11.222.333/0001-81");
///
/// assert!(TaxId::parse("11.222.333/0001-82").is_err()); // bad check digit
/// assert!(TaxId::parse("111.111.111-11").is_err());     // repeated digits
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    /// Parse a `TaxId` from a string, with or without punctuation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other
    /// than digits and `. - /` separators, has a digit count matching
    /// neither CPF nor CNPJ, consists of a single repeated digit, or fails
    /// check-digit validation.
    pub fn parse(s: &str) -> Result<Self, TaxIdError> {
        if s.trim().is_empty() {
            return Err(TaxIdError::Empty);
        }

        let mut digits = String::with_capacity(14);
        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if !matches!(c, '.' | '-' | '/' | ' ') {
                return Err(TaxIdError::InvalidCharacter(c));
            }
        }

        match digits.len() {
            11 | 14 => {}
            other => return Err(TaxIdError::InvalidLength(other)),
        }

        let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
        if values.iter().all(|&d| d == values[0]) {
            return Err(TaxIdError::RepeatedDigits);
        }

        let valid = if values.len() == 14 {
            check_digit(&values[..12], CNPJ_WEIGHTS_FIRST) == values[12]
                && check_digit(&values[..13], CNPJ_WEIGHTS_SECOND) == values[13]
        } else {
            check_digit(&values[..9], CPF_WEIGHTS_FIRST) == values[9]
                && check_digit(&values[..10], CPF_WEIGHTS_SECOND) == values[10]
        };
        if !valid {
            return Err(TaxIdError::CheckDigits);
        }

        Ok(Self(digits))
    }

    /// The canonical digit string (no punctuation).
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Whether this is a CNPJ or a CPF.
    #[must_use]
    pub fn kind(&self) -> TaxIdKind {
        if self.0.len() == 14 {
            TaxIdKind::Cnpj
        } else {
            TaxIdKind::Cpf
        }
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.0;
        match self.kind() {
            // 12.345.678/0001-90
            TaxIdKind::Cnpj => write!(
                f,
                "{}.{}.{}/{}-{}",
                &d[..2],
                &d[2..5],
                &d[5..8],
                &d[8..12],
                &d[12..]
            ),
            // 123.456.789-09
            TaxIdKind::Cpf => write!(f, "{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]),
        }
    }
}

impl<'de> Deserialize<'de> for TaxId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

// Weight tables for the mod-11 check digits.
const CNPJ_WEIGHTS_FIRST: &[u32] = &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: &[u32] = &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_WEIGHTS_FIRST: &[u32] = &[10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_WEIGHTS_SECOND: &[u32] = &[11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rem = sum % 11;
    if rem < 2 { 0 } else { 11 - rem }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_cnpj() {
        let id = TaxId::parse("11.222.333/0001-81").unwrap();
        assert_eq!(id.kind(), TaxIdKind::Cnpj);
        assert_eq!(id.digits(), "11222333000181");
    }

    #[test]
    fn test_parse_cnpj_without_punctuation() {
        let id = TaxId::parse("11444777000161").unwrap();
        assert_eq!(id.to_string(), "11.444.777/0001-61");
    }

    #[test]
    fn test_parse_valid_cpf() {
        let id = TaxId::parse("123.456.789-09").unwrap();
        assert_eq!(id.kind(), TaxIdKind::Cpf);
        assert_eq!(id.digits(), "12345678909");
    }

    #[test]
    fn test_rejects_bad_check_digits() {
        assert_eq!(
            TaxId::parse("11.222.333/0001-80"),
            Err(TaxIdError::CheckDigits)
        );
        assert_eq!(TaxId::parse("123.456.789-08"), Err(TaxIdError::CheckDigits));
    }

    #[test]
    fn test_rejects_repeated_digits() {
        assert_eq!(
            TaxId::parse("111.111.111-11"),
            Err(TaxIdError::RepeatedDigits)
        );
        assert_eq!(
            TaxId::parse("00.000.000/0000-00"),
            Err(TaxIdError::RepeatedDigits)
        );
    }

    #[test]
    fn test_rejects_bad_length_and_characters() {
        assert_eq!(TaxId::parse("1234"), Err(TaxIdError::InvalidLength(4)));
        assert_eq!(TaxId::parse(""), Err(TaxIdError::Empty));
        assert_eq!(
            TaxId::parse("11.222.33x/0001-81"),
            Err(TaxIdError::InvalidCharacter('x'))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<TaxId, _> = serde_json::from_str("\"98.765.432/0001-98\"");
        assert!(ok.is_ok());
        let bad: Result<TaxId, _> = serde_json::from_str("\"98.765.432/0001-99\"");
        assert!(bad.is_err());
    }
}
