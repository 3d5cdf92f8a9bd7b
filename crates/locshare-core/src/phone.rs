//! Phone number identity used to key shared locations.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// `\d` would also accept non-ASCII digits.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^5[0-9]{8}$").unwrap_or_else(|e| unreachable!("phone pattern is valid: {e}"))
});

/// Returns true if `input` is a 9 digit mobile number starting with `5`.
#[must_use]
pub fn validate_phone_number(input: &str) -> bool {
    PHONE_RE.is_match(input)
}

/// Rejected phone number input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid phone number: {0:?}")]
pub struct InvalidPhoneNumber(pub String);

/// A phone number that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate and wrap a phone number.
    ///
    /// # Errors
    /// Returns `InvalidPhoneNumber` if the input does not validate.
    pub fn parse(input: &str) -> Result<Self, InvalidPhoneNumber> {
        if validate_phone_number(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(InvalidPhoneNumber(input.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = InvalidPhoneNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if validate_phone_number(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidPhoneNumber(value))
        }
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_number() {
        assert!(validate_phone_number("512345678"));
        assert!(validate_phone_number("599999999"));
    }

    #[test]
    fn test_rejects_wrong_leading_digit() {
        assert!(!validate_phone_number("412345678"));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(!validate_phone_number("51234567"));
        assert!(!validate_phone_number("5123456789"));
        assert!(!validate_phone_number(""));
    }

    #[test]
    fn test_rejects_non_digits() {
        assert!(!validate_phone_number("51234567a"));
        assert!(!validate_phone_number("5 2345678"));
        assert!(!validate_phone_number(" 512345678"));
        // Arabic-Indic digits are not decimal ASCII digits.
        assert!(!validate_phone_number("5١٢٣٤٥٦٧٨"));
    }

    #[test]
    fn test_parse_and_serde() {
        let phone = PhoneNumber::parse("512345678").unwrap();
        assert_eq!(phone.as_str(), "512345678");
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"512345678\"");

        let err = serde_json::from_str::<PhoneNumber>("\"412345678\"");
        assert!(err.is_err());
        assert_eq!(
            PhoneNumber::parse("abc"),
            Err(InvalidPhoneNumber("abc".to_string()))
        );
    }
}
