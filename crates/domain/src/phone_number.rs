use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// An E.164 formatted phone number: a leading `+` followed by 2 to 15
/// digits, where the country code position never holds a zero.
/// Parsing is the only way to construct one, so a `PhoneNumber` held by
/// a `Reminder` is always dialable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Error, Debug)]
pub enum InvalidPhoneNumberError {
    #[error("Phone number: {0} is not in E.164 format")]
    Malformed(String),
}

impl FromStr for PhoneNumber {
    type Err = InvalidPhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = match s.strip_prefix('+') {
            Some(digits) => digits,
            None => return Err(InvalidPhoneNumberError::Malformed(s.to_string())),
        };
        let valid = (2..=15).contains(&digits.len())
            && !digits.starts_with('0')
            && digits.chars().all(|c| c.is_ascii_digit());
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidPhoneNumberError::Malformed(s.to_string()))
        }
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = InvalidPhoneNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhoneNumber> for String {
    fn from(phone_number: PhoneNumber) -> Self {
        phone_number.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_valid_e164_numbers() {
        let valid = ["+14155551234", "+4791234567", "+12", "+123456789012345"];
        for number in valid.iter() {
            assert!(number.parse::<PhoneNumber>().is_ok(), "{}", number);
        }
    }

    #[test]
    fn rejects_malformed_numbers() {
        let invalid = [
            "",
            "+",
            "14155551234",
            "+0123456789",
            "+1",
            "+1234567890123456",
            "+1415555123a",
            "+1 415 555 1234",
        ];
        for number in invalid.iter() {
            assert!(number.parse::<PhoneNumber>().is_err(), "{}", number);
        }
    }
}
