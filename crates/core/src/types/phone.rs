//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Dialing prefix assumed for numbers entered without a country code.
pub const DEFAULT_COUNTRY_CODE: &str = "234";

/// A phone number as entered by the user.
///
/// The number is stored the way the user typed it (trimmed) so that the
/// `users_phone_key` constraint compares what was registered. SMS delivery
/// needs international format, which [`PhoneNumber::to_e164`] derives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// The input is empty after trimming.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits and separators.
    #[error("phone number may only contain digits, spaces, dashes, parentheses and a leading +")]
    InvalidCharacter,
    /// The input has separators but no digits.
    #[error("phone number must contain at least one digit")]
    NoDigits,
}

impl PhoneNumber {
    /// Parse a phone number, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, has no digits, or contains
    /// letters or punctuation other than `+ - ( )` and spaces.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        let body = s.strip_prefix('+').unwrap_or(s);
        if !body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
        {
            return Err(PhoneNumberError::InvalidCharacter);
        }
        if !body.chars().any(|c| c.is_ascii_digit()) {
            return Err(PhoneNumberError::NoDigits);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Format the number for SMS delivery.
    ///
    /// Numbers already starting with `+` are returned unchanged. Otherwise
    /// separators are stripped, a single trunk `0` is dropped, and the
    /// default country code is prefixed unless the number already starts
    /// with it.
    ///
    /// ```
    /// use marketplace_core::PhoneNumber;
    ///
    /// let local = PhoneNumber::parse("0803 123-4567").unwrap();
    /// assert_eq!(local.to_e164(), "+2348031234567");
    ///
    /// let intl = PhoneNumber::parse("+447911123456").unwrap();
    /// assert_eq!(intl.to_e164(), "+447911123456");
    /// ```
    #[must_use]
    pub fn to_e164(&self) -> String {
        if self.0.starts_with('+') {
            return self.0.clone();
        }

        let digits: String = self
            .0
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        let digits = digits.strip_prefix('0').unwrap_or(&digits);

        if digits.starts_with(DEFAULT_COUNTRY_CODE) {
            format!("+{digits}")
        } else {
            format!("+{DEFAULT_COUNTRY_CODE}{digits}")
        }
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PhoneNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PhoneNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PhoneNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
