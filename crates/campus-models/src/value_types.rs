//! Validated value types for domain primitives.
//!
//! # Example
//!
//! ```ignore
//! use campus_models::value_types::Email;
//!
//! let email: Email = "student@campus.edu".parse().unwrap();
//! println!("Email: {}", email);
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::ValidateEmail;

/// Longest email address accepted anywhere in the portal.
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Error type for value type parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeError {
    /// The email address is invalid.
    InvalidEmail(String),
    /// The role name is not one of the known roles.
    InvalidRole(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            Self::InvalidRole(role) => write!(f, "Invalid role: {}", role),
        }
    }
}

/// A validated, trimmed email address.
///
/// ```ignore
/// let email = Email::new("  user@campus.edu ").unwrap();
/// assert_eq!(email.as_str(), "user@campus.edu");
/// assert!("not-an-email".parse::<Email>().is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, format = "email", example = "student@campus.edu")]
pub struct Email(String);

impl Email {
    /// Trims surrounding whitespace, then validates.
    pub fn new(email: impl Into<String>) -> Result<Self, ValueTypeError> {
        let email = email.into().trim().to_string();
        Self::validate(&email)?;
        Ok(Self(email))
    }

    /// Wraps a value loaded from a trusted source without validating it.
    #[inline]
    pub fn new_unchecked(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    fn validate(email: &str) -> Result<(), ValueTypeError> {
        if email.is_empty() {
            return Err(ValueTypeError::InvalidEmail("email cannot be empty".into()));
        }

        if email.len() > MAX_EMAIL_LENGTH {
            return Err(ValueTypeError::InvalidEmail(format!(
                "email must be at most {} characters",
                MAX_EMAIL_LENGTH
            )));
        }

        if !email.validate_email() {
            return Err(ValueTypeError::InvalidEmail(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Email {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = ValueTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Email {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Email> for String {
    fn from(email: Email) -> String {
        email.0
    }
}

impl Type<sqlx::Postgres> for Email {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for Email {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(Self::new_unchecked(s))
    }
}

impl PgHasArrayType for Email {
    fn array_type_info() -> PgTypeInfo {
        <String as PgHasArrayType>::array_type_info()
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_is_trimmed() {
        let email = Email::new("  student@campus.edu ").unwrap();
        assert_eq!(email.as_str(), "student@campus.edu");
    }

    #[test]
    fn test_invalid_emails() {
        assert!(Email::new("").is_err());
        assert!(Email::new("   ").is_err());
        assert!(Email::new("no-at-sign").is_err());
        assert!(Email::new("@campus.edu").is_err());
    }

    #[test]
    fn test_email_too_long() {
        let local = "a".repeat(250);
        let result = Email::new(format!("{}@campus.edu", local));
        assert!(matches!(result, Err(ValueTypeError::InvalidEmail(_))));
    }

    #[test]
    fn test_email_deserialize_validates() {
        let ok: Result<Email, _> = serde_json::from_str(r#""admin@campus.edu""#);
        assert!(ok.is_ok());
        let bad: Result<Email, _> = serde_json::from_str(r#""nope""#);
        assert!(bad.is_err());
    }
}
