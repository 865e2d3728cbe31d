//! The closed set of portal roles.

use crate::value_types::ValueTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Role granted to an account. Every account has at most one.
///
/// Stored as the Postgres enum `app_role` and serialized in lowercase, matching
/// the `user_roles.role` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Faculty, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }

    /// Human readable label, e.g. for the audience picker.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            other => Err(ValueTypeError::InvalidRole(other.to_string())),
        }
    }
}

/// Row shape of `user_roles` as returned by the data API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: crate::ids::UserId,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("  ADMIN ".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert_eq!(
            "teacher".parse::<Role>(),
            Err(ValueTypeError::InvalidRole("teacher".into()))
        );
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Faculty).unwrap(), r#""faculty""#);
        let role: Role = serde_json::from_str(r#""student""#).unwrap();
        assert_eq!(role, Role::Student);
        assert!(serde_json::from_str::<Role>(r#""superuser""#).is_err());
    }
}
