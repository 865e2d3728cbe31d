//! Profile models.

use crate::ids::UserId;
use crate::serde::{empty_string_as_none, normalize_optional};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Descriptive attributes of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub full_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub enrollment_number: Option<String>,
}

impl Profile {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            department: None,
            enrollment_number: None,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = normalize_optional(Some(department.into()));
        self
    }

    pub fn with_enrollment_number(mut self, enrollment_number: impl Into<String>) -> Self {
        self.enrollment_number = normalize_optional(Some(enrollment_number.into()));
        self
    }
}

/// A `profiles` row: the profile plus the account it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Self-service profile edit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,
    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,
    #[validate(length(max = 50, message = "Enrollment number must be at most 50 characters"))]
    pub enrollment_number: Option<String>,
}

impl UpdateProfileDto {
    /// Trims every field and turns blank optionals into `None`. Call before `validate`.
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            department: normalize_optional(self.department),
            enrollment_number: normalize_optional(self.enrollment_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_record_flattens() {
        let json = r#"{
            "user_id": "00000000-0000-0000-0000-000000000001",
            "full_name": "Asha Rao",
            "department": "",
            "enrollment_number": "ENR-7"
        }"#;
        let record: ProfileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.user_id, UserId::from_u128(1));
        assert_eq!(record.profile.full_name, "Asha Rao");
        assert_eq!(record.profile.department, None);
        assert_eq!(record.profile.enrollment_number.as_deref(), Some("ENR-7"));
    }

    #[test]
    fn test_update_profile_normalized_then_validated() {
        let dto = UpdateProfileDto {
            full_name: "   ".into(),
            department: Some("  ".into()),
            enrollment_number: None,
        }
        .normalized();
        assert_eq!(dto.department, None);
        assert!(dto.validate().is_err());

        let dto = UpdateProfileDto {
            full_name: " Dr. Mehta ".into(),
            department: Some(" Physics ".into()),
            enrollment_number: None,
        }
        .normalized();
        assert_eq!(dto.full_name, "Dr. Mehta");
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_builder_drops_blank_values() {
        let profile = Profile::new("Admin").with_department(" ");
        assert_eq!(profile.department, None);
    }
}
