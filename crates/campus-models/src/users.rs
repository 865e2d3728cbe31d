//! Account provisioning and user listing models.

use crate::ids::UserId;
use crate::profiles::Profile;
use crate::roles::Role;
use crate::serde::normalize_optional;
use crate::value_types::Email;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Body of the `admin-create-user` procedure.
#[derive(Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    pub email: Email,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    #[schema(example = "changeme123")]
    pub password: String,
    #[validate(
        custom(function = "not_blank"),
        length(min = 1, max = 100, message = "Full name must be 1-100 characters")
    )]
    pub full_name: String,
    pub role: Role,
    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    #[serde(default)]
    pub department: Option<String>,
    #[validate(length(max = 50, message = "Enrollment number must be at most 50 characters"))]
    #[serde(default)]
    pub enrollment_number: Option<String>,
}

impl CreateUserRequest {
    /// Trims text fields and drops blank optionals.
    pub fn normalized(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.department = normalize_optional(self.department);
        self.enrollment_number = normalize_optional(self.enrollment_number);
        self
    }

    pub fn profile(&self) -> Profile {
        Profile {
            full_name: self.full_name.clone(),
            department: self.department.clone(),
            enrollment_number: self.enrollment_number.clone(),
        }
    }
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .field("department", &self.department)
            .field("enrollment_number", &self.enrollment_number)
            .finish()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Full name is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateUserResponse {
    pub success: bool,
    pub user_id: UserId,
}

impl CreateUserResponse {
    pub fn created(user_id: UserId) -> Self {
        Self {
            success: true,
            user_id,
        }
    }
}

/// One row of the user management table: a role assignment joined with its profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub role: Role,
    pub profile: Option<Profile>,
}

impl UserSummary {
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.full_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("(no profile)")
    }

    /// Case-insensitive match on name, department or enrollment number.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let Some(profile) = &self.profile else {
            return false;
        };
        [
            Some(profile.full_name.as_str()),
            profile.department.as_deref(),
            profile.enrollment_number.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
