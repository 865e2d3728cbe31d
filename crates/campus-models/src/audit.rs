//! Audit log models.

use crate::ids::{AuditLogId, UserId};
use crate::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Most rows fetched for the audit log page.
pub const AUDIT_LOG_PAGE_LIMIT: usize = 500;

/// Well-known `action` values.
pub mod actions {
    pub const USER_CREATED: &str = "user_created";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: AuditLogId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub role: Option<Role>,
    pub action: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// Case-insensitive substring match on action, role or user id.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.action.to_lowercase().contains(&needle)
            || self.role.is_some_and(|r| r.as_str().contains(&needle))
            || self
                .user_id
                .is_some_and(|id| id.to_string().contains(&needle))
    }
}

/// Insert body for `audit_logs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditLog {
    pub user_id: UserId,
    pub role: Role,
    pub action: String,
    pub details: serde_json::Value,
}

impl NewAuditLog {
    /// Entry written when an admin provisions an account.
    pub fn user_created(
        admin_id: UserId,
        created_user_id: UserId,
        created_role: Role,
        email: &str,
    ) -> Self {
        Self {
            user_id: admin_id,
            role: Role::Admin,
            action: actions::USER_CREATED.to_string(),
            details: serde_json::json!({
                "created_user_id": created_user_id,
                "created_role": created_role,
                "email": email,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> AuditLog {
        AuditLog {
            id: AuditLogId::from_u128(1),
            user_id: Some(UserId::from_u128(0xabcdef)),
            role: Some(Role::Admin),
            action: "user_created".into(),
            details: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_action_role_and_user() {
        let entry = log();
        assert!(entry.matches("USER_"));
        assert!(entry.matches("admin"));
        assert!(entry.matches("abcdef"));
        assert!(entry.matches(" "));
        assert!(!entry.matches("student"));
    }

    #[test]
    fn test_user_created_details() {
        let entry = NewAuditLog::user_created(
            UserId::from_u128(1),
            UserId::from_u128(2),
            Role::Student,
            "new@campus.edu",
        );
        assert_eq!(entry.action, "user_created");
        assert_eq!(entry.role, Role::Admin);
        assert_eq!(entry.details["created_role"], "student");
        assert_eq!(entry.details["email"], "new@campus.edu");
        assert_eq!(
            entry.details["created_user_id"],
            "00000000-0000-0000-0000-000000000002"
        );
    }
}
