//! Notice board models.

use crate::ids::{NoticeId, UserId};
use crate::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub id: NoticeId,
    pub title: String,
    pub content: String,
    pub target_audience: Vec<Role>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_visible_to(&self, role: Role) -> bool {
        self.target_audience.contains(&role)
    }

    /// Case-insensitive match on title or content.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
    }
}

/// Admin notice form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNoticeDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: String,
    #[validate(length(min = 1, message = "Select at least one audience"))]
    pub target_audience: Vec<Role>,
}

impl CreateNoticeDto {
    /// Trims text fields and removes duplicate audience entries.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self.target_audience.sort();
        self.target_audience.dedup();
        self
    }
}

/// Insert body for the `notices` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotice {
    pub title: String,
    pub content: String,
    pub target_audience: Vec<Role>,
    pub created_by: UserId,
}

impl NewNotice {
    pub fn from_dto(dto: CreateNoticeDto, created_by: UserId) -> Self {
        Self {
            title: dto.title,
            content: dto.content,
            target_audience: dto.target_audience,
            created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> Notice {
        Notice {
            id: NoticeId::from_u128(1),
            title: "Exam Schedule".into(),
            content: "Mid-terms start Monday".into(),
            target_audience: vec![Role::Student, Role::Faculty],
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_visibility_by_audience() {
        let n = notice();
        assert!(n.is_visible_to(Role::Student));
        assert!(!n.is_visible_to(Role::Admin));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let n = notice();
        assert!(n.matches("exam"));
        assert!(n.matches("MONDAY"));
        assert!(n.matches(""));
        assert!(!n.matches("holiday"));
    }

    #[test]
    fn test_create_notice_validation() {
        let dto = CreateNoticeDto {
            title: "  ".into(),
            content: "body".into(),
            target_audience: vec![Role::Student],
        }
        .normalized();
        assert!(dto.validate().is_err());

        let dto = CreateNoticeDto {
            title: "Holiday".into(),
            content: "Campus closed".into(),
            target_audience: vec![],
        };
        assert!(dto.validate().is_err());

        let dto = CreateNoticeDto {
            title: "Holiday".into(),
            content: "Campus closed".into(),
            target_audience: vec![Role::Faculty, Role::Student, Role::Faculty],
        }
        .normalized();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.target_audience, vec![Role::Student, Role::Faculty]);
    }
}
