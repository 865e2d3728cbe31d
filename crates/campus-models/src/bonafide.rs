//! Bonafide certificate request models.

use crate::ids::{BonafideRequestId, UserId};
use crate::serde::truncate_chars;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

pub const MAX_REMARKS_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BonafideRequest {
    pub id: BonafideRequestId,
    pub student_id: UserId,
    pub purpose: String,
    pub date_needed: NaiveDate,
    pub status: RequestStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl BonafideRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Student request form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBonafideRequestDto {
    #[validate(length(min = 1, max = 500, message = "Purpose must be 1-500 characters"))]
    pub purpose: String,
    pub date_needed: NaiveDate,
}

impl CreateBonafideRequestDto {
    pub fn normalized(mut self) -> Self {
        self.purpose = self.purpose.trim().to_string();
        self
    }
}

/// Insert body for `bonafide_requests`.
#[derive(Debug, Clone, Serialize)]
pub struct NewBonafideRequest {
    pub student_id: UserId,
    pub purpose: String,
    pub date_needed: NaiveDate,
    pub status: RequestStatus,
}

impl NewBonafideRequest {
    pub fn from_dto(dto: CreateBonafideRequestDto, student_id: UserId) -> Self {
        Self {
            student_id,
            purpose: dto.purpose,
            date_needed: dto.date_needed,
            status: RequestStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl From<ReviewDecision> for RequestStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approve => RequestStatus::Approved,
            ReviewDecision::Reject => RequestStatus::Rejected,
        }
    }
}

/// Update body for a faculty review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonafideReview {
    pub status: RequestStatus,
    pub remarks: Option<String>,
    pub reviewed_by: UserId,
}

impl BonafideReview {
    /// Remarks are trimmed and cut to 500 characters; blank remarks are dropped.
    pub fn new(decision: ReviewDecision, remarks: &str, reviewed_by: UserId) -> Self {
        let trimmed = remarks.trim();
        Self {
            status: decision.into(),
            remarks: (!trimmed.is_empty()).then(|| truncate_chars(trimmed, MAX_REMARKS_CHARS)),
            reviewed_by,
        }
    }
}
