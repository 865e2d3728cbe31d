//! # Campus Models
//!
//! Domain models and DTOs for the campus portal.
//!
//! # Modules
//!
//! - [`auth`]: Session and sign-in form
//! - [`roles`]: The closed role set
//! - [`profiles`]: Profile attributes
//! - [`notices`], [`bonafide`], [`receipts`], [`audit`]: Feature page records and forms
//! - [`users`]: Account provisioning and the user table
//!
//! # Example
//!
//! ```ignore
//! use campus_models::{Role, LoginRequest};
//! use validator::Validate;
//!
//! let form = LoginRequest::new("student@campus.edu", "password");
//! form.validate()?;
//! assert_eq!("faculty".parse::<Role>()?, Role::Faculty);
//! ```

pub mod audit;
pub mod auth;
pub mod bonafide;
pub mod ids;
pub mod notices;
pub mod profiles;
pub mod receipts;
pub mod roles;
pub mod serde;
pub mod users;
pub mod validation;
pub mod value_types;

pub use audit::{AuditLog, NewAuditLog};
pub use auth::{LoginRequest, Session};
pub use bonafide::{
    BonafideRequest, BonafideReview, CreateBonafideRequestDto, NewBonafideRequest, RequestStatus,
    ReviewDecision,
};
pub use ids::{AuditLogId, BonafideRequestId, FeeReceiptId, NoticeId, UserId};
pub use notices::{CreateNoticeDto, NewNotice, Notice};
pub use profiles::{Profile, ProfileRecord, UpdateProfileDto};
pub use receipts::{FeeReceipt, NewFeeReceipt, UploadReceiptDto};
pub use roles::{Role, RoleAssignment};
pub use users::{CreateUserRequest, CreateUserResponse, UserSummary};
pub use validation::first_validation_message;
pub use value_types::{Email, ValueTypeError};
