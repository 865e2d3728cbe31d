//! Typed data access for each portal page.
//!
//! Row visibility is enforced by the backend's row-level policies; these services
//! only shape the queries and validate input before it leaves the process.

pub mod audit;
pub mod bonafide;
pub mod notices;
pub mod profiles;
pub mod receipts;
pub mod users;

pub use audit::AuditService;
pub use bonafide::BonafideService;
pub use notices::NoticeService;
pub use profiles::ProfileService;
pub use receipts::ReceiptService;
pub use users::UserService;
