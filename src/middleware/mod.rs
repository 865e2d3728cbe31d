//! Request extractors for authentication and authorization.
//!
//! - [`auth`]: `AuthUser`, a verified access token
//! - [`role`]: `RequireAdmin`, a verified token whose subject holds the admin role
//!
//! ```ignore
//! async fn handler(RequireAdmin(admin): RequireAdmin) -> Result<impl IntoResponse, AppError> {
//!     let admin_id = admin.user_id()?;
//!     // ...
//! }
//! ```

pub mod auth;
pub mod role;
