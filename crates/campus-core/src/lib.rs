//! # Campus Core
//!
//! Core error types shared by every crate of the campus portal.
//!
//! - [`errors::AppError`]: HTTP-facing error carrying a status code, used by the server
//! - [`errors::AuthError`]: closed set of authentication and authorization failures,
//!   each with a fixed user-facing message
//! - [`errors::RemoteError`]: failures of ordinary remote CRUD calls
//!
//! # Example
//!
//! ```ignore
//! use campus_core::{AppError, AuthError};
//!
//! let error = AppError::forbidden("Forbidden: Admin access required".to_string());
//! assert_eq!(AuthError::InvalidCredentials.user_message(), "Invalid credentials. Please try again.");
//! ```

pub mod errors;

pub use errors::{AppError, AuthError, RemoteError};
