//! # Campus Config
//!
//! Configuration types for the campus portal.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`auth`]: Idle timeout and role resolution timeout for the session controller
//! - [`backend`]: Remote backend URLs, API keys and the session file location
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`jwt`]: Secret used to verify access tokens
//!
//! # Example
//!
//! ```ignore
//! use campus_config::{AuthConfig, BackendConfig};
//!
//! let auth_config = AuthConfig::from_env();
//! let backend_config = BackendConfig::from_env();
//! ```

pub mod auth;
pub mod backend;
pub mod cors;
pub mod jwt;

pub use auth::AuthConfig;
pub use backend::BackendConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
