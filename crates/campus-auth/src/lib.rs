//! # Campus Auth
//!
//! Authentication and authorization core of the campus portal.
//!
//! - [`store`]: seams to the identity service and the role/profile directory
//! - [`resolver`]: concurrent role and profile lookup for a user
//! - [`machine`]: pure session state transitions
//! - [`controller`]: the session controller task and its handle
//! - [`guard`], [`routes`]: route-level access decisions and the portal route table
//! - [`claims`], [`jwt`]: access token verification for the server
//!
//! # Example
//!
//! ```ignore
//! use campus_auth::{AppRoute, AuthController, RouteDecision, guard};
//!
//! let controller = AuthController::start(store, directory, AuthConfig::from_env());
//! let state = controller.settled().await;
//! match guard(&state, AppRoute::AdminUsers) {
//!     RouteDecision::Allow => show_users(),
//!     RouteDecision::Pending => show_spinner(),
//!     RouteDecision::Redirect(target) => navigate(target.path()),
//! }
//! ```

pub mod claims;
pub mod controller;
pub mod guard;
pub mod jwt;
pub mod machine;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use claims::{AUTHENTICATED_AUDIENCE, AccessClaims};
pub use controller::AuthController;
pub use guard::{RedirectTarget, RouteDecision, decide};
pub use jwt::verify_access_token;
#[cfg(any(test, feature = "test-utils"))]
pub use jwt::create_access_token;
pub use resolver::{Resolution, ResolveError, RoleProfileResolver};
pub use routes::{AppRoute, RoleHome, guard, post_login_route};
pub use state::{ActivitySignal, AuthPhase, AuthState};
pub use store::{DirectoryReader, SessionEvent, SessionEventKind, SessionStore, StoreError};
