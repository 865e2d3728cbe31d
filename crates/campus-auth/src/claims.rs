//! Claims carried by access tokens from the identity service.

use campus_models::UserId;
use serde::{Deserialize, Serialize};

/// Audience stamped on tokens issued to signed-in users.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// JWT claims for access tokens.
///
/// Only the subject is trusted for authorization. Roles are always looked up in
/// the directory, never read from the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID (subject claim)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Audience, `authenticated` for user tokens
    pub aud: String,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl AccessClaims {
    /// `None` when the subject is not a UUID.
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}
