//! Access token verification.
//!
//! The identity service signs access tokens with a shared HS256 secret. The server
//! verifies the signature, expiry and audience before trusting the subject.
//!
//! # Example
//!
//! ```ignore
//! use campus_auth::verify_access_token;
//! use campus_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let claims = verify_access_token(&token, &config)?;
//! println!("User ID: {}", claims.sub);
//! ```

use jsonwebtoken::{DecodingKey, Validation, decode};

use campus_config::JwtConfig;
use campus_core::AppError;
#[cfg(any(test, feature = "test-utils"))]
use campus_models::UserId;

use crate::claims::{AUTHENTICATED_AUDIENCE, AccessClaims};

/// Issues an access token the way the identity service does. Fixtures only.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_access_token(
    user_id: UserId,
    email: &str,
    ttl_secs: i64,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let now = chrono::Utc::now().timestamp();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        email: Some(email.to_string()),
        aud: AUTHENTICATED_AUDIENCE.to_string(),
        exp: (now + ttl_secs).max(0) as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies signature, expiry and audience and returns the claims.
///
/// Every failure maps to the same `Unauthorized` error.
pub fn verify_access_token(token: &str, jwt_config: &JwtConfig) -> Result<AccessClaims, AppError> {
    let mut validation = Validation::default();
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Unauthorized".to_string()))
}
