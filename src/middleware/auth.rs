use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use campus_auth::{AccessClaims, verify_access_token};
use campus_core::AppError;
use campus_models::UserId;

use crate::metrics;
use crate::state::AppState;

/// Extractor that validates the bearer token and provides its claims.
///
/// A missing header, a malformed header and a bad token are all rejected with
/// the same 401 so callers learn nothing about which check failed.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessClaims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0.user_id().ok_or_else(unauthorized)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }
}

fn unauthorized() -> AppError {
    AppError::unauthorized("Unauthorized".to_string())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        let claims = verify_access_token(token, &state.jwt_config);
        metrics::track_jwt_validation(claims.is_ok());

        Ok(AuthUser(claims?))
    }
}
