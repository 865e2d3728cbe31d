//! Role checks for privileged endpoints.
//!
//! Roles are not carried in the access token. They are read from the role
//! assignment records on every request, so a revoked role takes effect at once.

use axum::{extract::FromRequestParts, http::request::Parts};
use campus_core::AppError;
use campus_models::Role;
use tracing::warn;

use crate::metrics;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Extractor that admits only callers holding the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        let user_id = auth_user.user_id()?;

        let allowed = state.provisioning.has_role(user_id, Role::Admin).await?;
        metrics::track_admin_check(if allowed { "allowed" } else { "denied" });

        if !allowed {
            warn!(%user_id, "Non-admin attempted a privileged operation");
            return Err(AppError::forbidden(
                "Forbidden: Admin access required".to_string(),
            ));
        }

        Ok(RequireAdmin(auth_user))
    }
}
