use axum::{Json, extract::State};
use campus_core::AppError;
use campus_models::{CreateUserRequest, CreateUserResponse};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::middleware::role::RequireAdmin;
use crate::modules::users::service::ProvisioningService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Forbidden: Admin access required")]
    pub error: String,
}

/// Create an account with a role and profile (admin only)
#[utoipa::path(
    post,
    path = "/functions/v1/admin-create-user",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Invalid input or rejected by the identity service", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>, AppError> {
    let admin_id = admin.user_id()?;
    let response = ProvisioningService::create_user(
        state.credentials.as_ref(),
        state.provisioning.as_ref(),
        admin_id,
        request,
    )
    .await?;
    Ok(Json(response))
}
