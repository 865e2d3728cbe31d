use campus_core::{AppError, RemoteError};
use campus_models::audit::NewAuditLog;
use campus_models::{CreateUserRequest, CreateUserResponse, UserId};
use tracing::{error, info, instrument, warn};

use crate::metrics;
use crate::modules::users::store::{CredentialAdmin, ProvisionedUser, ProvisioningStore};

pub struct ProvisioningService;

impl ProvisioningService {
    /// Creates the credential, then the role, profile and audit records.
    ///
    /// If the records cannot be written the credential is deleted again, so a
    /// failed call never leaves a login without a role.
    #[instrument(skip(credentials, store), fields(email = %request.email, role = %request.role))]
    pub async fn create_user(
        credentials: &dyn CredentialAdmin,
        store: &dyn ProvisioningStore,
        admin_id: UserId,
        request: CreateUserRequest,
    ) -> Result<CreateUserResponse, AppError> {
        let request = request.normalized();

        let user_id = credentials
            .create_credential(request.email.as_str(), &request.password, &request.full_name)
            .await
            .map_err(|e| {
                metrics::track_provisioning_failure("credential");
                credential_error(e)
            })?;

        let provisioned = ProvisionedUser {
            user_id,
            role: request.role,
            profile: request.profile(),
            audit: NewAuditLog::user_created(admin_id, user_id, request.role, request.email.as_str()),
        };

        if let Err(e) = store.provision(&provisioned).await {
            metrics::track_provisioning_failure("records");
            error!(%user_id, error = %e.error, "Failed to write records for new user");
            if let Err(cleanup) = credentials.delete_credential(user_id).await {
                error!(%user_id, error = %cleanup, "Failed to delete credential after provisioning failure");
            }
            return Err(AppError::internal_error(
                "Failed to create user records".to_string(),
            ));
        }

        metrics::track_user_created(request.role.as_str());
        info!(%user_id, "User created");
        Ok(CreateUserResponse::created(user_id))
    }
}

fn credential_error(err: RemoteError) -> AppError {
    match err {
        RemoteError::Rejected { message, .. } => {
            warn!(%message, "Identity service rejected new credential");
            AppError::bad_request(anyhow::anyhow!(message))
        }
        other => {
            error!(error = %other, "Identity service unavailable");
            AppError::internal_error("Failed to create user".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_rejected_credential_is_a_bad_request() {
        let err = credential_error(RemoteError::Rejected {
            status: 422,
            message: "A user with this email address has already been registered".into(),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.error.to_string().contains("already been registered"));
    }

    #[test]
    fn test_unreachable_identity_service_is_internal() {
        let err = credential_error(RemoteError::Unavailable("connection refused".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error.to_string(), "Failed to create user");
    }
}
