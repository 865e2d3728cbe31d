//! Privileged identity management. Needs the service role key.

use campus_config::BackendConfig;
use campus_core::RemoteError;
use campus_models::UserId;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::http::BackendClient;

#[derive(Deserialize)]
struct CreatedUser {
    id: UserId,
}

#[derive(Clone)]
pub struct IdentityAdmin {
    client: BackendClient,
}

impl IdentityAdmin {
    pub fn new(config: BackendConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            client: BackendClient::with_service_role(config)?,
        })
    }

    /// Creates a confirmed credential and returns its user id.
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<UserId, RemoteError> {
        let request = self
            .client
            .request(Method::POST, &self.client.config().auth_url("admin/users"))
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": { "full_name": full_name },
            }));
        let created: CreatedUser = self.client.send_json(request).await?;
        info!(user_id = %created.id, "credential created");
        Ok(created.id)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), RemoteError> {
        let url = self
            .client
            .config()
            .auth_url(&format!("admin/users/{}", user_id));
        self.client
            .send(self.client.request(Method::DELETE, &url))
            .await?;
        info!(%user_id, "credential deleted");
        Ok(())
    }
}
