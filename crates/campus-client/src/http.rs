//! Shared HTTP plumbing: headers, error mapping and JSON decoding.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use campus_config::BackendConfig;
use campus_core::RemoteError;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for every backend surface (identity, tables, storage, procedures).
///
/// Cheap to clone. Clones share the access token, so a sign-in through one clone
/// authorizes requests made through the others.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
    api_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl BackendClient {
    /// Client acting as the anonymous public key until a user signs in.
    pub fn new(config: BackendConfig) -> Result<Self, RemoteError> {
        let api_key = config.anon_key.clone();
        Self::build(config, api_key, None)
    }

    /// Client acting with the privileged service key. Server-side only.
    pub fn with_service_role(config: BackendConfig) -> Result<Self, RemoteError> {
        let key = config
            .service_role_key
            .clone()
            .ok_or_else(|| RemoteError::Unavailable("service role key is not configured".into()))?;
        Self::build(config, key.clone(), Some(key))
    }

    fn build(
        config: BackendConfig,
        api_key: String,
        access_token: Option<String>,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            config: Arc::new(config),
            api_key,
            access_token: Arc::new(RwLock::new(access_token)),
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .map(|t| t.is_some())
            .unwrap_or(false)
    }

    fn bearer(&self) -> String {
        let token = self
            .access_token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .unwrap_or_else(|| self.api_key.clone());
        format!("Bearer {}", token)
    }

    /// Request with the API key and the current bearer token.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", self.bearer())
    }

    /// Request authorized with an explicit bearer token instead of the shared one.
    pub fn request_as(&self, method: Method, url: &str, access_token: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
    }

    /// Sends and turns non-success statuses into [`RemoteError::Rejected`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = self.send(builder).await?;
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "could not decode response body");
            RemoteError::Decode(e.to_string())
        })
    }
}

async fn error_from_response(response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| format!("Request failed with status {}", status));
    RemoteError::Rejected { status, message }
}

/// Pulls the human readable message out of an error body. The identity,
/// data and procedure endpoints each use a different key.
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_keys() {
        assert_eq!(
            error_message(r#"{"message":"duplicate key value"}"#).as_deref(),
            Some("duplicate key value")
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"error":"Forbidden: Admin access required"}"#).as_deref(),
            Some("Forbidden: Admin access required")
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
        assert_eq!(error_message(r#"{"message":""}"#), None);
    }

    #[test]
    fn test_service_role_requires_key() {
        let config = BackendConfig::for_url("http://localhost:54321");
        assert!(BackendClient::with_service_role(config).is_err());
    }

    #[test]
    fn test_access_token_is_shared_between_clones() {
        let client = BackendClient::new(BackendConfig::for_url("http://localhost:54321")).unwrap();
        let clone = client.clone();
        assert!(!clone.has_access_token());
        client.set_access_token(Some("token".into()));
        assert!(clone.has_access_token());
        assert_eq!(clone.bearer(), "Bearer token");
    }
}
