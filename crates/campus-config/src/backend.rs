//! Remote backend connection settings.
//!
//! # Environment Variables
//!
//! - `CAMPUS_BACKEND_URL`: Base URL of the backend (default: `http://localhost:54321`)
//! - `CAMPUS_ANON_KEY`: Public API key sent with every request (default: empty)
//! - `CAMPUS_SERVICE_ROLE_KEY`: Privileged key, only needed by the server
//! - `CAMPUS_FUNCTIONS_URL`: Remote procedure base URL (default: `<backend>/functions/v1`)
//! - `CAMPUS_SESSION_FILE`: Where the client persists its session (default: `.campus/session.json`)

use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: Option<String>,
    pub functions_url: String,
    pub session_file: PathBuf,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let url = env::var("CAMPUS_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:54321".to_string())
            .trim_end_matches('/')
            .to_string();

        let functions_url = env::var("CAMPUS_FUNCTIONS_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("{}/functions/v1", url));

        Self {
            anon_key: env::var("CAMPUS_ANON_KEY").unwrap_or_default(),
            service_role_key: env::var("CAMPUS_SERVICE_ROLE_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            session_file: env::var("CAMPUS_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".campus/session.json")),
            functions_url,
            url,
        }
    }

    /// Config pointing at `url`, with every other field at its default.
    pub fn for_url(url: &str) -> Self {
        let url = url.trim_end_matches('/').to_string();
        Self {
            anon_key: String::new(),
            service_role_key: None,
            functions_url: format!("{}/functions/v1", url),
            session_file: PathBuf::from(".campus/session.json"),
            url,
        }
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    pub fn storage_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.url,
            bucket,
            key.trim_start_matches('/')
        )
    }

    pub fn function_url(&self, name: &str) -> String {
        format!("{}/{}", self.functions_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_built_from_base() {
        let config = BackendConfig::for_url("https://campus.example.com/");
        assert_eq!(
            config.auth_url("token?grant_type=password"),
            "https://campus.example.com/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            config.rest_url("profiles"),
            "https://campus.example.com/rest/v1/profiles"
        );
        assert_eq!(
            config.storage_url("fee-receipts", "/abc/1_file.pdf"),
            "https://campus.example.com/storage/v1/object/fee-receipts/abc/1_file.pdf"
        );
        assert_eq!(
            config.function_url("admin-create-user"),
            "https://campus.example.com/functions/v1/admin-create-user"
        );
    }
}
