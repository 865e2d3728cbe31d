//! In-memory collaborators and state for exercising the router without a
//! database or identity service.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use campus_auth::create_access_token;
use campus_config::{CorsConfig, JwtConfig};
use campus_core::{AppError, RemoteError};
use campus_models::{Role, UserId};

use crate::modules::users::store::{CredentialAdmin, ProvisionedUser, ProvisioningStore};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct MemoryProvisioningStore {
    roles: Mutex<HashSet<(UserId, Role)>>,
    provisioned: Mutex<Vec<ProvisionedUser>>,
    fail_provision: AtomicBool,
}

impl MemoryProvisioningStore {
    pub fn grant(&self, user_id: UserId, role: Role) {
        self.roles.lock().unwrap().insert((user_id, role));
    }

    pub fn fail_provision(&self, fail: bool) {
        self.fail_provision.store(fail, Ordering::SeqCst);
    }

    pub fn provisioned(&self) -> Vec<ProvisionedUser> {
        self.provisioned.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProvisioningStore for MemoryProvisioningStore {
    async fn has_role(&self, user_id: UserId, role: Role) -> Result<bool, AppError> {
        Ok(self.roles.lock().unwrap().contains(&(user_id, role)))
    }

    async fn provision(&self, user: &ProvisionedUser) -> Result<(), AppError> {
        if self.fail_provision.load(Ordering::SeqCst) {
            return Err(AppError::internal_error("insert failed".to_string()));
        }
        self.roles.lock().unwrap().insert((user.user_id, user.role));
        self.provisioned.lock().unwrap().push(user.clone());
        Ok(())
    }
}

/// Issues sequential user ids and remembers which credentials still exist.
#[derive(Default)]
pub struct MemoryCredentialAdmin {
    credentials: Mutex<Vec<(UserId, String)>>,
    deleted: Mutex<Vec<UserId>>,
    reject_with: Mutex<Option<String>>,
}

impl MemoryCredentialAdmin {
    /// Makes the next creations fail the way the identity service rejects input.
    pub fn reject_with(&self, message: &str) {
        *self.reject_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn emails(&self) -> Vec<String> {
        self.credentials
            .lock()
            .unwrap()
            .iter()
            .map(|(_, email)| email.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<UserId> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialAdmin for MemoryCredentialAdmin {
    async fn create_credential(
        &self,
        email: &str,
        _password: &str,
        _full_name: &str,
    ) -> Result<UserId, RemoteError> {
        if let Some(message) = self.reject_with.lock().unwrap().clone() {
            return Err(RemoteError::Rejected {
                status: 422,
                message,
            });
        }
        let mut credentials = self.credentials.lock().unwrap();
        let id = UserId::from_u128(1000 + credentials.len() as u128);
        credentials.push((id, email.to_string()));
        Ok(id)
    }

    async fn delete_credential(&self, user_id: UserId) -> Result<(), RemoteError> {
        self.credentials.lock().unwrap().retain(|(id, _)| *id != user_id);
        self.deleted.lock().unwrap().push(user_id);
        Ok(())
    }
}

/// Router state over the in-memory collaborators, keeping handles to both.
pub struct TestState {
    pub state: AppState,
    pub provisioning: Arc<MemoryProvisioningStore>,
    pub credentials: Arc<MemoryCredentialAdmin>,
}

impl TestState {
    pub fn new() -> Self {
        let provisioning = Arc::new(MemoryProvisioningStore::default());
        let credentials = Arc::new(MemoryCredentialAdmin::default());
        let state = AppState {
            provisioning: provisioning.clone(),
            credentials: credentials.clone(),
            jwt_config: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
            cors_config: CorsConfig {
                allowed_origins: vec!["http://localhost:5173".to_string()],
            },
        };
        Self {
            state,
            provisioning,
            credentials,
        }
    }

    /// Bearer header value for `user_id`, signed like the identity service does.
    pub fn bearer(&self, user_id: UserId) -> String {
        let token = create_access_token(user_id, "caller@campus.edu", 3600, &self.state.jwt_config)
            .unwrap();
        format!("Bearer {}", token)
    }
}

impl Default for TestState {
    fn default() -> Self {
        Self::new()
    }
}
