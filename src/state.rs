use std::sync::Arc;

use campus_client::IdentityAdmin;
use campus_config::{BackendConfig, CorsConfig, JwtConfig};
use campus_db::init_db_pool;

use crate::modules::users::store::{CredentialAdmin, PgProvisioningStore, ProvisioningStore};

#[derive(Clone)]
pub struct AppState {
    pub provisioning: Arc<dyn ProvisioningStore>,
    pub credentials: Arc<dyn CredentialAdmin>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &"<redacted>")
            .field("cors_config", &self.cors_config)
            .finish_non_exhaustive()
    }
}

pub async fn init_app_state() -> AppState {
    let credentials = IdentityAdmin::new(BackendConfig::from_env())
        .expect("CAMPUS_SERVICE_ROLE_KEY must be set to provision users");

    AppState {
        provisioning: Arc::new(PgProvisioningStore::new(init_db_pool().await)),
        credentials: Arc::new(credentials),
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
    }
}
