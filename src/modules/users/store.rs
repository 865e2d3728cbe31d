//! Seams used by the create-user procedure, and their production implementations.

use async_trait::async_trait;
use campus_client::IdentityAdmin;
use campus_core::{AppError, RemoteError};
use campus_models::audit::NewAuditLog;
use campus_models::{Profile, Role, UserId};
use sqlx::PgPool;

/// Everything written for a new account after its credential exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionedUser {
    pub user_id: UserId,
    pub role: Role,
    pub profile: Profile,
    pub audit: NewAuditLog,
}

/// Role, profile and audit tables of the backend database.
#[async_trait]
pub trait ProvisioningStore: Send + Sync {
    /// Whether `user_id` holds a `role` assignment record.
    async fn has_role(&self, user_id: UserId, role: Role) -> Result<bool, AppError>;

    /// Writes the role record, the profile and the audit entry. All or nothing.
    async fn provision(&self, user: &ProvisionedUser) -> Result<(), AppError>;
}

/// The identity service's credential store.
#[async_trait]
pub trait CredentialAdmin: Send + Sync {
    async fn create_credential(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<UserId, RemoteError>;

    async fn delete_credential(&self, user_id: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
impl CredentialAdmin for IdentityAdmin {
    async fn create_credential(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<UserId, RemoteError> {
        self.create_user(email, password, full_name).await
    }

    async fn delete_credential(&self, user_id: UserId) -> Result<(), RemoteError> {
        self.delete_user(user_id).await
    }
}

#[derive(Clone, Debug)]
pub struct PgProvisioningStore {
    db: PgPool,
}

impl PgProvisioningStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProvisioningStore for PgProvisioningStore {
    async fn has_role(&self, user_id: UserId, role: Role) -> Result<bool, AppError> {
        let found: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2 LIMIT 1")
                .bind(user_id)
                .bind(role)
                .fetch_optional(&self.db)
                .await
                .map_err(AppError::database)?;
        Ok(found.is_some())
    }

    async fn provision(&self, user: &ProvisionedUser) -> Result<(), AppError> {
        let mut tx = self.db.begin().await.map_err(AppError::database)?;

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user.user_id)
            .bind(user.role)
            .execute(&mut *tx)
            .await
            .map_err(AppError::database)?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, full_name, department, enrollment_number)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                department = EXCLUDED.department,
                enrollment_number = EXCLUDED.enrollment_number
            "#,
        )
        .bind(user.user_id)
        .bind(&user.profile.full_name)
        .bind(user.profile.department.clone().unwrap_or_default())
        .bind(user.profile.enrollment_number.clone().unwrap_or_default())
        .execute(&mut *tx)
        .await
        .map_err(AppError::database)?;

        sqlx::query("INSERT INTO audit_logs (user_id, role, action, details) VALUES ($1, $2, $3, $4)")
            .bind(user.audit.user_id)
            .bind(user.audit.role)
            .bind(&user.audit.action)
            .bind(&user.audit.details)
            .execute(&mut *tx)
            .await
            .map_err(AppError::database)?;

        tx.commit().await.map_err(AppError::database)?;
        Ok(())
    }
}
