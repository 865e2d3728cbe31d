use campus_models::{ProfileRecord, UpdateProfileDto, UserId};
use tracing::{info, instrument};
use validator::Validate;

use crate::directory::profile_query;
use crate::error::ServiceError;
use crate::http::BackendClient;
use crate::query::{TableQuery, tables};

#[derive(Clone)]
pub struct ProfileService {
    client: BackendClient,
}

impl ProfileService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Result<ProfileRecord, ServiceError> {
        let profile = self
            .client
            .select(&profile_query(user_id))
            .await?
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("Profile"))?;
        Ok(ProfileRecord { user_id, profile })
    }

    /// Updates the caller's own profile.
    #[instrument(skip(self, dto))]
    pub async fn update_own(
        &self,
        user_id: UserId,
        dto: UpdateProfileDto,
    ) -> Result<ProfileRecord, ServiceError> {
        let dto = dto.normalized();
        dto.validate()?;
        let query = TableQuery::from(tables::PROFILES).eq("user_id", user_id);
        let updated: Vec<ProfileRecord> = self.client.update(&query, &dto).await?;
        let record = updated
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("Profile"))?;
        info!(%user_id, "profile updated");
        Ok(record)
    }
}
