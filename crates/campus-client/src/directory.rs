use async_trait::async_trait;
use campus_auth::DirectoryReader;
use campus_core::RemoteError;
use campus_models::{Profile, Role, UserId};
use serde::Deserialize;

use crate::http::BackendClient;
use crate::query::{TableQuery, tables};

#[derive(Deserialize)]
struct RoleRow {
    role: Role,
}

/// [`DirectoryReader`] over the `user_roles` and `profiles` tables.
#[derive(Clone)]
pub struct RemoteDirectory {
    client: BackendClient,
}

impl RemoteDirectory {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

pub(crate) fn role_query(user_id: UserId) -> TableQuery {
    TableQuery::from(tables::USER_ROLES)
        .select("role")
        .eq("user_id", user_id)
}

pub(crate) fn profile_query(user_id: UserId) -> TableQuery {
    TableQuery::from(tables::PROFILES)
        .select("full_name,department,enrollment_number")
        .eq("user_id", user_id)
}

#[async_trait]
impl DirectoryReader for RemoteDirectory {
    async fn role_assignments(&self, user_id: UserId) -> Result<Vec<Role>, RemoteError> {
        let rows: Vec<RoleRow> = self.client.select(&role_query(user_id)).await?;
        Ok(rows.into_iter().map(|row| row.role).collect())
    }

    async fn profiles(&self, user_id: UserId) -> Result<Vec<Profile>, RemoteError> {
        self.client.select(&profile_query(user_id)).await
    }
}
