use std::collections::HashMap;

use campus_models::{
    CreateUserRequest, CreateUserResponse, ProfileRecord, Role, RoleAssignment, UserId,
    UserSummary,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::error::ServiceError;
use crate::http::BackendClient;
use crate::query::{TableQuery, tables};

pub const CREATE_USER_PROCEDURE: &str = "admin-create-user";

const PROFILE_COLUMNS: &str = "user_id,full_name,department,enrollment_number";

#[derive(Clone)]
pub struct UserService {
    client: BackendClient,
}

impl UserService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Every user with a role, joined with their profile.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let roles_query = TableQuery::from(tables::USER_ROLES).select("user_id,role");
        let profiles_query = TableQuery::from(tables::PROFILES).select(PROFILE_COLUMNS);
        let (assignments, profiles) = tokio::try_join!(
            self.client.select::<RoleAssignment>(&roles_query),
            self.client.select::<ProfileRecord>(&profiles_query),
        )?;
        Ok(join_users(assignments, profiles))
    }

    /// Students, for picking the owner of an uploaded receipt.
    #[instrument(skip(self))]
    pub async fn list_students(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let query = TableQuery::from(tables::USER_ROLES)
            .select("user_id,role")
            .eq("role", Role::Student);
        let assignments: Vec<RoleAssignment> = self.client.select(&query).await?;
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let query = TableQuery::from(tables::PROFILES)
            .select(PROFILE_COLUMNS)
            .in_list("user_id", assignments.iter().map(|a| a.user_id));
        let profiles: Vec<ProfileRecord> = self.client.select(&query).await?;
        Ok(join_users(assignments, profiles))
    }

    /// Provisions an account through the privileged procedure.
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<UserId, ServiceError> {
        let request = request.normalized();
        request.validate()?;
        let response: CreateUserResponse = self
            .client
            .invoke(CREATE_USER_PROCEDURE, &request)
            .await?;
        info!(user_id = %response.user_id, "user created");
        Ok(response.user_id)
    }
}

/// One summary per role assignment, in name order.
fn join_users(assignments: Vec<RoleAssignment>, profiles: Vec<ProfileRecord>) -> Vec<UserSummary> {
    let mut profiles: HashMap<UserId, _> = profiles
        .into_iter()
        .map(|record| (record.user_id, record.profile))
        .collect();
    let mut users: Vec<UserSummary> = assignments
        .into_iter()
        .map(|assignment| UserSummary {
            user_id: assignment.user_id,
            role: assignment.role,
            profile: profiles.remove(&assignment.user_id),
        })
        .collect();
    users.sort_by(|a, b| a.display_name().cmp(b.display_name()));
    users
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_models::Profile;

    #[test]
    fn test_join_users() {
        let ada = UserId::from_u128(1);
        let bob = UserId::from_u128(2);
        let users = join_users(
            vec![
                RoleAssignment { user_id: bob, role: Role::Faculty },
                RoleAssignment { user_id: ada, role: Role::Student },
            ],
            vec![ProfileRecord {
                user_id: ada,
                profile: Profile::new("Ada"),
            }],
        );

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, bob);
        assert_eq!(users[0].display_name(), "(no profile)");
        assert_eq!(users[1].display_name(), "Ada");
        assert_eq!(users[1].role, Role::Student);
    }
}
