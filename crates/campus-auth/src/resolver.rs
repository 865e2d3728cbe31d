//! Role and profile lookup for a signed-in user.

use std::sync::Arc;

use campus_core::RemoteError;
use campus_models::{Profile, Role, UserId};
use tracing::{debug, instrument, warn};

use crate::store::DirectoryReader;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("directory lookup failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Outcome of both lookups. Each side fails independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub role: Result<Option<Role>, ResolveError>,
    pub profile: Result<Option<Profile>, ResolveError>,
}

impl Resolution {
    /// Both values, or neither when either lookup failed.
    pub fn settled(self) -> Result<(Option<Role>, Option<Profile>), ResolveError> {
        Ok((self.role?, self.profile?))
    }
}

/// Issues the role and profile lookups concurrently. No caching: roles can
/// change between sessions.
#[derive(Clone)]
pub struct RoleProfileResolver {
    directory: Arc<dyn DirectoryReader>,
}

impl RoleProfileResolver {
    pub fn new(directory: Arc<dyn DirectoryReader>) -> Self {
        Self { directory }
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn resolve(&self, user_id: UserId) -> Resolution {
        let (roles, profiles) = tokio::join!(
            self.directory.role_assignments(user_id),
            self.directory.profiles(user_id)
        );

        let resolution = Resolution {
            role: roles
                .map(|rows| first_record(rows, "user_roles", user_id))
                .map_err(ResolveError::from),
            profile: profiles
                .map(|rows| first_record(rows, "profiles", user_id))
                .map_err(ResolveError::from),
        };
        debug!(
            role_ok = resolution.role.is_ok(),
            profile_ok = resolution.profile.is_ok(),
            "role/profile lookup finished"
        );
        resolution
    }
}

fn first_record<T>(rows: Vec<T>, collection: &str, user_id: UserId) -> Option<T> {
    if rows.len() > 1 {
        warn!(
            collection,
            user_id = %user_id,
            count = rows.len(),
            "more than one record for user, using the first"
        );
    }
    rows.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedDirectory {
        roles: Result<Vec<Role>, RemoteError>,
        profiles: Result<Vec<Profile>, RemoteError>,
    }

    #[async_trait]
    impl DirectoryReader for FixedDirectory {
        async fn role_assignments(&self, _user_id: UserId) -> Result<Vec<Role>, RemoteError> {
            self.roles.clone()
        }

        async fn profiles(&self, _user_id: UserId) -> Result<Vec<Profile>, RemoteError> {
            self.profiles.clone()
        }
    }

    fn resolver(
        roles: Result<Vec<Role>, RemoteError>,
        profiles: Result<Vec<Profile>, RemoteError>,
    ) -> RoleProfileResolver {
        RoleProfileResolver::new(Arc::new(FixedDirectory { roles, profiles }))
    }

    #[tokio::test]
    async fn test_resolves_single_records() {
        let resolution = resolver(Ok(vec![Role::Faculty]), Ok(vec![Profile::new("Dr. Iyer")]))
            .resolve(UserId::from_u128(1))
            .await;
        let (role, profile) = resolution.settled().unwrap();
        assert_eq!(role, Some(Role::Faculty));
        assert_eq!(profile.unwrap().full_name, "Dr. Iyer");
    }

    #[tokio::test]
    async fn test_missing_records_are_none() {
        let resolution = resolver(Ok(vec![]), Ok(vec![]))
            .resolve(UserId::from_u128(1))
            .await;
        assert_eq!(resolution.settled().unwrap(), (None, None));
    }

    #[tokio::test]
    async fn test_first_record_wins() {
        let resolution = resolver(Ok(vec![Role::Student, Role::Admin]), Ok(vec![]))
            .resolve(UserId::from_u128(1))
            .await;
        assert_eq!(resolution.role, Ok(Some(Role::Student)));
    }

    #[tokio::test]
    async fn test_one_failed_lookup_fails_both() {
        let resolution = resolver(
            Ok(vec![Role::Admin]),
            Err(RemoteError::Unavailable("down".into())),
        )
        .resolve(UserId::from_u128(1))
        .await;
        assert_eq!(resolution.role, Ok(Some(Role::Admin)));
        assert!(resolution.profile.is_err());
        assert!(resolution.settled().is_err());
    }
}
