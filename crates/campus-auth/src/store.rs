//! Collaborator seams: the remote identity service and the role/profile directory.

use async_trait::async_trait;
use campus_core::RemoteError;
use campus_models::{Profile, Role, Session, UserId};
use tokio::sync::broadcast;

/// Kind of session change announced by a [`SessionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Session-changed notification. `session` is `None` exactly when signed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: SessionEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: SessionEventKind::TokenRefreshed,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: SessionEventKind::SignedOut,
            session: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected identity service response: {0}")]
    Unexpected(String),
}

impl From<RemoteError> for StoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unavailable(msg) => StoreError::Unavailable(msg),
            RemoteError::Rejected { status: 400, .. } => StoreError::InvalidCredentials,
            other => StoreError::Unexpected(other.to_string()),
        }
    }
}

/// The remote identity service.
///
/// Implementations announce every session change on the channel returned by
/// [`subscribe`](SessionStore::subscribe), including changes caused by their own
/// `sign_in_with_password` and `sign_out`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, StoreError>;

    async fn sign_out(&self) -> Result<(), StoreError>;

    /// The current session if one is held, otherwise the one persisted by an
    /// earlier run, if still usable.
    async fn restore_session(&self) -> Result<Option<Session>, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Point lookups against the `user_roles` and `profiles` collections.
///
/// Each lookup is expected to match at most one record.
#[async_trait]
pub trait DirectoryReader: Send + Sync {
    async fn role_assignments(&self, user_id: UserId) -> Result<Vec<Role>, RemoteError>;

    async fn profiles(&self, user_id: UserId) -> Result<Vec<Profile>, RemoteError>;
}
