//! Identity service client.

use async_trait::async_trait;
use campus_auth::{SessionEvent, SessionStore, StoreError};
use campus_core::RemoteError;
use campus_models::{Session, UserId};
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, instrument, warn};

use crate::http::BackendClient;
use crate::persistence::SessionFile;

const EVENT_CAPACITY: usize = 16;

/// Refresh this long before the access token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Wait after a refresh that failed for a transient reason.
const REFRESH_RETRY: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: TokenUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => DateTime::from_timestamp(at, 0),
            (None, Some(secs)) => Some(now + Duration::seconds(secs)),
            (None, None) => None,
        };
        Session {
            user_id: self.user.id,
            email: self.user.email,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

/// [`SessionStore`] backed by the remote identity service.
///
/// Keeps the current session in memory and in a [`SessionFile`], and installs its
/// access token on the shared [`BackendClient`] so data calls run as the user.
pub struct RemoteSessionStore {
    client: BackendClient,
    file: SessionFile,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl RemoteSessionStore {
    pub fn new(client: BackendClient) -> Self {
        let file = SessionFile::new(client.config().session_file.clone());
        Self::with_file(client, file)
    }

    pub fn with_file(client: BackendClient, file: SessionFile) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            file,
            current: Mutex::new(None),
            events,
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn current_session(&self) -> Option<Session> {
        self.lock().clone()
    }

    /// Exchanges the refresh token for a new session and announces it.
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn refresh_session(&self, session: &Session) -> Result<Session, RemoteError> {
        let request = self
            .client
            .request(Method::POST, &self.client.config().auth_url("token?grant_type=refresh_token"))
            .json(&json!({ "refresh_token": session.refresh_token }));
        let token: TokenResponse = self.client.send_json(request).await?;
        let refreshed = token.into_session(Utc::now());

        self.install(Some(refreshed.clone())).await;
        let _ = self.events.send(SessionEvent::token_refreshed(refreshed.clone()));
        info!("session refreshed");
        Ok(refreshed)
    }

    /// Spawns a task that refreshes the held session shortly before it expires.
    ///
    /// The task re-plans on every session notification and ends once the store
    /// is dropped. A refresh the identity service rejects, or any failure after
    /// the token has lapsed, clears the session and announces a sign-out.
    pub fn keep_fresh(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        let mut events = self.events.subscribe();

        tokio::spawn(async move {
            let mut retry = None;
            loop {
                let wait = match retry.take() {
                    Some(wait) => Some(wait),
                    None => {
                        let Some(store) = store.upgrade() else { return };
                        store
                            .current_session()
                            .and_then(|session| refresh_delay(&session, Utc::now()))
                    }
                };

                let due = async {
                    match wait {
                        Some(wait) => time::sleep(wait).await,
                        None => std::future::pending().await,
                    }
                };

                tokio::select! {
                    event = events.recv() => match event {
                        Err(RecvError::Closed) => return,
                        _ => continue,
                    },
                    _ = due => {}
                }

                let Some(store) = store.upgrade() else { return };
                if store.refresh_current().await {
                    retry = Some(REFRESH_RETRY);
                }
            }
        })
    }

    /// Returns true when the attempt should be repeated later.
    async fn refresh_current(&self) -> bool {
        let Some(session) = self.current_session() else {
            return false;
        };
        let Err(error) = self.refresh_session(&session).await else {
            return false;
        };

        match refresh_failure(&error, &session, Utc::now()) {
            RefreshFailure::Retry => {
                warn!(error = %error, "session refresh failed, will retry");
                true
            }
            RefreshFailure::SignOut => {
                warn!(error = %error, user_id = %session.user_id, "session could not be kept alive");
                self.expire(&session).await;
                false
            }
        }
    }

    /// Drops `session` locally unless it was already replaced.
    async fn expire(&self, session: &Session) {
        let still_current = self
            .lock()
            .as_ref()
            .is_some_and(|current| current.access_token == session.access_token);
        if !still_current {
            debug!("session changed during refresh");
            return;
        }
        self.install(None).await;
        let _ = self.events.send(SessionEvent::signed_out());
    }

    async fn install(&self, session: Option<Session>) {
        self.client
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        match &session {
            Some(session) => {
                if let Err(e) = self.file.save(session).await {
                    warn!(error = %e, "could not persist session");
                }
            }
            None => self.file.clear().await,
        }
        *self.lock() = session;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshFailure {
    Retry,
    SignOut,
}

/// Time until `session` should be refreshed, `None` if it never expires.
fn refresh_delay(session: &Session, now: DateTime<Utc>) -> Option<std::time::Duration> {
    let due = session.expires_at? - Duration::seconds(REFRESH_MARGIN_SECS);
    Some((due - now).to_std().unwrap_or_default())
}

fn refresh_failure(error: &RemoteError, session: &Session, now: DateTime<Utc>) -> RefreshFailure {
    if matches!(error, RemoteError::Rejected { .. }) || session.is_expired_at(now) {
        RefreshFailure::SignOut
    } else {
        RefreshFailure::Retry
    }
}

#[async_trait]
impl SessionStore for RemoteSessionStore {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError> {
        let request = self
            .client
            .request(Method::POST, &self.client.config().auth_url("token?grant_type=password"))
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = self.client.send_json(request).await?;
        let session = token.into_session(Utc::now());

        self.install(Some(session.clone())).await;
        let _ = self.events.send(SessionEvent::signed_in(session.clone()));
        info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }

    /// Local state is cleared and announced before the remote call, so a
    /// failed logout request never leaves the user signed in.
    async fn sign_out(&self) -> Result<(), StoreError> {
        let previous = self.lock().take();
        self.install(None).await;

        let Some(session) = previous else {
            return Ok(());
        };
        let _ = self.events.send(SessionEvent::signed_out());

        let request = self.client.request_as(
            Method::POST,
            &self.client.config().auth_url("logout"),
            &session.access_token,
        );
        self.client.send(request).await?;
        Ok(())
    }

    async fn restore_session(&self) -> Result<Option<Session>, StoreError> {
        let session = match self.current_session() {
            Some(session) => Some(session),
            None => self.file.load().await,
        };
        let Some(session) = session else {
            return Ok(None);
        };

        if !session.is_expired() {
            self.install(Some(session.clone())).await;
            return Ok(Some(session));
        }

        match self.refresh_session(&session).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(RemoteError::Rejected { status, message }) => {
                warn!(status, %message, "stored session could not be refreshed");
                self.install(None).await;
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed");
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_auth::SessionEventKind;
    use campus_config::BackendConfig;
    use tempfile::TempDir;

    fn token(expires_in: Option<i64>, expires_at: Option<i64>) -> TokenResponse {
        TokenResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in,
            expires_at,
            user: TokenUser {
                id: UserId::from_u128(3),
                email: Some("grace@campus.edu".into()),
            },
        }
    }

    #[test]
    fn test_token_expiry() {
        let now = Utc::now();
        let session = token(Some(3600), None).into_session(now);
        assert_eq!(session.expires_at, Some(now + Duration::seconds(3600)));

        let session = token(Some(3600), Some(1_700_000_000)).into_session(now);
        assert_eq!(session.expires_at, DateTime::from_timestamp(1_700_000_000, 0));

        assert_eq!(token(None, None).into_session(now).expires_at, None);
    }

    #[test]
    fn test_token_response_shape() {
        let body = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {"id": "00000000-0000-0000-0000-000000000003", "email": "grace@campus.edu"}
        }"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(token.user.id, UserId::from_u128(3));
        assert_eq!(token.expires_at, None);
    }

    fn store(dir: &TempDir) -> RemoteSessionStore {
        let client = BackendClient::new(BackendConfig::for_url("http://127.0.0.1:9")).unwrap();
        RemoteSessionStore::with_file(client, SessionFile::new(dir.path().join("session.json")))
    }

    #[tokio::test]
    async fn test_restore_uses_persisted_session() {
        let dir = TempDir::new().unwrap();
        let session = token(Some(3600), None).into_session(Utc::now());
        SessionFile::new(dir.path().join("session.json"))
            .save(&session)
            .await
            .unwrap();

        let store = store(&dir);
        assert_eq!(store.restore_session().await.unwrap(), Some(session));
        assert!(store.client().has_access_token());
    }

    #[tokio::test]
    async fn test_restore_without_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir).restore_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_out_without_session_skips_remote() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut events = store.subscribe();
        tokio_test::assert_ok!(store.sign_out().await);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_refresh_is_planned_ahead_of_expiry() {
        let now = Utc::now();
        let session = token(Some(3600), None).into_session(now);
        assert_eq!(
            refresh_delay(&session, now),
            Some(std::time::Duration::from_secs(3540))
        );

        let nearly_expired = token(Some(30), None).into_session(now);
        assert_eq!(refresh_delay(&nearly_expired, now), Some(std::time::Duration::ZERO));

        let lapsed = token(Some(-600), None).into_session(now);
        assert_eq!(refresh_delay(&lapsed, now), Some(std::time::Duration::ZERO));

        assert_eq!(refresh_delay(&token(None, None).into_session(now), now), None);
    }

    #[test]
    fn test_refresh_failure_handling() {
        let now = Utc::now();
        let live = token(Some(45), None).into_session(now);
        let lapsed = token(Some(-1), None).into_session(now);
        let rejected = RemoteError::Rejected {
            status: 400,
            message: "Invalid Refresh Token".into(),
        };
        let offline = RemoteError::Unavailable("connection refused".into());

        assert_eq!(refresh_failure(&rejected, &live, now), RefreshFailure::SignOut);
        assert_eq!(refresh_failure(&offline, &live, now), RefreshFailure::Retry);
        assert_eq!(refresh_failure(&offline, &lapsed, now), RefreshFailure::SignOut);
    }

    #[tokio::test]
    async fn test_keep_fresh_signs_out_lapsed_session() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store(&dir));
        store
            .install(Some(token(Some(-60), None).into_session(Utc::now())))
            .await;
        let mut events = store.subscribe();

        let keeper = store.keep_fresh();
        let event = time::timeout(std::time::Duration::from_secs(10), events.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(event.kind, SessionEventKind::SignedOut);
        assert_eq!(store.current_session(), None);
        assert!(!store.client().has_access_token());
        keeper.abort();
    }

    #[tokio::test]
    async fn test_keep_fresh_ends_with_the_store() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store(&dir));
        let keeper = store.keep_fresh();

        drop(store);
        tokio_test::assert_ok!(time::timeout(std::time::Duration::from_secs(5), keeper).await);
    }
}
