//! In-memory collaborators for tests.
//!
//! [`MemorySessionStore`] behaves like the identity service: it checks passwords,
//! keeps one current session and announces every change. [`MemoryDirectory`]
//! serves role and profile rows with optional per-user delay or failure.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use campus_core::RemoteError;
use campus_models::{Profile, Role, Session, UserId};
use tokio::sync::broadcast;

use crate::store::{DirectoryReader, SessionEvent, SessionStore, StoreError};

/// Fake session for `user_id` with opaque tokens.
pub fn session_for(user_id: UserId) -> Session {
    Session {
        user_id,
        email: None,
        access_token: format!("access-{}", user_id),
        refresh_token: format!("refresh-{}", user_id),
        expires_at: None,
    }
}

struct Account {
    password: String,
    user_id: UserId,
}

pub struct MemorySessionStore {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<Session>>,
    restore_delay: Mutex<Duration>,
    events: broadcast::Sender<SessionEvent>,
    sign_out_calls: AtomicUsize,
    restore_calls: AtomicUsize,
    fail_sign_out: AtomicBool,
    unavailable: AtomicBool,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            restore_delay: Mutex::new(Duration::ZERO),
            events,
            sign_out_calls: AtomicUsize::new(0),
            restore_calls: AtomicUsize::new(0),
            fail_sign_out: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn with_account(self, email: &str, password: &str, user_id: UserId) -> Self {
        lock(&self.accounts).insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user_id,
            },
        );
        self
    }

    /// Session returned by `restore_session`, as if persisted by an earlier run.
    pub fn with_persisted_session(self, session: Session) -> Self {
        *lock(&self.current) = Some(session);
        self
    }

    pub fn with_restore_delay(self, delay: Duration) -> Self {
        *lock(&self.restore_delay) = delay;
        self
    }

    /// Simulates a change the portal did not initiate (another tab, expiry).
    pub fn emit(&self, event: SessionEvent) {
        *lock(&self.current) = event.session.clone();
        let _ = self.events.send(event);
    }

    pub fn current_session(&self) -> Option<Session> {
        lock(&self.current).clone()
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn restore_calls(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }

        let user_id = {
            let accounts = lock(&self.accounts);
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => account.user_id,
                _ => return Err(StoreError::InvalidCredentials),
            }
        };

        let mut session = session_for(user_id);
        session.email = Some(email.to_string());
        self.emit(SessionEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        if lock(&self.current).is_some() {
            self.emit(SessionEvent::signed_out());
        }
        Ok(())
    }

    async fn restore_session(&self) -> Result<Option<Session>, StoreError> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.restore_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(self.current_session())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[derive(Clone, Default)]
struct DirectoryEntry {
    roles: Vec<Role>,
    profiles: Vec<Profile>,
    delay: Duration,
    failing: bool,
}

#[derive(Default)]
pub struct MemoryDirectory {
    entries: Mutex<HashMap<UserId, DirectoryEntry>>,
    lookups: AtomicUsize,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user_id: UserId, role: Role, profile: Profile) -> Self {
        {
            let mut entries = lock(&self.entries);
            let entry = entries.entry(user_id).or_default();
            entry.roles.push(role);
            entry.profiles.push(profile);
        }
        self
    }

    /// Both lookups for `user_id` take `delay` before answering.
    pub fn with_delay(self, user_id: UserId, delay: Duration) -> Self {
        lock(&self.entries).entry(user_id).or_default().delay = delay;
        self
    }

    pub fn with_failure(self, user_id: UserId) -> Self {
        lock(&self.entries).entry(user_id).or_default().failing = true;
        self
    }

    pub fn set_role(&self, user_id: UserId, role: Role) {
        lock(&self.entries).entry(user_id).or_default().roles = vec![role];
    }

    /// Number of individual lookups served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    async fn entry(&self, user_id: UserId) -> Result<DirectoryEntry, RemoteError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let entry = lock(&self.entries)
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        if !entry.delay.is_zero() {
            tokio::time::sleep(entry.delay).await;
        }
        if entry.failing {
            return Err(RemoteError::Unavailable("directory offline".into()));
        }
        Ok(entry)
    }
}

#[async_trait]
impl DirectoryReader for MemoryDirectory {
    async fn role_assignments(&self, user_id: UserId) -> Result<Vec<Role>, RemoteError> {
        self.entry(user_id).await.map(|e| e.roles)
    }

    async fn profiles(&self, user_id: UserId) -> Result<Vec<Profile>, RemoteError> {
        self.entry(user_id).await.map(|e| e.profiles)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
