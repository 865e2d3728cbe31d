//! The auth session controller.
//!
//! One Tokio task owns the [`SessionMachine`] and is the only writer of the
//! published [`AuthState`]. Store notifications, the startup restore, lookup
//! results, activity signals and commands are all merged into that task, so
//! transitions never interleave.
//!
//! # Example
//!
//! ```ignore
//! let controller = AuthController::start(store, directory, AuthConfig::from_env());
//! controller.sign_in("faculty@campus.edu", "password").await?;
//! let state = controller.wait_until(|s| s.is_signed_in() && !s.loading()).await;
//! assert_eq!(guard(&state, AppRoute::FacultyDashboard), RouteDecision::Allow);
//! ```

use std::sync::Arc;
use std::time::Duration;

use campus_config::AuthConfig;
use campus_core::AuthError;
use campus_models::{LoginRequest, Session, first_validation_message};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, instrument, trace, warn};
use validator::Validate;

use crate::machine::{Effect, ResolutionOutcome, ResolveTicket, SessionMachine};
use crate::resolver::RoleProfileResolver;
use crate::state::{ActivitySignal, AuthState};
use crate::store::{DirectoryReader, SessionEvent, SessionStore, StoreError};

const FAR_FUTURE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

enum Command {
    Activity(ActivitySignal),
    SignOut(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the running controller.
///
/// Dropping the handle stops the controller task.
pub struct AuthController {
    state: watch::Receiver<AuthState>,
    commands: mpsc::UnboundedSender<Command>,
    store: Arc<dyn SessionStore>,
    task: Option<JoinHandle<()>>,
}

impl AuthController {
    /// Subscribes to the store, then starts the restore check. Must be called
    /// from within a Tokio runtime.
    pub fn start(
        store: Arc<dyn SessionStore>,
        directory: Arc<dyn DirectoryReader>,
        config: AuthConfig,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(AuthState::bootstrapping());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let actor = SessionActor {
            machine: SessionMachine::new(),
            events: store.subscribe(),
            store: store.clone(),
            resolver: RoleProfileResolver::new(directory),
            config,
            state_tx,
            commands: commands_rx,
            resolutions: JoinSet::new(),
            resyncs: JoinSet::new(),
            idle_deadline: None,
        };
        let task = tokio::spawn(actor.run());

        Self {
            state: state_rx,
            commands: commands_tx,
            store,
            task: Some(task),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Waits for a snapshot matching `predicate`. Returns the last snapshot if the
    /// controller stops first.
    pub async fn wait_until<F>(&self, mut predicate: F) -> AuthState
    where
        F: FnMut(&AuthState) -> bool,
    {
        let mut rx = self.state.clone();
        let result = rx.wait_for(|state| predicate(state)).await.map(|s| s.clone());
        match result {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Waits until bootstrap and any in-flight lookup have finished.
    pub async fn settled(&self) -> AuthState {
        self.wait_until(|state| !state.loading()).await
    }

    /// Checks the credentials with the identity service.
    ///
    /// State is not touched here: the store's sign-in notification drives the
    /// transition, so there is a single update path.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let form = LoginRequest::new(email, password);
        form.validate()
            .map_err(|errors| AuthError::InvalidInput(first_validation_message(&errors)))?;

        match self
            .store
            .sign_in_with_password(&form.email, &form.password)
            .await
        {
            Ok(session) => {
                info!(user_id = %session.user_id, "signed in");
                Ok(())
            }
            Err(StoreError::InvalidCredentials) => {
                warn!("sign-in rejected: invalid credentials");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                error!(error = %e, "sign-in failed");
                Err(AuthError::Unexpected)
            }
        }
    }

    /// Clears the local session, then signs out remotely on a best-effort basis.
    ///
    /// Returns once the remote call has been attempted. Local state is already
    /// anonymous by then, whatever the remote outcome.
    pub async fn sign_out(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::SignOut(ack_tx)).is_err() {
            debug!("controller stopped, nothing to sign out");
            return;
        }
        let _ = ack_rx.await;
    }

    /// Postpones the idle sign-out. Cheap enough to call on every input event.
    pub fn record_activity(&self, signal: ActivitySignal) {
        let _ = self.commands.send(Command::Activity(signal));
    }

    /// Stops the controller task, releasing the subscription and the idle timer.
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!(error = %e, "auth controller task failed");
                }
            }
        }
    }
}

impl Drop for AuthController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct SessionActor {
    machine: SessionMachine,
    store: Arc<dyn SessionStore>,
    resolver: RoleProfileResolver,
    config: AuthConfig,
    state_tx: watch::Sender<AuthState>,
    events: broadcast::Receiver<SessionEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    resolutions: JoinSet<(ResolveTicket, ResolutionOutcome)>,
    resyncs: JoinSet<Result<Option<Session>, StoreError>>,
    idle_deadline: Option<Instant>,
}

impl SessionActor {
    async fn run(mut self) {
        let store = self.store.clone();
        let mut restore = store.restore_session();
        let mut restored = false;
        let mut events_open = true;

        loop {
            tokio::select! {
                result = &mut restore, if !restored => {
                    restored = true;
                    let session = result.unwrap_or_else(|e| {
                        warn!(error = %e, "could not restore persisted session");
                        None
                    });
                    let effects = self.machine.restored(session);
                    self.apply(effects, None);
                }
                event = self.events.recv(), if events_open => match event {
                    Ok(event) => {
                        debug!(kind = ?event.kind, "session changed");
                        let effects = self.machine.session_changed(event.session);
                        self.apply(effects, None);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed session notifications, re-reading the session");
                        self.spawn_resync();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("session store closed its notification channel");
                        events_open = false;
                    }
                },
                Some(joined) = self.resolutions.join_next(), if !self.resolutions.is_empty() => {
                    match joined {
                        Ok((ticket, outcome)) => {
                            let effects = self.machine.resolved(ticket, outcome);
                            self.apply(effects, None);
                        }
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => {
                            error!(error = %e, "role/profile lookup task failed");
                            if let Some(ticket) = self.machine.pending_ticket() {
                                let effects = self.machine.resolved(ticket, ResolutionOutcome::Aborted);
                                self.apply(effects, None);
                            }
                        }
                    }
                }
                Some(joined) = self.resyncs.join_next(), if !self.resyncs.is_empty() => {
                    match joined {
                        Ok(Ok(session)) => {
                            let effects = self.machine.session_changed(session);
                            self.apply(effects, None);
                        }
                        Ok(Err(e)) => warn!(error = %e, "could not re-read session after missed notifications"),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => error!(error = %e, "session re-read task failed"),
                    }
                }
                _ = idle_wait(self.idle_deadline) => {
                    info!("idle timeout reached, signing out");
                    self.idle_deadline = None;
                    let effects = self.machine.idle_expired();
                    self.apply(effects, None);
                }
                command = self.commands.recv() => match command {
                    Some(Command::Activity(signal)) => self.touch(signal),
                    Some(Command::SignOut(ack)) => {
                        let effects = self.machine.sign_out();
                        self.apply(effects, Some(ack));
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        self.resolutions.abort_all();
        self.resyncs.abort_all();
        debug!("auth controller stopped");
    }

    fn apply(&mut self, effects: Vec<Effect>, mut ack: Option<oneshot::Sender<()>>) {
        for effect in effects {
            match effect {
                Effect::Publish(state) => {
                    trace!(phase = ?state.phase, "publishing auth state");
                    self.state_tx.send_replace(state);
                }
                Effect::Resolve(ticket) => self.spawn_resolution(ticket),
                Effect::ArmIdleTimer => {
                    self.idle_deadline = Some(deadline_after(self.config.idle_timeout));
                }
                Effect::DisarmIdleTimer => self.idle_deadline = None,
                Effect::RemoteSignOut => self.spawn_remote_sign_out(ack.take()),
            }
        }
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    fn spawn_resolution(&mut self, ticket: ResolveTicket) {
        let resolver = self.resolver.clone();
        let limit = self.config.resolution_timeout;
        self.resolutions.spawn(async move {
            let outcome = match time::timeout(limit, resolver.resolve(ticket.user_id)).await {
                Ok(resolution) => ResolutionOutcome::Settled(resolution),
                Err(_) => ResolutionOutcome::TimedOut,
            };
            (ticket, outcome)
        });
    }

    /// Reads the store's current session so missed notifications cannot leave
    /// the published state behind it.
    fn spawn_resync(&mut self) {
        if !self.resyncs.is_empty() {
            return;
        }
        let store = self.store.clone();
        self.resyncs.spawn(async move { store.restore_session().await });
    }

    fn spawn_remote_sign_out(&self, ack: Option<oneshot::Sender<()>>) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.sign_out().await {
                warn!(error = %e, "remote sign-out failed, local session already cleared");
            }
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        });
    }

    fn touch(&mut self, signal: ActivitySignal) {
        if self.idle_deadline.is_some() {
            trace!(?signal, "activity, resetting idle timer");
            self.idle_deadline = Some(deadline_after(self.config.idle_timeout));
        }
    }
}

/// `now + timeout`, saturating at a year out when the sum does not fit.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

async fn idle_wait(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

