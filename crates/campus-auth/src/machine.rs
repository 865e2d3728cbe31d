//! Transition table for the session controller.
//!
//! `SessionMachine` is synchronous and owns no I/O. Each input returns the effects
//! the controller must carry out, in order. Keeping it pure lets the race and
//! ordering rules be tested without a runtime.
//!
//! ```text
//! Bootstrapping ──restore(none)──▶ Anonymous
//!      │                              │ ▲
//!  restore/notify(session)     notify │ │ sign-out, idle, notify(none)
//!      ▼                              ▼ │
//! PendingProfile ──resolved──▶ Ready ───┘
//! ```

use campus_core::AuthError;
use campus_models::{Session, UserId};
use tracing::{debug, warn};

use crate::resolver::Resolution;
use crate::state::{AuthPhase, AuthState};

/// Identifies one resolution request. Results are committed only while both
/// fields still describe the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveTicket {
    pub epoch: u64,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Settled(Resolution),
    TimedOut,
    /// The lookup task died before reporting.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Publish(AuthState),
    Resolve(ResolveTicket),
    ArmIdleTimer,
    DisarmIdleTimer,
    RemoteSignOut,
}

#[derive(Debug)]
pub struct SessionMachine {
    state: AuthState,
    epoch: u64,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: AuthState::bootstrapping(),
            epoch: 0,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Ticket of the lookup the machine is waiting for, if any.
    pub fn pending_ticket(&self) -> Option<ResolveTicket> {
        match (&self.state.phase, &self.state.session) {
            (AuthPhase::PendingProfile, Some(session)) => Some(ResolveTicket {
                epoch: self.epoch,
                user_id: session.user_id,
            }),
            _ => None,
        }
    }

    /// Result of the persisted-session check at startup.
    ///
    /// Only applies while still bootstrapping: a notification that arrived first
    /// is newer than whatever was persisted.
    pub fn restored(&mut self, session: Option<Session>) -> Vec<Effect> {
        if self.state.phase != AuthPhase::Bootstrapping {
            debug!("restore finished after a session notification, ignoring");
            return Vec::new();
        }

        match session {
            Some(session) => self.begin(session),
            None => {
                self.state = AuthState::anonymous();
                vec![self.publish()]
            }
        }
    }

    pub fn session_changed(&mut self, session: Option<Session>) -> Vec<Effect> {
        let Some(session) = session else {
            return self.clear();
        };

        match self.state.user_id() {
            Some(current) if current == session.user_id => {
                // Same user with fresh tokens: keep role and profile.
                self.state.session = Some(session);
                vec![self.publish()]
            }
            Some(_) => {
                let mut effects = self.clear();
                effects.extend(self.begin(session));
                effects
            }
            None => self.begin(session),
        }
    }

    pub fn resolved(&mut self, ticket: ResolveTicket, outcome: ResolutionOutcome) -> Vec<Effect> {
        if self.pending_ticket() != Some(ticket) {
            debug!(
                epoch = ticket.epoch,
                user_id = %ticket.user_id,
                "discarding stale role/profile result"
            );
            return Vec::new();
        }

        let (role, profile, error) = match outcome {
            ResolutionOutcome::Settled(resolution) => match resolution.settled() {
                Ok((role, profile)) => (role, profile, None),
                Err(e) => {
                    warn!(user_id = %ticket.user_id, error = %e, "role/profile lookup failed");
                    (None, None, Some(AuthError::ResolutionFailed))
                }
            },
            ResolutionOutcome::TimedOut => {
                warn!(user_id = %ticket.user_id, "role/profile lookup timed out");
                (None, None, Some(AuthError::ResolutionTimeout))
            }
            ResolutionOutcome::Aborted => (None, None, Some(AuthError::ResolutionFailed)),
        };

        self.state.role = role;
        self.state.profile = profile;
        self.state.resolution_error = error;
        self.state.phase = AuthPhase::Ready;
        vec![self.publish()]
    }

    /// Local sign-out. Always asks for the remote sign-out as well.
    pub fn sign_out(&mut self) -> Vec<Effect> {
        let mut effects = self.clear();
        effects.push(Effect::RemoteSignOut);
        effects
    }

    pub fn idle_expired(&mut self) -> Vec<Effect> {
        if self.state.session.is_none() {
            return Vec::new();
        }
        self.sign_out()
    }

    fn begin(&mut self, session: Session) -> Vec<Effect> {
        self.epoch += 1;
        let ticket = ResolveTicket {
            epoch: self.epoch,
            user_id: session.user_id,
        };
        self.state = AuthState {
            session: Some(session),
            role: None,
            profile: None,
            phase: AuthPhase::PendingProfile,
            resolution_error: None,
        };
        vec![
            self.publish(),
            Effect::ArmIdleTimer,
            Effect::Resolve(ticket),
        ]
    }

    fn clear(&mut self) -> Vec<Effect> {
        if self.state.phase == AuthPhase::Anonymous {
            return Vec::new();
        }
        self.epoch += 1;
        self.state = AuthState::anonymous();
        vec![Effect::DisarmIdleTimer, self.publish()]
    }

    fn publish(&self) -> Effect {
        Effect::Publish(self.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolveError;
    use campus_core::RemoteError;
    use campus_models::{Profile, Role};

    fn session(n: u128) -> Session {
        Session {
            user_id: UserId::from_u128(n),
            email: None,
            access_token: format!("access-{}", n),
            refresh_token: format!("refresh-{}", n),
            expires_at: None,
        }
    }

    fn settled(role: Role, name: &str) -> ResolutionOutcome {
        ResolutionOutcome::Settled(Resolution {
            role: Ok(Some(role)),
            profile: Ok(Some(Profile::new(name))),
        })
    }

    fn ticket_of(effects: &[Effect]) -> ResolveTicket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Resolve(t) => Some(*t),
                _ => None,
            })
            .expect("resolve effect")
    }

    #[test]
    fn test_restore_none_goes_anonymous() {
        let mut machine = SessionMachine::new();
        let effects = machine.restored(None);
        assert_eq!(effects, vec![Effect::Publish(AuthState::anonymous())]);
        assert!(!machine.state().loading());
    }

    #[test]
    fn test_restore_session_starts_resolution() {
        let mut machine = SessionMachine::new();
        let effects = machine.restored(Some(session(1)));
        assert_eq!(machine.state().phase, AuthPhase::PendingProfile);
        assert!(effects.contains(&Effect::ArmIdleTimer));
        assert_eq!(ticket_of(&effects).user_id, UserId::from_u128(1));
    }

    #[test]
    fn test_restore_after_notification_is_ignored() {
        let mut machine = SessionMachine::new();
        machine.session_changed(Some(session(1)));
        assert!(machine.restored(None).is_empty());
        assert_eq!(machine.state().user_id(), Some(UserId::from_u128(1)));
    }

    #[test]
    fn test_resolution_commits_role_and_profile() {
        let mut machine = SessionMachine::new();
        let ticket = ticket_of(&machine.session_changed(Some(session(1))));
        let effects = machine.resolved(ticket, settled(Role::Faculty, "Dr. Iyer"));
        assert_eq!(effects.len(), 1);
        let state = machine.state();
        assert_eq!(state.phase, AuthPhase::Ready);
        assert_eq!(state.role, Some(Role::Faculty));
        assert_eq!(state.profile.as_ref().unwrap().full_name, "Dr. Iyer");
        assert!(!state.loading());
    }

    #[test]
    fn test_timeout_settles_without_role() {
        let mut machine = SessionMachine::new();
        let ticket = ticket_of(&machine.restored(Some(session(1))));
        machine.resolved(ticket, ResolutionOutcome::TimedOut);
        let state = machine.state();
        assert!(state.is_signed_in());
        assert_eq!(state.role, None);
        assert_eq!(state.profile, None);
        assert_eq!(state.resolution_error, Some(AuthError::ResolutionTimeout));
        assert!(!state.loading());
    }

    #[test]
    fn test_partial_failure_clears_both() {
        let mut machine = SessionMachine::new();
        let ticket = ticket_of(&machine.restored(Some(session(1))));
        machine.resolved(
            ticket,
            ResolutionOutcome::Settled(Resolution {
                role: Ok(Some(Role::Admin)),
                profile: Err(ResolveError::Remote(RemoteError::Unavailable("down".into()))),
            }),
        );
        assert_eq!(machine.state().role, None);
        assert_eq!(
            machine.state().resolution_error,
            Some(AuthError::ResolutionFailed)
        );
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut machine = SessionMachine::new();
        let ticket_a = ticket_of(&machine.session_changed(Some(session(1))));
        let effects = machine.session_changed(Some(session(2)));
        let ticket_b = ticket_of(&effects);

        // Passes through Anonymous before the new user's pending state.
        let published: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Publish(s) => Some(s.phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            published,
            vec![AuthPhase::Anonymous, AuthPhase::PendingProfile]
        );

        assert!(
            machine
                .resolved(ticket_a, settled(Role::Admin, "A"))
                .is_empty()
        );
        assert_eq!(machine.state().phase, AuthPhase::PendingProfile);

        machine.resolved(ticket_b, settled(Role::Student, "B"));
        assert_eq!(machine.state().role, Some(Role::Student));
        assert_eq!(machine.state().profile.as_ref().unwrap().full_name, "B");
    }

    #[test]
    fn test_same_user_refresh_keeps_role() {
        let mut machine = SessionMachine::new();
        let ticket = ticket_of(&machine.session_changed(Some(session(1))));
        machine.resolved(ticket, settled(Role::Student, "S"));

        let mut refreshed = session(1);
        refreshed.access_token = "rotated".into();
        let effects = machine.session_changed(Some(refreshed));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Resolve(_))));
        assert_eq!(machine.state().role, Some(Role::Student));
        assert_eq!(
            machine.state().session.as_ref().unwrap().access_token,
            "rotated"
        );
    }

    #[test]
    fn test_result_after_sign_out_is_discarded() {
        let mut machine = SessionMachine::new();
        let ticket = ticket_of(&machine.session_changed(Some(session(1))));
        machine.sign_out();
        assert!(
            machine
                .resolved(ticket, settled(Role::Admin, "A"))
                .is_empty()
        );
        assert_eq!(machine.state(), &AuthState::anonymous());
    }

    #[test]
    fn test_sign_out_is_idempotent() {
        let mut machine = SessionMachine::new();
        machine.session_changed(Some(session(1)));
        let first = machine.sign_out();
        assert!(first.contains(&Effect::DisarmIdleTimer));
        assert!(first.contains(&Effect::Publish(AuthState::anonymous())));

        let second = machine.sign_out();
        assert_eq!(second, vec![Effect::RemoteSignOut]);
        assert_eq!(machine.state(), &AuthState::anonymous());
    }

    #[test]
    fn test_idle_expiry_without_session_is_noop() {
        let mut machine = SessionMachine::new();
        machine.restored(None);
        assert!(machine.idle_expired().is_empty());
    }

    #[test]
    fn test_signed_out_notification_during_bootstrap() {
        let mut machine = SessionMachine::new();
        let effects = machine.session_changed(None);
        assert_eq!(
            effects,
            vec![
                Effect::DisarmIdleTimer,
                Effect::Publish(AuthState::anonymous())
            ]
        );
    }
}
