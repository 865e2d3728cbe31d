//! Published authentication state.

use campus_core::AuthError;
use campus_models::{Profile, Role, Session, UserId};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Waiting for the persisted session check.
    Bootstrapping,
    Anonymous,
    /// Signed in, role and profile lookup in flight.
    PendingProfile,
    /// Signed in, lookup settled (possibly without a role).
    Ready,
}

/// Snapshot of the signed-in user as seen by the rest of the portal.
///
/// `role` and `profile` are only ever set while `session` is. A snapshot is
/// published whole, so readers never see a role without its profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub role: Option<Role>,
    pub profile: Option<Profile>,
    pub phase: AuthPhase,
    /// Why the last lookup left the user without a role, if it failed.
    pub resolution_error: Option<AuthError>,
}

impl AuthState {
    pub fn bootstrapping() -> Self {
        Self {
            session: None,
            role: None,
            profile: None,
            phase: AuthPhase::Bootstrapping,
            resolution_error: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            phase: AuthPhase::Anonymous,
            ..Self::bootstrapping()
        }
    }

    /// True until the first session check completes and while a role lookup is in flight.
    ///
    /// A restored session therefore keeps `loading()` true until its role is
    /// known, so guarded pages answer `Pending` instead of flashing an
    /// unauthorized redirect for a user whose role is still being read.
    pub fn loading(&self) -> bool {
        matches!(
            self.phase,
            AuthPhase::Bootstrapping | AuthPhase::PendingProfile
        )
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().map(|s| s.user_id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::bootstrapping()
    }
}

/// User-activity signals that postpone the idle sign-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PointerDown,
    KeyDown,
    Scroll,
    TouchStart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_by_phase() {
        let mut state = AuthState::bootstrapping();
        assert!(state.loading());
        state.phase = AuthPhase::PendingProfile;
        assert!(state.loading());
        state.phase = AuthPhase::Ready;
        assert!(!state.loading());
        assert!(!AuthState::anonymous().loading());
    }

    #[test]
    fn test_anonymous_shape() {
        let state = AuthState::anonymous();
        assert_eq!(state.session, None);
        assert_eq!(state.role, None);
        assert_eq!(state.profile, None);
        assert_eq!(state.user_id(), None);
    }
}
