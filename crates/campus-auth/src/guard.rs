//! Route guard: allow, hold or redirect a navigation based on [`AuthState`].

use campus_models::Role;
use std::fmt;

use crate::state::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    SignIn,
    Unauthorized,
}

impl RedirectTarget {
    pub fn path(&self) -> &'static str {
        match self {
            RedirectTarget::SignIn => "/login",
            RedirectTarget::Unauthorized => "/unauthorized",
        }
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Still loading: show a neutral indicator, do not redirect yet.
    Pending,
    Allow,
    Redirect(RedirectTarget),
}

/// Decides access to a route gated on `required`.
///
/// Pure and cheap: evaluate it on every state change and every navigation.
/// A missing role is never treated as a match.
pub fn decide(state: &AuthState, required: &[Role]) -> RouteDecision {
    if state.loading() {
        return RouteDecision::Pending;
    }
    if state.session.is_none() {
        return RouteDecision::Redirect(RedirectTarget::SignIn);
    }
    match state.role {
        Some(role) if required.contains(&role) => RouteDecision::Allow,
        _ => RouteDecision::Redirect(RedirectTarget::Unauthorized),
    }
}
