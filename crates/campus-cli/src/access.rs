//! Maps shell commands to the page they act on and checks it with the route guard.

use campus_auth::{AppRoute, AuthState, RedirectTarget, RouteDecision, decide, guard};
use campus_core::AuthError;
use campus_models::Role;

use crate::command::ShellCommand;

/// What a command needs before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Runs for anyone, signed in or not.
    Open,
    /// Any signed-in user with a role.
    SignedIn,
    Page(AppRoute),
}

impl Access {
    pub fn for_command(command: &ShellCommand, state: &AuthState) -> Access {
        match command {
            ShellCommand::Help
            | ShellCommand::Quit
            | ShellCommand::Login
            | ShellCommand::Logout
            | ShellCommand::Whoami
            | ShellCommand::Menu => Access::Open,
            ShellCommand::Dashboard => Access::Page(role_page(state, AppRoute::home_for)),
            ShellCommand::Notices => Access::Page(role_page(state, notices_page)),
            ShellCommand::Profile
            | ShellCommand::EditProfile
            | ShellCommand::DownloadReceipt { .. } => Access::SignedIn,
            other => other.route().map_or(Access::SignedIn, Access::Page),
        }
    }

    pub fn check(&self, state: &AuthState) -> RouteDecision {
        match self {
            Access::Open => RouteDecision::Allow,
            Access::SignedIn => decide(state, &Role::ALL),
            Access::Page(route) => guard(state, *route),
        }
    }
}

pub fn notices_page(role: Role) -> AppRoute {
    match role {
        Role::Student => AppRoute::StudentNotices,
        Role::Faculty => AppRoute::FacultyNotices,
        Role::Admin => AppRoute::AdminNotices,
    }
}

/// The role's own variant of a page. Without a role every gated page is
/// refused the same way, so any of them gives the right decision.
fn role_page(state: &AuthState, page: fn(Role) -> AppRoute) -> AppRoute {
    page(state.role.unwrap_or(Role::Student))
}

/// Message for a refused command.
pub fn refusal(target: RedirectTarget) -> String {
    match target {
        RedirectTarget::SignIn => AuthError::Unauthorized.user_message(),
        RedirectTarget::Unauthorized => AuthError::Forbidden.user_message(),
    }
}
