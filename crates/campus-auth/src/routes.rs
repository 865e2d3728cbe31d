//! Portal route table.

use campus_models::Role;
use std::fmt;

use crate::guard::{RedirectTarget, RouteDecision, decide};
use crate::state::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    Root,
    Login,
    Unauthorized,
    StudentDashboard,
    StudentBonafide,
    StudentReceipts,
    StudentNotices,
    FacultyDashboard,
    FacultyRequests,
    FacultyNotices,
    AdminDashboard,
    AdminUsers,
    AdminNotices,
    AdminReceipts,
    AdminAudit,
}

const STUDENT: &[Role] = &[Role::Student];
const FACULTY: &[Role] = &[Role::Faculty];
const ADMIN: &[Role] = &[Role::Admin];

impl AppRoute {
    pub const ALL: [AppRoute; 15] = [
        AppRoute::Root,
        AppRoute::Login,
        AppRoute::Unauthorized,
        AppRoute::StudentDashboard,
        AppRoute::StudentBonafide,
        AppRoute::StudentReceipts,
        AppRoute::StudentNotices,
        AppRoute::FacultyDashboard,
        AppRoute::FacultyRequests,
        AppRoute::FacultyNotices,
        AppRoute::AdminDashboard,
        AppRoute::AdminUsers,
        AppRoute::AdminNotices,
        AppRoute::AdminReceipts,
        AppRoute::AdminAudit,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            AppRoute::Root => "/",
            AppRoute::Login => "/login",
            AppRoute::Unauthorized => "/unauthorized",
            AppRoute::StudentDashboard => "/student",
            AppRoute::StudentBonafide => "/student/bonafide",
            AppRoute::StudentReceipts => "/student/receipts",
            AppRoute::StudentNotices => "/student/notices",
            AppRoute::FacultyDashboard => "/faculty",
            AppRoute::FacultyRequests => "/faculty/requests",
            AppRoute::FacultyNotices => "/faculty/notices",
            AppRoute::AdminDashboard => "/admin",
            AppRoute::AdminUsers => "/admin/users",
            AppRoute::AdminNotices => "/admin/notices",
            AppRoute::AdminReceipts => "/admin/receipts",
            AppRoute::AdminAudit => "/admin/audit",
        }
    }

    /// Exact match, ignoring one trailing slash. Unknown paths are `None`.
    pub fn from_path(path: &str) -> Option<AppRoute> {
        let path = path.trim();
        let normalized = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Roles allowed on the route. Empty for public routes.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            AppRoute::Root | AppRoute::Login | AppRoute::Unauthorized => &[],
            AppRoute::StudentDashboard
            | AppRoute::StudentBonafide
            | AppRoute::StudentReceipts
            | AppRoute::StudentNotices => STUDENT,
            AppRoute::FacultyDashboard | AppRoute::FacultyRequests | AppRoute::FacultyNotices => {
                FACULTY
            }
            AppRoute::AdminDashboard
            | AppRoute::AdminUsers
            | AppRoute::AdminNotices
            | AppRoute::AdminReceipts
            | AppRoute::AdminAudit => ADMIN,
        }
    }

    pub fn is_public(&self) -> bool {
        self.required_roles().is_empty()
    }

    /// Landing page after sign-in.
    pub fn home_for(role: Role) -> AppRoute {
        match role {
            Role::Admin => AppRoute::AdminDashboard,
            Role::Faculty => AppRoute::FacultyDashboard,
            Role::Student => AppRoute::StudentDashboard,
        }
    }

    /// Routes a role may open, in menu order.
    pub fn menu_for(role: Role) -> Vec<AppRoute> {
        Self::ALL
            .into_iter()
            .filter(|route| route.required_roles().contains(&role))
            .collect()
    }
}

impl fmt::Display for AppRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Post-login landing extension for [`Role`].
pub trait RoleHome {
    fn home_route(&self) -> AppRoute;
}

impl RoleHome for Role {
    fn home_route(&self) -> AppRoute {
        AppRoute::home_for(*self)
    }
}

/// Guard decision for navigating to `route`.
///
/// `/` always forwards to the sign-in page; the other public routes always allow.
pub fn guard(state: &AuthState, route: AppRoute) -> RouteDecision {
    match route {
        AppRoute::Root => RouteDecision::Redirect(RedirectTarget::SignIn),
        route if route.is_public() => RouteDecision::Allow,
        route => decide(state, route.required_roles()),
    }
}

/// Where the sign-in page should send a user who is already signed in.
pub fn post_login_route(state: &AuthState) -> Option<AppRoute> {
    if state.loading() || state.session.is_none() {
        return None;
    }
    state.role.map(AppRoute::home_for)
}
