//! Plain-text rendering of portal records.

use campus_auth::{AppRoute, AuthPhase, AuthState};
use campus_models::{AuditLog, BonafideRequest, FeeReceipt, Notice, Role, UserSummary};
use chrono::{DateTime, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

pub fn whoami(state: &AuthState) -> String {
    match (&state.session, state.phase) {
        (_, AuthPhase::Bootstrapping) => "Checking for a saved session...".to_string(),
        (None, _) => "Not signed in.".to_string(),
        (Some(session), phase) => {
            let email = session.email.as_deref().unwrap_or("(unknown email)");
            let name = state
                .profile
                .as_ref()
                .map(|p| p.full_name.as_str())
                .unwrap_or("(no profile)");
            let role = match (state.role, phase) {
                (_, AuthPhase::PendingProfile) => "loading...".to_string(),
                (Some(role), _) => role.label().to_string(),
                (None, _) => "none".to_string(),
            };
            let mut out = format!("{} <{}>\nRole: {}\nUser id: {}", name, email, role, session.user_id);
            if let Some(error) = &state.resolution_error {
                out.push_str(&format!("\n{}", error.user_message()));
            }
            out
        }
    }
}

pub fn menu(role: Role) -> String {
    AppRoute::menu_for(role)
        .into_iter()
        .map(|route| format!("  {}", route.path()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn notices(notices: &[Notice]) -> String {
    if notices.is_empty() {
        return "No notices.".to_string();
    }
    notices
        .iter()
        .map(|n| {
            let audience = n
                .target_audience
                .iter()
                .map(Role::label)
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "[{}] {}  ({})\n  {}\n  id: {}",
                timestamp(&n.created_at),
                n.title,
                audience,
                n.content,
                n.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn requests(requests: &[BonafideRequest]) -> String {
    if requests.is_empty() {
        return "No requests.".to_string();
    }
    requests
        .iter()
        .map(|r| {
            let mut line = format!(
                "{}  {:<8}  needed {}  {}",
                r.id,
                r.status.as_str(),
                r.date_needed,
                r.purpose
            );
            if let Some(remarks) = &r.remarks {
                line.push_str(&format!("\n    remarks: {}", remarks));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn receipts(receipts: &[FeeReceipt]) -> String {
    if receipts.is_empty() {
        return "No receipts.".to_string();
    }
    receipts
        .iter()
        .map(|r| {
            format!(
                "{}  {:>10.2}  {}  {}",
                r.id,
                r.amount,
                timestamp(&r.created_at),
                r.receipt_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn users(users: &[UserSummary]) -> String {
    if users.is_empty() {
        return "No users.".to_string();
    }
    users
        .iter()
        .map(|u| {
            let extra = u
                .profile
                .as_ref()
                .and_then(|p| p.enrollment_number.as_deref().or(p.department.as_deref()))
                .unwrap_or("");
            format!("{}  {:<7}  {}  {}", u.user_id, u.role.as_str(), u.display_name(), extra)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn audit(logs: &[AuditLog]) -> String {
    if logs.is_empty() {
        return "No audit entries.".to_string();
    }
    logs.iter()
        .map(|log| {
            let actor = log
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            let role = log.role.map(|r| r.as_str()).unwrap_or("-");
            let details = log
                .details
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_default();
            format!(
                "{}  {:<14}  {:<7}  {}  {}",
                timestamp(&log.created_at),
                log.action,
                role,
                actor,
                details
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
