//! Interactive shell hosting one [`AuthController`].
//!
//! Every line read counts as key-down activity. Commands pass through the route
//! guard before they run, so a user only reaches the pages of their own role.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use campus_auth::{
    ActivitySignal, AppRoute, AuthController, AuthState, RedirectTarget, RouteDecision,
    post_login_route,
};
use campus_client::services::{
    AuditService, BonafideService, NoticeService, ProfileService, ReceiptService, UserService,
};
use campus_client::{BackendClient, ObjectStorage};
use campus_models::{
    CreateBonafideRequestDto, CreateNoticeDto, CreateUserRequest, Email, FeeReceiptId, Role,
    UpdateProfileDto, UploadReceiptDto, UserId,
};
use chrono::NaiveDate;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::access::{Access, notices_page, refusal};
use crate::command::{HELP, ShellCommand};
use crate::render;

/// Page services, all sharing one backend connection.
#[derive(Clone)]
pub struct Portal {
    pub notices: NoticeService,
    pub bonafide: BonafideService,
    pub receipts: ReceiptService,
    pub audit: AuditService,
    pub users: UserService,
    pub profiles: ProfileService,
}

impl Portal {
    pub fn new(client: BackendClient, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            notices: NoticeService::new(client.clone()),
            bonafide: BonafideService::new(client.clone()),
            receipts: ReceiptService::new(client.clone(), storage),
            audit: AuditService::new(client.clone()),
            users: UserService::new(client.clone()),
            profiles: ProfileService::new(client),
        }
    }
}

pub struct Shell {
    controller: AuthController,
    portal: Portal,
}

impl Shell {
    pub fn new(controller: AuthController, portal: Portal) -> Self {
        Self { controller, portal }
    }

    pub async fn run(self) -> Result<()> {
        let notifier = self.watch_sign_out();
        let state = self.controller.settled().await;
        println!("{}", render::whoami(&state));
        println!("Type 'help' for a list of commands.");

        loop {
            let label = prompt_label(&self.controller.state());
            let line = blocking(move || {
                Input::<String>::new()
                    .with_prompt(label)
                    .allow_empty(true)
                    .interact_text()
            })
            .await?;
            self.controller.record_activity(ActivitySignal::KeyDown);

            match ShellCommand::parse(&line) {
                Ok(None) => continue,
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.dispatch(command).await {
                        println!("Error: {:#}", e);
                    }
                }
                Err(e) => println!("{}", e),
            }
        }

        notifier.abort();
        self.controller.shutdown().await;
        Ok(())
    }

    /// Tells the user when the session ends without them asking, e.g. on idle timeout.
    fn watch_sign_out(&self) -> JoinHandle<()> {
        let mut updates = self.controller.subscribe();
        tokio::spawn(async move {
            let mut signed_in = updates.borrow_and_update().is_signed_in();
            while updates.changed().await.is_ok() {
                let now = updates.borrow_and_update().is_signed_in();
                if signed_in && !now {
                    println!("\nYou have been signed out.");
                }
                signed_in = now;
            }
        })
    }

    /// Runs the guard for `command`, waiting out a pending decision once.
    async fn authorize(&self, command: &ShellCommand) -> Option<AuthState> {
        let mut state = self.controller.state();
        let mut decision = Access::for_command(command, &state).check(&state);
        if decision == RouteDecision::Pending {
            state = self.controller.settled().await;
            decision = Access::for_command(command, &state).check(&state);
        }
        match decision {
            RouteDecision::Allow => Some(state),
            RouteDecision::Redirect(target) => {
                println!("{}", refusal(target));
                if target == RedirectTarget::SignIn {
                    println!("Use 'login' to sign in.");
                }
                None
            }
            RouteDecision::Pending => {
                println!("Still loading your account, try again in a moment.");
                None
            }
        }
    }

    pub async fn dispatch(&self, command: ShellCommand) -> Result<()> {
        let Some(state) = self.authorize(&command).await else {
            return Ok(());
        };
        debug!(?command, "running command");

        match command {
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => {}
            ShellCommand::Login => self.login(&state).await?,
            ShellCommand::Logout => self.controller.sign_out().await,
            ShellCommand::Whoami => println!("{}", render::whoami(&state)),
            ShellCommand::Menu => match state.role {
                Some(role) => println!("{}", render::menu(role)),
                None => println!("Sign in to see your pages."),
            },
            ShellCommand::Go(route) => self.show_page(route, &state).await?,
            ShellCommand::Dashboard => {
                if let Some(role) = state.role {
                    self.show_page(AppRoute::home_for(role), &state).await?;
                }
            }
            ShellCommand::Notices => {
                if let Some(role) = state.role {
                    self.show_page(notices_page(role), &state).await?;
                }
            }
            ShellCommand::NewNotice => self.new_notice(user(&state)?).await?,
            ShellCommand::DeleteNotice(id) => {
                self.portal.notices.delete(id).await?;
                println!("Notice deleted.");
            }
            ShellCommand::MyRequests | ShellCommand::PendingRequests => {
                let requests = self.portal.bonafide.list().await?;
                println!("{}", render::requests(&requests));
            }
            ShellCommand::NewRequest => self.new_request(user(&state)?).await?,
            ShellCommand::Review {
                id,
                decision,
                remarks,
            } => {
                let request = self
                    .portal
                    .bonafide
                    .review(id, decision, &remarks, user(&state)?)
                    .await?;
                println!("Request {} is now {}.", request.id, request.status.as_str());
            }
            ShellCommand::MyReceipts | ShellCommand::AllReceipts => {
                let receipts = self.portal.receipts.list().await?;
                println!("{}", render::receipts(&receipts));
            }
            ShellCommand::UploadReceipt(path) => self.upload_receipt(user(&state)?, &path).await?,
            ShellCommand::DownloadReceipt { id, dest } => self.download_receipt(id, dest).await?,
            ShellCommand::Users => {
                let users = self.portal.users.list().await?;
                println!("{}", render::users(&users));
            }
            ShellCommand::NewUser => self.new_user().await?,
            ShellCommand::Audit(search) => {
                let logs = self.portal.audit.list(&search).await?;
                println!("{}", render::audit(&logs));
            }
            ShellCommand::Profile => {
                let record = self.portal.profiles.get(user(&state)?).await?;
                let profile = record.profile;
                println!("Name: {}", profile.full_name);
                println!("Department: {}", profile.department.as_deref().unwrap_or("-"));
                if let Some(enrollment) = &profile.enrollment_number {
                    println!("Enrollment number: {}", enrollment);
                }
            }
            ShellCommand::EditProfile => self.edit_profile(user(&state)?).await?,
        }
        Ok(())
    }

    async fn show_page(&self, route: AppRoute, state: &AuthState) -> Result<()> {
        match route {
            AppRoute::Root | AppRoute::Login => self.login(state).await?,
            AppRoute::Unauthorized => println!("{}", refusal(RedirectTarget::Unauthorized)),
            AppRoute::StudentDashboard | AppRoute::FacultyDashboard | AppRoute::AdminDashboard => {
                let name = state
                    .profile
                    .as_ref()
                    .map(|p| p.full_name.as_str())
                    .unwrap_or("there");
                println!("Welcome, {}.", name);
                if let Some(role) = state.role {
                    println!("{}", render::menu(role));
                }
            }
            AppRoute::StudentNotices | AppRoute::FacultyNotices => {
                let audience = state.role;
                let notices = self.portal.notices.list(audience).await?;
                println!("{}", render::notices(&notices));
            }
            AppRoute::AdminNotices => {
                let notices = self.portal.notices.list(None).await?;
                println!("{}", render::notices(&notices));
            }
            AppRoute::StudentBonafide | AppRoute::FacultyRequests => {
                let requests = self.portal.bonafide.list().await?;
                println!("{}", render::requests(&requests));
            }
            AppRoute::StudentReceipts | AppRoute::AdminReceipts => {
                let receipts = self.portal.receipts.list().await?;
                println!("{}", render::receipts(&receipts));
            }
            AppRoute::AdminUsers => {
                let users = self.portal.users.list().await?;
                println!("{}", render::users(&users));
            }
            AppRoute::AdminAudit => {
                let logs = self.portal.audit.list("").await?;
                println!("{}", render::audit(&logs));
            }
        }
        Ok(())
    }

    async fn login(&self, state: &AuthState) -> Result<()> {
        if let Some(home) = post_login_route(state) {
            println!("Already signed in. Your home page is {}.", home);
            return Ok(());
        }

        let email = blocking(|| Input::<String>::new().with_prompt("Email").interact_text()).await?;
        let password = blocking(|| Password::new().with_prompt("Password").interact()).await?;
        self.controller.record_activity(ActivitySignal::KeyDown);

        if let Err(e) = self.controller.sign_in(&email, &password).await {
            println!("{}", e.user_message());
            return Ok(());
        }

        let state = self
            .controller
            .wait_until(|s| s.is_signed_in() && !s.loading())
            .await;
        match post_login_route(&state) {
            Some(home) => {
                println!("{}", render::whoami(&state));
                println!("Home page: {}", home);
            }
            None => println!("{}", render::whoami(&state)),
        }
        Ok(())
    }

    async fn new_notice(&self, author: UserId) -> Result<()> {
        let title = blocking(|| Input::<String>::new().with_prompt("Title").interact_text()).await?;
        let content =
            blocking(|| Input::<String>::new().with_prompt("Content").interact_text()).await?;
        let labels: Vec<&'static str> = Role::ALL.iter().map(Role::label).collect();
        let picked = blocking(move || {
            MultiSelect::new()
                .with_prompt("Audience (space to toggle)")
                .items(&labels)
                .interact()
        })
        .await?;

        let dto = CreateNoticeDto {
            title,
            content,
            target_audience: picked.into_iter().map(|i| Role::ALL[i]).collect(),
        };
        let notice = self.portal.notices.create(author, dto).await?;
        println!("Notice published ({}).", notice.id);
        Ok(())
    }

    async fn new_request(&self, student: UserId) -> Result<()> {
        let purpose =
            blocking(|| Input::<String>::new().with_prompt("Purpose").interact_text()).await?;
        let date_needed = blocking(|| {
            Input::<String>::new()
                .with_prompt("Date needed (YYYY-MM-DD)")
                .validate_with(|input: &String| parse_date(input).map(|_| ()))
                .interact_text()
        })
        .await?;

        let dto = CreateBonafideRequestDto {
            purpose,
            date_needed: parse_date(&date_needed).map_err(anyhow::Error::msg)?,
        };
        let request = self.portal.bonafide.submit(student, dto).await?;
        println!("Request submitted ({}).", request.id);
        Ok(())
    }

    async fn upload_receipt(&self, uploader: UserId, path: &Path) -> Result<()> {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("receipt path has no file name")?;

        let students = self.portal.users.list_students().await?;
        if students.is_empty() {
            println!("No students to attach the receipt to.");
            return Ok(());
        }
        let names: Vec<String> = students
            .iter()
            .map(|s| {
                let enrollment = s
                    .profile
                    .as_ref()
                    .and_then(|p| p.enrollment_number.as_deref())
                    .unwrap_or("-");
                format!("{} ({})", s.display_name(), enrollment)
            })
            .collect();
        let picked = blocking(move || {
            Select::new()
                .with_prompt("Student")
                .items(&names)
                .default(0)
                .interact()
        })
        .await?;

        let default_name = file_name.clone();
        let receipt_name = blocking(move || {
            Input::<String>::new()
                .with_prompt("Receipt name")
                .default(default_name)
                .interact_text()
        })
        .await?;
        let amount = blocking(|| Input::<f64>::new().with_prompt("Amount").interact_text()).await?;

        let dto = UploadReceiptDto {
            student_id: students[picked].user_id,
            receipt_name,
            amount,
            file_name,
        };
        let receipt = self.portal.receipts.upload(uploader, dto, content).await?;
        println!("Receipt uploaded ({}).", receipt.id);
        Ok(())
    }

    async fn download_receipt(&self, id: FeeReceiptId, dest: Option<PathBuf>) -> Result<()> {
        let (receipt, content) = self.portal.receipts.download(id).await?;
        let dest = dest.unwrap_or_else(|| PathBuf::from(receipt.download_name()));
        tokio::fs::write(&dest, content)
            .await
            .with_context(|| format!("could not write {}", dest.display()))?;
        println!("Saved {}.", dest.display());
        Ok(())
    }

    async fn new_user(&self) -> Result<()> {
        let email = blocking(|| {
            Input::<String>::new()
                .with_prompt("Email")
                .validate_with(|input: &String| Email::new(input.as_str()).map(|_| ()))
                .interact_text()
        })
        .await?;
        let password = blocking(|| {
            Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords don't match")
                .interact()
        })
        .await?;
        let full_name =
            blocking(|| Input::<String>::new().with_prompt("Full name").interact_text()).await?;
        let labels: Vec<&'static str> = Role::ALL.iter().map(Role::label).collect();
        let picked = blocking(move || {
            Select::new()
                .with_prompt("Role")
                .items(&labels)
                .default(0)
                .interact()
        })
        .await?;
        let role = Role::ALL[picked];
        let department = optional_input("Department (optional)").await?;
        let enrollment_number = if role == Role::Student {
            optional_input("Enrollment number (optional)").await?
        } else {
            None
        };

        let request = CreateUserRequest {
            email: Email::new(email)?,
            password,
            full_name,
            role,
            department,
            enrollment_number,
        };
        let user_id = self.portal.users.create(request).await?;
        println!("User created ({}).", user_id);
        Ok(())
    }

    async fn edit_profile(&self, user_id: UserId) -> Result<()> {
        let current = self.portal.profiles.get(user_id).await?.profile;

        let name = current.full_name.clone();
        let full_name = blocking(move || {
            Input::<String>::new()
                .with_prompt("Full name")
                .default(name)
                .interact_text()
        })
        .await?;
        let department = current.department.clone().unwrap_or_default();
        let department = blocking(move || {
            Input::<String>::new()
                .with_prompt("Department")
                .default(department)
                .allow_empty(true)
                .interact_text()
        })
        .await?;

        let confirmed = blocking(|| {
            Confirm::new()
                .with_prompt("Save changes?")
                .default(true)
                .interact()
        })
        .await?;
        if !confirmed {
            return Ok(());
        }

        let dto = UpdateProfileDto {
            full_name,
            department: Some(department),
            enrollment_number: current.enrollment_number,
        };
        self.portal.profiles.update_own(user_id, dto).await?;
        println!("Profile updated.");
        Ok(())
    }
}

fn user(state: &AuthState) -> Result<UserId> {
    state.user_id().context("not signed in")
}

fn prompt_label(state: &AuthState) -> String {
    match (&state.session, state.role) {
        (Some(_), Some(role)) => format!("campus ({})", role.as_str()),
        (Some(_), None) => "campus (no role)".to_string(),
        (None, _) => "campus".to_string(),
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| "Enter a date as YYYY-MM-DD".to_string())
}

async fn optional_input(prompt: &'static str) -> Result<Option<String>> {
    let value = blocking(move || {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await?;
    Ok(Some(value).filter(|v| !v.trim().is_empty()))
}

/// Runs a terminal prompt off the async runtime so the controller keeps running.
async fn blocking<T, F>(prompt: F) -> Result<T>
where
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(prompt).await??)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_auth::AuthPhase;
    use campus_auth::testing::session_for;

    #[test]
    fn test_prompt_label() {
        assert_eq!(prompt_label(&AuthState::anonymous()), "campus");
        let state = AuthState {
            session: Some(session_for(UserId::from_u128(1))),
            role: Some(Role::Admin),
            profile: None,
            phase: AuthPhase::Ready,
            resolution_error: None,
        };
        assert_eq!(prompt_label(&state), "campus (admin)");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2026-03-01 "),
            Ok(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
        );
        assert!(parse_date("01/03/2026").is_err());
    }
}
