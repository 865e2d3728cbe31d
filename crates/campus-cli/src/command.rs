//! Shell command grammar.
//!
//! Every command that shows or changes portal data belongs to exactly one page
//! ([`AppRoute`]), so the shell can run it through the route guard first.

use std::path::PathBuf;

use campus_auth::AppRoute;
use campus_models::{BonafideRequestId, FeeReceiptId, NoticeId, ReviewDecision};

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    Quit,
    Login,
    Logout,
    Whoami,
    Menu,
    /// Navigate to a page by path and show it.
    Go(AppRoute),
    Dashboard,
    Notices,
    NewNotice,
    DeleteNotice(NoticeId),
    MyRequests,
    NewRequest,
    PendingRequests,
    Review {
        id: BonafideRequestId,
        decision: ReviewDecision,
        remarks: String,
    },
    MyReceipts,
    AllReceipts,
    UploadReceipt(PathBuf),
    DownloadReceipt {
        id: FeeReceiptId,
        dest: Option<PathBuf>,
    },
    Users,
    NewUser,
    Audit(String),
    Profile,
    EditProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a valid id")]
    InvalidId(String),

    #[error("No page at '{0}'")]
    UnknownPage(String),
}

pub const HELP: &str = "\
Commands:
  login | logout | whoami | menu | help | quit
  go <path>                          open a page, e.g. go /admin/users
  dashboard                          your home page
  notices                            notices for your role
  notice new | notice delete <id>    manage notices (admin)
  requests                           your bonafide requests (student)
  request new                        request a bonafide certificate (student)
  review                             pending requests (faculty)
  review <id> approve|reject [remarks]
  receipts                           your fee receipts (student)
  receipts all                       every fee receipt (admin)
  receipt upload <file>              upload a receipt (admin)
  receipt download <id> [dest]       save a receipt file
  users | user new                   manage users (admin)
  audit [search]                     audit log (admin)
  profile | profile edit             your profile";

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (head.to_lowercase().as_str(), args.as_slice()) {
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            ("login", []) => Self::Login,
            ("logout", []) => Self::Logout,
            ("whoami", []) => Self::Whoami,
            ("menu", []) => Self::Menu,
            ("go", [path]) => Self::Go(
                AppRoute::from_path(path).ok_or_else(|| ParseError::UnknownPage(path.to_string()))?,
            ),
            ("go", _) => return Err(ParseError::Usage("go <path>")),
            ("dashboard" | "home", []) => Self::Dashboard,
            ("notices", []) => Self::Notices,
            ("notice", ["new"]) => Self::NewNotice,
            ("notice", ["delete", id]) => Self::DeleteNotice(parse_id(id)?),
            ("notice", _) => return Err(ParseError::Usage("notice new | notice delete <id>")),
            ("requests", []) => Self::MyRequests,
            ("request", ["new"]) => Self::NewRequest,
            ("request", _) => return Err(ParseError::Usage("request new")),
            ("review", []) => Self::PendingRequests,
            ("review", [id, decision, remarks @ ..]) => Self::Review {
                id: parse_id(id)?,
                decision: parse_decision(decision)?,
                remarks: remarks.join(" "),
            },
            ("review", _) => {
                return Err(ParseError::Usage("review <id> approve|reject [remarks]"));
            }
            ("receipts", []) => Self::MyReceipts,
            ("receipts", ["all"]) => Self::AllReceipts,
            ("receipt", ["upload", file]) => Self::UploadReceipt(PathBuf::from(file)),
            ("receipt", ["download", id]) => Self::DownloadReceipt {
                id: parse_id(id)?,
                dest: None,
            },
            ("receipt", ["download", id, dest]) => Self::DownloadReceipt {
                id: parse_id(id)?,
                dest: Some(PathBuf::from(dest)),
            },
            ("receipt", _) => {
                return Err(ParseError::Usage(
                    "receipt upload <file> | receipt download <id> [dest]",
                ));
            }
            ("users", []) => Self::Users,
            ("user", ["new"]) => Self::NewUser,
            ("user", _) => return Err(ParseError::Usage("user new")),
            ("audit", search) => Self::Audit(search.join(" ")),
            ("profile", []) => Self::Profile,
            ("profile", ["edit"]) => Self::EditProfile,
            ("profile", _) => return Err(ParseError::Usage("profile | profile edit")),
            (other, _) => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    /// Page the command belongs to. `None` for commands that need no page,
    /// and for the dashboard, whose page depends on the signed-in role.
    pub fn route(&self) -> Option<AppRoute> {
        match self {
            Self::Help
            | Self::Quit
            | Self::Login
            | Self::Logout
            | Self::Whoami
            | Self::Menu
            | Self::Dashboard
            | Self::Notices => None,
            Self::Go(route) => Some(*route),
            Self::NewNotice | Self::DeleteNotice(_) => Some(AppRoute::AdminNotices),
            Self::MyRequests | Self::NewRequest => Some(AppRoute::StudentBonafide),
            Self::PendingRequests | Self::Review { .. } => Some(AppRoute::FacultyRequests),
            Self::MyReceipts => Some(AppRoute::StudentReceipts),
            Self::AllReceipts | Self::UploadReceipt(_) => Some(AppRoute::AdminReceipts),
            Self::DownloadReceipt { .. } => None,
            Self::Users | Self::NewUser => Some(AppRoute::AdminUsers),
            Self::Audit(_) => Some(AppRoute::AdminAudit),
            Self::Profile | Self::EditProfile => None,
        }
    }
}

fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T, ParseError> {
    raw.parse().map_err(|_| ParseError::InvalidId(raw.to_string()))
}

fn parse_decision(raw: &str) -> Result<ReviewDecision, ParseError> {
    match raw.to_lowercase().as_str() {
        "approve" | "approved" => Ok(ReviewDecision::Approve),
        "reject" | "rejected" => Ok(ReviewDecision::Reject),
        _ => Err(ParseError::Usage("review <id> approve|reject [remarks]")),
    }
}
