use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn unauthorized(message: String) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message))
    }

    pub fn forbidden(message: String) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message))
    }

    pub fn internal_error(message: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow::anyhow!(message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

/// Authentication and authorization failures.
///
/// The `Display` text of every variant is the message shown to the user. No variant
/// carries backend error text, so nothing from the identity service leaks through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("Invalid credentials. Please try again.")]
    InvalidCredentials,

    /// The sign-in form failed local validation.
    #[error("{0}")]
    InvalidInput(String),

    /// No session where one is required.
    #[error("Please sign in to continue.")]
    Unauthorized,

    /// Signed in, but the role does not grant access.
    #[error("You do not have permission to access this page.")]
    Forbidden,

    /// Role/profile lookup did not finish in time.
    #[error("Your account details could not be loaded in time.")]
    ResolutionTimeout,

    /// Role/profile lookup failed.
    #[error("Your account details could not be loaded.")]
    ResolutionFailed,

    /// Anything else that went wrong talking to the identity service.
    #[error("An unexpected error occurred. Please try again.")]
    Unexpected,
}

impl AuthError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Failure of a remote CRUD or storage call.
///
/// Unlike [`AuthError`], the backend's message is kept: it is safe to show for
/// ordinary data operations and helps the user correct the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Network failure or the service could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with an error status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from service: {0}")]
    Decode(String),

    /// The call needs a signed-in user.
    #[error("Not signed in")]
    NoSession,
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}
