use crate::modules::users::controller::create_user;
use crate::state::AppState;
use axum::{Router, routing::post};

/// Privileged procedures, mounted under `/functions/v1`.
pub fn init_functions_router() -> Router<AppState> {
    Router::new().route("/admin-create-user", post(create_user))
}
