use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use campus_core::AppError;
use campus_models::first_validation_message;
use serde::de::DeserializeOwned;
use validator::Validate;

const TARGET_PREFIX: &str = "into the target type: ";

/// Strips axum's preamble and serde's trailing position from a body error.
fn deserialize_detail(message: &str) -> &str {
    let detail = message
        .split_once(TARGET_PREFIX)
        .map_or(message, |(_, rest)| rest);
    detail
        .rsplit_once(" at line ")
        .map_or(detail, |(head, _)| head)
}

fn rejection_message(rejection: &JsonRejection) -> String {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return "Missing 'Content-Type: application/json' header".to_string();
    }

    let body = rejection.body_text();

    if let Some(field) = body
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return format!("{} is required", field);
    }

    if body.contains("unknown variant") {
        let detail = deserialize_detail(&body);
        let field = detail
            .split_once(": unknown variant")
            .map_or("value", |(path, _)| path);
        return format!("Invalid {}", field);
    }

    if body.contains("invalid type") {
        return "Invalid field type in request".to_string();
    }

    if matches!(rejection, JsonRejection::JsonDataError(_)) {
        return deserialize_detail(&body).to_string();
    }

    "Invalid request body".to_string()
}

/// JSON body that is rejected with a 400 unless it parses and validates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::new(StatusCode::BAD_REQUEST, anyhow!(rejection_message(&rejection)))
            })?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                anyhow!(first_validation_message(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}
