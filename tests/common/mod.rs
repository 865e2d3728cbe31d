use axum::body::Body;
use axum::http::{Request, StatusCode};
use campus::router::init_router;
use campus::testing::TestState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub fn valid_body() -> Value {
    json!({
        "email": "new.student@campus.edu",
        "password": "changeme123",
        "full_name": "Ravi Kumar",
        "role": "student",
        "department": "Computer Science",
        "enrollment_number": "CS-2024-001"
    })
}

/// Posts to the create-user procedure and returns status and JSON body.
pub async fn create_user(
    test: &TestState,
    authorization: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/functions/v1/admin-create-user")
        .header("content-type", "application/json");
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = init_router(test.state.clone())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
