mod common;

use axum::http::StatusCode;
use campus::testing::TestState;
use campus_models::{Role, UserId};
use common::{create_user, valid_body};
use serde_json::json;

const ADMIN: UserId = UserId::from_u128(1);
const FACULTY: UserId = UserId::from_u128(2);

fn with_admin() -> TestState {
    let test = TestState::new();
    test.provisioning.grant(ADMIN, Role::Admin);
    test.provisioning.grant(FACULTY, Role::Faculty);
    test
}

#[tokio::test]
async fn test_admin_creates_user() {
    let test = with_admin();
    let bearer = test.bearer(ADMIN);

    let (status, body) = create_user(&test, Some(&bearer), &valid_body().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let user_id: UserId = body["user_id"].as_str().unwrap().parse().unwrap();

    let provisioned = test.provisioning.provisioned();
    assert_eq!(provisioned.len(), 1);
    let user = &provisioned[0];
    assert_eq!(user.user_id, user_id);
    assert_eq!(user.role, Role::Student);
    assert_eq!(user.profile.full_name, "Ravi Kumar");
    assert_eq!(user.profile.enrollment_number.as_deref(), Some("CS-2024-001"));

    assert_eq!(user.audit.user_id, ADMIN);
    assert_eq!(user.audit.role, Role::Admin);
    assert_eq!(user.audit.action, "user_created");
    assert_eq!(user.audit.details["created_user_id"], json!(user_id));
    assert_eq!(user.audit.details["created_role"], "student");
    assert_eq!(user.audit.details["email"], "new.student@campus.edu");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let test = with_admin();

    let (status, body) = create_user(&test, None, &valid_body().to_string()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
    assert!(test.credentials.emails().is_empty());
}

#[tokio::test]
async fn test_bad_tokens_are_unauthorized() {
    let test = with_admin();
    let bearer = test.bearer(ADMIN);
    let raw = bearer.trim_start_matches("Bearer ").to_string();
    let wrong_scheme = format!("Token {}", raw);

    for header in ["Bearer not-a-jwt", raw.as_str(), wrong_scheme.as_str()] {
        let (status, body) = create_user(&test, Some(header), &valid_body().to_string()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", header);
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_token_signed_with_another_secret_is_unauthorized() {
    let test = with_admin();
    let forged = campus_auth::create_access_token(
        ADMIN,
        "caller@campus.edu",
        3600,
        &campus_config::JwtConfig {
            secret: "someone-else".to_string(),
        },
    )
    .unwrap();

    let (status, _) = create_user(
        &test,
        Some(&format!("Bearer {}", forged)),
        &valid_body().to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let test = with_admin();
    let bearer = test.bearer(FACULTY);

    let (status, body) = create_user(&test, Some(&bearer), &valid_body().to_string()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Forbidden: Admin access required" }));
    assert!(test.credentials.emails().is_empty());
}

#[tokio::test]
async fn test_user_without_role_record_is_forbidden() {
    let test = with_admin();
    let bearer = test.bearer(UserId::from_u128(99));

    let (status, _) = create_user(&test, Some(&bearer), &valid_body().to_string()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let test = with_admin();
    let bearer = test.bearer(ADMIN);
    let mut body = valid_body();
    body.as_object_mut().unwrap().remove("full_name");

    let (status, body) = create_user(&test, Some(&bearer), &body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "full_name is required");
}

#[tokio::test]
async fn test_invalid_role_is_bad_request() {
    let test = with_admin();
    let bearer = test.bearer(ADMIN);
    let mut body = valid_body();
    body["role"] = json!("dean");

    let (status, body) = create_user(&test, Some(&bearer), &body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid role");
    assert!(test.credentials.emails().is_empty());
}

#[tokio::test]
async fn test_short_password_is_bad_request() {
    let test = with_admin();
    let bearer = test.bearer(ADMIN);
    let mut body = valid_body();
    body["password"] = json!("short");

    let (status, body) = create_user(&test, Some(&bearer), &body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be 8-128 characters");
}

#[tokio::test]
async fn test_identity_rejection_is_reported() {
    let test = with_admin();
    test.credentials
        .reject_with("A user with this email address has already been registered");
    let bearer = test.bearer(ADMIN);

    let (status, body) = create_user(&test, Some(&bearer), &valid_body().to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "A user with this email address has already been registered"
    );
    assert!(test.provisioning.provisioned().is_empty());
}

#[tokio::test]
async fn test_record_failure_removes_credential() {
    let test = with_admin();
    test.provisioning.fail_provision(true);
    let bearer = test.bearer(ADMIN);

    let (status, body) = create_user(&test, Some(&bearer), &valid_body().to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create user records");
    assert_eq!(test.credentials.deleted().len(), 1);
    assert!(test.credentials.emails().is_empty());
}

#[tokio::test]
async fn test_blank_optionals_are_dropped() {
    let test = with_admin();
    let bearer = test.bearer(ADMIN);
    let mut body = valid_body();
    body["role"] = json!("faculty");
    body["enrollment_number"] = json!("  ");

    let (status, _) = create_user(&test, Some(&bearer), &body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    let provisioned = test.provisioning.provisioned();
    assert_eq!(provisioned[0].role, Role::Faculty);
    assert_eq!(provisioned[0].profile.enrollment_number, None);
}
