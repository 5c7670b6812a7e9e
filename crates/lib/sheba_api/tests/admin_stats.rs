//! Integration tests for the role-gated admin stats endpoint.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn stats_requires_an_admin_bearer_token() {
    let app = TestApp::spawn().await;

    // No token at all.
    let (status, _) = app.get("/api/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage token.
    let (status, _) = app.get("/api/admin/stats", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A plain user is authenticated but not authorized.
    let (status, body) = app
        .post(
            "/api/auth/register",
            json!({
                "name": "Plain",
                "email": "plain@example.com",
                "password": "password123",
                "role": "user",
                "phone": "+8801712345670"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_token = body["token"].as_str().expect("token").to_string();

    let (status, _) = app.get("/api/admin/stats", Some(&user_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin gets the counts.
    let (status, body) = app
        .post(
            "/api/auth/register",
            json!({
                "name": "Boss",
                "email": "boss@example.com",
                "password": "password123",
                "role": "admin",
                "phone": "+8801712345671"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let admin_token = body["token"].as_str().expect("token").to_string();

    // One outstanding OTP so the count is non-zero.
    let (status, _) = app
        .post("/api/auth/request-otp", json!({"phone": "+8801712345672"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/admin/stats", Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], 2);
    assert_eq!(body["workers"], 0);
    assert_eq!(body["events"], 0);
    assert_eq!(body["otps"], 1);

    app.stop().await;
}
