//! Integration tests for the OTP request/verify flow.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;

const PHONE: &str = "+8801712345678";

/// Pull the 6-digit code out of a recorded SMS message.
fn code_from_message(message: &str) -> String {
    message
        .rsplit(' ')
        .next()
        .expect("code suffix")
        .to_string()
}

#[tokio::test]
async fn request_verify_and_replay() {
    let app = TestApp::spawn().await;

    // Missing phone is a 400.
    let (status, _) = app.post("/api/auth/request-otp", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Request a code.
    let (status, body) = app
        .post("/api/auth/request-otp", json!({"phone": PHONE}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], PHONE);
    assert_eq!(body["ttl"], 300);

    // Exactly one gateway send, carrying the issued code.
    let messages = app.sms.messages_for(PHONE);
    assert_eq!(messages.len(), 1);
    let code = code_from_message(&messages[0]);
    assert_eq!(code.len(), 6);

    // A non-matching code is rejected.
    let wrong_code = if code == "000000" { "000001" } else { "000000" };
    let (status, body) = app
        .post(
            "/api/auth/verify-otp",
            json!({"phone": PHONE, "code": wrong_code}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired OTP");

    // The right code logs in and auto-provisions a user.
    let (status, body) = app
        .post("/api/auth/verify-otp", json!({"phone": PHONE, "code": code}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    assert_eq!(body["phone"], PHONE);
    assert_eq!(body["email"], format!("{PHONE}@noemail.local"));
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let user_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE phone = $1")
        .bind(PHONE)
        .fetch_one(&app.pool)
        .await
        .expect("count users");
    assert_eq!(user_rows, 1);

    // The code is consumed...
    let used: bool = sqlx::query_scalar("SELECT used FROM otp_codes WHERE phone = $1 AND code = $2")
        .bind(PHONE)
        .bind(&code)
        .fetch_one(&app.pool)
        .await
        .expect("fetch used");
    assert!(used);

    // ...so replaying it fails, and no second user appears.
    let (status, body) = app
        .post("/api/auth/verify-otp", json!({"phone": PHONE, "code": code}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired OTP");

    let user_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE phone = $1")
        .bind(PHONE)
        .fetch_one(&app.pool)
        .await
        .expect("count users");
    assert_eq!(user_rows, 1);

    app.stop().await;
}

#[tokio::test]
async fn eleventh_request_within_an_hour_is_rate_limited() {
    let app = TestApp::spawn().await;

    for i in 0..10 {
        let (status, _) = app
            .post("/api/auth/request-otp", json!({"phone": PHONE}))
            .await;
        assert_eq!(status, StatusCode::OK, "request {} should pass", i + 1);
    }

    let (status, body) = app
        .post("/api/auth/request-otp", json!({"phone": PHONE}))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");

    // Ten distinct rows, ten gateway sends — the 11th created nothing.
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM otp_codes WHERE phone = $1")
        .bind(PHONE)
        .fetch_one(&app.pool)
        .await
        .expect("count codes");
    assert_eq!(rows, 10);
    assert_eq!(app.sms.messages_for(PHONE).len(), 10);

    let distinct: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT id) FROM otp_codes WHERE phone = $1")
            .bind(PHONE)
            .fetch_one(&app.pool)
            .await
            .expect("distinct codes");
    assert_eq!(distinct, 10);

    app.stop().await;
}

#[tokio::test]
async fn expired_code_fails_and_stays_unused() {
    let app = TestApp::spawn().await;

    // Plant a code that expired a minute ago.
    let expired_at = Utc::now() - Duration::seconds(60);
    let record = sheba_core::otp::queries::create(&app.pool, PHONE, "123456", expired_at)
        .await
        .expect("insert code");

    let (status, body) = app
        .post(
            "/api/auth/verify-otp",
            json!({"phone": PHONE, "code": "123456"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "OTP expired");

    // The row is left unused.
    let used: bool = sqlx::query_scalar("SELECT used FROM otp_codes WHERE id = $1")
        .bind(record.id)
        .fetch_one(&app.pool)
        .await
        .expect("fetch used");
    assert!(!used);

    // And no user was provisioned for the phone.
    let user_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE phone = $1")
        .bind(PHONE)
        .fetch_one(&app.pool)
        .await
        .expect("count users");
    assert_eq!(user_rows, 0);

    app.stop().await;
}
