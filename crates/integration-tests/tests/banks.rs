//! Bank directory and account lookup.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use marketplace_integration_tests::{KNOWN_ACCOUNT, TestApp};

#[tokio::test]
async fn unconfigured_provider_is_unavailable() {
    let app = TestApp::new();

    let (status, body) = app.get("/banks", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Bank service is not available");

    let token = app.register("ada@example.com", "08031234567").await;
    let (status, _) = app
        .post(
            "/banks/verify",
            Some(&token),
            json!({ "account_number": KNOWN_ACCOUNT, "bank_code": "044" }),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn lists_banks() {
    let app = TestApp::with_bank();

    let (status, body) = app.get("/banks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["code"], "044");
}

#[tokio::test]
async fn verifies_an_account() {
    let app = TestApp::with_bank();
    let token = app.register("ada@example.com", "08031234567").await;

    let (status, body) = app
        .post(
            "/banks/verify",
            Some(&token),
            json!({ "account_number": KNOWN_ACCOUNT, "bank_code": "044" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account_name"], "Forrest Green");

    let (status, body) = app
        .post(
            "/banks/verify",
            Some(&token),
            json!({ "account_number": "0000000000", "bank_code": "044" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Bank account verification failed");

    let (status, _) = app
        .post("/banks/verify", Some(&token), json!({ "bank_code": "044" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_requires_a_token() {
    let app = TestApp::with_bank();

    let (status, _) = app
        .post(
            "/banks/verify",
            None,
            json!({ "account_number": KNOWN_ACCOUNT, "bank_code": "044" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
