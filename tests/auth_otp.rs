use std::sync::Arc;

use reqwest::StatusCode;

pub mod common;
use common::helpers::{api_client, spawn_app, spawn_with_transport, test_email, FailingMailer};

#[tokio::test]
async fn send_otp_emails_a_code() {
    let app = spawn_app().await;
    let email = test_email();

    let res = app.post_send_otp(&email).await;

    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, email);
    assert!(app.mailer.last_otp_for(&email).is_some());
}

#[tokio::test]
async fn send_then_verify_works_once() {
    let app = spawn_app().await;
    let email = test_email();

    app.post_send_otp(&email).await;
    let code = app.mailer.last_otp_for(&email).unwrap();

    let res = app.post_verify_otp(&email, &code).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.post_verify_otp(&email, &code).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_code_can_be_retried() {
    let app = spawn_app().await;
    let email = test_email();

    app.post_send_otp(&email).await;
    let code = app.mailer.last_otp_for(&email).unwrap();
    let wrong = if code == "000000" { "000001" } else { "000000" };

    let res = app.post_verify_otp(&email, wrong).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.post_verify_otp(&email, &code).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn verify_without_send_fails() {
    let app = spawn_app().await;

    let res = app.post_verify_otp(&test_email(), "123456").await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_otp_rejects_invalid_email() {
    let app = spawn_app().await;

    let res = app.post_send_otp("not-an-email").await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["errors"]["email"].is_array());
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn verify_otp_rejects_malformed_code() {
    let app = spawn_app().await;

    let res = app.post_verify_otp(&test_email(), "12").await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = spawn_app().await;

    let res = app
        .api_client
        .post(&format!("{}/auth/otp/send", &app.address))
        .header("Content-Type", "application/json")
        .body("{\"email\":")
        .send()
        .await
        .expect("failed to execute request");

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delivery_failure_is_service_unavailable() {
    let (address, _) = spawn_with_transport(Arc::new(FailingMailer)).await;

    let res = api_client()
        .post(&format!("{}/auth/otp/send", &address))
        .json(&serde_json::json!({ "email": test_email() }))
        .send()
        .await
        .expect("failed to execute request");

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.text().await.unwrap(),
        "failed to send email, try again later"
    );
}
