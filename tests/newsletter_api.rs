#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::{Value, json};

use common::*;
use inkpress::database::models::newsletter_subscribers;

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

#[actix_web::test]
async fn subscribe_requires_name_and_email() {
    let app = test_app!(state(empty_db()));

    let req = test::TestRequest::post()
        .uri("/api/newsletter")
        .set_json(json!({"email": "reader@example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Name and email are required");
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[actix_web::test]
async fn subscribe_rejects_malformed_email() {
    let app = test_app!(state(empty_db()));

    let req = test::TestRequest::post()
        .uri("/api/newsletter")
        .set_json(json!({"name": "Reader", "email": "not-an-email"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn resubscribing_returns_400() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![subscriber("reader@example.com")]])
        .into_connection();
    let app = test_app!(state(db));

    let req = test::TestRequest::post()
        .uri("/api/newsletter")
        .set_json(json!({"name": "Reader", "email": "  Reader@Example.com "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "This email is already subscribed to our newsletter"
    );
}

#[actix_web::test]
async fn subscribe_stores_lowercased_email() {
    let (db, handle) = recorded(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<newsletter_subscribers::Model>::new()])
            .append_query_results([vec![subscriber("reader@example.com")]]),
    );
    let app = test_app!(state(db));

    let req = test::TestRequest::post()
        .uri("/api/newsletter")
        .set_json(json!({"name": "Reader", "email": "Reader@Example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Successfully subscribed to newsletter");

    let executed = statements(&handle);
    assert_eq!(executed.len(), 2);
    for stmt in &executed {
        let values = values_of(stmt);
        assert!(values.contains("reader@example.com"), "{}", values);
        assert!(!values.contains("Reader@Example.com"), "{}", values);
    }
}

#[actix_web::test]
async fn listing_subscribers_without_credentials_returns_401() {
    let app = test_app!(state_with_config(empty_db(), admin_config()));

    let req = test::TestRequest::get().uri("/api/newsletter").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_subscribers_with_wrong_password_returns_401() {
    let app = test_app!(state_with_config(empty_db(), admin_config()));

    let req = test::TestRequest::get()
        .uri("/api/newsletter")
        .insert_header(("Authorization", basic("admin", "guess")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_subscribers_is_forbidden_when_admin_is_not_configured() {
    let app = test_app!(state(empty_db()));

    let req = test::TestRequest::get()
        .uri("/api/newsletter")
        .insert_header(("Authorization", basic("admin", "admin123")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_lists_subscribers() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![subscriber("reader@example.com")]])
        .into_connection();
    let app = test_app!(state_with_config(db, admin_config()));

    let req = test::TestRequest::get()
        .uri("/api/newsletter?search=reader")
        .insert_header(("Authorization", basic("admin", "admin123")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["email"], "reader@example.com");
    assert!(body[0]["createdAt"].is_string());
}
