#[macro_use]
mod common;

use std::collections::BTreeMap;

use actix_web::{http::StatusCode, test};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sea_orm::{DatabaseBackend, MockDatabase, Value as DbValue};
use serde_json::Value;

use common::*;

fn admin_header() -> (&'static str, String) {
    (
        "Authorization",
        format!("Basic {}", STANDARD.encode("admin:admin123")),
    )
}

fn count_row(author_id: &str, total: i64) -> BTreeMap<&'static str, DbValue> {
    BTreeMap::from([
        ("author_id", DbValue::from(author_id.to_string())),
        ("total", DbValue::BigInt(Some(total))),
    ])
}

#[actix_web::test]
async fn listing_another_users_posts_returns_403() {
    let db = signed_in(&user("u1")).into_connection();
    let app = test_app!(state(db));

    let req = test::TestRequest::get()
        .uri("/api/users/u2/posts")
        .cookie(session_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "You can only view your own posts");
}

#[actix_web::test]
async fn listing_user_posts_requires_session() {
    let app = test_app!(state(empty_db()));

    let req = test::TestRequest::get().uri("/api/users/u1/posts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_own_posts_returns_summaries() {
    let db = signed_in(&user("u1"))
        .append_query_results([vec![post("p1", "u1", "mine")]])
        .into_connection();
    let app = test_app!(state(db));

    let req = test::TestRequest::get()
        .uri("/api/users/u1/posts")
        .cookie(session_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["slug"], "mine");
    assert!(body[0].get("content").is_none());
    assert!(body[0]["updatedAt"].is_string());
}

#[actix_web::test]
async fn admin_user_listing_includes_counts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user("u1"), user("u2")]])
        .append_query_results([vec![count_row("u1", 3)]])
        .append_query_results([vec![count_row("u1", 1), count_row("u2", 4)]])
        .into_connection();
    let app = test_app!(state_with_config(db, admin_config()));

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(admin_header())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["id"], "u1");
    assert_eq!(body[0]["counts"]["posts"], 3);
    assert_eq!(body[0]["counts"]["comments"], 1);
    assert_eq!(body[1]["counts"]["posts"], 0);
    assert_eq!(body[1]["counts"]["comments"], 4);
    assert!(body[0].get("passwordHash").is_none());
}

#[actix_web::test]
async fn admin_user_listing_requires_credentials() {
    let app = test_app!(state_with_config(empty_db(), admin_config()));

    let req = test::TestRequest::get().uri("/api/users").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

fn total(n: i64) -> BTreeMap<&'static str, DbValue> {
    BTreeMap::from([("num_items", DbValue::BigInt(Some(n)))])
}

#[actix_web::test]
async fn admin_stats_reports_totals() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![total(2)]])
        .append_query_results([vec![total(5)]])
        .append_query_results([vec![total(7)]])
        .append_query_results([vec![total(11)]])
        .into_connection();
    let app = test_app!(state_with_config(db, admin_config()));

    let req = test::TestRequest::get()
        .uri("/api/admin/stats")
        .insert_header(admin_header())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["users"], 2);
    assert_eq!(body["posts"], 5);
    assert_eq!(body["comments"], 7);
    assert_eq!(body["subscribers"], 11);
}
