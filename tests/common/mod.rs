#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{cookie::Cookie, web};
use chrono::{Duration, TimeZone, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockDatabaseConnection, Statement};

use inkpress::{
    app_state::AppState,
    config::Config,
    database::models::{comments, newsletter_subscribers, posts, sessions, users},
    services::sessions::SESSION_COOKIE,
};

pub const TOKEN: &str = "test-session-token";

/// Builds the `/api` service around the given state.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state)
                .app_data(inkpress::api::helpers::json_config(1024 * 1024))
                .app_data(inkpress::api::helpers::query_config())
                .service(actix_web::web::scope("/api").configure(inkpress::api::init_routes)),
        )
        .await
    };
}

pub fn state(db: DatabaseConnection) -> web::Data<AppState> {
    state_with_config(db, Config::default())
}

pub fn state_with_config(db: DatabaseConnection, config: Config) -> web::Data<AppState> {
    web::Data::new(AppState { db, config })
}

pub fn admin_config() -> Config {
    Config {
        admin_username: Some("admin".to_string()),
        admin_password: Some("admin123".to_string()),
        ..Config::default()
    }
}

/// Connection plus a handle that can read back the statements it ran.
pub fn recorded(mock: MockDatabase) -> (DatabaseConnection, Arc<MockDatabaseConnection>) {
    let handle = Arc::new(MockDatabaseConnection::new(mock));
    (
        DatabaseConnection::MockDatabaseConnection(Arc::clone(&handle)),
        handle,
    )
}

pub fn statements(handle: &Arc<MockDatabaseConnection>) -> Vec<Statement> {
    DatabaseConnection::MockDatabaseConnection(Arc::clone(handle))
        .into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().to_vec())
        .collect()
}

/// First statement whose SQL starts with `verb`, e.g. `"UPDATE"`.
pub fn statement(handle: &Arc<MockDatabaseConnection>, verb: &str) -> Statement {
    statements(handle)
        .into_iter()
        .find(|stmt| stmt.sql.starts_with(verb))
        .unwrap_or_else(|| panic!("no {} statement was executed", verb))
}

pub fn values_of(stmt: &Statement) -> String {
    format!("{:?}", stmt.values)
}

pub fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

pub fn session_cookie() -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, TOKEN)
}

fn at(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 9, 30, 0).unwrap()
}

pub fn user(id: &str) -> users::Model {
    users::Model {
        id: id.to_string(),
        name: Some(format!("User {}", id)),
        email: format!("{}@example.com", id),
        password_hash: String::new(),
        image: None,
        created_at: at(1),
    }
}

pub fn session_for(user: &users::Model) -> sessions::Model {
    sessions::Model {
        id: format!("session-{}", user.id),
        token_hash: inkpress::services::sessions::hash_token(TOKEN),
        user_id: user.id.clone(),
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub fn post(id: &str, author_id: &str, slug: &str) -> posts::Model {
    posts::Model {
        id: id.to_string(),
        title: format!("Post {}", id),
        slug: slug.to_string(),
        content: "<p>Hello</p>".to_string(),
        featured_image: None,
        author_id: author_id.to_string(),
        created_at: at(2),
        updated_at: at(2),
    }
}

pub fn comment(id: &str, post_id: &str, author_id: &str) -> comments::Model {
    comments::Model {
        id: id.to_string(),
        content: "Nice post".to_string(),
        post_id: post_id.to_string(),
        author_id: author_id.to_string(),
        created_at: at(3),
    }
}

pub fn subscriber(email: &str) -> newsletter_subscribers::Model {
    newsletter_subscribers::Model {
        id: "sub-1".to_string(),
        name: "Reader".to_string(),
        email: email.to_string(),
        created_at: at(4),
    }
}

/// Mock database that answers the two session lookup queries for `user`.
pub fn signed_in(user: &users::Model) -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![session_for(user)]])
        .append_query_results([vec![user.clone()]])
}
