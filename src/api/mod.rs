pub mod admin;
pub mod auth;
pub mod comments;
pub mod context;
pub mod health;
pub mod helpers;
pub mod middleware;
pub mod newsletter;
pub mod posts;
pub mod upload;
pub mod users;
pub mod validation;

use actix_web::web;

/// Registers every route under the `/api` scope.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::init_routes)
        .configure(auth::init_routes)
        .configure(posts::init_routes)
        .configure(newsletter::init_routes)
        .configure(users::init_routes)
        .configure(upload::init_routes)
        .configure(admin::init_routes);
}
