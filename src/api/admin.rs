use actix_web::{HttpRequest, HttpResponse, get, web};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::context::ensure_admin_access,
    app_state::AppState,
    database::models::{comments, newsletter_subscribers, posts, users},
    errors::AppError,
};

/// Totals shown at the top of the admin dashboard.
#[derive(Serialize, ToSchema)]
pub struct SiteStats {
    users: u64,
    posts: u64,
    comments: u64,
    subscribers: u64,
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Site totals", body = SiteStats),
        (status = 401, description = "Admin credentials missing or wrong")
    ),
    security(("admin_basic" = []))
)]
#[get("/stats")]
pub async fn get_site_stats(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    ensure_admin_access(&req, &app_state.config)?;
    let db = &app_state.db;

    let stats = SiteStats {
        users: users::Entity::find().count(db).await?,
        posts: posts::Entity::find().count(db).await?,
        comments: comments::Entity::find().count(db).await?,
        subscribers: newsletter_subscribers::Entity::find().count(db).await?,
    };

    Ok(HttpResponse::Ok().json(stats))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/admin").service(get_site_stats));
}
