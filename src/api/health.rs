use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{app_state::AppState, database, errors::AppError};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service and database reachable", body = HealthResponse),
        (status = 500, description = "Database unreachable")
    )
)]
#[get("/health")]
pub async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    database::ping(&app_state.db).await?;
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health);
}
