use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr, sea_query::extension::postgres::PgExpr,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{
        context::ensure_admin_access,
        helpers::{like_pattern, new_id, unique_violation_as},
        validation::{MAX_NAME_LEN, ensure_max_len, is_valid_email, normalize_email, required_trimmed},
    },
    app_state::AppState,
    database::models::newsletter_subscribers,
    errors::AppError,
};

const ALREADY_SUBSCRIBED: &str = "This email is already subscribed to our newsletter";

#[derive(Debug, Deserialize, ToSchema, Clone, Default)]
pub struct SubscribeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscribeResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubscriberListQuery {
    /// Case-insensitive filter on name or email.
    pub search: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/newsletter",
    tag = "Newsletter",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribed", body = SubscribeResponse),
        (status = 400, description = "Missing fields, malformed or already subscribed email")
    )
)]
#[post("")]
pub async fn subscribe(
    app_state: web::Data<AppState>,
    body: web::Json<SubscribeRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();
    let (Some(name), Some(email)) = (
        required_trimmed(&payload.name),
        required_trimmed(&payload.email),
    ) else {
        return Err(AppError::InvalidInput(
            "Name and email are required".to_string(),
        ));
    };

    if !ensure_max_len(name, MAX_NAME_LEN) {
        return Err(AppError::InvalidInput(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }

    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput(
            "Please provide a valid email address".to_string(),
        ));
    }

    let existing = newsletter_subscribers::Entity::find()
        .filter(newsletter_subscribers::Column::Email.eq(email.as_str()))
        .one(&app_state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::InvalidInput(ALREADY_SUBSCRIBED.to_string()));
    }

    newsletter_subscribers::ActiveModel {
        id: Set(new_id()),
        name: Set(name.to_string()),
        email: Set(email.clone()),
        created_at: Set(Utc::now()),
    }
    .insert(&app_state.db)
    .await
    .map_err(|err| unique_violation_as(err, ALREADY_SUBSCRIBED))?;

    log::info!("new newsletter subscriber {}", email);

    Ok(HttpResponse::Created().json(SubscribeResponse {
        message: "Successfully subscribed to newsletter".to_string(),
    }))
}

/// Subscribers newest first, optionally filtered on name or email.
pub async fn load_subscribers(
    db: &DatabaseConnection,
    search: Option<&str>,
) -> Result<Vec<newsletter_subscribers::Model>, AppError> {
    let mut select = newsletter_subscribers::Entity::find()
        .order_by_desc(newsletter_subscribers::Column::CreatedAt);

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        select = select.filter(
            Condition::any()
                .add(Expr::col(newsletter_subscribers::Column::Name).ilike(pattern.as_str()))
                .add(Expr::col(newsletter_subscribers::Column::Email).ilike(pattern.as_str())),
        );
    }

    Ok(select.all(db).await?)
}

#[utoipa::path(
    get,
    path = "/api/newsletter",
    tag = "Newsletter",
    params(SubscriberListQuery),
    responses(
        (status = 200, description = "Subscribers, newest first", body = [newsletter_subscribers::Model]),
        (status = 401, description = "Admin credentials missing or wrong")
    ),
    security(("admin_basic" = []))
)]
#[get("")]
pub async fn list_subscribers(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<SubscriberListQuery>,
) -> Result<HttpResponse, AppError> {
    ensure_admin_access(&req, &app_state.config)?;

    let subscribers = load_subscribers(&app_state.db, query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(subscribers))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/newsletter")
            .service(subscribe)
            .service(list_subscribers),
    );
}
