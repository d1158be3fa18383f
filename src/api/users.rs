use std::collections::HashMap;

use actix_web::{HttpRequest, HttpResponse, get, web};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr, sea_query::extension::postgres::PgExpr,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{
        context::{ensure_admin_access, require_session},
        helpers::like_pattern,
    },
    app_state::AppState,
    database::models::{comments, posts, users},
    errors::AppError,
};

#[derive(Debug, Serialize, ToSchema, Clone, Default, PartialEq)]
pub struct ActivityCounts {
    pub posts: i64,
    pub comments: i64,
}

/// Row of the admin user table.
#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserOverview {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    pub counts: ActivityCounts,
}

/// Dashboard listing of a user's own posts; content is left out.
#[derive(Debug, Serialize, ToSchema, Clone, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct UserPostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub featured_image: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Case-insensitive filter on name or email.
    pub search: Option<String>,
}

#[derive(FromQueryResult)]
struct AuthorCount {
    author_id: String,
    total: i64,
}

async fn count_posts_by_author(
    db: &DatabaseConnection,
    user_ids: &[String],
) -> Result<HashMap<String, i64>, AppError> {
    let rows = posts::Entity::find()
        .select_only()
        .column(posts::Column::AuthorId)
        .column_as(posts::Column::Id.count(), "total")
        .filter(posts::Column::AuthorId.is_in(user_ids.iter().cloned()))
        .group_by(posts::Column::AuthorId)
        .into_model::<AuthorCount>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| (row.author_id, row.total)).collect())
}

async fn count_comments_by_author(
    db: &DatabaseConnection,
    user_ids: &[String],
) -> Result<HashMap<String, i64>, AppError> {
    let rows = comments::Entity::find()
        .select_only()
        .column(comments::Column::AuthorId)
        .column_as(comments::Column::Id.count(), "total")
        .filter(comments::Column::AuthorId.is_in(user_ids.iter().cloned()))
        .group_by(comments::Column::AuthorId)
        .into_model::<AuthorCount>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| (row.author_id, row.total)).collect())
}

/// Users newest first with their post and comment counts.
pub async fn load_user_overviews(
    db: &DatabaseConnection,
    search: Option<&str>,
) -> Result<Vec<UserOverview>, AppError> {
    let mut select = users::Entity::find().order_by_desc(users::Column::CreatedAt);
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        select = select.filter(
            Condition::any()
                .add(Expr::col(users::Column::Name).ilike(pattern.as_str()))
                .add(Expr::col(users::Column::Email).ilike(pattern.as_str())),
        );
    }
    let models = select.all(db).await?;
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = models.iter().map(|user| user.id.clone()).collect();
    let post_counts = count_posts_by_author(db, &ids).await?;
    let comment_counts = count_comments_by_author(db, &ids).await?;

    Ok(models
        .into_iter()
        .map(|user| {
            let counts = ActivityCounts {
                posts: post_counts.get(&user.id).copied().unwrap_or(0),
                comments: comment_counts.get(&user.id).copied().unwrap_or(0),
            };
            UserOverview {
                id: user.id,
                name: user.name,
                email: user.email,
                image: user.image,
                created_at: user.created_at,
                counts,
            }
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Registered users with activity counts", body = [UserOverview]),
        (status = 401, description = "Admin credentials missing or wrong")
    ),
    security(("admin_basic" = []))
)]
#[get("")]
pub async fn list_users(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    ensure_admin_access(&req, &app_state.config)?;
    let overviews = load_user_overviews(&app_state.db, query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(overviews))
}

#[utoipa::path(
    get,
    path = "/api/users/{userId}/posts",
    tag = "Users",
    params(
        ("userId" = String, Path, description = "User id; must be the signed-in user")
    ),
    responses(
        (status = 200, description = "The user's posts, newest first", body = [UserPostSummary]),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Another user's posts")
    )
)]
#[get("/{userId}/posts")]
pub async fn list_user_posts(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = require_session(&req, &app_state, "You must be signed in to view posts").await?;
    let user_id = path.into_inner();

    if !ctx.is_same_user(&user_id) {
        return Err(AppError::Forbidden(
            "You can only view your own posts".to_string(),
        ));
    }

    let summaries = posts::Entity::find()
        .select_only()
        .columns([
            posts::Column::Id,
            posts::Column::Title,
            posts::Column::Slug,
            posts::Column::FeaturedImage,
            posts::Column::CreatedAt,
            posts::Column::UpdatedAt,
        ])
        .filter(posts::Column::AuthorId.eq(user_id))
        .order_by_desc(posts::Column::CreatedAt)
        .into_model::<UserPostSummary>()
        .all(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(summaries))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(list_users)
            .service(list_user_posts),
    );
}
