use std::collections::HashSet;

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
    sea_query::extension::postgres::PgExpr,
};

use crate::{
    api::{
        context::{ensure_author, require_session},
        helpers::{AuthorSummary, like_pattern, load_authors, new_id},
        validation::{MAX_TITLE_LEN, ensure_max_len, required},
    },
    app_state::AppState,
    database::models::posts,
    errors::AppError,
};

use super::functions::{
    SLUG_TAKEN, author_ids, build_post_views, generate_slug, map_slug_conflict,
};
use super::structures::{
    CreatePostRequest, MessageResponse, PostListQuery, PostSearchQuery, PostView,
    UpdatePostRequest,
};

const DEFAULT_SEARCH_LIMIT: u64 = 5;

async fn find_post(app_state: &AppState, post_id: &str) -> Result<posts::Model, AppError> {
    posts::Entity::find_by_id(post_id.to_string())
        .one(&app_state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

async fn slug_in_use(app_state: &AppState, slug: &str) -> Result<Option<posts::Model>, AppError> {
    Ok(posts::Entity::find()
        .filter(posts::Column::Slug.eq(slug))
        .one(&app_state.db)
        .await?)
}

async fn with_author(app_state: &AppState, post: posts::Model) -> Result<PostView, AppError> {
    let ids: HashSet<String> = HashSet::from([post.author_id.clone()]);
    let authors = load_authors(&app_state.db, &ids).await?;
    let author = authors.get(&post.author_id).cloned();
    Ok(PostView { post, author })
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    params(PostListQuery),
    responses(
        (status = 200, description = "Posts, newest first", body = [PostView])
    )
)]
#[get("")]
pub async fn list_posts(
    app_state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = posts::Entity::find().order_by_desc(posts::Column::CreatedAt);
    if let Some(limit) = query.limit.filter(|limit| *limit > 0) {
        select = select.limit(limit as u64);
    }

    let models = select.all(&app_state.db).await?;
    let authors = load_authors(&app_state.db, &author_ids(&models)).await?;

    Ok(HttpResponse::Ok().json(build_post_views(models, &authors)))
}

#[utoipa::path(
    get,
    path = "/api/posts/search",
    tag = "Posts",
    params(PostSearchQuery),
    responses(
        (status = 200, description = "Posts whose title or content match", body = [PostView])
    )
)]
#[get("/search")]
pub async fn search_posts(
    app_state: web::Data<AppState>,
    query: web::Query<PostSearchQuery>,
) -> Result<HttpResponse, AppError> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Ok(HttpResponse::Ok().json(Vec::<PostView>::new()));
    }

    let pattern = like_pattern(term);
    let limit = query
        .limit
        .filter(|limit| *limit > 0)
        .map_or(DEFAULT_SEARCH_LIMIT, |limit| limit as u64);

    let models = posts::Entity::find()
        .filter(
            Condition::any()
                .add(Expr::col(posts::Column::Title).ilike(pattern.as_str()))
                .add(Expr::col(posts::Column::Content).ilike(pattern.as_str())),
        )
        .order_by_desc(posts::Column::CreatedAt)
        .limit(limit)
        .all(&app_state.db)
        .await?;
    let authors = load_authors(&app_state.db, &author_ids(&models)).await?;

    Ok(HttpResponse::Ok().json(build_post_views(models, &authors)))
}

#[utoipa::path(
    get,
    path = "/api/posts/slug/{slug}",
    tag = "Posts",
    params(
        ("slug" = String, Path, description = "Post URL slug")
    ),
    responses(
        (status = 200, description = "Post found", body = PostView),
        (status = 404, description = "Post not found")
    )
)]
#[get("/slug/{slug}")]
pub async fn get_post_by_slug(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let slug = path.into_inner();
    let post = slug_in_use(&app_state, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(with_author(&app_state, post).await?))
}

#[utoipa::path(
    get,
    path = "/api/posts/{postId}",
    tag = "Posts",
    params(
        ("postId" = String, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostView),
        (status = 404, description = "Post not found")
    )
)]
#[get("/{postId}")]
pub async fn get_post(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let post = find_post(&app_state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(with_author(&app_state, post).await?))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "Posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostView),
        (status = 400, description = "Missing fields or slug already in use"),
        (status = 401, description = "Not signed in")
    )
)]
#[post("")]
pub async fn create_post(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = require_session(&req, &app_state, "You must be signed in to create a post").await?;
    let payload = body.into_inner();

    let (Some(title), Some(content)) = (required(&payload.title), required(&payload.content))
    else {
        return Err(AppError::InvalidInput(
            "Title, content, and slug are required".to_string(),
        ));
    };
    if !ensure_max_len(title, MAX_TITLE_LEN) {
        return Err(AppError::InvalidInput(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }

    let slug = generate_slug(required(&payload.slug).unwrap_or(title));
    if slug.is_empty() {
        return Err(AppError::InvalidInput(
            "Slug must contain letters or numbers".to_string(),
        ));
    }

    if slug_in_use(&app_state, &slug).await?.is_some() {
        return Err(AppError::InvalidInput(SLUG_TAKEN.to_string()));
    }

    let now = Utc::now();
    let post = posts::ActiveModel {
        id: Set(new_id()),
        title: Set(title.to_string()),
        slug: Set(slug),
        content: Set(content.to_string()),
        featured_image: Set(payload.featured_image.filter(|image| !image.is_empty())),
        author_id: Set(ctx.user_id().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&app_state.db)
    .await
    .map_err(map_slug_conflict)?;

    log::info!("user {} created post {} ({})", ctx.user_id(), post.id, post.slug);

    Ok(HttpResponse::Created().json(PostView {
        post,
        author: Some(AuthorSummary::from(&ctx.user)),
    }))
}

#[utoipa::path(
    put,
    path = "/api/posts/{postId}",
    tag = "Posts",
    params(
        ("postId" = String, Path, description = "Post id")
    ),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostView),
        (status = 400, description = "Missing fields or slug already in use"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Post belongs to another user"),
        (status = 404, description = "Post not found")
    )
)]
#[put("/{postId}")]
pub async fn update_post(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = require_session(&req, &app_state, "You must be signed in to update a post").await?;
    let post_id = path.into_inner();

    let existing = find_post(&app_state, &post_id).await?;
    ensure_author(&ctx, &existing.author_id, "update")?;

    let payload = body.into_inner();
    let (Some(title), Some(content)) = (required(&payload.title), required(&payload.content))
    else {
        return Err(AppError::InvalidInput(
            "Title and content are required".to_string(),
        ));
    };
    if !ensure_max_len(title, MAX_TITLE_LEN) {
        return Err(AppError::InvalidInput(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }

    let new_slug = match required(&payload.slug) {
        Some(raw) => {
            let slug = generate_slug(raw);
            if slug.is_empty() {
                return Err(AppError::InvalidInput(
                    "Slug must contain letters or numbers".to_string(),
                ));
            }
            Some(slug)
        }
        None => None,
    };

    if let Some(slug) = new_slug.as_deref().filter(|slug| *slug != existing.slug) {
        if let Some(other) = slug_in_use(&app_state, slug).await? {
            if other.id != existing.id {
                return Err(AppError::InvalidInput(SLUG_TAKEN.to_string()));
            }
        }
    }

    let old_slug = existing.slug.clone();
    let mut active = existing.into_active_model();
    active.title = Set(title.to_string());
    active.content = Set(content.to_string());
    if let Some(slug) = new_slug {
        active.slug = Set(slug);
    }
    if let Some(image) = payload.featured_image {
        active.featured_image = Set(image.filter(|image| !image.is_empty()));
    }
    active.updated_at = Set(Utc::now());

    let post = active
        .update(&app_state.db)
        .await
        .map_err(map_slug_conflict)?;

    if post.slug != old_slug {
        log::info!("post {} moved from /{} to /{}", post.id, old_slug, post.slug);
    } else {
        log::info!("post {} updated", post.id);
    }

    Ok(HttpResponse::Ok().json(PostView {
        post,
        author: Some(AuthorSummary::from(&ctx.user)),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{postId}",
    tag = "Posts",
    params(
        ("postId" = String, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Post belongs to another user"),
        (status = 404, description = "Post not found")
    )
)]
#[delete("/{postId}")]
pub async fn delete_post(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = require_session(&req, &app_state, "You must be signed in to delete a post").await?;
    let post_id = path.into_inner();

    let existing = find_post(&app_state, &post_id).await?;
    ensure_author(&ctx, &existing.author_id, "delete")?;

    let slug = existing.slug.clone();
    existing.delete(&app_state.db).await?;
    log::info!("user {} deleted post {} ({})", ctx.user_id(), post_id, slug);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Post deleted successfully".to_string(),
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .service(list_posts)
            .service(create_post)
            .service(search_posts)
            .service(get_post_by_slug)
            .configure(crate::api::comments::init_routes)
            .service(get_post)
            .service(update_post)
            .service(delete_post),
    );
}
