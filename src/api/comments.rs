use std::collections::HashSet;

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::{
        context::require_session,
        helpers::{AuthorSummary, load_authors, new_id},
        validation::{MAX_COMMENT_LEN, ensure_max_len},
    },
    app_state::AppState,
    database::models::{comments, posts},
    errors::AppError,
};

#[derive(Debug, Deserialize, ToSchema, Clone, Default)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comments::Model,
    pub author: Option<AuthorSummary>,
}

#[utoipa::path(
    get,
    path = "/api/posts/{postId}/comments",
    tag = "Comments",
    params(
        ("postId" = String, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Comments, newest first", body = [CommentView])
    )
)]
#[get("/{postId}/comments")]
pub async fn list_comments(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();

    let models = comments::Entity::find()
        .filter(comments::Column::PostId.eq(post_id))
        .order_by_desc(comments::Column::CreatedAt)
        .all(&app_state.db)
        .await?;

    let ids: HashSet<String> = models.iter().map(|c| c.author_id.clone()).collect();
    let authors = load_authors(&app_state.db, &ids).await?;

    let views: Vec<CommentView> = models
        .into_iter()
        .map(|comment| {
            let author = authors.get(&comment.author_id).cloned();
            CommentView { comment, author }
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

#[utoipa::path(
    post,
    path = "/api/posts/{postId}/comments",
    tag = "Comments",
    params(
        ("postId" = String, Path, description = "Post id")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentView),
        (status = 400, description = "Empty comment"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Post not found")
    )
)]
#[post("/{postId}/comments")]
pub async fn create_comment(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let ctx = require_session(
        &req,
        &app_state,
        "Unauthorized: You must be signed in to comment",
    )
    .await?;

    let payload = body.into_inner();
    let Some(content) = payload.content.filter(|c| !c.trim().is_empty()) else {
        return Err(AppError::InvalidInput(
            "Comment content is required".to_string(),
        ));
    };
    if !ensure_max_len(&content, MAX_COMMENT_LEN) {
        return Err(AppError::InvalidInput(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_LEN
        )));
    }

    let post = posts::Entity::find_by_id(post_id.clone())
        .one(&app_state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let comment = comments::ActiveModel {
        id: Set(new_id()),
        content: Set(content),
        post_id: Set(post.id.clone()),
        author_id: Set(ctx.user_id().to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&app_state.db)
    .await?;

    log::info!("user {} commented on /{}", ctx.user_id(), post.slug);

    Ok(HttpResponse::Created().json(CommentView {
        comment,
        author: Some(AuthorSummary::from(&ctx.user)),
    }))
}

/// Mounted inside the `/posts` scope.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_comments).service(create_comment);
}
