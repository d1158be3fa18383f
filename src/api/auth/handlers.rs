use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    api::{
        context::{require_session, resolve_optional_session},
        helpers::{new_id, unique_violation_as},
        validation::{
            MAX_NAME_LEN, MIN_PASSWORD_LEN, ensure_max_len, is_valid_email, normalize_email,
            required, required_trimmed,
        },
    },
    app_state::AppState,
    database::models::users,
    errors::AppError,
    services::sessions,
};

use super::functions::{expired_session_cookie, session_cookie};
use super::structures::{RegisterRequest, SessionResponse, SignInRequest};

const EMAIL_TAKEN: &str = "A user with this email already exists";
const BAD_CREDENTIALS: &str = "Invalid email or password";

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = users::Model),
        (status = 400, description = "Missing fields, weak password or email taken")
    )
)]
#[post("/register")]
pub async fn register(
    app_state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();
    let (Some(email), Some(password)) = (
        required_trimmed(&payload.email),
        required(&payload.password),
    ) else {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    };

    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput(
            "Please provide a valid email address".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let name = required_trimmed(&payload.name).map(str::to_string);
    if name.as_deref().is_some_and(|n| !ensure_max_len(n, MAX_NAME_LEN)) {
        return Err(AppError::InvalidInput(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }

    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&app_state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::InvalidInput(EMAIL_TAKEN.to_string()));
    }

    let password_hash =
        sessions::hash_password(password, app_state.config.effective_bcrypt_cost()).await?;

    let user = users::ActiveModel {
        id: Set(new_id()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        image: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&app_state.db)
    .await
    .map_err(|err| unique_violation_as(err, EMAIL_TAKEN))?;

    log::info!("registered user {}", user.id);
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "Auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = SessionResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
#[post("/signin")]
pub async fn sign_in(
    app_state: web::Data<AppState>,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();
    let (Some(email), Some(password)) = (
        required_trimmed(&payload.email),
        required(&payload.password),
    ) else {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    };

    let found = users::Entity::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .one(&app_state.db)
        .await?;

    let Some(user) = found else {
        sessions::burn_password_check(password, app_state.config.effective_bcrypt_cost()).await;
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };
    if !sessions::verify_password(password, &user.password_hash).await {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let (token, _) =
        sessions::create_session(&app_state.db, &user.id, app_state.config.effective_session_ttl())
            .await?;

    log::info!("user {} signed in", user.id);
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&token, &app_state.config))
        .json(SessionResponse { user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "Auth",
    responses(
        (status = 204, description = "Session revoked and cookie cleared")
    )
)]
#[post("/signout")]
pub async fn sign_out(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if let Some(ctx) = resolve_optional_session(&req, &app_state).await? {
        sessions::revoke_session(&app_state.db, &ctx.token).await?;
        log::info!("user {} signed out", ctx.user_id());
    }

    Ok(HttpResponse::NoContent()
        .cookie(expired_session_cookie(&app_state.config))
        .finish())
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = SessionResponse),
        (status = 401, description = "Not signed in")
    )
)]
#[get("/session")]
pub async fn current_session(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ctx = require_session(&req, &app_state, "Not signed in").await?;
    Ok(HttpResponse::Ok().json(SessionResponse { user: ctx.user }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(sign_in)
            .service(sign_out)
            .service(current_session),
    );
}
