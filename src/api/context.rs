use actix_web::{HttpRequest, http::header, web};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use subtle::ConstantTimeEq;

use crate::{
    app_state::AppState,
    config::Config,
    database::models::users,
    errors::AppError,
    services::sessions::{self, SESSION_COOKIE},
};

/// The signed-in user behind a request.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub user: users::Model,
    pub token: String,
}

impl SessionContext {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn is_same_user(&self, user_id: &str) -> bool {
        self.user.id == user_id
    }
}

fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves the session cookie, if any. An unknown or expired token is treated
/// as signed out.
pub async fn resolve_optional_session(
    req: &HttpRequest,
    app_state: &web::Data<AppState>,
) -> Result<Option<SessionContext>, AppError> {
    let Some(token) = session_token(req) else {
        return Ok(None);
    };

    let user = sessions::find_session_user(&app_state.db, &token).await?;
    Ok(user.map(|user| SessionContext { user, token }))
}

/// Like [`resolve_optional_session`] but signed-out requests fail with 401
/// carrying `message`.
pub async fn require_session(
    req: &HttpRequest,
    app_state: &web::Data<AppState>,
    message: &str,
) -> Result<SessionContext, AppError> {
    resolve_optional_session(req, app_state)
        .await?
        .ok_or_else(|| AppError::Unauthorized(message.to_string()))
}

pub fn ensure_author(ctx: &SessionContext, author_id: &str, action: &str) -> Result<(), AppError> {
    if ctx.is_same_user(author_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You can only {} your own posts",
            action
        )))
    }
}

/// Checks HTTP Basic credentials against the configured admin account.
pub fn ensure_admin_access(req: &HttpRequest, config: &Config) -> Result<(), AppError> {
    let (expected_user, expected_pass) = config
        .admin_credentials()
        .ok_or_else(|| AppError::Forbidden("Admin access is not configured".to_string()))?;

    let (user, pass) = basic_credentials(req)
        .ok_or_else(|| AppError::Unauthorized("Admin credentials required".to_string()))?;

    let user_ok = constant_time_eq(&user, expected_user);
    let pass_ok = constant_time_eq(&pass, expected_pass);
    if user_ok && pass_ok {
        Ok(())
    } else {
        log::warn!("rejected admin login for {:?}", user);
        Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ))
    }
}

fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        return false;
    }
    provided.ct_eq(expected).into()
}

fn basic_credentials(req: &HttpRequest) -> Option<(String, String)> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
