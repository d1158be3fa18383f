use std::collections::{HashMap, HashSet};

use actix_web::web;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{database::models::users, errors::AppError};

/// Public part of a user shown next to posts and comments.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<&users::Model> for AuthorSummary {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Loads author summaries for the given user ids in one query.
pub async fn load_authors(
    db: &DatabaseConnection,
    ids: &HashSet<String>,
) -> Result<HashMap<String, AuthorSummary>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let models = users::Entity::find()
        .filter(users::Column::Id.is_in(ids.iter().cloned()))
        .all(db)
        .await?;

    Ok(models
        .iter()
        .map(|user| (user.id.clone(), AuthorSummary::from(user)))
        .collect())
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default)]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Unique violations that slip past a pre-check become the same 400 the
/// pre-check would have returned.
pub fn unique_violation_as(err: DbErr, message: &str) -> AppError {
    let sql_err = err.sql_err();
    classify_write_error(sql_err, err, message)
}

fn classify_write_error(sql_err: Option<SqlErr>, err: DbErr, message: &str) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::InvalidInput(message.to_string()),
        _ => AppError::DbError(err),
    }
}

/// JSON extractor settings: size limit and errors rendered as `AppError`.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            AppError::InvalidInput(format!("Invalid JSON body: {}", err)).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Invalid query string: {}", err)).into()
    })
}
