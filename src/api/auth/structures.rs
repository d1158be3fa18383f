use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::models::users;

#[derive(Debug, Deserialize, ToSchema, Clone, Default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Clone, Default)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: users::Model,
}
