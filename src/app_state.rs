use crate::config::Config;
use sea_orm::DatabaseConnection;

/// Shared through `web::Data`, so the state itself is never cloned.
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
}
