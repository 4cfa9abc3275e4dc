use std::sync::Arc;

use mongodb::Client;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::services::AchievementCoordinator;
use crate::store::FileStorage;

pub mod achievements;

/// Shared router state. Built once in `main`; axum clones it per request.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: AchievementCoordinator,
    pub files: Arc<dyn FileStorage>,
    pub config: Arc<AppConfig>,
    pub pg: PgPool,
    pub mongo: Client,
}
