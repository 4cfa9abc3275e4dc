use std::sync::Arc;

use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use bson::doc;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use student_achievement_api::config::AppConfig;
use student_achievement_api::handlers::{achievements, AppState};
use student_achievement_api::middleware::jwt_auth_middleware;
use student_achievement_api::services::AchievementCoordinator;
use student_achievement_api::store::{
    self, LocalFileStorage, MongoDetailStore, PgAdvisorDirectory, PgReferenceStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, MONGO_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Arc::new(AppConfig::from_env());
    tracing::info!("Starting achievement API in {:?} mode", config.environment);

    let pg = store::postgres::connect(&config.postgres).await?;
    let mongo = store::mongo::connect(&config.mongo).await?;

    let state = AppState {
        coordinator: AchievementCoordinator::new(
            Arc::new(PgReferenceStore::new(pg.clone())),
            Arc::new(MongoDetailStore::new(&mongo, &config.mongo.database)),
            Arc::new(PgAdvisorDirectory::new(pg.clone())),
        ),
        files: Arc::new(LocalFileStorage::new(
            config.uploads.dir.clone(),
            config.uploads.public_prefix.clone(),
        )),
        config: config.clone(),
        pg,
        mongo,
    };

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected API
        .merge(achievement_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn achievement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/achievements",
            get(achievements::list).post(achievements::create),
        )
        .route(
            "/api/v1/achievements/:id",
            get(achievements::get)
                .put(achievements::update)
                .delete(achievements::delete),
        )
        .route("/api/v1/achievements/:id/submit", post(achievements::submit))
        .route("/api/v1/achievements/:id/verify", post(achievements::verify))
        .route("/api/v1/achievements/:id/reject", post(achievements::reject))
        .route("/api/v1/achievements/:id/history", get(achievements::history))
        .route(
            "/api/v1/achievements/:id/attachments",
            post(achievements::add_attachment),
        )
        .layer(axum_middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Student Achievement API",
            "version": version,
            "description": "Campus achievement record keeping with advisor verification workflow",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "achievements": "/api/v1/achievements[/:id] (protected)",
                "workflow": "/api/v1/achievements/:id/{submit,verify,reject} (protected)",
                "history": "/api/v1/achievements/:id/history (protected)",
                "attachments": "/api/v1/achievements/:id/attachments (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    let postgres = store::postgres::health_check(&state.pg).await;
    let mongo = state
        .mongo
        .database(&state.config.mongo.database)
        .run_command(doc! { "ping": 1 })
        .await;

    match (&postgres, &mongo) {
        (Ok(_), Ok(_)) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "postgres": "ok",
                    "mongo": "ok"
                }
            })),
        ),
        _ => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "storage unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "postgres": postgres.map(|_| "ok").unwrap_or_else(|e| {
                        tracing::error!("postgres health check failed: {}", e);
                        "unavailable"
                    }),
                    "mongo": mongo.map(|_| "ok").unwrap_or_else(|e| {
                        tracing::error!("mongo health check failed: {}", e);
                        "unavailable"
                    })
                }
            })),
        ),
    }
}
