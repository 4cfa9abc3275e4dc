use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde_json::Value;

use crate::auth::Claims;
use crate::domain::Actor;
use crate::error::ApiError;
use crate::handlers::AppState;

/// JWT authentication middleware that validates tokens and injects the
/// request [`Actor`] into extensions. The signing secret comes from the
/// router state, never from a process-wide global.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let unauthorized = |msg: String| {
        let api_error = ApiError::unauthorized(msg);
        (
            StatusCode::from_u16(api_error.status_code()).unwrap_or(StatusCode::UNAUTHORIZED),
            Json(api_error.to_json()),
        )
    };

    let token = extract_jwt_from_headers(&headers).map_err(unauthorized)?;
    let claims =
        validate_jwt(&token, &state.config.security.jwt_secret).map_err(unauthorized)?;

    request.extensions_mut().insert(Actor::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Validate JWT token and extract claims
fn validate_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid JWT token: {}", e))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use crate::config::AppConfig;
    use crate::domain::Role;
    use crate::handlers::AppState;
    use crate::services::AchievementCoordinator;
    use crate::store::LocalFileStorage;
    use crate::testing::{InMemoryDetailStore, InMemoryReferenceStore, StaticAdvisorDirectory};
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Extension, Router};
    use sqlx::postgres::PgPoolOptions;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn guarded_app(secret: &str) -> Router {
        let mut config = AppConfig::from_env();
        config.security.jwt_secret = secret.to_string();

        let state = AppState {
            coordinator: AchievementCoordinator::new(
                Arc::new(InMemoryReferenceStore::new()),
                Arc::new(InMemoryDetailStore::new()),
                Arc::new(StaticAdvisorDirectory::new()),
            ),
            files: Arc::new(LocalFileStorage::new("/tmp", "/uploads")),
            config: Arc::new(config),
            // Lazy pool and unconnected client: the guarded route below
            // never touches either store.
            pg: PgPoolOptions::new()
                .connect_lazy("postgres://localhost:5432/unused")
                .unwrap(),
            mongo: mongodb::Client::with_uri_str("mongodb://localhost:27017")
                .await
                .unwrap(),
        };

        Router::new()
            .route(
                "/whoami",
                get(|Extension(actor): Extension<crate::domain::Actor>| async move {
                    actor.user_id.to_string()
                }),
            )
            .layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
            .with_state(state)
    }

    #[tokio::test]
    async fn guarded_route_rejects_missing_and_forged_tokens() {
        let app = guarded_app("mw-secret").await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let forged = generate_jwt(
            "other-secret",
            &Claims::new(Uuid::new_v4(), None, Role::Admin, HashSet::new(), 1),
        )
        .unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("authorization", format!("Bearer {}", forged))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn guarded_route_sees_actor_from_valid_token() {
        let app = guarded_app("mw-secret").await;
        let claims = Claims::new(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            Role::Student,
            HashSet::new(),
            1,
        );
        let token = generate_jwt("mw-secret", &claims).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), claims.user_id.to_string());
    }

    #[test]
    fn bearer_extraction_rejects_malformed_headers() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", "Bearer  ".parse().unwrap());
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", "Bearer token123".parse().unwrap());
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "token123");
    }

    #[test]
    fn validation_rejects_wrong_secret() {
        let claims =
            Claims::new(Uuid::new_v4(), None, Role::Admin, HashSet::new(), 1);
        let token = generate_jwt("secret-a", &claims).unwrap();

        assert!(validate_jwt(&token, "secret-b").is_err());
        assert!(validate_jwt(&token, "").is_err());
        let decoded = validate_jwt(&token, "secret-a").unwrap();
        assert_eq!(decoded.user_id, claims.user_id);
    }
}
