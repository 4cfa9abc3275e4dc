use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{AchievementContent, AchievementStatus, Actor, Attachment};
use crate::error::ApiError;
use crate::services::ListQuery;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub note: String,
}

/// GET /api/v1/achievements - role-scoped listing
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(
            raw.parse::<AchievementStatus>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?,
        ),
        None => None,
    };

    let query = ListQuery { status, page: params.page, page_size: params.page_size };
    let list = state.coordinator.list(&actor, query).await?;
    Ok(Json(json!({ "success": true, "data": list })))
}

/// POST /api/v1/achievements - create a new draft
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(content): Json<AchievementContent>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = state.coordinator.create(&actor, content).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": reference }))))
}

/// GET /api/v1/achievements/:id - combined reference + detail view
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.coordinator.detail(id, &actor).await?;
    Ok(Json(json!({ "success": true, "data": view })))
}

/// PUT /api/v1/achievements/:id - full-replace content update (draft only)
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(content): Json<AchievementContent>,
) -> Result<impl IntoResponse, ApiError> {
    state.coordinator.update_content(id, &actor, content).await?;
    let view = state.coordinator.detail(id, &actor).await?;
    Ok(Json(json!({ "success": true, "data": view })))
}

/// DELETE /api/v1/achievements/:id - soft delete (draft only)
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.coordinator.delete(id, &actor).await?;
    Ok(Json(json!({ "success": true, "data": { "id": id, "status": "deleted" } })))
}

/// POST /api/v1/achievements/:id/submit - draft to submitted
pub async fn submit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.coordinator.submit(id, &actor).await?;
    Ok(Json(json!({ "success": true, "data": { "id": id, "status": "submitted" } })))
}

/// POST /api/v1/achievements/:id/verify - submitted to verified (advisor)
pub async fn verify(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.coordinator.verify(id, &actor).await?;
    Ok(Json(json!({ "success": true, "data": { "id": id, "status": "verified" } })))
}

/// POST /api/v1/achievements/:id/reject - submitted to rejected with a note
pub async fn reject(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.coordinator.reject(id, &actor, &body.note).await?;
    Ok(Json(json!({ "success": true, "data": { "id": id, "status": "rejected" } })))
}

/// GET /api/v1/achievements/:id/history - status timeline
pub async fn history(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.coordinator.history(id, &actor).await?;
    Ok(Json(json!({ "success": true, "data": history })))
}

/// POST /api/v1/achievements/:id/attachments - multipart evidence upload
///
/// Expects a `file` part with the upload and an optional `fileType` text
/// part. Ownership and status are checked before the body is read, so a
/// denied request writes nothing; after that the file lands in storage first
/// and the document append happens last, leaving at worst an unreferenced
/// file on disk when the append fails.
pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    state.coordinator.authorize_attachment(id, &actor).await?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut file_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("file part must carry a filename"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {}", e)))?;
                file = Some((name, bytes.to_vec()));
            }
            Some("fileType") => {
                file_type = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::bad_request("missing 'file' part in multipart body"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }

    let stored = state
        .files
        .store(id, &file_name, &bytes)
        .await
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    let attachment = Attachment {
        file_name: stored.file_name,
        file_url: stored.file_url,
        file_type: file_type.unwrap_or_else(|| extension_of(&file_name)),
        uploaded_at: Utc::now(),
    };

    let attachment = state.coordinator.add_attachment(id, &actor, attachment).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": attachment }))))
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}
