//! Presigned-upload issuance for client-side file uploads.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vidova_core::collab::UploadPurpose;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PresignUploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub purpose: UploadPurpose,
}

/// POST /api/v1/uploads/presign
///
/// Issue a short-lived PUT URL; the client uploads directly to storage
/// and references the returned key when creating a job.
pub async fn presign_upload(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<PresignUploadRequest>,
) -> AppResult<impl IntoResponse> {
    if request.file_name.trim().is_empty() {
        return Err(AppError::BadRequest("file_name must not be empty".into()));
    }
    if request.content_type.trim().is_empty() {
        return Err(AppError::BadRequest(
            "content_type must not be empty".into(),
        ));
    }

    let presigned = state
        .signer
        .presign_upload(&request.file_name, &request.content_type, request.purpose)
        .await?;

    tracing::info!(
        owner_id = %user.user_id,
        key = %presigned.key,
        "Issued presigned upload",
    );
    Ok(Json(DataResponse { data: presigned }))
}
