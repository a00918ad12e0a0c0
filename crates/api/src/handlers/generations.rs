//! Generation job submission, listing, retrieval, and rename.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vidova_core::error::CoreError;
use vidova_core::job::{JobInput, NewJob, MAX_NAME_LEN};
use vidova_core::types::Id;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for creating a generation. The `kind` tag selects the
/// input shape; `name` is optional and derived when absent.
#[derive(Debug, Deserialize)]
pub struct CreateGenerationRequest {
    pub name: Option<String>,
    #[serde(flatten)]
    pub input: JobInput,
}

/// POST /api/v1/generations
///
/// Create a job in `queued` status and wake the dispatcher. The response
/// returns immediately; progress is observed by polling the job.
pub async fn create_generation(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateGenerationRequest>,
) -> AppResult<impl IntoResponse> {
    let new_job = NewJob::build(
        user.user_id,
        request.name,
        request.input,
        chrono::Utc::now(),
    )?;
    let job = state.store.create_job(new_job).await?;

    tracing::info!(
        job_id = %job.id,
        owner_id = %user.user_id,
        kind = job.kind.as_str(),
        "Generation job created",
    );
    state.jobs_notify.notify_one();

    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

/// GET /api/v1/generations
///
/// List the caller's jobs, newest first.
pub async fn list_generations(
    user: AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let jobs = state
        .store
        .jobs_for_owner(user.user_id, pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/generations/{id}
pub async fn get_generation(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .store
        .job_for_owner(id, user.user_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Job", id })?;
    Ok(Json(DataResponse { data: job }))
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// PATCH /api/v1/generations/{id}/name
pub async fn rename_generation(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(request): Json<RenameRequest>,
) -> AppResult<impl IntoResponse> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "name must not exceed {MAX_NAME_LEN} characters"
        )));
    }

    if !state.store.rename_job(id, user.user_id, name).await? {
        return Err(CoreError::NotFound { entity: "Job", id }.into());
    }

    let job = state
        .store
        .job_for_owner(id, user.user_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Job", id })?;
    Ok(Json(DataResponse { data: job }))
}
