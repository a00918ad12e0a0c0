//! Credit balance read.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

/// GET /api/v1/credits
pub async fn get_balance(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let balance = state.store.credit_balance(user.user_id).await?;
    Ok(Json(DataResponse {
        data: BalanceResponse { balance },
    }))
}
