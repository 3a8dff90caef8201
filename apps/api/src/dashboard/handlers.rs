use axum::{
    extract::{Path, State},
    Json,
};

use crate::dashboard::{get_dashboard, record_progress, Dashboard, ProgressRequest, ProgressUpdate};
use crate::errors::AppError;
use crate::state::AppState;

/// PUT /api/v1/progress
pub async fn handle_record_progress(
    State(state): State<AppState>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ProgressUpdate>, AppError> {
    Ok(Json(record_progress(&state.db, &req).await?))
}

/// GET /api/v1/users/:id/dashboard
pub async fn handle_get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(get_dashboard(&state.db, user_id).await?))
}
