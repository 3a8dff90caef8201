use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::wizard::session::{Session, SkillAnswer};
use crate::wizard::steps::{self, StepResponse, TrendsResponse};
use crate::wizard::validation::DetailsForm;

#[derive(Deserialize)]
pub struct SkillsRequest {
    pub selected: Vec<String>,
}

#[derive(Deserialize)]
pub struct CustomSkillRequest {
    pub skill: String,
}

#[derive(Deserialize)]
pub struct RatingEntry {
    pub skill: String,
    pub rating: i64,
}

#[derive(Deserialize)]
pub struct RatingsRequest {
    pub ratings: Vec<RatingEntry>,
}

#[derive(Deserialize)]
pub struct AnswersRequest {
    pub answers: Vec<SkillAnswer>,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<Session>) {
    (StatusCode::CREATED, Json(steps::create_session(&state).await))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(steps::get_session(&state, id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(steps::reset_session(&state, id).await?))
}

/// POST /api/v1/sessions/:id/details
pub async fn handle_submit_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<DetailsForm>,
) -> Result<Json<StepResponse>, AppError> {
    Ok(Json(steps::submit_details(&state, id, form).await?))
}

/// POST /api/v1/sessions/:id/suggestions
pub async fn handle_suggest_more(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepResponse>, AppError> {
    Ok(Json(steps::suggest_more(&state, id).await?))
}

/// POST /api/v1/sessions/:id/skills/custom
pub async fn handle_add_custom_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CustomSkillRequest>,
) -> Result<Json<StepResponse>, AppError> {
    Ok(Json(steps::add_custom_skill(&state, id, &req.skill).await?))
}

/// POST /api/v1/sessions/:id/skills
pub async fn handle_confirm_skills(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SkillsRequest>,
) -> Result<Json<StepResponse>, AppError> {
    Ok(Json(steps::confirm_skills(&state, id, &req.selected).await?))
}

/// POST /api/v1/sessions/:id/ratings
pub async fn handle_submit_ratings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RatingsRequest>,
) -> Result<Json<StepResponse>, AppError> {
    let ratings: Vec<(String, i64)> = req
        .ratings
        .into_iter()
        .map(|entry| (entry.skill, entry.rating))
        .collect();
    Ok(Json(steps::submit_ratings(&state, id, &ratings).await?))
}

/// POST /api/v1/sessions/:id/answers
pub async fn handle_submit_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswersRequest>,
) -> Result<Json<StepResponse>, AppError> {
    Ok(Json(steps::submit_answers(&state, id, req.answers).await?))
}

/// POST /api/v1/sessions/:id/recommendation
pub async fn handle_recommend(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepResponse>, AppError> {
    Ok(Json(steps::recommend(&state, id).await?))
}

/// GET /api/v1/sessions/:id/trends
pub async fn handle_trends(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrendsResponse>, AppError> {
    Ok(Json(steps::trends(&state, id).await?))
}

/// GET /api/v1/sessions/:id/report.pdf
pub async fn handle_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = steps::report(&state, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"learning_path.pdf\"",
            ),
        ],
        bytes,
    ))
}
