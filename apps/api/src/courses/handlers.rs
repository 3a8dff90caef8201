//! Axum route handlers for course authoring.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::courses::{
    create_course, draft_course, list_courses, require_course, CourseDraft, NewCourse,
};
use crate::errors::AppError;
use crate::models::course::CourseRow;
use crate::state::AppState;
use crate::wizard::models::PhaseLevel;

#[derive(Debug, Deserialize)]
pub struct CourseFilter {
    pub skill: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub title: String,
    pub skill: String,
    pub level: String,
}

fn parse_level(level: &str) -> Result<PhaseLevel, AppError> {
    PhaseLevel::parse(level).ok_or_else(|| {
        AppError::Validation("level must be Beginner, Intermediate or Advanced".to_string())
    })
}

/// POST /api/v1/courses
pub async fn handle_create_course(
    State(state): State<AppState>,
    Json(request): Json<NewCourse>,
) -> Result<(StatusCode, Json<CourseRow>), AppError> {
    let course = create_course(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /api/v1/courses?skill=&level=
pub async fn handle_list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<Vec<CourseRow>>, AppError> {
    let level = filter
        .level
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .map(parse_level)
        .transpose()?;
    let skill = filter.skill.as_deref().filter(|s| !s.trim().is_empty());
    Ok(Json(list_courses(&state.db, skill, level).await?))
}

/// GET /api/v1/courses/:id
pub async fn handle_get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseRow>, AppError> {
    Ok(Json(require_course(&state.db, course_id).await?))
}

/// POST /api/v1/courses/draft
///
/// Asks the model for a description and module outline. Nothing is stored.
pub async fn handle_draft_course(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<CourseDraft>, AppError> {
    if request.title.trim().is_empty() || request.skill.trim().is_empty() {
        return Err(AppError::Validation(
            "title and skill cannot be empty".to_string(),
        ));
    }
    let level = parse_level(&request.level)?;
    let draft = draft_course(
        state.model.as_ref(),
        request.title.trim(),
        request.skill.trim(),
        level,
    )
    .await
    .map_err(|e| AppError::Llm(format!("Course draft failed: {e}")))?;
    Ok(Json(draft))
}
