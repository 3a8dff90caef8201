use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::board::{create_post, list_posts, NewPost};
use crate::errors::AppError;
use crate::models::community::PostRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PostFilter {
    pub course_id: Option<i64>,
}

/// POST /api/v1/posts
pub async fn handle_create_post(
    State(state): State<AppState>,
    Json(req): Json<NewPost>,
) -> Result<(StatusCode, Json<PostRow>), AppError> {
    let post = create_post(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/v1/posts?course_id=
pub async fn handle_list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<PostRow>>, AppError> {
    Ok(Json(list_posts(&state.db, filter.course_id).await?))
}
