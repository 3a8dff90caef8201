//! Discussion board: short posts by learners, optionally tied to a course.

pub mod handlers;

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::courses::require_course;
use crate::errors::AppError;
use crate::models::community::PostRow;
use crate::users::require_user;

pub const MAX_POST_CHARS: usize = 2000;
/// Posts returned by one listing.
pub const LIST_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub user_id: i64,
    pub course_id: Option<i64>,
    pub body: String,
}

pub async fn create_post(pool: &SqlitePool, post: &NewPost) -> Result<PostRow, AppError> {
    let body = post.body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("post body cannot be empty".to_string()));
    }
    if body.chars().count() > MAX_POST_CHARS {
        return Err(AppError::Validation(format!(
            "post body cannot exceed {MAX_POST_CHARS} characters"
        )));
    }
    require_user(pool, post.user_id).await?;
    if let Some(course_id) = post.course_id {
        require_course(pool, course_id).await?;
    }

    let id = sqlx::query(
        "INSERT INTO posts (user_id, course_id, body, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(post.user_id)
    .bind(post.course_id)
    .bind(body)
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(post_id = id, user_id = post.user_id, "Post created");

    sqlx::query_as::<_, PostRow>(
        "SELECT p.id, p.user_id, u.name AS author_name, p.course_id, p.body, p.created_at
         FROM posts p JOIN users u ON u.id = p.user_id
         WHERE p.id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

/// Newest posts first, optionally only those for one course.
pub async fn list_posts(
    pool: &SqlitePool,
    course_id: Option<i64>,
) -> Result<Vec<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(
        "SELECT p.id, p.user_id, u.name AS author_name, p.course_id, p.body, p.created_at
         FROM posts p JOIN users u ON u.id = p.user_id
         WHERE (?1 IS NULL OR p.course_id = ?1)
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?2",
    )
    .bind(course_id)
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await
}
