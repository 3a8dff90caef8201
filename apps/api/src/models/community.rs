use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgressRow {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub percent: i64,
    pub updated_at: DateTime<Utc>,
}

/// Progress joined with the course it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgressEntry {
    pub course_id: i64,
    pub course_title: String,
    pub level: String,
    pub percent: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BadgeRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub awarded_at: DateTime<Utc>,
}

/// A discussion post with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub course_id: Option<i64>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
