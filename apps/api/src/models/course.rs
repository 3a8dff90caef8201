use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub skill: String,
    /// One of `Beginner`, `Intermediate`, `Advanced`.
    pub level: String,
    pub url: Option<String>,
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
