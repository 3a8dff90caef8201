//! Progress tracking and badges.
//!
//! Progress is one row per (user, course). Badges are awarded as a side
//! effect of recording progress and are never awarded twice: the
//! `UNIQUE (user_id, name)` constraint plus `INSERT OR IGNORE` make the
//! insert itself the check.

pub mod handlers;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::courses::require_course;
use crate::errors::AppError;
use crate::models::community::{BadgeRow, ProgressEntry, ProgressRow};
use crate::models::user::User;
use crate::users::require_user;

pub const FIRST_STEPS_BADGE: &str = "First Steps";
pub const DEDICATED_LEARNER_BADGE: &str = "Dedicated Learner";
/// Completed courses needed for `DEDICATED_LEARNER_BADGE`.
pub const DEDICATED_LEARNER_COURSES: i64 = 3;

pub fn finished_badge(course_title: &str) -> String {
    format!("Finished: {course_title}")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRequest {
    pub user_id: i64,
    pub course_id: i64,
    pub percent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub progress: ProgressRow,
    /// Badges earned by this update only.
    pub new_badges: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: User,
    pub progress: Vec<ProgressEntry>,
    pub badges: Vec<BadgeRow>,
    pub completed_courses: i64,
    /// Mean percent over all tracked courses, 0 when nothing is tracked.
    pub average_percent: f64,
}

async fn award_badge(pool: &SqlitePool, user_id: i64, name: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("INSERT OR IGNORE INTO badges (user_id, name, awarded_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(name)
            .bind(Utc::now())
            .execute(pool)
            .await?;
    Ok(result.rows_affected() == 1)
}

async fn completed_count(pool: &SqlitePool, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM progress WHERE user_id = ? AND percent = 100")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn record_progress(
    pool: &SqlitePool,
    request: &ProgressRequest,
) -> Result<ProgressUpdate, AppError> {
    if !(0..=100).contains(&request.percent) {
        return Err(AppError::Validation(format!(
            "percent must be between 0 and 100, got {}",
            request.percent
        )));
    }
    require_user(pool, request.user_id).await?;
    let course = require_course(pool, request.course_id).await?;

    let tracked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM progress WHERE user_id = ?")
        .bind(request.user_id)
        .fetch_one(pool)
        .await?;

    sqlx::query(
        "INSERT INTO progress (user_id, course_id, percent, updated_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(user_id, course_id)
         DO UPDATE SET percent = excluded.percent, updated_at = excluded.updated_at",
    )
    .bind(request.user_id)
    .bind(request.course_id)
    .bind(request.percent)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let progress = sqlx::query_as::<_, ProgressRow>(
        "SELECT * FROM progress WHERE user_id = ? AND course_id = ?",
    )
    .bind(request.user_id)
    .bind(request.course_id)
    .fetch_one(pool)
    .await?;

    let mut candidates = Vec::new();
    if tracked == 0 {
        candidates.push(FIRST_STEPS_BADGE.to_string());
    }
    if request.percent == 100 {
        candidates.push(finished_badge(&course.title));
        if completed_count(pool, request.user_id).await? >= DEDICATED_LEARNER_COURSES {
            candidates.push(DEDICATED_LEARNER_BADGE.to_string());
        }
    }

    let mut new_badges = Vec::new();
    for name in candidates {
        if award_badge(pool, request.user_id, &name).await? {
            info!(user_id = request.user_id, badge = %name, "Badge awarded");
            new_badges.push(name);
        }
    }

    Ok(ProgressUpdate {
        progress,
        new_badges,
    })
}

pub async fn get_dashboard(pool: &SqlitePool, user_id: i64) -> Result<Dashboard, AppError> {
    let user = require_user(pool, user_id).await?;

    let progress = sqlx::query_as::<_, ProgressEntry>(
        "SELECT p.course_id, c.title AS course_title, c.level, p.percent, p.updated_at
         FROM progress p JOIN courses c ON c.id = p.course_id
         WHERE p.user_id = ?
         ORDER BY p.updated_at DESC, p.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let badges = sqlx::query_as::<_, BadgeRow>(
        "SELECT * FROM badges WHERE user_id = ? ORDER BY awarded_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let completed_courses = progress.iter().filter(|p| p.percent == 100).count() as i64;
    let average_percent = if progress.is_empty() {
        0.0
    } else {
        progress.iter().map(|p| p.percent as f64).sum::<f64>() / progress.len() as f64
    };

    Ok(Dashboard {
        user,
        progress,
        badges,
        completed_courses,
        average_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::{create_course, NewCourse};
    use crate::db::test_pool;
    use crate::users::seed_user;

    async fn seed_course(pool: &SqlitePool, title: &str) -> i64 {
        let course = NewCourse {
            title: title.to_string(),
            description: String::new(),
            skill: "SQL".to_string(),
            level: "Intermediate".to_string(),
            url: None,
            author_id: None,
        };
        create_course(pool, &course).await.unwrap().id
    }

    fn request(user_id: i64, course_id: i64, percent: i64) -> ProgressRequest {
        ProgressRequest {
            user_id,
            course_id,
            percent,
        }
    }

    #[tokio::test]
    async fn test_badges_are_awarded_once() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "Mei", "mei@example.com").await;
        let course = seed_course(&pool, "Joins").await;

        let first = record_progress(&pool, &request(user, course, 40)).await.unwrap();
        assert_eq!(first.new_badges, [FIRST_STEPS_BADGE]);
        assert_eq!(first.progress.percent, 40);

        let done = record_progress(&pool, &request(user, course, 100)).await.unwrap();
        assert_eq!(done.new_badges, ["Finished: Joins"]);

        let again = record_progress(&pool, &request(user, course, 100)).await.unwrap();
        assert!(again.new_badges.is_empty());

        let dashboard = get_dashboard(&pool, user).await.unwrap();
        assert_eq!(dashboard.badges.len(), 2);
        assert_eq!(dashboard.progress.len(), 1);
    }

    #[tokio::test]
    async fn test_dedicated_learner_after_three_completions() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "Mei", "mei@example.com").await;
        let mut last = None;
        for title in ["One", "Two", "Three"] {
            let course = seed_course(&pool, title).await;
            last = Some(record_progress(&pool, &request(user, course, 100)).await.unwrap());
        }
        let last = last.unwrap();
        assert!(last
            .new_badges
            .iter()
            .any(|b| b == DEDICATED_LEARNER_BADGE));

        let dashboard = get_dashboard(&pool, user).await.unwrap();
        assert_eq!(dashboard.completed_courses, 3);
        assert_eq!(dashboard.average_percent, 100.0);
        // First Steps, three Finished badges, Dedicated Learner
        assert_eq!(dashboard.badges.len(), 5);
    }

    #[tokio::test]
    async fn test_progress_validation() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "Mei", "mei@example.com").await;
        let course = seed_course(&pool, "Joins").await;

        let err = record_progress(&pool, &request(user, course, 101)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = record_progress(&pool, &request(user, 99, 10)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = record_progress(&pool, &request(99, course, 10)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_dashboard_averages_to_zero() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "Mei", "mei@example.com").await;
        let course_a = seed_course(&pool, "A").await;
        let dashboard = get_dashboard(&pool, user).await.unwrap();
        assert_eq!(dashboard.average_percent, 0.0);
        assert_eq!(dashboard.completed_courses, 0);

        record_progress(&pool, &request(user, course_a, 50)).await.unwrap();
        let dashboard = get_dashboard(&pool, user).await.unwrap();
        assert_eq!(dashboard.average_percent, 50.0);
        assert_eq!(dashboard.progress[0].course_title, "A");
    }
}
