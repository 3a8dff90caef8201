//! Course authoring: learner-facing course catalogue plus model-drafted outlines.

pub mod handlers;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{prompts, LlmError, TextModel};
use crate::models::course::CourseRow;
use crate::users::require_user;
use crate::wizard::models::PhaseLevel;

const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub skill: String,
    pub level: String,
    pub url: Option<String>,
    pub author_id: Option<i64>,
}

/// Checks a submission and returns its level.
pub fn validate_course(course: &NewCourse) -> Result<PhaseLevel, AppError> {
    let title = course.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "title must be between 1 and {MAX_TITLE_CHARS} characters"
        )));
    }
    if course.skill.trim().is_empty() {
        return Err(AppError::Validation("skill cannot be empty".to_string()));
    }
    if let Some(url) = course.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Validation(
                "url must start with http:// or https://".to_string(),
            ));
        }
    }
    PhaseLevel::parse(&course.level).ok_or_else(|| {
        AppError::Validation("level must be Beginner, Intermediate or Advanced".to_string())
    })
}

pub async fn create_course(pool: &SqlitePool, course: &NewCourse) -> Result<CourseRow, AppError> {
    let level = validate_course(course)?;
    if let Some(author_id) = course.author_id {
        require_user(pool, author_id).await?;
    }
    let url = course
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let id = sqlx::query(
        "INSERT INTO courses (title, description, skill, level, url, author_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(course.title.trim())
    .bind(course.description.trim())
    .bind(course.skill.trim())
    .bind(level.as_str())
    .bind(url)
    .bind(course.author_id)
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(course_id = id, level = level.as_str(), "Course created");
    require_course(pool, id).await
}

pub async fn get_course(pool: &SqlitePool, course_id: i64) -> Result<Option<CourseRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub async fn require_course(pool: &SqlitePool, course_id: i64) -> Result<CourseRow, AppError> {
    get_course(pool, course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} not found")))
}

/// Courses in creation order, optionally narrowed by skill (case-insensitive) and level.
pub async fn list_courses(
    pool: &SqlitePool,
    skill: Option<&str>,
    level: Option<PhaseLevel>,
) -> Result<Vec<CourseRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(
        "SELECT * FROM courses
         WHERE (?1 IS NULL OR skill = ?1 COLLATE NOCASE)
           AND (?2 IS NULL OR level = ?2)
         ORDER BY id",
    )
    .bind(skill.map(str::trim))
    .bind(level.map(|l| l.as_str()))
    .fetch_all(pool)
    .await
}

/// Model-written starting point for a new course.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseDraft {
    pub description: String,
    pub modules: Vec<String>,
}

/// Splits outline text into the description (lines before the first
/// `Module` line) and the module lines.
pub fn parse_course_draft(text: &str) -> CourseDraft {
    let mut description = Vec::new();
    let mut modules = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let bare = line.replace("**", "");
        let bare = bare.trim_start_matches(|c: char| matches!(c, '-' | '*' | '#') || c.is_whitespace());
        if bare.get(..6).map_or(false, |head| head.eq_ignore_ascii_case("module")) {
            modules.push(bare.trim().to_string());
        } else if modules.is_empty() {
            description.push(line);
        }
    }
    CourseDraft {
        description: description.join(" "),
        modules,
    }
}

pub async fn draft_course(
    model: &dyn TextModel,
    title: &str,
    skill: &str,
    level: PhaseLevel,
) -> Result<CourseDraft, LlmError> {
    let text = model
        .generate(&prompts::course_outline(title, skill, level.as_str()))
        .await?;
    Ok(parse_course_draft(&text))
}
