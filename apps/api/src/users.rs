use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::user::User;
use crate::wizard::models::UserProfile;

/// Stores the profile if the email is new and returns the user's id either way.
/// An existing row keeps its original name and profession.
pub async fn upsert_user(pool: &SqlitePool, profile: &UserProfile) -> Result<i64, sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (name, email, profession, created_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(email) DO NOTHING",
    )
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(&profile.profession)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&profile.email)
        .fetch_one(pool)
        .await
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn require_user(pool: &SqlitePool, user_id: i64) -> Result<User, AppError> {
    get_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

#[cfg(test)]
pub async fn seed_user(pool: &SqlitePool, name: &str, email: &str) -> i64 {
    let profile = UserProfile {
        name: name.to_string(),
        email: email.to_string(),
        profession: "Engineer".to_string(),
    };
    upsert_user(pool, &profile).await.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_upsert_is_keyed_by_email_ignoring_case() {
        let pool = test_pool().await;
        let first = seed_user(&pool, "Asha", "asha@example.com").await;
        let again = seed_user(&pool, "Someone Else", "ASHA@example.com").await;
        assert_eq!(first, again);

        let user = get_user(&pool, first).await.unwrap().unwrap();
        assert_eq!(user.name, "Asha");
    }

    #[tokio::test]
    async fn test_require_user_missing_is_not_found() {
        let pool = test_pool().await;
        let err = require_user(&pool, 42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
