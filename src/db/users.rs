use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{ProfileUpdate, User, UserProfile};
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (id, username, email, password_hash, created_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_email(
        pool: &Pool<Sqlite>,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_profile(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<UserProfile>, AppError> {
        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        Ok(profile)
    }

    /// Overwrites the whole profile row; there is no partial-field merge.
    pub async fn upsert_profile(
        pool: &Pool<Sqlite>,
        user_id: &str,
        fields: &ProfileUpdate,
    ) -> Result<UserProfile, AppError> {
        let updated_at = chrono::Utc::now().timestamp();

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
INSERT OR REPLACE INTO user_profiles
    (user_id, age, interests, strengths, favorite_subjects, goals, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(fields.age)
        .bind(&fields.interests)
        .bind(&fields.strengths)
        .bind(&fields.favorite_subjects)
        .bind(&fields.goals)
        .bind(updated_at)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }
}
