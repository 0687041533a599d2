use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::Session;
use crate::error::AppError;

pub struct SessionRepository;

impl SessionRepository {
    /// Issue a fresh session for `(user_id, ip_address)`.
    ///
    /// Sessions are unique per address: every session currently bound to the
    /// address is revoked first, whichever user owned it. Both statements run
    /// in one transaction.
    pub async fn issue(
        pool: &Pool<Sqlite>,
        user_id: &str,
        ip_address: &str,
    ) -> Result<Session, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM sessions WHERE ip_address = ?")
            .bind(ip_address)
            .execute(&mut *tx)
            .await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
INSERT INTO sessions (id, user_id, ip_address, created_at)
VALUES (?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(ip_address)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(session)
    }

    /// Exact-match check, no normalization of either field.
    pub async fn authorize(
        pool: &Pool<Sqlite>,
        user_id: &str,
        ip_address: &str,
    ) -> Result<bool, AppError> {
        let row = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = ? AND ip_address = ?",
        )
        .bind(user_id)
        .bind(ip_address)
        .fetch_optional(pool)
        .await?;

        Ok(row.is_some())
    }

    /// The user's most recent session. Older rows for other addresses may
    /// linger until another occupant claims those addresses.
    pub async fn get_by_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
SELECT * FROM sessions
WHERE user_id = ?
ORDER BY created_at DESC, rowid DESC
LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }
}
