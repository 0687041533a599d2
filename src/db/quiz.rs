use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{QuizProgressRow, QuizResult};
use crate::error::AppError;

pub struct QuizRepository;

impl QuizRepository {
    /// Wholesale upsert of the single progress row per user.
    pub async fn upsert_progress(
        pool: &Pool<Sqlite>,
        user_id: &str,
        current_question: i64,
        answers_json: &str,
        results_json: Option<&str>,
    ) -> Result<(), AppError> {
        let updated_at = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
INSERT OR REPLACE INTO quiz_progress (user_id, current_question, answers, results, updated_at)
VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(current_question)
        .bind(answers_json)
        .bind(results_json)
        .bind(updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get_progress(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<QuizProgressRow>, AppError> {
        let row =
            sqlx::query_as::<_, QuizProgressRow>("SELECT * FROM quiz_progress WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        Ok(row)
    }

    pub async fn clear_progress(pool: &Pool<Sqlite>, user_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM quiz_progress WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Append a completed result and drop the in-progress row, atomically.
    pub async fn record_result(
        pool: &Pool<Sqlite>,
        user_id: &str,
        answers_summary: &str,
        results_json: &str,
    ) -> Result<QuizResult, AppError> {
        let id = Uuid::new_v4().to_string();
        let completed_at = chrono::Utc::now().timestamp();

        let mut tx = pool.begin().await?;

        let result = sqlx::query_as::<_, QuizResult>(
            r#"
INSERT INTO quiz_results (id, user_id, answers, results, completed_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(answers_summary)
        .bind(results_json)
        .bind(completed_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM quiz_progress WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result)
    }

    pub async fn latest_result(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<QuizResult>, AppError> {
        let result = sqlx::query_as::<_, QuizResult>(
            r#"
SELECT * FROM quiz_results
WHERE user_id = ?
ORDER BY completed_at DESC, rowid DESC
LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(result)
    }
}
