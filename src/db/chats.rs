use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{Chat, ChatMessage, MessageRole};
use crate::error::AppError;

pub struct ChatRepository;

impl ChatRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        title: &str,
    ) -> Result<Chat, AppError> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        let chat = sqlx::query_as::<_, Chat>(
            r#"
INSERT INTO chats (id, user_id, title, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(chat)
    }

    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<Chat>, AppError> {
        let chats = sqlx::query_as::<_, Chat>(
            "SELECT * FROM chats WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(chats)
    }

    pub async fn get_owned(
        pool: &Pool<Sqlite>,
        user_id: &str,
        chat_id: &str,
    ) -> Result<Option<Chat>, AppError> {
        let chat = sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(chat)
    }

    /// The pointer may only reference a chat owned by the same user; returns
    /// false when the ownership pre-check fails.
    pub async fn set_active(
        pool: &Pool<Sqlite>,
        user_id: &str,
        chat_id: &str,
    ) -> Result<bool, AppError> {
        if Self::get_owned(pool, user_id, chat_id).await?.is_none() {
            return Ok(false);
        }

        sqlx::query("INSERT OR REPLACE INTO active_chats (user_id, chat_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(chat_id)
            .execute(pool)
            .await?;

        Ok(true)
    }

    pub async fn get_active(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<Chat>, AppError> {
        let chat = sqlx::query_as::<_, Chat>(
            r#"
SELECT c.id, c.user_id, c.title, c.created_at, c.updated_at
FROM chats c
JOIN active_chats ac ON c.id = ac.chat_id
WHERE ac.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(chat)
    }

    /// Deletes the chat's messages, the chat row and, when it was the active
    /// chat, the active pointer. Returns false when the chat is not owned.
    pub async fn delete(
        pool: &Pool<Sqlite>,
        user_id: &str,
        chat_id: &str,
    ) -> Result<bool, AppError> {
        if Self::get_owned(pool, user_id, chat_id).await?.is_none() {
            return Ok(false);
        }

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM chat_messages WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM active_chats WHERE user_id = ? AND chat_id = ?")
            .bind(user_id)
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    pub async fn rename(
        pool: &Pool<Sqlite>,
        user_id: &str,
        chat_id: &str,
        new_title: &str,
    ) -> Result<bool, AppError> {
        let updated = sqlx::query("UPDATE chats SET title = ? WHERE id = ? AND user_id = ?")
            .bind(new_title)
            .bind(chat_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(updated.rows_affected() > 0)
    }

    /// Appends a message and touches the owning chat's `updated_at`.
    pub async fn add_message(
        pool: &Pool<Sqlite>,
        chat_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let mut tx = pool.begin().await?;

        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
INSERT INTO chat_messages (id, chat_id, role, content, created_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(chat_id)
        .bind(role)
        .bind(content)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
            .bind(created_at)
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(message)
    }

    pub async fn get_messages(
        pool: &Pool<Sqlite>,
        chat_id: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
SELECT * FROM chat_messages
WHERE chat_id = ?
ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}
