use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub ip_address: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: i64,
}

/// Raw quiz-progress row; `answers`/`results` hold JSON text and are decoded
/// by the quiz service.
#[derive(Debug, Clone, FromRow)]
pub struct QuizProgressRow {
    pub user_id: String,
    pub current_question: i64,
    pub answers: String,
    pub results: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuizResult {
    pub id: String,
    pub user_id: String,
    /// Summary string in the fixed `A:n,B:n,C:n,D:n` format.
    pub answers: String,
    /// JSON-encoded category counts.
    pub results: String,
    pub completed_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub age: Option<i64>,
    pub interests: Option<String>,
    pub strengths: Option<String>,
    pub favorite_subjects: Option<String>,
    pub goals: Option<String>,
    pub updated_at: i64,
}

/// The five recognized profile fields. Updates overwrite the whole row;
/// unknown fields are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub age: Option<i64>,
    pub interests: Option<String>,
    pub strengths: Option<String>,
    pub favorite_subjects: Option<String>,
    pub goals: Option<String>,
}
