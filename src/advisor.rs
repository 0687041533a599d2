//! Chat orchestration: chat lifecycle, response generation and the
//! deterministic fallback used whenever the generation call is unavailable.
//!
//! `CareerAdvisor` is constructed once at startup and handed to request
//! handlers through shared state; it owns no process-wide singletons.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{Pool, Sqlite};
use tokio::sync::Mutex;

use crate::db::models::{Chat, ChatMessage, MessageRole};
use crate::db::{ChatRepository, UserRepository};
use crate::error::AppError;
use crate::llm::{GenerationOptions, Generator};
use crate::memory;
use crate::quiz::QuizService;

pub const DEFAULT_CHAT_TITLE: &str = "Новый чат";

/// Generated titles longer than this fall back to plain truncation.
const TITLE_MAX_CHARS: usize = 40;
const TITLE_TRUNCATE_CHARS: usize = 30;
/// Portion of the first message shown to the title generator.
const TITLE_CONTEXT_CHARS: usize = 200;

pub struct CareerAdvisor {
    db: Pool<Sqlite>,
    generator: Generator,
    generation_timeout: Duration,
    // Serializes send_message per user so two concurrent sends cannot both
    // observe "no active chat" and create duplicate chats.
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CareerAdvisor {
    pub fn new(db: Pool<Sqlite>, generator: Generator, generation_timeout: Duration) -> Self {
        Self {
            db,
            generator,
            generation_timeout,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create a chat and make it the user's active chat.
    ///
    /// Title precedence: explicit title, then one generated from the first
    /// message, then the fixed placeholder.
    pub async fn create_chat(
        &self,
        user_id: &str,
        title: Option<&str>,
        first_message: Option<&str>,
    ) -> Result<Chat, AppError> {
        let title = match (title.map(str::trim).filter(|t| !t.is_empty()), first_message) {
            (Some(title), _) => title.to_string(),
            (None, Some(message)) => self.generate_title(message).await,
            (None, None) => DEFAULT_CHAT_TITLE.to_string(),
        };

        let chat = ChatRepository::create(&self.db, user_id, &title).await?;
        ChatRepository::set_active(&self.db, user_id, &chat.id).await?;

        Ok(chat)
    }

    /// Ask the generator for a short chat title; any failure, empty or
    /// oversize output degrades to plain truncation of the message.
    async fn generate_title(&self, first_message: &str) -> String {
        let context: String = first_message.chars().take(TITLE_CONTEXT_CHARS).collect();
        let prompt = format!(
            "Придумай очень краткое и информативное название для чата \
             карьерного консультанта. Основано на первом сообщении пользователя. \
             Максимум 3-4 слова. Только название, без объяснений и кавычек.\n\n\
             Сообщение: \"{}\"\n\nНазвание:",
            context
        );

        let options = GenerationOptions {
            max_output_tokens: Some(20),
            temperature: Some(0.3),
        };

        let generated = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&prompt, options),
        )
        .await;

        match generated {
            Ok(Ok(raw)) => {
                let title = raw.replace(['"', '\''], "");
                let title = title.trim();
                if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
                    simple_title(first_message)
                } else {
                    title.to_string()
                }
            }
            Ok(Err(e)) => {
                tracing::debug!("Title generation failed: {}", e);
                simple_title(first_message)
            }
            Err(_) => {
                tracing::debug!("Title generation timed out");
                simple_title(first_message)
            }
        }
    }

    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<Chat>, AppError> {
        ChatRepository::list_for_user(&self.db, user_id).await
    }

    pub async fn get_active_chat(&self, user_id: &str) -> Result<Option<Chat>, AppError> {
        ChatRepository::get_active(&self.db, user_id).await
    }

    pub async fn set_active_chat(&self, user_id: &str, chat_id: &str) -> Result<bool, AppError> {
        ChatRepository::set_active(&self.db, user_id, chat_id).await
    }

    pub async fn delete_chat(&self, user_id: &str, chat_id: &str) -> Result<bool, AppError> {
        ChatRepository::delete(&self.db, user_id, chat_id).await
    }

    pub async fn rename_chat(
        &self,
        user_id: &str,
        chat_id: &str,
        new_title: &str,
    ) -> Result<bool, AppError> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(AppError::Validation("Chat title must not be empty".to_string()));
        }

        ChatRepository::rename(&self.db, user_id, chat_id, new_title).await
    }

    /// Messages of the active chat, oldest first, with the chat itself.
    pub async fn active_chat_messages(
        &self,
        user_id: &str,
    ) -> Result<Option<(Chat, Vec<ChatMessage>)>, AppError> {
        let Some(chat) = ChatRepository::get_active(&self.db, user_id).await? else {
            return Ok(None);
        };

        let messages = ChatRepository::get_messages(&self.db, &chat.id).await?;
        Ok(Some((chat, messages)))
    }

    /// Append the user message to the active chat (creating one when
    /// needed), generate a reply from the assembled context, and append it.
    ///
    /// Generation failures are recovered here; the caller always gets a
    /// response text.
    pub async fn send_message(&self, user_id: &str, text: &str) -> Result<String, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message must not be empty".to_string()));
        }

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let chat = match ChatRepository::get_active(&self.db, user_id).await? {
            Some(chat) => chat,
            None => {
                self.create_chat(user_id, Some(&simple_title(text)), None)
                    .await?
            }
        };

        ChatRepository::add_message(&self.db, &chat.id, MessageRole::User, text).await?;

        let messages = ChatRepository::get_messages(&self.db, &chat.id).await?;
        let scores = QuizService::latest_scores(&self.db, user_id).await?;
        let profile = UserRepository::get_profile(&self.db, user_id).await?;

        let prompt = memory::assemble(&messages, scores.as_ref(), profile.as_ref());

        let generated = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&prompt, GenerationOptions::default()),
        )
        .await;

        let response = match generated {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!("Generation failed, using fallback: {}", e);
                fallback_response(text).to_string()
            }
            Err(_) => {
                tracing::warn!("Generation timed out, using fallback");
                fallback_response(text).to_string()
            }
        };

        ChatRepository::add_message(&self.db, &chat.id, MessageRole::Assistant, &response).await?;

        Ok(response)
    }
}

/// Truncation-based chat title: first 30 characters of the message plus an
/// ellipsis when it was longer.
pub fn simple_title(message: &str) -> String {
    if message.is_empty() {
        return DEFAULT_CHAT_TITLE.to_string();
    }

    let mut title: String = message.chars().take(TITLE_TRUNCATE_CHARS).collect();
    if message.chars().count() > TITLE_TRUNCATE_CHARS {
        title.push_str("...");
    }
    title
}

/// Deterministic keyword-matched responses used when generation is
/// unavailable. Matching is case-insensitive over word stems.
pub fn fallback_response(message: &str) -> &'static str {
    let message = message.to_lowercase();
    let matches = |stems: &[&str]| stems.iter().any(|stem| message.contains(stem));

    if matches(&["привет", "здравствуй", "добрый", "hello", "hi"]) {
        "Здравствуйте! Я Профориентолог - ваш ИИ-помощник по выбору профессии. Чем могу помочь в вопросах профессионального развития?"
    } else if matches(&["професси", "работ", "карьер"]) {
        "Для выбора подходящей профессии важно понимать свои интересы и способности. Расскажите подробнее о том, что вам нравится делать, и я помогу подобрать подходящие направления."
    } else if matches(&["образован", "вуз", "университет", "поступл", "курс"]) {
        "Выбор образовательного направления зависит от ваших интересов и целей. Рекомендую изучить профильные предметы, поговорить с действующими специалистами и пройти практику в интересующей сфере."
    } else if matches(&["навык", "умение", "компетенц"]) {
        "Развитие профессиональных навыков - ключ к успеху. Сосредоточьтесь на тех областях, которые соответствуют выбранной профессии, и не забывайте о soft skills - коммуникации, критическом мышлении и творчестве."
    } else if matches(&["зарплат", "востребован", "рынок", "перспектив"]) {
        "Актуальную информацию о рынке труда можно найти на профильных сайтах по трудоустройству. Важно учитывать не только текущую востребованность, но и перспективы развития направления."
    } else if matches(&["интерес", "качеств", "способност", "люблю"]) {
        "Понимание своих интересов и качеств - первый шаг к правильному выбору профессии. Подумайте, что вам действительно нравится делать, и в каких ситуациях вы чувствуете себя наиболее уверенно."
    } else if matches(&["домашк", "сочинен", "реферат", "математик", "физик"]) {
        "Извините, но я специализируюсь только на вопросах профориентации и выбора профессии. Пожалуйста, задайте вопрос, связанный с профессиональным развитием или выбором образовательного направления."
    } else {
        "Расскажите подробнее о ваших интересах и целях в профессиональной сфере. Это поможет мне дать более точный и полезный совет по выбору профессии."
    }
}
