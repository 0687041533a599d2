//! Prompt assembly for the career consultant.
//!
//! Layers, in fixed order: static persona instructions, the user's global
//! profile, the latest quiz result, then the recent conversation window with
//! a restated current question. Pure and deterministic; callers fetch the
//! inputs, this module only formats them.

use std::fmt::Write;

use crate::db::models::{ChatMessage, MessageRole, UserProfile};
use crate::quiz::QuizScores;

/// Number of trailing history messages included in the prompt.
const HISTORY_WINDOW: usize = 10;

const SYSTEM_PROMPT: &str = r#"Ты — "Профориентолог" — умный ИИ-помощник, который помогает подросткам и студентам найти подходящую профессию, понять свои интересы и выбрать образовательный путь.

Твоя цель:
- Помогать пользователю определиться с будущей профессией.
- Давать советы по выбору направления обучения, вузов, программ и курсов.
- Давать вдохновляющие, но реалистичные советы.
- Поддерживать нейтральный и доброжелательный стиль общения, как у настоящего карьерного консультанта.

Тебе НЕЛЬЗЯ:
- Решать домашние задания, писать сочинения, рефераты и т.д.
- Отвечать на вопросы, не связанные с выбором профессии, образованием, карьерой или личным развитием.
- Давать личные данные, ссылки на сомнительные сайты, или что-то, что может быть небезопасно.

Если вопрос не по теме:
- Вежливо объясни, что ты предназначен только для помощи с профориентацией.
- Предложи задать вопрос, связанный с поиском профессии, направлением вуза или личными интересами.

Стиль общения:
- Пиши просто и коротко, понятно и дружелюбно.
- Используй примеры из реальной жизни.
- Можно чуть неформально, как будто ты современный наставник или ментор.

Отвечай чётко, структурированно, кратко, логично, используя абзацы, списки, подзаголовки.
Всегда сначала дай краткий ответ.
Если вопрос сложный — раздели ответ на пункты: основная идея, объяснение, пример, вывод.
"#;

/// Human-readable name of a personality type letter.
pub fn type_name(letter: char) -> &'static str {
    match letter {
        'A' => "Практик-деятель",
        'B' => "Коммуникатор-организатор",
        'C' => "Творец-инноватор",
        'D' => "Аналитик-стратег",
        _ => "Неизвестный тип",
    }
}

fn profile_lines(profile: &UserProfile) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();

    if let Some(age) = profile.age {
        lines.push(("Возраст", age.to_string()));
    }
    for (label, value) in [
        ("Интересы", &profile.interests),
        ("Сильные стороны", &profile.strengths),
        ("Любимые предметы", &profile.favorite_subjects),
        ("Цели", &profile.goals),
    ] {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                lines.push((label, value.clone()));
            }
        }
    }

    lines
}

fn render_scores(scores: &QuizScores) -> String {
    format!(
        r#"{{"A": {}, "B": {}, "C": {}, "D": {}}}"#,
        scores.a, scores.b, scores.c, scores.d
    )
}

/// Build the full generation prompt from layered context.
pub fn assemble(
    messages: &[ChatMessage],
    scores: Option<&QuizScores>,
    profile: Option<&UserProfile>,
) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);

    if let Some(profile) = profile {
        let lines = profile_lines(profile);
        if !lines.is_empty() {
            prompt.push_str("\nГлобальная информация о пользователе:\n");
            for (label, value) in lines {
                let _ = writeln!(prompt, "- {}: {}", label, value);
            }
        }
    }

    if let Some(scores) = scores {
        let (letter, count) = scores.dominant();
        prompt.push_str("\nРезультаты теста пользователя:\n");
        let _ = writeln!(prompt, "- Результаты теста: {}", render_scores(scores));
        let _ = writeln!(
            prompt,
            "- Основной тип личности: {} ({} баллов)",
            type_name(letter),
            count
        );
    }

    prompt.push_str("\nИстория диалога:");

    let window_start = messages.len().saturating_sub(HISTORY_WINDOW);
    for message in &messages[window_start..] {
        let label = match message.role {
            MessageRole::User => "Человек",
            MessageRole::Assistant => "Консультант",
        };
        let _ = write!(prompt, "\n{}: {}", label, message.content);
    }

    // The question being answered: the newest user message, or the last
    // message of any role when no user message exists.
    let current_question = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .or_else(|| messages.last())
        .map(|m| m.content.as_str())
        .unwrap_or("");

    let _ = write!(
        prompt,
        "\n\nТекущий вопрос: {}\n\nТвой ответ:",
        current_question
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: "m".to_string(),
            chat_id: "c".to_string(),
            role,
            content: content.to_string(),
            created_at: 0,
        }
    }

    fn profile(interests: Option<&str>, age: Option<i64>) -> UserProfile {
        UserProfile {
            user_id: "u".to_string(),
            age,
            interests: interests.map(str::to_string),
            strengths: None,
            favorite_subjects: None,
            goals: None,
            updated_at: 0,
        }
    }

    #[test]
    fn test_minimal_prompt_has_no_optional_sections() {
        let messages = vec![
            message(MessageRole::User, "Hi"),
            message(MessageRole::Assistant, "Hello"),
        ];

        let prompt = assemble(&messages, None, None);

        assert!(!prompt.contains("Глобальная информация"));
        assert!(!prompt.contains("Результаты теста"));
        assert!(prompt.ends_with("Текущий вопрос: Hi\n\nТвой ответ:"));
    }

    #[test]
    fn test_current_question_is_newest_user_message() {
        let messages = vec![
            message(MessageRole::User, "первый"),
            message(MessageRole::Assistant, "ответ"),
            message(MessageRole::User, "второй"),
            message(MessageRole::Assistant, "ещё ответ"),
        ];

        let prompt = assemble(&messages, None, None);
        assert!(prompt.contains("Текущий вопрос: второй"));
    }

    #[test]
    fn test_current_question_falls_back_to_last_message() {
        let messages = vec![message(MessageRole::Assistant, "только ассистент")];

        let prompt = assemble(&messages, None, None);
        assert!(prompt.contains("Текущий вопрос: только ассистент"));
    }

    #[test]
    fn test_history_truncated_to_window() {
        let messages: Vec<ChatMessage> = (0..15)
            .map(|i| message(MessageRole::User, &format!("msg-{}", i)))
            .collect();

        let prompt = assemble(&messages, None, None);

        assert!(!prompt.contains("Человек: msg-4\n"));
        assert!(prompt.contains("Человек: msg-5"));
        assert!(prompt.contains("Человек: msg-14"));

        // Chronological order within the window
        let pos_5 = prompt.find("msg-5").unwrap();
        let pos_14 = prompt.find("msg-14").unwrap();
        assert!(pos_5 < pos_14);
    }

    #[test]
    fn test_profile_emits_only_populated_fields() {
        let prompt = assemble(&[], None, Some(&profile(Some("музыка"), None)));

        assert!(prompt.contains("Глобальная информация о пользователе:"));
        assert!(prompt.contains("- Интересы: музыка"));
        assert!(!prompt.contains("- Возраст"));
    }

    #[test]
    fn test_empty_profile_emits_no_section() {
        let prompt = assemble(&[], None, Some(&profile(Some("   "), None)));
        assert!(!prompt.contains("Глобальная информация"));
    }

    #[test]
    fn test_scores_section_names_dominant_type() {
        let scores = QuizScores { a: 3, b: 5, c: 5, d: 1 };
        let prompt = assemble(&[], Some(&scores), None);

        assert!(prompt.contains(r#"- Результаты теста: {"A": 3, "B": 5, "C": 5, "D": 1}"#));
        assert!(prompt.contains("- Основной тип личности: Коммуникатор-организатор (5 баллов)"));
    }
}
