use std::collections::BTreeMap;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use career_guide::advisor::{fallback_response, CareerAdvisor, DEFAULT_CHAT_TITLE};
use career_guide::auth::AuthService;
use career_guide::db::models::{MessageRole, ProfileUpdate};
use career_guide::db::{ChatRepository, SessionRepository, UserRepository};
use career_guide::error::AppError;
use career_guide::llm::Generator;
use career_guide::quiz::{QuizScores, QuizService};

async fn test_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

fn advisor_without_backend(pool: &Pool<Sqlite>) -> CareerAdvisor {
    CareerAdvisor::new(pool.clone(), Generator::Disabled, Duration::from_secs(5))
}

async fn register(pool: &Pool<Sqlite>, email: &str, ip: &str) -> String {
    AuthService::register(pool, "testuser", email, "password123", ip)
        .await
        .expect("registration")
        .id
}

async fn user_count(pool: &Pool<Sqlite>) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .expect("count")
}

#[tokio::test]
async fn registration_assigns_id_and_issues_session() {
    let pool = test_pool().await;

    let user_id = register(&pool, "alice@example.com", "10.0.0.1").await;

    assert!(!user_id.is_empty());
    assert!(SessionRepository::authorize(&pool, &user_id, "10.0.0.1")
        .await
        .unwrap());
    assert!(!SessionRepository::authorize(&pool, &user_id, "10.0.0.2")
        .await
        .unwrap());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_and_creates_no_row() {
    let pool = test_pool().await;

    register(&pool, "alice@example.com", "10.0.0.1").await;

    let err = AuthService::register(&pool, "other", "alice@example.com", "password456", "10.0.0.2")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(user_count(&pool).await, 1);
}

#[tokio::test]
async fn passwords_are_stored_hashed() {
    let pool = test_pool().await;

    register(&pool, "alice@example.com", "10.0.0.1").await;

    let user = UserRepository::get_by_email(&pool, "alice@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_ne!(user.password_hash, "password123");
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn login_verifies_credentials() {
    let pool = test_pool().await;

    register(&pool, "alice@example.com", "10.0.0.1").await;

    let user = AuthService::login(&pool, "alice@example.com", "password123", "10.0.0.5")
        .await
        .unwrap();
    assert!(SessionRepository::authorize(&pool, &user.id, "10.0.0.5")
        .await
        .unwrap());

    let err = AuthService::login(&pool, "alice@example.com", "wrong-password", "10.0.0.5")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn issuing_for_an_address_evicts_its_previous_occupant() {
    let pool = test_pool().await;

    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let bob = register(&pool, "bob@example.com", "10.0.0.1").await;

    // Bob registering from the shared address revoked Alice's session there
    assert!(!SessionRepository::authorize(&pool, &alice, "10.0.0.1")
        .await
        .unwrap());
    assert!(SessionRepository::authorize(&pool, &bob, "10.0.0.1")
        .await
        .unwrap());
}

#[tokio::test]
async fn self_heal_reissues_for_the_new_address() {
    let pool = test_pool().await;

    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;

    // Address change: the guard re-issues rather than rejecting
    SessionRepository::issue(&pool, &alice, "10.0.0.2").await.unwrap();

    assert!(SessionRepository::authorize(&pool, &alice, "10.0.0.2")
        .await
        .unwrap());

    // The freshest session is the one the guard compares against
    let session = SessionRepository::get_by_user(&pool, &alice)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.ip_address, "10.0.0.2");
}

#[tokio::test]
async fn quiz_progress_round_trips_exactly() {
    let pool = test_pool().await;
    let user = register(&pool, "alice@example.com", "10.0.0.1").await;

    let mut answers = BTreeMap::new();
    answers.insert(0u32, "A".to_string());
    answers.insert(1u32, "C".to_string());

    QuizService::save_progress(&pool, &user, 2, &answers, None)
        .await
        .unwrap();

    let state = QuizService::load_progress(&pool, &user).await.unwrap().unwrap();
    assert_eq!(state.current_question, 2);
    assert_eq!(state.answers, answers);
    assert_eq!(state.results, None);

    // Saving again overwrites wholesale
    let partial = QuizScores { a: 1, b: 0, c: 1, d: 0 };
    QuizService::save_progress(&pool, &user, 3, &answers, Some(&partial))
        .await
        .unwrap();

    let state = QuizService::load_progress(&pool, &user).await.unwrap().unwrap();
    assert_eq!(state.current_question, 3);
    assert_eq!(state.results, Some(partial));
}

#[tokio::test]
async fn submit_records_result_and_clears_progress() {
    let pool = test_pool().await;
    let user = register(&pool, "alice@example.com", "10.0.0.1").await;

    let answers = BTreeMap::from([(0u32, "B".to_string())]);
    QuizService::save_progress(&pool, &user, 1, &answers, None)
        .await
        .unwrap();

    let scores = QuizScores { a: 3, b: 5, c: 5, d: 1 };
    let result = QuizService::submit(&pool, &user, scores).await.unwrap();

    assert_eq!(result.answers, "A:3,B:5,C:5,D:1");
    assert!(QuizService::load_progress(&pool, &user).await.unwrap().is_none());

    let latest = QuizService::latest_result(&pool, &user).await.unwrap().unwrap();
    assert_eq!(latest.id, result.id);
    assert_eq!(
        QuizService::latest_scores(&pool, &user).await.unwrap(),
        Some(scores)
    );
}

#[tokio::test]
async fn latest_result_tracks_the_newest_submission() {
    let pool = test_pool().await;
    let user = register(&pool, "alice@example.com", "10.0.0.1").await;

    let first = QuizScores { a: 9, b: 0, c: 0, d: 0 };
    let second = QuizScores { a: 0, b: 0, c: 0, d: 9 };

    QuizService::submit(&pool, &user, first).await.unwrap();
    QuizService::submit(&pool, &user, second).await.unwrap();

    assert_eq!(
        QuizService::latest_scores(&pool, &user).await.unwrap(),
        Some(second)
    );
}

#[tokio::test]
async fn submit_rejects_negative_counts() {
    let pool = test_pool().await;
    let user = register(&pool, "alice@example.com", "10.0.0.1").await;

    let err = QuizService::submit(&pool, &user, QuizScores { a: -2, b: 0, c: 0, d: 0 })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(QuizService::latest_result(&pool, &user).await.unwrap().is_none());
}

#[tokio::test]
async fn active_chat_pointer_is_owner_checked() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let bob = register(&pool, "bob@example.com", "10.0.0.2").await;
    let advisor = advisor_without_backend(&pool);

    let chat = advisor.create_chat(&alice, Some("Мой чат"), None).await.unwrap();

    assert!(!advisor.set_active_chat(&bob, &chat.id).await.unwrap());
    assert!(advisor.get_active_chat(&bob).await.unwrap().is_none());

    let active = advisor.get_active_chat(&alice).await.unwrap().unwrap();
    assert_eq!(active.id, chat.id);
}

#[tokio::test]
async fn create_chat_without_title_or_message_uses_placeholder() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let advisor = advisor_without_backend(&pool);

    let chat = advisor.create_chat(&alice, None, None).await.unwrap();
    assert_eq!(chat.title, DEFAULT_CHAT_TITLE);
}

#[tokio::test]
async fn create_chat_titles_from_first_message_when_backend_is_down() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let advisor = advisor_without_backend(&pool);

    let long_message = "Помоги мне выбрать профессию, связанную с программированием";
    let chat = advisor
        .create_chat(&alice, None, Some(long_message))
        .await
        .unwrap();

    let expected: String = long_message.chars().take(30).collect();
    assert_eq!(chat.title, format!("{}...", expected));
}

#[tokio::test]
async fn delete_chat_removes_messages_and_clears_pointer() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let bob = register(&pool, "bob@example.com", "10.0.0.2").await;
    let advisor = advisor_without_backend(&pool);

    let chat = advisor.create_chat(&alice, Some("Удаляемый"), None).await.unwrap();
    ChatRepository::add_message(&pool, &chat.id, MessageRole::User, "привет")
        .await
        .unwrap();

    assert!(!advisor.delete_chat(&bob, &chat.id).await.unwrap());
    assert!(advisor.delete_chat(&alice, &chat.id).await.unwrap());

    assert!(advisor.get_active_chat(&alice).await.unwrap().is_none());
    assert!(advisor.list_chats(&alice).await.unwrap().is_empty());

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE chat_id = ?")
        .bind(&chat.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn rename_chat_is_owner_checked() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let bob = register(&pool, "bob@example.com", "10.0.0.2").await;
    let advisor = advisor_without_backend(&pool);

    let chat = advisor.create_chat(&alice, Some("Старое имя"), None).await.unwrap();

    assert!(!advisor.rename_chat(&bob, &chat.id, "Чужое имя").await.unwrap());
    assert!(advisor.rename_chat(&alice, &chat.id, "Новое имя").await.unwrap());

    let chats = advisor.list_chats(&alice).await.unwrap();
    assert_eq!(chats[0].title, "Новое имя");
}

#[tokio::test]
async fn send_message_falls_back_and_persists_both_messages() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let advisor = advisor_without_backend(&pool);

    let response = advisor.send_message(&alice, "Привет").await.unwrap();
    assert_eq!(response, fallback_response("Привет"));

    // An active chat was created, titled from the message
    let (chat, messages) = advisor.active_chat_messages(&alice).await.unwrap().unwrap();
    assert_eq!(chat.title, "Привет");

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "Привет");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, response);
}

#[tokio::test]
async fn send_message_reuses_the_active_chat_in_order() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;
    let advisor = advisor_without_backend(&pool);

    advisor.send_message(&alice, "Привет").await.unwrap();
    advisor.send_message(&alice, "Какие профессии мне подходят?").await.unwrap();

    assert_eq!(advisor.list_chats(&alice).await.unwrap().len(), 1);

    let (_, messages) = advisor.active_chat_messages(&alice).await.unwrap().unwrap();
    assert_eq!(messages.len(), 4);

    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents[0], "Привет");
    assert_eq!(contents[2], "Какие профессии мне подходят?");
}

#[tokio::test]
async fn profile_updates_overwrite_wholesale() {
    let pool = test_pool().await;
    let alice = register(&pool, "alice@example.com", "10.0.0.1").await;

    let first = ProfileUpdate {
        age: Some(16),
        interests: Some("музыка".to_string()),
        ..Default::default()
    };
    UserRepository::upsert_profile(&pool, &alice, &first).await.unwrap();

    let second = ProfileUpdate {
        goals: Some("поступить в вуз".to_string()),
        ..Default::default()
    };
    UserRepository::upsert_profile(&pool, &alice, &second).await.unwrap();

    let profile = UserRepository::get_profile(&pool, &alice).await.unwrap().unwrap();
    assert_eq!(profile.goals.as_deref(), Some("поступить в вуз"));
    assert_eq!(profile.age, None);
    assert_eq!(profile.interests, None);
}
