pub mod auth;
pub mod chat;
pub mod middleware;
pub mod quiz;
pub mod state;

pub use state::AppState;

use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    // Everything below the session guard sees a validated CurrentUser
    let protected = Router::new()
        .route(
            "/api/quiz/progress",
            post(quiz::save_progress).get(quiz::get_progress),
        )
        .route("/api/quiz/submit", post(quiz::submit))
        .route("/api/quiz/results", get(quiz::latest_results))
        .route("/api/chat/chats", get(chat::list_chats))
        .route("/api/chat/create", post(chat::create_chat))
        .route("/api/chat/:chat_id/activate", post(chat::set_active_chat))
        .route("/api/chat/:chat_id/rename", put(chat::rename_chat))
        .route("/api/chat/:chat_id", delete(chat::delete_chat))
        .route("/api/chat/messages", get(chat::get_messages))
        .route("/api/chat/send", post(chat::send_message))
        .route(
            "/api/profile",
            get(chat::get_profile).put(chat::update_profile),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::session_guard,
        ));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
