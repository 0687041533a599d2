use std::collections::BTreeMap;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::error::AppError;
use crate::quiz::{QuizProgressState, QuizScores, QuizService};

#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    #[serde(default)]
    pub current_question: i64,
    #[serde(default)]
    pub answers: BTreeMap<u32, String>,
    pub results: Option<QuizScores>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: Option<QuizProgressState>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub results: QuizScores,
    pub completed_at: i64,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub results: QuizScores,
    pub answers: String,
    pub completed_at: i64,
}

/// POST /api/quiz/progress (requires session)
pub async fn save_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SaveProgressRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.current_question < 0 {
        return Err(AppError::Validation(
            "Question index must be non-negative".to_string(),
        ));
    }
    if let Some(results) = &req.results {
        results.validate()?;
    }

    QuizService::save_progress(
        &state.db,
        &user.user_id,
        req.current_question,
        &req.answers,
        req.results.as_ref(),
    )
    .await?;

    Ok(Json(serde_json::json!({"status": "success"})))
}

/// GET /api/quiz/progress (requires session)
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ProgressResponse>, AppError> {
    let progress = QuizService::load_progress(&state.db, &user.user_id).await?;

    Ok(Json(ProgressResponse { progress }))
}

/// POST /api/quiz/submit (requires session)
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(scores): Json<QuizScores>,
) -> Result<Json<SubmitResponse>, AppError> {
    let result = QuizService::submit(&state.db, &user.user_id, scores).await?;

    Ok(Json(SubmitResponse {
        results: scores,
        completed_at: result.completed_at,
    }))
}

/// GET /api/quiz/results (requires session)
pub async fn latest_results(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ResultsResponse>, AppError> {
    let result = QuizService::latest_result(&state.db, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No results found".to_string()))?;

    let results: QuizScores = serde_json::from_str(&result.results)?;

    Ok(Json(ResultsResponse {
        results,
        answers: result.answers,
        completed_at: result.completed_at,
    }))
}
