//! Quiz state machine: `NotStarted -> InProgress -> Submitted`.
//!
//! `InProgress` is represented by the presence of the per-user progress row;
//! submission records an immutable result and drops the progress row in one
//! transaction, returning the user to `NotStarted`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::db::models::QuizResult;
use crate::db::QuizRepository;
use crate::error::AppError;

/// Category counts for the four fixed personality types. Absent fields
/// default to 0, so the four-key shape holds structurally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScores {
    #[serde(rename = "A", default)]
    pub a: i64,
    #[serde(rename = "B", default)]
    pub b: i64,
    #[serde(rename = "C", default)]
    pub c: i64,
    #[serde(rename = "D", default)]
    pub d: i64,
}

impl QuizScores {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.a < 0 || self.b < 0 || self.c < 0 || self.d < 0 {
            return Err(AppError::Validation(
                "Quiz counts must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Fixed summary format used for the stored answers column.
    pub fn summary(&self) -> String {
        format!("A:{},B:{},C:{},D:{}", self.a, self.b, self.c, self.d)
    }

    /// Dominant category: maximum count, ties broken by the fixed A, B, C, D
    /// iteration order.
    pub fn dominant(&self) -> (char, i64) {
        let mut best = ('A', self.a);
        for (letter, count) in [('B', self.b), ('C', self.c), ('D', self.d)] {
            if count > best.1 {
                best = (letter, count);
            }
        }
        best
    }
}

/// In-progress quiz state as seen by the client.
#[derive(Debug, Clone, Serialize)]
pub struct QuizProgressState {
    pub current_question: i64,
    pub answers: BTreeMap<u32, String>,
    pub results: Option<QuizScores>,
}

pub struct QuizService;

impl QuizService {
    /// Wholesale overwrite of the saved state; idempotent under repeated
    /// identical input.
    pub async fn save_progress(
        pool: &Pool<Sqlite>,
        user_id: &str,
        current_question: i64,
        answers: &BTreeMap<u32, String>,
        results: Option<&QuizScores>,
    ) -> Result<(), AppError> {
        let answers_json = serde_json::to_string(answers)?;
        let results_json = results.map(serde_json::to_string).transpose()?;

        QuizRepository::upsert_progress(
            pool,
            user_id,
            current_question,
            &answers_json,
            results_json.as_deref(),
        )
        .await
    }

    pub async fn load_progress(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<QuizProgressState>, AppError> {
        let Some(row) = QuizRepository::get_progress(pool, user_id).await? else {
            return Ok(None);
        };

        let answers: BTreeMap<u32, String> = serde_json::from_str(&row.answers)?;
        let results: Option<QuizScores> =
            row.results.as_deref().map(serde_json::from_str).transpose()?;

        Ok(Some(QuizProgressState {
            current_question: row.current_question,
            answers,
            results,
        }))
    }

    /// Finalize the quiz: record the result and clear any saved progress,
    /// atomically.
    pub async fn submit(
        pool: &Pool<Sqlite>,
        user_id: &str,
        scores: QuizScores,
    ) -> Result<QuizResult, AppError> {
        scores.validate()?;

        let results_json = serde_json::to_string(&scores)?;
        QuizRepository::record_result(pool, user_id, &scores.summary(), &results_json).await
    }

    pub async fn latest_result(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<QuizResult>, AppError> {
        QuizRepository::latest_result(pool, user_id).await
    }

    /// Decoded counts of the most recent completed quiz, if any.
    pub async fn latest_scores(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<QuizScores>, AppError> {
        let Some(result) = QuizRepository::latest_result(pool, user_id).await? else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_str(&result.results)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_format() {
        let scores = QuizScores { a: 3, b: 5, c: 0, d: 1 };
        assert_eq!(scores.summary(), "A:3,B:5,C:0,D:1");
    }

    #[test]
    fn test_dominant_tie_breaks_in_fixed_order() {
        let scores = QuizScores { a: 3, b: 5, c: 5, d: 1 };
        assert_eq!(scores.dominant(), ('B', 5));
    }

    #[test]
    fn test_dominant_all_zero_is_a() {
        assert_eq!(QuizScores::default().dominant(), ('A', 0));
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let scores: QuizScores = serde_json::from_str(r#"{"B": 4}"#).unwrap();
        assert_eq!(scores, QuizScores { a: 0, b: 4, c: 0, d: 0 });
    }

    #[test]
    fn test_negative_counts_rejected() {
        let scores = QuizScores { a: -1, b: 0, c: 0, d: 0 };
        assert!(scores.validate().is_err());
    }

    #[test]
    fn test_scores_round_trip() {
        let scores = QuizScores { a: 1, b: 2, c: 3, d: 4 };
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(serde_json::from_str::<QuizScores>(&json).unwrap(), scores);
    }
}
