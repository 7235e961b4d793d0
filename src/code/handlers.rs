use axum::{extract::State, Extension, Json};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::upload::CodeSubmission;
use crate::{ai::AiOutcome, error::AppError, guest::Caller, state::AppState};

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub review: String,
    pub language: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamps: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub success: bool,
    pub data: String,
    pub language: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamps: OffsetDateTime,
}

impl From<AiOutcome> for ReviewResponse {
    fn from(o: AiOutcome) -> Self {
        Self {
            success: true,
            review: o.text,
            language: o.language,
            timestamps: o.timestamp,
        }
    }
}

impl From<AiOutcome> for DataResponse {
    fn from(o: AiOutcome) -> Self {
        Self {
            success: true,
            data: o.text,
            language: o.language,
            timestamps: o.timestamp,
        }
    }
}

#[instrument(skip_all, fields(caller = %caller))]
pub async fn review_code(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    submission: CodeSubmission,
) -> Result<Json<ReviewResponse>, AppError> {
    let code = submission.source()?;
    let mode = submission.mode()?;
    let outcome = state.ai.review_code(&code, mode).await?;
    info!(language = %outcome.language, "code reviewed");
    Ok(Json(outcome.into()))
}

#[instrument(skip_all, fields(caller = %caller))]
pub async fn suggest_fixes(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    submission: CodeSubmission,
) -> Result<Json<ReviewResponse>, AppError> {
    let code = submission.source()?;
    submission.mode()?;
    let outcome = state.ai.suggest_fixes(&code).await?;
    info!(language = %outcome.language, "fixes suggested");
    Ok(Json(outcome.into()))
}

#[instrument(skip_all, fields(caller = %caller))]
pub async fn generate_documentation(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    submission: CodeSubmission,
) -> Result<Json<DataResponse>, AppError> {
    let code = submission.source()?;
    let mode = submission.mode()?;
    let outcome = state.ai.generate_documentation(&code, mode).await?;
    info!(language = %outcome.language, "documentation generated");
    Ok(Json(outcome.into()))
}

#[instrument(skip_all, fields(caller = %caller))]
pub async fn analyze_complexity(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    submission: CodeSubmission,
) -> Result<Json<DataResponse>, AppError> {
    let code = submission.source()?;
    submission.mode()?;
    let outcome = state.ai.analyze_complexity(&code).await?;
    info!(language = %outcome.language, "complexity analyzed");
    Ok(Json(outcome.into()))
}
