//! Classification handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::read_json;
use crate::{AppError, AppState};
use fina_core::{ClassificationSource, ClassificationStats, Suggestion};

/// Request body for classifying a transaction
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub description: String,
    /// Signed amount in cents (negative = outflow)
    pub amount: i64,
    /// Category chosen by the caller; skips all matching when non-blank
    pub category: Option<String>,
}

/// Request body for teaching the engine a classification
#[derive(Debug, Deserialize)]
pub struct LearnRequest {
    pub description: String,
    pub amount: i64,
    pub category_id: i64,
    #[serde(default = "default_source")]
    pub source: ClassificationSource,
}

fn default_source() -> ClassificationSource {
    ClassificationSource::Manual
}

/// Response for a learn request
#[derive(Debug, Serialize)]
pub struct LearnResponse {
    pub success: bool,
    pub category_id: i64,
    pub category_name: String,
}

/// POST /api/users/:user_id/classify - Ranked category suggestions
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    request: Request,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let req: ClassifyRequest = read_json(request).await?;

    let suggestions = state
        .engine
        .classify(user_id, &req.description, req.amount, req.category.as_deref());

    Ok(Json(suggestions))
}

/// POST /api/users/:user_id/classify/simple - Single suggestion, no history
pub async fn classify_simple(
    State(state): State<Arc<AppState>>,
    Path(_user_id): Path<i64>,
    request: Request,
) -> Result<Json<Suggestion>, AppError> {
    let req: ClassifyRequest = read_json(request).await?;

    let suggestion =
        state
            .engine
            .classify_simple(&req.description, req.amount, req.category.as_deref());

    Ok(Json(suggestion))
}

/// POST /api/users/:user_id/learn - Record a classification decision
pub async fn learn(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    request: Request,
) -> Result<Json<LearnResponse>, AppError> {
    let req: LearnRequest = read_json(request).await?;

    if req.description.trim().is_empty() {
        return Err(AppError::bad_request("Description must not be empty"));
    }

    let category = state
        .db()
        .get_category(req.category_id)?
        .ok_or_else(|| AppError::not_found(&format!("Category {} not found", req.category_id)))?;

    state.engine.learn(
        user_id,
        &req.description,
        req.amount,
        category.id,
        req.source,
    );

    info!(
        user_id,
        category = %category.name,
        source = %req.source,
        "Learned classification"
    );

    Ok(Json(LearnResponse {
        success: true,
        category_id: category.id,
        category_name: category.name,
    }))
}

/// GET /api/users/:user_id/classification-stats - Learned history summary
pub async fn classification_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Json<ClassificationStats> {
    Json(state.engine.classification_stats(user_id))
}
