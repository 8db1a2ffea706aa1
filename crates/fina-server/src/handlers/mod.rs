//! HTTP request handlers organized by domain
//!
//! - `classification`: suggestions, learning and history stats
//! - `analysis`: anomaly checks, forecasts, recommendations and insights

pub mod analysis;
pub mod classification;

use std::sync::Arc;

use axum::{body::to_bytes, extract::Request, extract::State, Json};
use serde::de::DeserializeOwned;

use crate::{AppError, AppState, HealthResponse};

/// Largest JSON body accepted by the POST endpoints
const MAX_BODY_SIZE: usize = 16 * 1024;

// Re-export all handlers for use in router
pub use analysis::*;
pub use classification::*;

/// GET /api/health - Liveness check (no auth)
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        phraser: state.phraser.is_some(),
    })
}

/// Read a JSON request body, mapping failures to 400
async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))
}
