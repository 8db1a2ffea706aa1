//! Analysis handlers: anomalies, forecasts, recommendations, insights

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_FORECAST_MONTHS};
use fina_core::{AnomalyCheck, ForecastPoint, InsightReport, YearMonth};

/// Optional month/year selector; missing parts default to the current month
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PeriodQuery {
    fn resolve(&self) -> Result<YearMonth, AppError> {
        let current = YearMonth::current();
        let month = self.month.unwrap_or(current.month());
        let year = self.year.unwrap_or(current.year());
        YearMonth::new(year, month)
            .ok_or_else(|| AppError::bad_request("month must be between 1 and 12"))
    }
}

/// Query parameters for an anomaly check
#[derive(Debug, Deserialize)]
pub struct AnomalyQuery {
    pub category_id: i64,
    /// Amount in cents to check
    pub amount: i64,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Query parameters for the forecast
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub months: Option<u32>,
}

/// Recommendations for one month
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub month: u32,
    pub year: i32,
    pub recommendations: Vec<String>,
}

/// GET /api/users/:user_id/anomaly - Compare an amount to the category's history
pub async fn detect_anomaly(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<AnomalyQuery>,
) -> Result<Json<AnomalyCheck>, AppError> {
    let period = PeriodQuery {
        month: params.month,
        year: params.year,
    }
    .resolve()?;

    let check = state.engine.detect_anomaly(
        user_id,
        params.category_id,
        params.amount,
        period.month(),
        period.year(),
        None,
    );

    Ok(Json(check))
}

/// GET /api/users/:user_id/forecast?months=N - Flat cash-flow projection
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<Vec<ForecastPoint>>, AppError> {
    let months = params
        .months
        .unwrap_or(state.engine.config().recommendations.forecast_months);

    if !(1..=MAX_FORECAST_MONTHS).contains(&months) {
        return Err(AppError::bad_request(&format!(
            "months must be between 1 and {}",
            MAX_FORECAST_MONTHS
        )));
    }

    Ok(Json(state.engine.forecast_cash_flow(user_id, months)))
}

/// GET /api/users/:user_id/recommendations - Rule-based advice for a month
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let period = params.resolve()?;

    let recommendations = state
        .engine
        .generate_recommendations_from(user_id, period);

    Ok(Json(RecommendationsResponse {
        month: period.month(),
        year: period.year(),
        recommendations,
    }))
}

/// GET /api/users/:user_id/insights - Recommendations plus an optional narrative
pub async fn insights(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<InsightReport>, AppError> {
    let period = params.resolve()?;

    let report = state
        .engine
        .generate_insights_from(user_id, period, state.phraser.as_deref())
        .await;

    Ok(Json(report))
}
