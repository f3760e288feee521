//! Prediction handlers

use axum::{extract::{rejection::JsonRejection, State}, Json};

use crate::{AppState, AppError, AppResult};
use crate::inference::Prediction;
use crate::models::{InputRecord, PredictionResponse, WeatherPredictionResponse, WeatherReport};

/// Score one 20-field record
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<InputRecord>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let Json(record) = payload?;

    let prediction = state.predictor.predict(&record)?;
    Ok(Json(to_response(prediction)))
}

/// Score the first day of a weather timeline report
pub async fn predict_weather(
    State(state): State<AppState>,
    payload: Result<Json<WeatherReport>, JsonRejection>,
) -> AppResult<Json<WeatherPredictionResponse>> {
    let Json(report) = payload?;

    let record = report
        .to_input()
        .ok_or_else(|| AppError::Unprocessable("Weather report has no days".to_string()))?;
    let prediction = state.predictor.predict(&record)?;

    Ok(Json(WeatherPredictionResponse {
        prediction: to_response(prediction),
        datetime: report.current_day().and_then(|day| day.datetime.clone()),
        resolved_address: report.resolved_address,
    }))
}

fn to_response(prediction: Prediction) -> PredictionResponse {
    tracing::debug!(score = prediction.score, risk = ?prediction.risk, "Scored request");
    PredictionResponse {
        flood_risk: prediction.risk,
        confidence: prediction.confidence,
    }
}
