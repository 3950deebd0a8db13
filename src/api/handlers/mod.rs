use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{CheckOptions, ComplianceEngine, ComplianceError};
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Caller-input failures map to 400 with the taxonomy message intact, so
/// the transport layer can distinguish a bad request from an outage.
fn validation_error(e: ComplianceError) -> (StatusCode, String) {
    tracing::warn!("Validation error: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Evaluation
// ============================================================

/// Body for a rain-trigger evaluation request.
///
/// Coordinates are optional in the wire type so that a null latitude maps
/// to the engine's invalid-location failure rather than a shapeless
/// deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRainTriggerRequest {
    pub project_id: Uuid,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// IANA zone override for deadline arithmetic.
    pub timezone: Option<String>,
    /// Evaluation instant override, for backfilling historical storms.
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRainTriggerResponse {
    pub triggered: bool,
    pub trigger: Option<Trigger>,
}

pub async fn check_rain_trigger(
    State(engine): State<Arc<ComplianceEngine>>,
    Json(request): Json<CheckRainTriggerRequest>,
) -> Result<Json<CheckRainTriggerResponse>, (StatusCode, String)> {
    let location = match (request.lat, request.lng) {
        (Some(lat), Some(lng)) => Location::new(lat, lng),
        _ => {
            return Err(validation_error(ComplianceError::InvalidLocation(
                "latitude and longitude are required".to_string(),
            )))
        }
    };

    let options = CheckOptions {
        timezone: request.timezone,
        as_of: request.as_of,
    };

    let trigger = engine
        .check_rain_trigger(request.project_id, location, options)
        .await
        .map_err(validation_error)?;

    Ok(Json(CheckRainTriggerResponse {
        triggered: trigger.is_some(),
        trigger,
    }))
}

pub async fn run_escalation_sweep(
    State(engine): State<Arc<ComplianceEngine>>,
) -> Result<StatusCode, (StatusCode, String)> {
    engine
        .check_pending_deadlines(Utc::now())
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn last_error(
    State(engine): State<Arc<ComplianceEngine>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "last_error": engine.last_error() }))
}

// ============================================================
// Per-project compliance views
// ============================================================

pub async fn compliance_history(
    State(engine): State<Arc<ComplianceEngine>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Trigger>>, (StatusCode, String)> {
    engine
        .compliance_history(project_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn cooldown_status(
    State(engine): State<Arc<ComplianceEngine>>,
    Path(project_id): Path<Uuid>,
) -> Json<CooldownStatus> {
    Json(engine.cooldown_status(project_id))
}

// ============================================================
// Triggers
// ============================================================

pub async fn get_trigger(
    State(engine): State<Arc<ComplianceEngine>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trigger>, (StatusCode, String)> {
    engine
        .get_trigger(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Trigger not found".to_string()))
}

pub async fn discharge_trigger(
    State(engine): State<Arc<ComplianceEngine>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if engine.record_inspection(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            "Trigger not found or not pending".to_string(),
        ))
    }
}
