use crate::calculate::build_request;
use crate::infra::{reload_reference, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use hcc_raf::error::AppError;
use hcc_raf::model::{CalculationPolicy, DemographicsInput, RafCalculator, RafResult};
use hcc_raf::reference::ReferenceSummary;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub(crate) struct RafPayload {
    #[serde(default)]
    pub(crate) diagnosis_codes: Vec<String>,
    pub(crate) demographics: DemographicsInput,
    #[serde(default)]
    pub(crate) model_name: Option<String>,
    #[serde(default)]
    pub(crate) interactions: BTreeMap<String, f64>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/raf", post(calculate_endpoint))
        .route("/api/v1/reference", get(reference_summary_endpoint))
        .route("/api/v1/reference/reload", post(reload_reference_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Acquire);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "loading reference data" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn calculate_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RafPayload>,
) -> Result<Json<RafResult>, AppError> {
    let RafPayload {
        diagnosis_codes,
        demographics,
        model_name,
        interactions,
    } = payload;

    let request = build_request(
        model_name.as_deref(),
        state.settings.default_model,
        diagnosis_codes,
        demographics,
        interactions,
    )?;

    let policy = CalculationPolicy {
        require_diagnoses: state.settings.require_diagnoses,
    };
    let calculator = RafCalculator::new(state.reference.current()).with_policy(policy);
    let result = calculator.calculate(&request)?;
    Ok(Json(result))
}

pub(crate) async fn reference_summary_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<ReferenceSummary> {
    Json(state.reference.current().summary())
}

pub(crate) async fn reload_reference_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<ReferenceSummary>, AppError> {
    let settings = Arc::clone(&state.settings);
    let shared = Arc::clone(&state.reference);

    let snapshot = tokio::task::spawn_blocking(move || reload_reference(&settings, &shared))
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?
        .map_err(|err| {
            warn!(error = %err, "reference reload failed; keeping previous snapshot");
            AppError::from(err)
        })?;

    state.readiness.store(true, Ordering::Release);
    info!(loaded_at = %snapshot.loaded_at(), "reference reload complete");
    Ok(Json(snapshot.summary()))
}
