use axum::{
    Json,
    extract::{
        Query, State, WebSocketUpgrade,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use intake_storage::{PatientDraft, StoredRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ApiError, SEARCH_FAILURE_MESSAGE, STORAGE_FAILURE_MESSAGE};
use crate::realtime::run_connection;
use crate::server::AppState;

/// Message returned alongside a newly stored record.
pub const CREATED_MESSAGE: &str = "Patient data saved successfully";

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub patient: StoredRecord,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "service": "Patient Intake Service",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.intake.store().backend_name(),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            error: None,
        }),
    )
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.intake.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                error: Some(e.to_string()),
            }),
        ),
    }
}

pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<PatientDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) = payload?;
    let patient = state
        .intake
        .create(&draft)
        .await
        .map_err(|e| ApiError::from_storage(&e, STORAGE_FAILURE_MESSAGE))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: CREATED_MESSAGE,
            patient,
        }),
    ))
}

pub async fn search_patients(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let Query(params) = query?;
    state
        .intake
        .search(params.name.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::from_storage(&e, SEARCH_FAILURE_MESSAGE))
}

pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| run_connection(socket, hub))
}
