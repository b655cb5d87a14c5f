use crate::{auth::require_reseller, error::AppError, report::analytics_report, AppState};
use analytics::{AnalyticsReport, ReportingWindow};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Html,
    Json,
};
use core_types::Store;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Body of `PATCH /api/reseller/store/settings`.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub settings: Map<String, Value>,
}

async fn owned_store(state: &AppState, reseller_id: uuid::Uuid) -> Result<Store, AppError> {
    state
        .repository
        .find_store_by_reseller(reseller_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".to_string()))
}

/// # GET /api/reseller/analytics
/// Sales series, top products and growth for the caller's store.
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AnalyticsReport>, AppError> {
    let principal = require_reseller(&headers, &state.sessions)?;
    let store = owned_store(&state, principal.user_id).await?;

    let window = ReportingWindow::trailing(state.now(), state.window_days)?;
    let report = analytics_report(
        state.repository.as_ref(),
        &state.engine,
        principal.user_id,
        &window,
    )
    .await?;

    tracing::debug!(store_id = %store.id, days = report.chart_data.len(), "Analytics served.");
    Ok(Json(report))
}

/// # GET /api/reseller/store
pub async fn get_store(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Store>, AppError> {
    let principal = require_reseller(&headers, &state.sessions)?;
    let store = owned_store(&state, principal.user_id).await?;
    Ok(Json(store))
}

/// # PATCH /api/reseller/store/settings
/// Validates the markup against the stored bounds, then merges and saves.
pub async fn update_store_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<Store>, AppError> {
    let principal = require_reseller(&headers, &state.sessions)?;
    let Json(request) = payload?;

    let store = owned_store(&state, principal.user_id).await?;
    let merged = store.settings.merge(&request.settings)?;
    let updated = state
        .repository
        .update_store_settings(store.id, &merged)
        .await?;

    tracing::info!(
        store_id = %updated.id,
        keys = ?request.settings.keys().collect::<Vec<_>>(),
        "Store settings updated."
    );
    Ok(Json(updated))
}

/// # GET /reseller/analytics
pub async fn analytics_page() -> Html<&'static str> {
    Html(include_str!("../assets/analytics.html"))
}

/// # GET /reseller/settings
pub async fn settings_page() -> Html<&'static str> {
    Html(include_str!("../assets/settings.html"))
}
