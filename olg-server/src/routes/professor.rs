use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use olg_core::{Phase, PolicyChange, PolicyUpdate};
use serde::Deserialize;
use serde_json::{Value, json};

use super::require_professor;
use crate::{AppState, HttpApiError};

pub(crate) async fn set_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<PolicyUpdate>,
) -> Result<Json<Value>, HttpApiError> {
    require_professor(&headers)?;

    let mut economy = state.economy.lock().await;
    let PolicyChange { notifications, job } = economy.set_policy(update);
    for notification in notifications {
        state.publish(notification);
    }
    let recomputing = job.is_some();
    state.submit(job);

    Ok(Json(json!({
        "success": true,
        "policy": economy.policy(),
        "interest_rate": economy.interest_rate(),
        "rate_pinned": economy.is_rate_pinned(),
        "recomputing": recomputing,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdvanceQuery {
    #[serde(default)]
    force: bool,
}

/// Phase 1 answers right away; the cleared rate follows as a
/// `round_advanced` notification with phase `complete`.
pub(crate) async fn advance_round(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdvanceQuery>,
) -> Result<Json<Value>, HttpApiError> {
    require_professor(&headers)?;

    let mut economy = state.economy.lock().await;
    let advance = economy.advance_round(query.force)?;
    state.publish(advance.notification);
    state.submit(advance.job);

    Ok(Json(json!({
        "success": true,
        "round": advance.round,
        "aggregates": advance.aggregates,
        "phase": Phase::Initial,
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestPlayersRequest {
    count: usize,
    optimal: Option<bool>,
}

pub(crate) async fn test_players(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TestPlayersRequest>,
) -> Result<Json<Value>, HttpApiError> {
    require_professor(&headers)?;

    let mut economy = state.economy.lock().await;
    if let Some(optimal) = request.optimal {
        economy.set_synthetic_optimal(optimal);
    }
    let notification = economy.set_synthetic_count(request.count);
    state.publish(notification);

    Ok(Json(json!({
        "success": true,
        "synthetic_count": economy.synthetic_count(),
        "synthetic_optimal": economy.synthetic_optimal(),
    })))
}

pub(crate) async fn reset(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, HttpApiError> {
    require_professor(&headers)?;

    let mut economy = state.economy.lock().await;
    let notification = economy.reset();
    state.publish(notification);

    Ok(Json(json!({ "success": true, "round": economy.round() })))
}
