use axum::Json;
use axum::extract::{Path, Query, State};
use olg_core::{AgentId, CurvePoint, Decision, DecisionKind};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, HttpApiError};

#[derive(Debug, Deserialize)]
pub(crate) struct JoinRequest {
    user_id: String,
    name: Option<String>,
    avatar: Option<String>,
}

pub(crate) async fn join(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<Value>, HttpApiError> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(HttpApiError::bad_request("user_id is required"));
    }
    let id = AgentId::from(user_id);

    let mut economy = state.economy.lock().await;
    let notification = economy.add_agent(id.clone(), request.name, request.avatar)?;
    state.publish(notification);

    Ok(Json(json!({
        "success": true,
        "agent": economy.agent_snapshot(&id),
        "round": economy.round(),
    })))
}

pub(crate) async fn leave(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, HttpApiError> {
    let mut economy = state.economy.lock().await;
    let notification = economy.remove_agent(&AgentId::new(user_id))?;
    state.publish(notification);
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    user_id: String,
    decision_type: String,
    /// Optional for "consume".
    amount: Option<f64>,
}

pub(crate) async fn submit_decision(
    State(state): State<AppState>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<Value>, HttpApiError> {
    let kind: DecisionKind = request.decision_type.parse()?;
    let amount = match (kind, request.amount) {
        (_, Some(amount)) => amount,
        (DecisionKind::Consume, None) => 0.0,
        (_, None) => return Err(HttpApiError::bad_request("amount is required")),
    };
    let id = AgentId::new(request.user_id);

    let mut economy = state.economy.lock().await;
    let notification = economy.record_decision(&id, Decision::from_parts(kind, amount))?;
    state.publish(notification);

    Ok(Json(json!({
        "success": true,
        "agent": economy.agent_snapshot(&id),
        "aggregates": economy.aggregates(),
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct DemandCurveRequest {
    user_id: String,
    points: Vec<CurvePoint>,
}

pub(crate) async fn submit_demand_curve(
    State(state): State<AppState>,
    Json(request): Json<DemandCurveRequest>,
) -> Result<Json<Value>, HttpApiError> {
    let id = AgentId::new(request.user_id);

    let mut economy = state.economy.lock().await;
    let notification = economy.record_demand_curve(&id, request.points)?;
    state.publish(notification);

    let borrowing = economy.agent(&id).map_or(0.0, |a| a.borrowing);
    Ok(Json(json!({
        "success": true,
        "borrowing": borrowing,
        "interest_rate": economy.interest_rate(),
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StateQuery {
    user_id: Option<String>,
}

/// One participant's view with `?user_id=`, otherwise the whole economy.
pub(crate) async fn current_state(
    State(state): State<AppState>,
    Query(query): Query<StateQuery>,
) -> Result<Json<Value>, HttpApiError> {
    let economy = state.economy.lock().await;
    let body = match query.user_id {
        Some(user_id) => {
            let view = economy
                .agent_view(&AgentId::new(user_id.clone()))
                .ok_or_else(|| HttpApiError::not_found(format!("unknown agent: {user_id}")))?;
            json!(view)
        }
        None => json!(economy.snapshot()),
    };
    Ok(Json(body))
}
