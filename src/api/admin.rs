//! Administrator routes. Every handler authenticates through the vault, so
//! a non-admin caller gets `UNAUTHORIZED` without any state change.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{caller_from_headers, parse_amount, parse_identity, AppState};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// `null` revokes the current agent.
    pub agent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub admin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimumDepositRequest {
    pub amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRequest {
    pub strategy_ref: String,
}

pub async fn set_agent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AgentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    let agent = body
        .agent
        .as_deref()
        .map(|a| parse_identity("agent", a))
        .transpose()?;
    state
        .ledger
        .set_authorized_agent(caller, agent.clone())
        .await?;
    Ok(Json(json!({ "authorizedAgent": agent })))
}

pub async fn transfer_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TransferRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    let admin = parse_identity("admin", &body.admin)?;
    state.ledger.transfer_admin(caller, admin.clone()).await?;
    Ok(Json(json!({ "admin": admin })))
}

pub async fn pause(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    state.ledger.set_paused(caller, true).await?;
    Ok(Json(json!({ "paused": true })))
}

pub async fn unpause(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    state.ledger.set_paused(caller, false).await?;
    Ok(Json(json!({ "paused": false })))
}

pub async fn set_minimum_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MinimumDepositRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    let amount = parse_amount("amount", &body.amount)?;
    state.ledger.set_minimum_deposit(caller, amount).await?;
    Ok(Json(json!({ "minimumDeposit": amount.to_string() })))
}

pub async fn propose_strategy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ProposeRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    state
        .ledger
        .propose_strategy(caller, body.strategy_ref)
        .await?;
    let vault = state.ledger.read().await;
    Ok(Json(json!({ "pending": vault.pending_strategy() })))
}

pub async fn execute_strategy(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    state.ledger.execute_strategy(caller).await?;
    let vault = state.ledger.read().await;
    Ok(Json(json!({ "currentStrategy": vault.current_strategy() })))
}

pub async fn cancel_strategy(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    state.ledger.cancel_strategy(caller).await?;
    Ok(Json(json!({ "pending": Value::Null })))
}
