use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{caller_from_headers, parse_amount, AppState};
use crate::engine::PendingStrategy;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub total_shares: String,
    pub total_value: String,
    pub holder_count: usize,
    pub decision_count: u64,
    pub model_count: u64,
    pub journal_length: u64,
    pub admin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_agent: Option<String>,
    pub minimum_deposit: String,
    pub paused: bool,
    pub page_size_limit: usize,
    pub strategy_timelock_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_strategy: Option<PendingStrategy>,
}

pub async fn get_ledger(State(state): State<AppState>) -> Result<Json<LedgerResponse>, AppError> {
    let vault = state.ledger.read().await;
    // No append can land while the read lock is held.
    let journal_length = state.ledger.journal_len().await?;
    let settings = vault.settings();
    Ok(Json(LedgerResponse {
        total_shares: vault.total_shares().to_string(),
        total_value: vault.total_value().to_string(),
        holder_count: vault.holder_count(),
        decision_count: vault.decision_count(),
        model_count: vault.model_count(),
        journal_length,
        admin: settings.admin.to_string(),
        authorized_agent: settings.authorized_agent.as_ref().map(|a| a.to_string()),
        minimum_deposit: settings.minimum_deposit.to_string(),
        paused: settings.state.is_paused(),
        page_size_limit: vault.page_size_limit(),
        strategy_timelock_secs: settings.strategy_timelock_secs,
        current_strategy: vault.current_strategy().map(|s| s.to_string()),
        pending_strategy: vault.pending_strategy().cloned(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub ok: bool,
    pub violations: Vec<String>,
}

pub async fn get_audit(State(state): State<AppState>) -> Json<AuditResponse> {
    let violations = state.ledger.read().await.check_invariants();
    Json(AuditResponse {
        ok: violations.is_empty(),
        violations,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    pub amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub shares: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub shares_issued: String,
    pub total_shares: String,
    pub total_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub amount_returned: String,
    pub total_shares: String,
    pub total_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueResponse {
    pub total_value: String,
}

pub async fn post_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AmountRequest>,
) -> Result<Json<DepositResponse>, AppError> {
    let holder = caller_from_headers(&headers)?;
    let amount = parse_amount("amount", &body.amount)?;

    let receipt = state.ledger.deposit(holder, amount).await?;
    Ok(Json(DepositResponse {
        shares_issued: receipt.shares_issued.to_string(),
        total_shares: receipt.total_shares.to_string(),
        total_value: receipt.total_value.to_string(),
    }))
}

pub async fn post_withdrawal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, AppError> {
    let holder = caller_from_headers(&headers)?;
    let shares = parse_amount("shares", &body.shares)?;

    let receipt = state.ledger.withdraw(holder, shares).await?;
    Ok(Json(WithdrawResponse {
        amount_returned: receipt.amount_returned.to_string(),
        total_shares: receipt.total_shares.to_string(),
        total_value: receipt.total_value.to_string(),
    }))
}

pub async fn post_yield(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AmountRequest>,
) -> Result<Json<ValueResponse>, AppError> {
    let caller = caller_from_headers(&headers)?;
    let amount = parse_amount("amount", &body.amount)?;
    let total_value = state.ledger.report_yield(caller, amount).await?;
    Ok(Json(ValueResponse {
        total_value: total_value.to_string(),
    }))
}

pub async fn post_loss(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AmountRequest>,
) -> Result<Json<ValueResponse>, AppError> {
    let caller = caller_from_headers(&headers)?;
    let amount = parse_amount("amount", &body.amount)?;
    let total_value = state.ledger.report_loss(caller, amount).await?;
    Ok(Json(ValueResponse {
        total_value: total_value.to_string(),
    }))
}
