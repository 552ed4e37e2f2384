pub mod admin;
pub mod decisions;
pub mod events;
pub mod health;
pub mod holders;
pub mod ledger;
pub mod models;

use crate::domain::Identity;
use crate::error::AppError;
use crate::orchestration::LedgerService;
use axum::http::HeaderMap;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use tower_http::cors::{Any, CorsLayer};

/// Header carrying the caller identity on mutating routes.
pub const CALLER_HEADER: &str = "x-caller-id";

#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
}

impl AppState {
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/ledger", get(ledger::get_ledger))
        .route("/v1/ledger/audit", get(ledger::get_audit))
        .route("/v1/deposits", post(ledger::post_deposit))
        .route("/v1/withdrawals", post(ledger::post_withdrawal))
        .route("/v1/value/yield", post(ledger::post_yield))
        .route("/v1/value/loss", post(ledger::post_loss))
        .route("/v1/holders", get(holders::list_holders))
        .route("/v1/holders/:holder", get(holders::get_user_summary))
        .route("/v1/activity/daily/:day_slot", get(holders::get_daily_activity))
        .route(
            "/v1/decisions",
            get(decisions::get_range).post(decisions::post_decision),
        )
        .route("/v1/decisions/by-time", get(decisions::get_by_time))
        .route(
            "/v1/decisions/by-type/:decision_type",
            get(decisions::get_by_type),
        )
        .route(
            "/v1/decisions/by-strategy/:strategy_ref",
            get(decisions::get_by_strategy),
        )
        .route("/v1/decisions/export", get(decisions::export_csv))
        .route("/v1/decisions/:index", get(decisions::get_decision))
        .route("/v1/models", post(models::post_model))
        .route("/v1/models/active", get(models::get_latest_active))
        .route("/v1/models/:index", get(models::get_model))
        .route("/v1/models/:index/activate", post(models::activate_model))
        .route("/v1/admin/agent", post(admin::set_agent))
        .route("/v1/admin/transfer", post(admin::transfer_admin))
        .route("/v1/admin/pause", post(admin::pause))
        .route("/v1/admin/unpause", post(admin::unpause))
        .route("/v1/admin/minimum-deposit", post(admin::set_minimum_deposit))
        .route("/v1/admin/strategy/propose", post(admin::propose_strategy))
        .route("/v1/admin/strategy/execute", post(admin::execute_strategy))
        .route("/v1/admin/strategy/cancel", post(admin::cancel_strategy))
        .route("/v1/events", get(events::stream_events))
        .layer(cors)
        .with_state(state)
}

/// Caller identity from the `x-caller-id` header.
pub(crate) fn caller_from_headers(headers: &HeaderMap) -> Result<Identity, AppError> {
    let raw = headers
        .get(CALLER_HEADER)
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", CALLER_HEADER)))?
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} header", CALLER_HEADER)))?;
    parse_identity(CALLER_HEADER, raw)
}

pub(crate) fn parse_identity(field: &str, raw: &str) -> Result<Identity, AppError> {
    Identity::from_str(raw).map_err(|e| AppError::BadRequest(format!("Invalid {}: {}", field, e)))
}

/// Amounts travel as base-10 strings so u128 survives JSON clients.
pub(crate) fn parse_amount(field: &str, raw: &str) -> Result<u128, AppError> {
    raw.trim().parse::<u128>().map_err(|_| {
        AppError::BadRequest(format!("{} must be a non-negative integer string", field))
    })
}
