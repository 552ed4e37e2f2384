//! Ledger error taxonomy.

use crate::domain::Timestamp;
use thiserror::Error;

/// Why a range query was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    FromOutOfRange,
    ToOutOfRange,
    FromGreaterThanTo,
}

impl std::fmt::Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeError::FromOutOfRange => write!(f, "from is out of range"),
            RangeError::ToOutOfRange => write!(f, "to is out of range"),
            RangeError::FromGreaterThanTo => write!(f, "from is greater than to"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Deposit of {amount} would mint zero shares")]
    ZeroSharesMinted { amount: u128 },
    #[error("Invalid shares: {0}")]
    InvalidShares(String),
    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid range [{from}, {to}] with {count} records: {reason}")]
    InvalidRange {
        reason: RangeError,
        from: u64,
        to: u64,
        count: u64,
    },
    #[error("Invalid performance score {0}, must be within [0, 10000]")]
    InvalidPerformanceScore(u32),
    #[error("Invalid version: must not be empty")]
    InvalidVersion,
    #[error("No active model snapshot")]
    NoActiveModel,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("System is paused")]
    SystemPaused,
    #[error("No pending strategy change")]
    NoPendingStrategy,
    #[error("Strategy time-lock active until {eta}")]
    TimelockActive { eta: Timestamp },
    #[error("Invalid strategy reference: must not be empty")]
    InvalidStrategy,
}

impl LedgerError {
    /// Stable machine-readable code for integrators.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::ZeroSharesMinted { .. } => "ZERO_SHARES_MINTED",
            LedgerError::InvalidShares(_) => "INVALID_SHARES",
            LedgerError::InsufficientShares { .. } => "INSUFFICIENT_SHARES",
            LedgerError::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
            LedgerError::Unauthorized(_) => "UNAUTHORIZED",
            LedgerError::InvalidRange { reason, .. } => match reason {
                RangeError::FromOutOfRange => "INVALID_RANGE_FROM",
                RangeError::ToOutOfRange => "INVALID_RANGE_TO",
                RangeError::FromGreaterThanTo => "INVALID_RANGE_ORDER",
            },
            LedgerError::InvalidPerformanceScore(_) => "INVALID_PERFORMANCE_SCORE",
            LedgerError::InvalidVersion => "INVALID_VERSION",
            LedgerError::NoActiveModel => "NO_ACTIVE_MODEL",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::SystemPaused => "SYSTEM_PAUSED",
            LedgerError::NoPendingStrategy => "NO_PENDING_STRATEGY",
            LedgerError::TimelockActive { .. } => "TIMELOCK_ACTIVE",
            LedgerError::InvalidStrategy => "INVALID_STRATEGY",
        }
    }
}

/// `a * b / c` with truncating division and checked multiplication.
pub(crate) fn mul_div_floor(
    a: u128,
    b: u128,
    c: u128,
    context: &'static str,
) -> Result<u128, LedgerError> {
    if c == 0 {
        return Err(LedgerError::ArithmeticOverflow(context));
    }
    a.checked_mul(b)
        .map(|product| product / c)
        .ok_or(LedgerError::ArithmeticOverflow(context))
}

pub(crate) fn checked_add(a: u128, b: u128, context: &'static str) -> Result<u128, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::ArithmeticOverflow(context))
}

pub(crate) fn checked_sub(a: u128, b: u128, context: &'static str) -> Result<u128, LedgerError> {
    a.checked_sub(b).ok_or(LedgerError::ArithmeticOverflow(context))
}
