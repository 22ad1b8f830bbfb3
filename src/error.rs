//! Unified error types for the ladder bot.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the ladder bot.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Market resolution error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Ladder planning error.
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),

    /// Trading/order error.
    #[error("trading error: {0}")]
    Trading(#[from] TradingError),

    /// Position monitor gave up.
    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Market resolution and lookup errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Neither Gamma nor the CLOB knows this identifier.
    #[error("market {identifier} not found")]
    NotFound {
        /// Slug or condition id that was looked up.
        identifier: String,
    },

    /// Failed to fetch market information.
    #[error("failed to fetch market {slug}: {reason}")]
    FetchFailed {
        /// The market slug that failed.
        slug: String,
        /// Reason for failure.
        reason: String,
    },

    /// Market carries no outcome tokens.
    #[error("no outcome tokens found for market {slug}")]
    MissingTokens {
        /// The market slug.
        slug: String,
    },

    /// Requested outcome index does not exist on the market.
    #[error("outcome index {index} out of range ({available} tokens)")]
    OutcomeOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of tokens on the market.
        available: usize,
    },

    /// Market URL could not be turned into a slug.
    #[error("invalid market url: {0}")]
    InvalidUrl(String),

    /// Failed to parse market data.
    #[error("failed to parse market data: {0}")]
    ParseError(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Ladder parameter validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Price schedule has no entries.
    #[error("price schedule is empty")]
    EmptySchedule,

    /// A ladder price is not strictly between 0 and 1.
    #[error("ladder price {price} must be strictly between 0 and 1")]
    PriceOutOfRange {
        /// Offending price.
        price: Decimal,
    },

    /// Per-step size is not positive.
    #[error("size per step must be positive, got {0}")]
    InvalidSize(Decimal),
}

/// Trading and order gateway errors.
#[derive(Error, Debug)]
pub enum TradingError {
    /// Order submission failed.
    #[error("order submission failed: {0}")]
    SubmissionFailed(String),

    /// Order rejected by the exchange.
    #[error("order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason from the exchange.
        reason: String,
    },

    /// Failed to cancel order.
    #[error("failed to cancel order {order_id}: {reason}")]
    CancelFailed {
        /// Order ID that failed to cancel.
        order_id: String,
        /// Reason for failure.
        reason: String,
    },

    /// Order book has no level on the side needed to price the position.
    #[error("no {side} quotes for token {token_id}")]
    QuoteUnavailable {
        /// Token being priced.
        token_id: String,
        /// Missing side ("bid" or "ask").
        side: &'static str,
    },

    /// Any other upstream API or network failure.
    #[error("gateway request {operation} failed: {reason}")]
    Gateway {
        /// Which call failed.
        operation: &'static str,
        /// Reason for failure.
        reason: String,
    },

    /// Invalid order parameters.
    #[error("invalid order parameters: {0}")]
    InvalidParams(String),

    /// Signing error.
    #[error("signing error: {0}")]
    SigningError(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limited by the API.
    #[error("rate limited: retry after {retry_after_seconds}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_seconds: u64,
    },
}

impl TradingError {
    /// Shorthand for a failed gateway call.
    pub fn gateway(operation: &'static str, reason: impl std::fmt::Display) -> Self {
        TradingError::Gateway {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Position monitor termination errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// Too many consecutive polls failed.
    #[error("monitor gave up after {attempts} consecutive failed polls")]
    RetryLimitExceeded {
        /// Consecutive failures observed.
        attempts: u32,
    },

    /// Session outlived its configured maximum duration.
    #[error("monitor exceeded maximum duration of {limit:?}")]
    DurationExceeded {
        /// Configured limit.
        limit: Duration,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn plan_error_messages_name_the_value() {
        let err = PlanError::PriceOutOfRange { price: dec!(1.2) };
        assert_eq!(err.to_string(), "ladder price 1.2 must be strictly between 0 and 1");
    }

    #[test]
    fn errors_convert_into_bot_error() {
        let err: BotError = PlanError::EmptySchedule.into();
        assert!(matches!(err, BotError::Plan(PlanError::EmptySchedule)));

        let err: BotError = TradingError::gateway("balance", "timeout").into();
        assert_eq!(
            err.to_string(),
            "trading error: gateway request balance failed: timeout"
        );
    }
}
