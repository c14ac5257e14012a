use thiserror::Error;

/// Errors returned by an upstream price feed.
///
/// Only [`FeedError::InstrumentNotFound`] is authoritative: the exchange
/// explicitly said the instrument does not exist on the requested market.
/// Every other variant is transient and must never be treated as a
/// permanent signal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("Instrument {instrument} does not exist on {feed}")]
    InstrumentNotFound { feed: String, instrument: String },

    #[error("Price request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Rate limit exceeded on {feed}")]
    RateLimited { feed: String },

    #[error("HTTP {status} from {feed}: {body}")]
    Http {
        feed: String,
        status: u16,
        body: String,
    },

    #[error("Upstream error {code} from {feed}: {message}")]
    Upstream {
        feed: String,
        code: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid payload for {instrument}: {reason}")]
    InvalidPayload { instrument: String, reason: String },
}

impl FeedError {
    /// True when the failure proves the instrument is absent from the feed.
    pub fn is_authoritative(&self) -> bool {
        matches!(self, FeedError::InstrumentNotFound { .. })
    }
}

/// Errors raised at the configuration boundary when pairs are mutated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PairConfigError {
    #[error("Invalid pair symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("Pair {symbol} is already monitored")]
    DuplicatePair { symbol: String },

    #[error("Pair {symbol} is not monitored")]
    PairNotFound { symbol: String },

    #[error("Invalid thresholds for {symbol}: {reason}")]
    InvalidThresholds { symbol: String, reason: String },

    #[error("Failed to persist pair configuration: {0}")]
    Persistence(String),
}

/// Errors from the notification collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotificationError {
    #[error("Notification target is not configured: {0}")]
    NotConfigured(String),

    #[error("Notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Notification transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_is_authoritative() {
        let not_found = FeedError::InstrumentNotFound {
            feed: "okx".to_string(),
            instrument: "DOGE-USDT-SWAP".to_string(),
        };
        assert!(not_found.is_authoritative());

        let transient = [
            FeedError::Timeout { duration_ms: 2000 },
            FeedError::RateLimited {
                feed: "okx".to_string(),
            },
            FeedError::Http {
                feed: "okx".to_string(),
                status: 503,
                body: String::new(),
            },
            FeedError::Transport("connection reset".to_string()),
            FeedError::InvalidPayload {
                instrument: "BTC-USDT".to_string(),
                reason: "empty".to_string(),
            },
        ];
        for err in transient {
            assert!(!err.is_authoritative(), "{} should be transient", err);
        }
    }

    #[test]
    fn test_pair_config_error_formatting() {
        let error = PairConfigError::InvalidThresholds {
            symbol: "BTC/USDT".to_string(),
            reason: "upper must be greater than lower".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("BTC/USDT"));
        assert!(msg.contains("upper must be greater than lower"));
    }
}
