//! Broker error types.

/// Errors that can occur during broker operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("order error: {0}")]
    Order(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("malformed response: {0}")]
    Decode(String),
}

impl BrokerError {
    /// Whether the failure is on the network path to the broker rather than
    /// a decision the broker made.
    pub fn is_transport(&self) -> bool {
        matches!(self, BrokerError::Connection(_) | BrokerError::Timeout(_))
    }
}
