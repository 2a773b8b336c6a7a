/// Core error type for the bot.
///
/// Adapter crates map their vendor errors into this type so the engine and
/// the HTTP boundary can handle failures consistently (status code vs
/// user-facing message vs logged degradation).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

/// Why a free-text message could not be turned into a proposal.
///
/// Every variant is user-recoverable: the engine answers with a
/// clarification message and leaves the sender in Idle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("no financial intent detected")]
    NoFinancialIntent,

    #[error("no amount found in message")]
    NoAmount,

    #[error("backend returned no usable proposal: {0}")]
    BadShape(String),

    #[error("backend call failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
