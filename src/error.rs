use thiserror::Error;

/// Errors surfaced by the engine's services and stores.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("wallet not found for user {0}")]
    WalletMissing(u64),
    #[error("transaction not found: {0}")]
    TransactionMissing(String),
    #[error("task not found: {0}")]
    TaskMissing(u64),
    #[error("task performance not found: {0}")]
    PerformanceMissing(String),
    #[error("webhook signature mismatch")]
    Signature,
    #[error("unexpected gateway response: {0}")]
    GatewayProtocol(String),
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("user already has a pending task of this kind")]
    PendingTask,
    #[error("no unassigned task available")]
    NoUnassignedTask,
    #[error("{0} is already in a terminal state")]
    TerminalState(String),
    #[error("operation not permitted for this user")]
    Forbidden,
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
