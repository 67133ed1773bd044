use std::time::Duration;
use thiserror::Error;

/// Common result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Every way a gateway request can end short of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("unauthorized: invalid or missing TOKEN")]
    Unauthorized,
    #[error("invalid service name")]
    InvalidInput,
    #[error("service is not allowed (policy restriction)")]
    PolicyDenied,
    #[error("command timeout after {0:?}")]
    ExecutionTimeout(Duration),
    #[error("{0}")]
    ExecutionFailure(String),
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),
}

impl GatewayError {
    /// Stable machine-readable reason carried in every failure response.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "Unauthorized",
            GatewayError::InvalidInput => "InvalidInput",
            GatewayError::PolicyDenied => "PolicyDenied",
            GatewayError::ExecutionTimeout(_) => "ExecutionTimeout",
            GatewayError::ExecutionFailure(_) => "ExecutionFailure",
            GatewayError::UnsupportedAction(_) => "UnsupportedAction",
        }
    }
}
