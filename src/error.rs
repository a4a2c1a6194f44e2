//! Error types for the transaction submission subsystem

use thiserror::Error;

/// Main error type for ledger write operations
#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("All configured endpoints failed, last error: {last}")]
    Connection { last: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Gas {gas} exceeds block gas limit {limit}")]
    GasExceeded { gas: u128, limit: u64 },

    #[error("Account sequence mismatch: {0}")]
    SequenceMismatch(String),

    #[error("Insufficient balance: {0}")]
    Balance(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Broadcast rejected with code {code}: {response}")]
    Broadcast { code: u32, response: String },

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Sender pool error: {0}")]
    Pool(String),
}

impl SenderError {
    /// Check if the error class is remediable by a local retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SenderError::SequenceMismatch(_)
                | SenderError::Balance(_)
                | SenderError::Transport(_)
        )
    }
}

/// Result type for submission operations
pub type SenderResult<T> = Result<T, SenderError>;
