//! Errors surfaced by the ledger engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Rejected before anything was mutated.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Nothing to undo: the ledger is empty")]
    EmptyLedger,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LedgerError::InvalidInput(message.into())
    }
}
