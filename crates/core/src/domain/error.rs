// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Duplicate target name: {0}")]
    DuplicateTarget(String),

    #[error("Target name must not be empty")]
    EmptyName,
}

pub type Result<T> = std::result::Result<T, DomainError>;
