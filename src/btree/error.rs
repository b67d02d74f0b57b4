use thiserror::Error;

use super::node::NodeId;

/// Errors that can occur during tree operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BTreeError {
    #[error("Duplicate key")]
    DuplicateKey,

    #[error("Key not found")]
    KeyNotFound,

    #[error("Invalid minimum degree: {0} (must be >= 2)")]
    InvalidOrder(usize),

    #[error("Invalid range: lower bound is greater than upper bound")]
    InvalidRange,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid tree state: {0}")]
    InvalidState(String),
}

pub type BTreeResult<T> = Result<T, BTreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BTreeError::InvalidOrder(1).to_string(),
            "Invalid minimum degree: 1 (must be >= 2)"
        );
        assert_eq!(BTreeError::NodeNotFound(7).to_string(), "Node not found: 7");
    }
}
