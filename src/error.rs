// chainindex_node_rust/src/error.rs

use thiserror::Error;

fn hash_hex(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}

#[derive(Debug, Error)]
pub enum ChainIndexError {
    #[error("block not found: {}", hash_hex(.hash))]
    NotFound { hash: [u8; 32] },

    #[error("block height {height} out of range (tip height {tip})")]
    OutOfRange { height: i64, tip: i64 },

    // The next three are integrity violations by the feeding validator.
    #[error("block {} is already indexed", hash_hex(.hash))]
    DuplicateHash { hash: [u8; 32] },

    #[error("block {} declares unknown parent {}", hash_hex(.hash), hash_hex(.prev_hash))]
    UnknownParent { hash: [u8; 32], prev_hash: [u8; 32] },

    #[error("block {} declares less chain work than its parent", hash_hex(.hash))]
    ChainWorkRegression { hash: [u8; 32] },

    #[error("invalid block reference: {0}")]
    InvalidBlockRef(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("block index is full ({len} entries)")]
    IndexFull { len: usize },

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChainIndexError {
    /// Insertion-time errors that mean the forest fed to us is corrupt.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            ChainIndexError::DuplicateHash { .. }
                | ChainIndexError::UnknownParent { .. }
                | ChainIndexError::ChainWorkRegression { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ChainIndexError>;
