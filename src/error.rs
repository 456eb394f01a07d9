//! Internal error taxonomy.
//!
//! Errors never cross the WASM façade: every fallible action returns a
//! primitive status and leaves the world in a valid state. `CoreError` exists
//! for the snapshot codec, the balance loader and the CLI, where a reason
//! string is worth having.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreError {
    InvalidIndex(String),
    InsufficientResource(String),
    StateViolation(String),
    BodyPoolExhausted,
    SnapshotTruncated { need: usize, have: usize },
    SnapshotBadMagic,
    SnapshotVersionMismatch { found: u16 },
    BalanceData(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidIndex(msg) => write!(f, "Invalid index: {}", msg),
            CoreError::InsufficientResource(msg) => write!(f, "Insufficient resource: {}", msg),
            CoreError::StateViolation(msg) => write!(f, "State violation: {}", msg),
            CoreError::BodyPoolExhausted => write!(f, "Body pool exhausted"),
            CoreError::SnapshotTruncated { need, have } => {
                write!(f, "Snapshot truncated: need {} bytes, have {}", need, have)
            }
            CoreError::SnapshotBadMagic => write!(f, "Snapshot has bad magic bytes"),
            CoreError::SnapshotVersionMismatch { found } => {
                write!(f, "Snapshot version mismatch: found {}", found)
            }
            CoreError::BalanceData(msg) => write!(f, "Balance data error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}
