//! Runtime error type. Wraps every failure the record-store layer can hit.

use std::io;

use thiserror::Error;

use economy_kernel::error::EngineError;

use crate::proto_bridge::BridgeError;
use crate::snapshot_codec::SnapshotError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt operation log: {0}")]
    CorruptLog(String),
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("proto conversion failed: {0}")]
    Bridge(#[from] BridgeError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("operation rejected: {0}")]
    Engine(#[from] EngineError),
    #[error("sequence violation in operation log: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },
    #[error("determinism failure: run1={first} run2={second}")]
    DeterminismFailure { first: String, second: String },
    #[error("session lock poisoned")]
    SessionPoisoned,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
