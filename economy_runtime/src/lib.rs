#![forbid(unsafe_code)]

//! Economy Runtime
//!
//! Wraps the economy kernel with persistence, replay, snapshots,
//! session management, and drift detection.
//!
//! No domain logic lives here: all transitions and invariants
//! are delegated to the kernel.

pub mod error;
pub mod proto_types;
pub mod proto_bridge;
pub mod operation_log;
pub mod replay;
pub mod snapshot;
pub mod snapshot_codec;
pub mod session;
pub mod drift;

pub use error::{RuntimeError, RuntimeResult};
