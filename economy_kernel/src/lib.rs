#![forbid(unsafe_code)]

/// Kernel v1. Behavioral changes require kernel_v2.
pub const KERNEL_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod geometry;
pub mod domain;
pub mod config;
pub mod events;
pub mod state;
pub mod catalog;
pub mod registry;
pub mod transit;
pub mod ledger;
pub mod processor;
pub mod sender;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use config::EconomyConfig;
pub use domain::{EconomyState, TransitionResult};
pub use engine::EconomyEngine;
pub use error::{EngineError, EngineResult};
pub use events::{Operation, OperationEnvelope};
