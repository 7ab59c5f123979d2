/// Economy Kernel v1: Error Taxonomy
///
/// Every rejection is a precondition failure detected before the
/// committed state is touched. Callers decide retry policy.

use thiserror::Error;

/// All ways an operation can be rejected by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("locations are different")]
    DifferentLocations,
    #[error("resource types don't match")]
    ResourceNotMatching,
    #[error("storage is full")]
    StorageFull,
    #[error("not enough in storage")]
    StorageAmountTooLow,
    #[error("storage type fixed cannot be moved")]
    StorageTypeNotMovable,
    #[error("location is full")]
    LocationFull,
    #[error("input storage amount is too low")]
    InputStorageAmountTooLow,
    #[error("input storage not supplied to production: {0}")]
    InputStorageNotSupplied(String),
    #[error("resource has more than {max} inputs")]
    ResourceInputMax { max: usize },
    #[error("processor type {expected:?} required")]
    InvalidProcessorType { expected: String },
    #[error("fuel not supplied to processor")]
    FuelNotSupplied,
    #[error("not allowed while moving")]
    NotAllowedWhileMoving,
    #[error("name longer than {max} characters")]
    NameTooLong { max: usize },
    #[error("location already exists at ({x}, {y})")]
    LocationAlreadyExists { x: i64, y: i64 },
    #[error("invalid input parameter: {0}")]
    InvalidInput(String),
    #[error("{kind} {id} does not exist")]
    RecordNotFound { kind: &'static str, id: u64 },
    #[error("current time {now} is before last claim at {claimed_at}")]
    ClockBehind { now: i64, claimed_at: i64 },
    #[error("arithmetic overflow: {0}")]
    Overflow(String),
    #[error("sequence violation: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaVersionMismatch { expected: u32, got: u32 },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
