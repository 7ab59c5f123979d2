/// Economy Kernel v1: Operation Definitions
///
/// Operations are pure data. They carry intent and arguments only.
/// All transition logic lives in the engine modules.
///
/// Schema version is locked at 1. Envelopes with another version
/// are rejected by the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    FuelCostMode, LocationId, Mobility, ProcessorId, ProcessorKind, RecipeInput, ResourceId,
    StorageId, UnitId,
};
use crate::geometry::Position;

/// Schema version for v1 kernel operations.
pub const SCHEMA_VERSION: u32 = 1;

/// Every operation a caller can submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Operation {
    CreateResource {
        name: String,
        recipe: Vec<RecipeInput>,
    },
    CreateLocation {
        name: String,
        position: Position,
        capacity: i64,
        kind: String,
    },
    CreateProcessor {
        kind: ProcessorKind,
        location_id: LocationId,
        output_resource_id: ResourceId,
        fuel_resource_id: Option<ResourceId>,
        output_rate: i64,
        cycle_duration: i64,
        fuel_cost_mode: FuelCostMode,
    },
    CreateStorage {
        resource_id: ResourceId,
        capacity: i64,
        location_id: LocationId,
        mobility: Mobility,
        speed: i64,
    },
    CreateUnit {
        name: String,
        speed: i64,
        location_id: Option<LocationId>,
    },
    ProduceZeroInput {
        processor_id: ProcessorId,
        output_storage_id: StorageId,
    },
    ProduceOneInput {
        processor_id: ProcessorId,
        output_storage_id: StorageId,
        input_storage_id: StorageId,
    },
    ProduceTwoInputs {
        processor_id: ProcessorId,
        output_storage_id: StorageId,
        input_storage_ids: [StorageId; 2],
    },
    Send {
        sender_id: ProcessorId,
        from_storage_id: StorageId,
        to_storage_id: StorageId,
        fuel_storage_id: Option<StorageId>,
        from_location_id: LocationId,
        to_location_id: LocationId,
    },
    MoveBetweenStorage {
        from_storage_id: StorageId,
        to_storage_id: StorageId,
        amount: i64,
    },
    MoveStorage {
        storage_id: StorageId,
        from_location_id: LocationId,
        to_location_id: LocationId,
    },
    UpdateStorageMoveStatus {
        storage_id: StorageId,
    },
    MoveUnitStart {
        unit_id: UnitId,
        from_location_id: LocationId,
        to_location_id: LocationId,
    },
    MoveUnitComplete {
        unit_id: UnitId,
    },
}

impl Operation {
    /// Stable snake_case name, matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateResource { .. } => "create_resource",
            Operation::CreateLocation { .. } => "create_location",
            Operation::CreateProcessor { .. } => "create_processor",
            Operation::CreateStorage { .. } => "create_storage",
            Operation::CreateUnit { .. } => "create_unit",
            Operation::ProduceZeroInput { .. } => "produce_zero_input",
            Operation::ProduceOneInput { .. } => "produce_one_input",
            Operation::ProduceTwoInputs { .. } => "produce_two_inputs",
            Operation::Send { .. } => "send",
            Operation::MoveBetweenStorage { .. } => "move_between_storage",
            Operation::MoveStorage { .. } => "move_storage",
            Operation::UpdateStorageMoveStatus { .. } => "update_storage_move_status",
            Operation::MoveUnitStart { .. } => "move_unit_start",
            Operation::MoveUnitComplete { .. } => "move_unit_complete",
        }
    }
}

/// Operation envelope: ordering, caller-supplied time and caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationEnvelope {
    pub sequence: u64,
    /// Externally supplied current timestamp. The kernel never reads a clock.
    pub now: i64,
    /// Identity already verified by the authorization layer.
    pub caller: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub operation: Operation,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl OperationEnvelope {
    pub fn new(sequence: u64, now: i64, caller: &str, operation: Operation) -> Self {
        Self {
            sequence,
            now,
            caller: caller.to_string(),
            schema_version: SCHEMA_VERSION,
            operation,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse an envelope from JSON (fixtures, replay files).
    pub fn from_value(v: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(v)
    }
}
