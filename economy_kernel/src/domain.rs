/// Economy Kernel v1: Core Domain Types
///
/// Pure data. No transition logic.
/// All quantities and timestamps: i64.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Position;

// ── Identifiers ────────────────────────────────────────────────────

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const KIND: &'static str = $kind;

            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

record_id!(
    /// Identity of a resource kind in the catalog.
    ResourceId,
    "resource"
);
record_id!(
    /// Identity of a producer or sender.
    ProcessorId,
    "processor"
);
record_id!(
    /// Identity of a capacity-bounded storage.
    StorageId,
    "storage"
);
record_id!(
    /// Identity of a map location.
    LocationId,
    "location"
);
record_id!(
    /// Identity of a mobile, storage-less unit.
    UnitId,
    "unit"
);

// ── Resource Catalog ───────────────────────────────────────────────

/// One recipe line: `amount` units of `resource_id` per output unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeInput {
    pub resource_id: ResourceId,
    pub amount: i64,
}

/// A resource kind. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub recipe: Vec<RecipeInput>, // ordered, empty for raw resources
}

impl Resource {
    pub fn is_raw(&self) -> bool {
        self.recipe.is_empty()
    }

    /// Amount of `input` required per output unit, if it is part of the recipe.
    pub fn required_amount(&self, input: ResourceId) -> Option<i64> {
        self.recipe
            .iter()
            .find(|line| line.resource_id == input)
            .map(|line| line.amount)
    }
}

// ── Processors ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    Producer,
    Sender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelCostMode {
    None,
    PerOutputUnit,
    PerDistanceUnit,
}

/// Time-gated producer. Behaviour is a pure function of
/// `(now, claimed_at, awaiting_units)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Processor {
    pub id: ProcessorId,
    pub location_id: LocationId,
    pub kind: ProcessorKind,
    pub output_resource_id: ResourceId,
    pub fuel_resource_id: Option<ResourceId>,
    pub output_rate: i64,    // units per cycle, > 0
    pub cycle_duration: i64, // time units per cycle, > 0
    pub fuel_cost_mode: FuelCostMode,
    pub claimed_at: i64,
    pub awaiting_units: i64, // produced, not yet delivered
}

// ── Storage Ledger ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mobility {
    Fixed,
    Movable,
}

/// Quantity of one resource, bounded by `capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Storage {
    pub id: StorageId,
    pub resource_id: ResourceId,
    pub amount: i64,
    pub capacity: i64,
    pub location_id: LocationId,
    pub mobility: Mobility,
    pub speed: i64,
    pub arrives_at: i64, // 0 when stationary
}

impl Storage {
    pub fn free_capacity(&self) -> i64 {
        (self.capacity - self.amount).max(0)
    }

    pub fn is_movable(&self) -> bool {
        self.mobility == Mobility::Movable
    }
}

// ── Location Registry ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub position: Position,
    pub capacity: i64,
    pub occupied_space: i64,
    pub kind: String, // terrain tag, informational
}

impl Location {
    pub fn is_full(&self) -> bool {
        self.occupied_space >= self.capacity
    }
}

// ── Units ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub location_id: LocationId,
    pub speed: i64,
    pub arrives_at: i64, // 0 when stationary
}

// ── Transition outcome ─────────────────────────────────────────────

/// Structured, immutable outcome of an accepted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionResult {
    pub operation: String,
    pub created_id: Option<u64>,
    pub produced: i64,       // units accrued from elapsed cycles this call
    pub delivered: i64,      // units credited to the destination storage
    pub awaiting_units: i64, // processor carry-over after the call
    pub input_consumed: i64, // input units debited across all recipe lines
    pub fuel_spent: i64,
    pub arrives_at: i64,
    pub arrived: bool,
    pub reason: String,
}

impl Default for TransitionResult {
    fn default() -> Self {
        Self {
            operation: String::new(),
            created_id: None,
            produced: 0,
            delivered: 0,
            awaiting_units: 0,
            input_consumed: 0,
            fuel_spent: 0,
            arrives_at: 0,
            arrived: false,
            reason: String::new(),
        }
    }
}

// ── State image ────────────────────────────────────────────────────

/// Complete record image. One map per record kind, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EconomyState {
    pub next_id: u64,
    pub resources: BTreeMap<ResourceId, Resource>,
    pub processors: BTreeMap<ProcessorId, Processor>,
    pub storages: BTreeMap<StorageId, Storage>,
    pub locations: BTreeMap<LocationId, Location>,
    pub units: BTreeMap<UnitId, Unit>,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self {
            next_id: 1,
            resources: BTreeMap::new(),
            processors: BTreeMap::new(),
            storages: BTreeMap::new(),
            locations: BTreeMap::new(),
            units: BTreeMap::new(),
        }
    }
}
