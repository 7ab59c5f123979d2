//! Hand-written protobuf types for the operation log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format and never reused.

use prost::Message;

// ── Operation Envelope ─────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoOperationEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(int64, tag = "2")]
    pub now: i64,
    #[prost(string, tag = "3")]
    pub caller: String,
    #[prost(uint32, tag = "4")]
    pub schema_version: u32,
    #[prost(message, optional, tag = "5")]
    pub operation: Option<ProtoOperation>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoOperation {
    #[prost(oneof = "OperationKind", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14")]
    pub kind: Option<OperationKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum OperationKind {
    #[prost(message, tag = "1")]
    CreateResource(CreateResource),
    #[prost(message, tag = "2")]
    CreateLocation(CreateLocation),
    #[prost(message, tag = "3")]
    CreateProcessor(CreateProcessor),
    #[prost(message, tag = "4")]
    CreateStorage(CreateStorage),
    #[prost(message, tag = "5")]
    CreateUnit(CreateUnit),
    #[prost(message, tag = "6")]
    ProduceZeroInput(Produce),
    #[prost(message, tag = "7")]
    ProduceOneInput(Produce),
    #[prost(message, tag = "8")]
    ProduceTwoInputs(Produce),
    #[prost(message, tag = "9")]
    Send(SendOutput),
    #[prost(message, tag = "10")]
    MoveBetweenStorage(MoveBetweenStorage),
    #[prost(message, tag = "11")]
    MoveStorage(Relocate),
    #[prost(message, tag = "12")]
    UpdateStorageMoveStatus(CompleteMove),
    #[prost(message, tag = "13")]
    MoveUnitStart(Relocate),
    #[prost(message, tag = "14")]
    MoveUnitComplete(CompleteMove),
}

// ── Enumerations ───────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoProcessorKind {
    Producer = 0,
    Sender = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoFuelCostMode {
    None = 0,
    PerOutputUnit = 1,
    PerDistanceUnit = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoMobility {
    Fixed = 0,
    Movable = 1,
}

// ── Shared messages ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoRecipeInput {
    #[prost(uint64, tag = "1")]
    pub resource_id: u64,
    #[prost(int64, tag = "2")]
    pub amount: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoPosition {
    #[prost(int64, tag = "1")]
    pub x: i64,
    #[prost(int64, tag = "2")]
    pub y: i64,
}

// ── Operation Types ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct CreateResource {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub recipe: Vec<ProtoRecipeInput>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateLocation {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub position: Option<ProtoPosition>,
    #[prost(int64, tag = "3")]
    pub capacity: i64,
    #[prost(string, tag = "4")]
    pub kind: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateProcessor {
    #[prost(enumeration = "ProtoProcessorKind", tag = "1")]
    pub kind: i32,
    #[prost(uint64, tag = "2")]
    pub location_id: u64,
    #[prost(uint64, tag = "3")]
    pub output_resource_id: u64,
    #[prost(uint64, optional, tag = "4")]
    pub fuel_resource_id: Option<u64>,
    #[prost(int64, tag = "5")]
    pub output_rate: i64,
    #[prost(int64, tag = "6")]
    pub cycle_duration: i64,
    #[prost(enumeration = "ProtoFuelCostMode", tag = "7")]
    pub fuel_cost_mode: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateStorage {
    #[prost(uint64, tag = "1")]
    pub resource_id: u64,
    #[prost(int64, tag = "2")]
    pub capacity: i64,
    #[prost(uint64, tag = "3")]
    pub location_id: u64,
    #[prost(enumeration = "ProtoMobility", tag = "4")]
    pub mobility: i32,
    #[prost(int64, tag = "5")]
    pub speed: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateUnit {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub speed: i64,
    #[prost(uint64, optional, tag = "3")]
    pub location_id: Option<u64>,
}

/// Shared by the zero-, one- and two-input variants; the oneof tag
/// tells them apart and the input count must match it.
#[derive(Clone, PartialEq, Message)]
pub struct Produce {
    #[prost(uint64, tag = "1")]
    pub processor_id: u64,
    #[prost(uint64, tag = "2")]
    pub output_storage_id: u64,
    #[prost(uint64, repeated, tag = "3")]
    pub input_storage_ids: Vec<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SendOutput {
    #[prost(uint64, tag = "1")]
    pub sender_id: u64,
    #[prost(uint64, tag = "2")]
    pub from_storage_id: u64,
    #[prost(uint64, tag = "3")]
    pub to_storage_id: u64,
    #[prost(uint64, optional, tag = "4")]
    pub fuel_storage_id: Option<u64>,
    #[prost(uint64, tag = "5")]
    pub from_location_id: u64,
    #[prost(uint64, tag = "6")]
    pub to_location_id: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct MoveBetweenStorage {
    #[prost(uint64, tag = "1")]
    pub from_storage_id: u64,
    #[prost(uint64, tag = "2")]
    pub to_storage_id: u64,
    #[prost(int64, tag = "3")]
    pub amount: i64,
}

/// Start of a two-phase move, for a storage or a unit.
#[derive(Clone, PartialEq, Message)]
pub struct Relocate {
    #[prost(uint64, tag = "1")]
    pub entity_id: u64,
    #[prost(uint64, tag = "2")]
    pub from_location_id: u64,
    #[prost(uint64, tag = "3")]
    pub to_location_id: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct CompleteMove {
    #[prost(uint64, tag = "1")]
    pub entity_id: u64,
}
