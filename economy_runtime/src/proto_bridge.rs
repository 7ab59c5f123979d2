//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between protobuf wire types (proto_types.rs) and the
//! kernel's typed `OperationEnvelope`. Decoding is strict: a missing
//! message, an unknown enum value or a wrong input count is an error.

use thiserror::Error;

use economy_kernel::domain::{
    FuelCostMode, LocationId, Mobility, ProcessorId, ProcessorKind, RecipeInput, ResourceId,
    StorageId, UnitId,
};
use economy_kernel::events::{Operation, OperationEnvelope};
use economy_kernel::geometry::Position;

use crate::proto_types::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("unknown {field} value {value}")]
    UnknownEnum { field: &'static str, value: i32 },
    #[error("{operation} takes {expected} input storages, got {got}")]
    InputCount {
        operation: &'static str,
        expected: usize,
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Proto → Kernel
// ---------------------------------------------------------------------------

/// Convert a protobuf envelope to the kernel's `OperationEnvelope`.
pub fn proto_to_kernel(proto: &ProtoOperationEnvelope) -> Result<OperationEnvelope, BridgeError> {
    let kind = proto
        .operation
        .as_ref()
        .and_then(|op| op.kind.as_ref())
        .ok_or(BridgeError::MissingField("operation"))?;

    let operation = match kind {
        OperationKind::CreateResource(m) => Operation::CreateResource {
            name: m.name.clone(),
            recipe: m
                .recipe
                .iter()
                .map(|line| RecipeInput {
                    resource_id: ResourceId(line.resource_id),
                    amount: line.amount,
                })
                .collect(),
        },
        OperationKind::CreateLocation(m) => {
            let p = m
                .position
                .as_ref()
                .ok_or(BridgeError::MissingField("position"))?;
            Operation::CreateLocation {
                name: m.name.clone(),
                position: Position::new(p.x, p.y),
                capacity: m.capacity,
                kind: m.kind.clone(),
            }
        }
        OperationKind::CreateProcessor(m) => Operation::CreateProcessor {
            kind: processor_kind_from_proto(m.kind)?,
            location_id: LocationId(m.location_id),
            output_resource_id: ResourceId(m.output_resource_id),
            fuel_resource_id: m.fuel_resource_id.map(ResourceId),
            output_rate: m.output_rate,
            cycle_duration: m.cycle_duration,
            fuel_cost_mode: fuel_mode_from_proto(m.fuel_cost_mode)?,
        },
        OperationKind::CreateStorage(m) => Operation::CreateStorage {
            resource_id: ResourceId(m.resource_id),
            capacity: m.capacity,
            location_id: LocationId(m.location_id),
            mobility: mobility_from_proto(m.mobility)?,
            speed: m.speed,
        },
        OperationKind::CreateUnit(m) => Operation::CreateUnit {
            name: m.name.clone(),
            speed: m.speed,
            location_id: m.location_id.map(LocationId),
        },
        OperationKind::ProduceZeroInput(m) => {
            inputs::<0>("produce_zero_input", m)?;
            Operation::ProduceZeroInput {
                processor_id: ProcessorId(m.processor_id),
                output_storage_id: StorageId(m.output_storage_id),
            }
        }
        OperationKind::ProduceOneInput(m) => {
            let [input] = inputs::<1>("produce_one_input", m)?;
            Operation::ProduceOneInput {
                processor_id: ProcessorId(m.processor_id),
                output_storage_id: StorageId(m.output_storage_id),
                input_storage_id: input,
            }
        }
        OperationKind::ProduceTwoInputs(m) => Operation::ProduceTwoInputs {
            processor_id: ProcessorId(m.processor_id),
            output_storage_id: StorageId(m.output_storage_id),
            input_storage_ids: inputs::<2>("produce_two_inputs", m)?,
        },
        OperationKind::Send(m) => Operation::Send {
            sender_id: ProcessorId(m.sender_id),
            from_storage_id: StorageId(m.from_storage_id),
            to_storage_id: StorageId(m.to_storage_id),
            fuel_storage_id: m.fuel_storage_id.map(StorageId),
            from_location_id: LocationId(m.from_location_id),
            to_location_id: LocationId(m.to_location_id),
        },
        OperationKind::MoveBetweenStorage(m) => Operation::MoveBetweenStorage {
            from_storage_id: StorageId(m.from_storage_id),
            to_storage_id: StorageId(m.to_storage_id),
            amount: m.amount,
        },
        OperationKind::MoveStorage(m) => Operation::MoveStorage {
            storage_id: StorageId(m.entity_id),
            from_location_id: LocationId(m.from_location_id),
            to_location_id: LocationId(m.to_location_id),
        },
        OperationKind::UpdateStorageMoveStatus(m) => Operation::UpdateStorageMoveStatus {
            storage_id: StorageId(m.entity_id),
        },
        OperationKind::MoveUnitStart(m) => Operation::MoveUnitStart {
            unit_id: UnitId(m.entity_id),
            from_location_id: LocationId(m.from_location_id),
            to_location_id: LocationId(m.to_location_id),
        },
        OperationKind::MoveUnitComplete(m) => Operation::MoveUnitComplete {
            unit_id: UnitId(m.entity_id),
        },
    };

    Ok(OperationEnvelope {
        sequence: proto.sequence,
        now: proto.now,
        caller: proto.caller.clone(),
        schema_version: proto.schema_version,
        operation,
    })
}

fn inputs<const N: usize>(operation: &'static str, m: &Produce) -> Result<[StorageId; N], BridgeError> {
    let ids: Vec<StorageId> = m.input_storage_ids.iter().copied().map(StorageId).collect();
    let got = ids.len();
    ids.try_into().map_err(|_| BridgeError::InputCount {
        operation,
        expected: N,
        got,
    })
}

fn processor_kind_from_proto(v: i32) -> Result<ProcessorKind, BridgeError> {
    match ProtoProcessorKind::try_from(v) {
        Ok(ProtoProcessorKind::Producer) => Ok(ProcessorKind::Producer),
        Ok(ProtoProcessorKind::Sender) => Ok(ProcessorKind::Sender),
        Err(_) => Err(BridgeError::UnknownEnum { field: "kind", value: v }),
    }
}

fn fuel_mode_from_proto(v: i32) -> Result<FuelCostMode, BridgeError> {
    match ProtoFuelCostMode::try_from(v) {
        Ok(ProtoFuelCostMode::None) => Ok(FuelCostMode::None),
        Ok(ProtoFuelCostMode::PerOutputUnit) => Ok(FuelCostMode::PerOutputUnit),
        Ok(ProtoFuelCostMode::PerDistanceUnit) => Ok(FuelCostMode::PerDistanceUnit),
        Err(_) => Err(BridgeError::UnknownEnum {
            field: "fuel_cost_mode",
            value: v,
        }),
    }
}

fn mobility_from_proto(v: i32) -> Result<Mobility, BridgeError> {
    match ProtoMobility::try_from(v) {
        Ok(ProtoMobility::Fixed) => Ok(Mobility::Fixed),
        Ok(ProtoMobility::Movable) => Ok(Mobility::Movable),
        Err(_) => Err(BridgeError::UnknownEnum {
            field: "mobility",
            value: v,
        }),
    }
}

// ---------------------------------------------------------------------------
// Kernel → Proto
// ---------------------------------------------------------------------------

fn produce(processor_id: ProcessorId, output_storage_id: StorageId, ids: &[StorageId]) -> Produce {
    Produce {
        processor_id: processor_id.raw(),
        output_storage_id: output_storage_id.raw(),
        input_storage_ids: ids.iter().map(|id| id.raw()).collect(),
    }
}

/// Convert a kernel envelope to its protobuf form for the binary log.
pub fn kernel_to_proto(kernel: &OperationEnvelope) -> ProtoOperationEnvelope {
    let kind = match &kernel.operation {
        Operation::CreateResource { name, recipe } => OperationKind::CreateResource(CreateResource {
            name: name.clone(),
            recipe: recipe
                .iter()
                .map(|line| ProtoRecipeInput {
                    resource_id: line.resource_id.raw(),
                    amount: line.amount,
                })
                .collect(),
        }),
        Operation::CreateLocation {
            name,
            position,
            capacity,
            kind,
        } => OperationKind::CreateLocation(CreateLocation {
            name: name.clone(),
            position: Some(ProtoPosition {
                x: position.x,
                y: position.y,
            }),
            capacity: *capacity,
            kind: kind.clone(),
        }),
        Operation::CreateProcessor {
            kind,
            location_id,
            output_resource_id,
            fuel_resource_id,
            output_rate,
            cycle_duration,
            fuel_cost_mode,
        } => OperationKind::CreateProcessor(CreateProcessor {
            kind: match kind {
                ProcessorKind::Producer => ProtoProcessorKind::Producer,
                ProcessorKind::Sender => ProtoProcessorKind::Sender,
            } as i32,
            location_id: location_id.raw(),
            output_resource_id: output_resource_id.raw(),
            fuel_resource_id: fuel_resource_id.map(|id| id.raw()),
            output_rate: *output_rate,
            cycle_duration: *cycle_duration,
            fuel_cost_mode: match fuel_cost_mode {
                FuelCostMode::None => ProtoFuelCostMode::None,
                FuelCostMode::PerOutputUnit => ProtoFuelCostMode::PerOutputUnit,
                FuelCostMode::PerDistanceUnit => ProtoFuelCostMode::PerDistanceUnit,
            } as i32,
        }),
        Operation::CreateStorage {
            resource_id,
            capacity,
            location_id,
            mobility,
            speed,
        } => OperationKind::CreateStorage(CreateStorage {
            resource_id: resource_id.raw(),
            capacity: *capacity,
            location_id: location_id.raw(),
            mobility: match mobility {
                Mobility::Fixed => ProtoMobility::Fixed,
                Mobility::Movable => ProtoMobility::Movable,
            } as i32,
            speed: *speed,
        }),
        Operation::CreateUnit {
            name,
            speed,
            location_id,
        } => OperationKind::CreateUnit(CreateUnit {
            name: name.clone(),
            speed: *speed,
            location_id: location_id.map(|id| id.raw()),
        }),
        Operation::ProduceZeroInput {
            processor_id,
            output_storage_id,
        } => OperationKind::ProduceZeroInput(produce(*processor_id, *output_storage_id, &[])),
        Operation::ProduceOneInput {
            processor_id,
            output_storage_id,
            input_storage_id,
        } => OperationKind::ProduceOneInput(produce(
            *processor_id,
            *output_storage_id,
            &[*input_storage_id],
        )),
        Operation::ProduceTwoInputs {
            processor_id,
            output_storage_id,
            input_storage_ids,
        } => OperationKind::ProduceTwoInputs(produce(
            *processor_id,
            *output_storage_id,
            &input_storage_ids[..],
        )),
        Operation::Send {
            sender_id,
            from_storage_id,
            to_storage_id,
            fuel_storage_id,
            from_location_id,
            to_location_id,
        } => OperationKind::Send(SendOutput {
            sender_id: sender_id.raw(),
            from_storage_id: from_storage_id.raw(),
            to_storage_id: to_storage_id.raw(),
            fuel_storage_id: fuel_storage_id.map(|id| id.raw()),
            from_location_id: from_location_id.raw(),
            to_location_id: to_location_id.raw(),
        }),
        Operation::MoveBetweenStorage {
            from_storage_id,
            to_storage_id,
            amount,
        } => OperationKind::MoveBetweenStorage(MoveBetweenStorage {
            from_storage_id: from_storage_id.raw(),
            to_storage_id: to_storage_id.raw(),
            amount: *amount,
        }),
        Operation::MoveStorage {
            storage_id,
            from_location_id,
            to_location_id,
        } => OperationKind::MoveStorage(Relocate {
            entity_id: storage_id.raw(),
            from_location_id: from_location_id.raw(),
            to_location_id: to_location_id.raw(),
        }),
        Operation::UpdateStorageMoveStatus { storage_id } => {
            OperationKind::UpdateStorageMoveStatus(CompleteMove {
                entity_id: storage_id.raw(),
            })
        }
        Operation::MoveUnitStart {
            unit_id,
            from_location_id,
            to_location_id,
        } => OperationKind::MoveUnitStart(Relocate {
            entity_id: unit_id.raw(),
            from_location_id: from_location_id.raw(),
            to_location_id: to_location_id.raw(),
        }),
        Operation::MoveUnitComplete { unit_id } => OperationKind::MoveUnitComplete(CompleteMove {
            entity_id: unit_id.raw(),
        }),
    };

    ProtoOperationEnvelope {
        sequence: kernel.sequence,
        now: kernel.now,
        caller: kernel.caller.clone(),
        schema_version: kernel.schema_version,
        operation: Some(ProtoOperation { kind: Some(kind) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_input_count_is_rejected() {
        let proto = ProtoOperationEnvelope {
            sequence: 1,
            now: 0,
            caller: "t".to_string(),
            schema_version: 1,
            operation: Some(ProtoOperation {
                kind: Some(OperationKind::ProduceTwoInputs(Produce {
                    processor_id: 1,
                    output_storage_id: 2,
                    input_storage_ids: vec![3],
                })),
            }),
        };
        assert_eq!(
            proto_to_kernel(&proto),
            Err(BridgeError::InputCount {
                operation: "produce_two_inputs",
                expected: 2,
                got: 1,
            })
        );
    }

    #[test]
    fn unknown_enum_is_rejected() {
        let proto = ProtoOperationEnvelope {
            sequence: 1,
            now: 0,
            caller: "t".to_string(),
            schema_version: 1,
            operation: Some(ProtoOperation {
                kind: Some(OperationKind::CreateStorage(CreateStorage {
                    resource_id: 1,
                    capacity: 5,
                    location_id: 2,
                    mobility: 7,
                    speed: 0,
                })),
            }),
        };
        assert_eq!(
            proto_to_kernel(&proto),
            Err(BridgeError::UnknownEnum {
                field: "mobility",
                value: 7,
            })
        );
    }

    #[test]
    fn empty_envelope_is_rejected() {
        let proto = ProtoOperationEnvelope::default();
        assert_eq!(proto_to_kernel(&proto), Err(BridgeError::MissingField("operation")));
    }

    #[test]
    fn send_keeps_optional_fuel_storage() {
        let env = OperationEnvelope::new(
            4,
            90,
            "player-2",
            Operation::Send {
                sender_id: ProcessorId(7),
                from_storage_id: StorageId(8),
                to_storage_id: StorageId(9),
                fuel_storage_id: None,
                from_location_id: LocationId(1),
                to_location_id: LocationId(2),
            },
        );
        assert_eq!(proto_to_kernel(&kernel_to_proto(&env)), Ok(env));
    }
}
