/// Economy Kernel v1: Centralized Transition Dispatch
///
/// Routes every operation to its engine module. The committed state is
/// never mutated here: a clone is made first and returned on success.
/// All math is checked integer. No float.

use crate::catalog::create_resource;
use crate::config::EconomyConfig;
use crate::domain::{EconomyState, TransitionResult};
use crate::error::EngineResult;
use crate::events::{Operation, OperationEnvelope};
use crate::ledger::{create_storage, move_between_storage};
use crate::processor::{create_processor, produce_one_input, produce_two_inputs, produce_zero_input};
use crate::registry::create_location;
use crate::sender::send;
use crate::transit::{
    create_unit, move_storage, move_unit_complete, move_unit_start, update_storage_move_status,
};

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `envelope` to `state` and return `(new_state, result)`.
///
/// On error the clone is dropped, so a failed operation never leaves a
/// partial write behind.
pub fn apply_operation(
    state: &EconomyState,
    config: &EconomyConfig,
    envelope: &OperationEnvelope,
) -> EngineResult<(EconomyState, TransitionResult)> {
    let mut next = state.clone();
    let now = envelope.now;

    let mut result = match &envelope.operation {
        Operation::CreateResource { name, recipe } => {
            let id = create_resource(&mut next, config, name, recipe)?;
            created(id.raw())
        }
        Operation::CreateLocation {
            name,
            position,
            capacity,
            kind,
        } => {
            let id = create_location(&mut next, config, name, *position, *capacity, kind)?;
            created(id.raw())
        }
        Operation::CreateProcessor {
            kind,
            location_id,
            output_resource_id,
            fuel_resource_id,
            output_rate,
            cycle_duration,
            fuel_cost_mode,
        } => {
            let id = create_processor(
                &mut next,
                config,
                *kind,
                *location_id,
                *output_resource_id,
                *fuel_resource_id,
                *output_rate,
                *cycle_duration,
                *fuel_cost_mode,
                now,
            )?;
            created(id.raw())
        }
        Operation::CreateStorage {
            resource_id,
            capacity,
            location_id,
            mobility,
            speed,
        } => {
            let id = create_storage(
                &mut next,
                *resource_id,
                *capacity,
                *location_id,
                *mobility,
                *speed,
            )?;
            created(id.raw())
        }
        Operation::CreateUnit {
            name,
            speed,
            location_id,
        } => {
            let id = create_unit(&mut next, config, name, *speed, *location_id)?;
            created(id.raw())
        }
        Operation::ProduceZeroInput {
            processor_id,
            output_storage_id,
        } => produce_zero_input(&mut next, config, *processor_id, *output_storage_id, now)?,
        Operation::ProduceOneInput {
            processor_id,
            output_storage_id,
            input_storage_id,
        } => produce_one_input(
            &mut next,
            config,
            *processor_id,
            *output_storage_id,
            *input_storage_id,
            now,
        )?,
        Operation::ProduceTwoInputs {
            processor_id,
            output_storage_id,
            input_storage_ids,
        } => produce_two_inputs(
            &mut next,
            config,
            *processor_id,
            *output_storage_id,
            *input_storage_ids,
            now,
        )?,
        Operation::Send {
            sender_id,
            from_storage_id,
            to_storage_id,
            fuel_storage_id,
            from_location_id,
            to_location_id,
        } => send(
            &mut next,
            config,
            *sender_id,
            *from_storage_id,
            *to_storage_id,
            *fuel_storage_id,
            *from_location_id,
            *to_location_id,
            now,
        )?,
        Operation::MoveBetweenStorage {
            from_storage_id,
            to_storage_id,
            amount,
        } => move_between_storage(&mut next, *from_storage_id, *to_storage_id, *amount, now)?,
        Operation::MoveStorage {
            storage_id,
            from_location_id,
            to_location_id,
        } => move_storage(&mut next, *storage_id, *from_location_id, *to_location_id, now)?,
        Operation::UpdateStorageMoveStatus { storage_id } => {
            update_storage_move_status(&mut next, *storage_id, now)?
        }
        Operation::MoveUnitStart {
            unit_id,
            from_location_id,
            to_location_id,
        } => move_unit_start(&mut next, *unit_id, *from_location_id, *to_location_id, now)?,
        Operation::MoveUnitComplete { unit_id } => move_unit_complete(&mut next, *unit_id, now)?,
    };

    result.operation = envelope.operation.name().to_string();
    Ok((next, result))
}

fn created(id: u64) -> TransitionResult {
    TransitionResult {
        created_id: Some(id),
        ..Default::default()
    }
}
