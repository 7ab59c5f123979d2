/// Economy Kernel v1: Processor Engine
///
/// Time-gated production accrual. Elapsed time converts into whole
/// cycles; the partial remainder stays behind `claimed_at`. Units that do
/// not fit the destination, or that inputs cannot back, stay in
/// `awaiting_units` for a later call.

use crate::arithmetic::{checked_add, checked_mul, checked_sub, whole_units};
use crate::catalog::match_recipe;
use crate::config::{EconomyConfig, InputShortfallPolicy};
use crate::domain::{
    EconomyState, FuelCostMode, LocationId, Processor, ProcessorId, ProcessorKind, ResourceId,
    Storage, StorageId, TransitionResult,
};
use crate::error::{EngineError, EngineResult};
use crate::registry::require_same_location;
use crate::transit::Relocatable;

/// Result of converting elapsed time into completed cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub new_cycles: i64,
    pub produced: i64,
    /// `claimed_at` advanced by whole cycles only.
    pub claimed_at: i64,
    /// Carry-over plus this call's production.
    pub total_available: i64,
}

impl Accrual {
    /// Write the accrual back, keeping whatever was not delivered.
    pub fn settle(&self, processor: &mut Processor, delivered: i64) -> EngineResult<i64> {
        let remaining = checked_sub(self.total_available, delivered)?;
        if remaining < 0 {
            return Err(EngineError::InvariantViolation(format!(
                "{} delivered {} of {} available",
                processor.id, delivered, self.total_available
            )));
        }
        processor.claimed_at = self.claimed_at;
        processor.awaiting_units = remaining;
        Ok(remaining)
    }
}

/// Convert the time since the last observation into whole cycles.
pub fn accrue(processor: &Processor, now: i64) -> EngineResult<Accrual> {
    if now < processor.claimed_at {
        return Err(EngineError::ClockBehind {
            now,
            claimed_at: processor.claimed_at,
        });
    }
    if processor.cycle_duration <= 0 || processor.output_rate <= 0 {
        return Err(EngineError::InvariantViolation(format!(
            "{} has non-positive rate or cycle duration",
            processor.id
        )));
    }
    let elapsed = checked_sub(now, processor.claimed_at)?;
    let new_cycles = elapsed / processor.cycle_duration;
    let produced = checked_mul(new_cycles, processor.output_rate)?;
    let claimed_at = checked_add(
        processor.claimed_at,
        checked_mul(new_cycles, processor.cycle_duration)?,
    )?;
    let total_available = checked_add(processor.awaiting_units, produced)?;
    Ok(Accrual {
        new_cycles,
        produced,
        claimed_at,
        total_available,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn create_processor(
    state: &mut EconomyState,
    config: &EconomyConfig,
    kind: ProcessorKind,
    location_id: LocationId,
    output_resource_id: ResourceId,
    fuel_resource_id: Option<ResourceId>,
    output_rate: i64,
    cycle_duration: i64,
    fuel_cost_mode: FuelCostMode,
    now: i64,
) -> EngineResult<ProcessorId> {
    if output_rate <= 0 {
        return Err(EngineError::InvalidInput(format!(
            "output rate must be positive, got {}",
            output_rate
        )));
    }
    if cycle_duration <= 0 {
        return Err(EngineError::InvalidInput(format!(
            "cycle duration must be positive, got {}",
            cycle_duration
        )));
    }
    state.location(location_id)?;
    state.resource(output_resource_id)?;

    let fuel_resource_id = fuel_resource_id.or(config.default_fuel_resource);
    match fuel_resource_id {
        Some(fuel) => {
            state.resource(fuel)?;
        }
        None if fuel_cost_mode != FuelCostMode::None => {
            return Err(EngineError::InvalidInput(format!(
                "fuel cost mode {:?} requires a fuel resource",
                fuel_cost_mode
            )));
        }
        None => {}
    }

    let id = ProcessorId(state.allocate_id()?);
    state.put_processor(Processor {
        id,
        location_id,
        kind,
        output_resource_id,
        fuel_resource_id,
        output_rate,
        cycle_duration,
        fuel_cost_mode,
        claimed_at: now,
        awaiting_units: 0,
    });
    Ok(id)
}

pub fn produce_zero_input(
    state: &mut EconomyState,
    config: &EconomyConfig,
    processor_id: ProcessorId,
    output_storage_id: StorageId,
    now: i64,
) -> EngineResult<TransitionResult> {
    produce(state, config, processor_id, output_storage_id, &[], now)
}

pub fn produce_one_input(
    state: &mut EconomyState,
    config: &EconomyConfig,
    processor_id: ProcessorId,
    output_storage_id: StorageId,
    input_storage_id: StorageId,
    now: i64,
) -> EngineResult<TransitionResult> {
    produce(
        state,
        config,
        processor_id,
        output_storage_id,
        &[input_storage_id],
        now,
    )
}

pub fn produce_two_inputs(
    state: &mut EconomyState,
    config: &EconomyConfig,
    processor_id: ProcessorId,
    output_storage_id: StorageId,
    input_storage_ids: [StorageId; 2],
    now: i64,
) -> EngineResult<TransitionResult> {
    produce(
        state,
        config,
        processor_id,
        output_storage_id,
        &input_storage_ids,
        now,
    )
}

/// Shared body of the zero-, one- and two-input variants.
fn produce(
    state: &mut EconomyState,
    config: &EconomyConfig,
    processor_id: ProcessorId,
    output_storage_id: StorageId,
    input_storage_ids: &[StorageId],
    now: i64,
) -> EngineResult<TransitionResult> {
    let mut processor = state.processor(processor_id)?.clone();
    if processor.kind != ProcessorKind::Producer {
        return Err(EngineError::InvalidProcessorType {
            expected: "producer".to_string(),
        });
    }

    let mut output = state.storage(output_storage_id)?.clone();
    if output.resource_id != processor.output_resource_id {
        return Err(EngineError::ResourceNotMatching);
    }

    let mut inputs: Vec<Storage> = Vec::with_capacity(input_storage_ids.len());
    for &id in input_storage_ids {
        if id == output_storage_id || inputs.iter().any(|s| s.id == id) {
            return Err(EngineError::InvalidInput(format!(
                "{} supplied more than once",
                id
            )));
        }
        inputs.push(state.storage(id)?.clone());
    }

    let here = Some(processor.location_id);
    require_same_location(here, output.location_at(now))?;
    for input in &inputs {
        require_same_location(here, input.location_at(now))?;
    }

    let resource = state.resource(processor.output_resource_id)?;
    let input_refs: Vec<&Storage> = inputs.iter().collect();
    let required = match_recipe(resource, &input_refs)?;

    let mut input_capacity = i64::MAX;
    for (input, &per_unit) in inputs.iter().zip(&required) {
        if input.amount < per_unit && config.input_shortfall == InputShortfallPolicy::Strict {
            return Err(EngineError::InputStorageAmountTooLow);
        }
        input_capacity = input_capacity.min(whole_units(input.amount, per_unit));
    }

    let accrual = accrue(&processor, now)?;
    let free = output.free_capacity();
    let delivered = accrual.total_available.min(free).min(input_capacity);

    let reason = if delivered < accrual.total_available {
        if input_capacity < free {
            "input shortfall"
        } else {
            "output storage full"
        }
    } else {
        ""
    };

    let mut input_consumed = 0;
    for (input, &per_unit) in inputs.iter_mut().zip(&required) {
        let debit = checked_mul(delivered, per_unit)?;
        input.amount = checked_sub(input.amount, debit)?;
        input_consumed = checked_add(input_consumed, debit)?;
    }
    output.amount = checked_add(output.amount, delivered)?;
    let awaiting_units = accrual.settle(&mut processor, delivered)?;

    tracing::debug!(
        target: "economy::processor",
        processor = %processor.id,
        cycles = accrual.new_cycles,
        produced = accrual.produced,
        delivered,
        awaiting_units,
        input_consumed,
        "processor.produced"
    );

    state.put_processor(processor);
    state.put_storage(output);
    for input in inputs {
        state.put_storage(input);
    }

    Ok(TransitionResult {
        produced: accrual.produced,
        delivered,
        awaiting_units,
        input_consumed,
        reason: reason.to_string(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::create_resource;
    use crate::domain::{Mobility, RecipeInput};
    use crate::geometry::Position;
    use crate::ledger::create_storage;
    use crate::registry::create_location;
    use crate::state::create_initial_state;

    fn processor(rate: i64, duration: i64, claimed_at: i64, awaiting: i64) -> Processor {
        Processor {
            id: ProcessorId(1),
            location_id: LocationId(1),
            kind: ProcessorKind::Producer,
            output_resource_id: ResourceId(1),
            fuel_resource_id: None,
            output_rate: rate,
            cycle_duration: duration,
            fuel_cost_mode: FuelCostMode::None,
            claimed_at,
            awaiting_units: awaiting,
        }
    }

    #[test]
    fn accrual_keeps_partial_cycle() {
        let p = processor(3, 10, 100, 2);
        let a = accrue(&p, 125).unwrap();
        assert_eq!(a.new_cycles, 2);
        assert_eq!(a.produced, 6);
        assert_eq!(a.claimed_at, 120);
        assert_eq!(a.total_available, 8);
    }

    #[test]
    fn accrual_rejects_time_going_backwards() {
        let p = processor(1, 1, 100, 0);
        assert_eq!(
            accrue(&p, 99),
            Err(EngineError::ClockBehind { now: 99, claimed_at: 100 })
        );
    }

    #[test]
    fn settle_keeps_remainder() {
        let mut p = processor(5, 1, 0, 0);
        let a = accrue(&p, 1).unwrap();
        assert_eq!(a.settle(&mut p, 3), Ok(2));
        assert_eq!(p.awaiting_units, 2);
        assert_eq!(p.claimed_at, 1);
    }

    #[test]
    fn processor_rejects_non_positive_rate() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let ore = create_resource(&mut state, &config, "ore", &[]).unwrap();
        let loc = create_location(&mut state, &config, "mine", Position::new(0, 0), 3, "hills")
            .unwrap();
        for (rate, duration) in [(0, 1), (1, 0), (-1, 5)] {
            assert!(matches!(
                create_processor(
                    &mut state,
                    &config,
                    ProcessorKind::Producer,
                    loc,
                    ore,
                    None,
                    rate,
                    duration,
                    FuelCostMode::None,
                    0,
                ),
                Err(EngineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn fuel_mode_without_fuel_resource_is_rejected_unless_defaulted() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let ore = create_resource(&mut state, &config, "ore", &[]).unwrap();
        let coal = create_resource(&mut state, &config, "coal", &[]).unwrap();
        let loc = create_location(&mut state, &config, "dock", Position::new(0, 0), 3, "coast")
            .unwrap();
        let make = |state: &mut EconomyState, config: &EconomyConfig| {
            create_processor(
                state,
                config,
                ProcessorKind::Sender,
                loc,
                ore,
                None,
                1,
                1,
                FuelCostMode::PerOutputUnit,
                0,
            )
        };
        assert!(matches!(make(&mut state, &config), Err(EngineError::InvalidInput(_))));

        let config = config.with_default_fuel_resource(coal);
        let id = make(&mut state, &config).unwrap();
        assert_eq!(state.processor(id).unwrap().fuel_resource_id, Some(coal));
    }

    #[test]
    fn strict_policy_rejects_input_shortfall() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default().with_input_shortfall(InputShortfallPolicy::Strict);
        let a = create_resource(&mut state, &config, "a", &[]).unwrap();
        let b = create_resource(
            &mut state,
            &config,
            "b",
            &[RecipeInput { resource_id: a, amount: 2 }],
        )
        .unwrap();
        let loc = create_location(&mut state, &config, "shop", Position::new(0, 0), 3, "town")
            .unwrap();
        let sa = create_storage(&mut state, a, 10, loc, Mobility::Fixed, 0).unwrap();
        let sb = create_storage(&mut state, b, 10, loc, Mobility::Fixed, 0).unwrap();
        state.storages.get_mut(&sa).unwrap().amount = 1;
        let p = create_processor(
            &mut state,
            &config,
            ProcessorKind::Producer,
            loc,
            b,
            None,
            1,
            1,
            FuelCostMode::None,
            0,
        )
        .unwrap();
        assert_eq!(
            produce_one_input(&mut state, &config, p, sb, sa, 5),
            Err(EngineError::InputStorageAmountTooLow)
        );
        assert_eq!(state.storage(sa).unwrap().amount, 1);
    }

    #[test]
    fn sender_cannot_produce() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let ore = create_resource(&mut state, &config, "ore", &[]).unwrap();
        let loc = create_location(&mut state, &config, "dock", Position::new(0, 0), 3, "coast")
            .unwrap();
        let s = create_storage(&mut state, ore, 10, loc, Mobility::Fixed, 0).unwrap();
        let p = create_processor(
            &mut state,
            &config,
            ProcessorKind::Sender,
            loc,
            ore,
            None,
            1,
            1,
            FuelCostMode::None,
            0,
        )
        .unwrap();
        assert!(matches!(
            produce_zero_input(&mut state, &config, p, s, 3),
            Err(EngineError::InvalidProcessorType { .. })
        ));
    }
}
