/// Economy Kernel v1: Sender Engine
///
/// Production accrual fused with relocation: a sender draws one unit from
/// its local storage per unit delivered and credits a storage at another
/// location in the same step, paying fuel from a co-located fuel storage.

use crate::arithmetic::{checked_add, checked_mul, checked_sub};
use crate::config::EconomyConfig;
use crate::domain::{
    EconomyState, FuelCostMode, LocationId, ProcessorId, ProcessorKind, StorageId,
    TransitionResult,
};
use crate::error::{EngineError, EngineResult};
use crate::geometry::distance;
use crate::processor::accrue;
use crate::registry::require_same_location;
use crate::transit::Relocatable;

/// Fuel charged for one send, and the delivery it allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuelCharge {
    pub delivered: i64,
    pub cost: i64,
}

/// Throttle `deliverable` to what `fuel_available` can pay for.
pub fn charge_fuel(
    mode: FuelCostMode,
    config: &EconomyConfig,
    deliverable: i64,
    distance: i64,
    fuel_available: i64,
) -> EngineResult<FuelCharge> {
    match mode {
        FuelCostMode::None => Ok(FuelCharge {
            delivered: deliverable,
            cost: 0,
        }),
        FuelCostMode::PerOutputUnit => {
            let k = config.fuel_per_output_unit;
            let delivered = if k > 0 {
                deliverable.min(fuel_available.max(0) / k)
            } else {
                deliverable
            };
            Ok(FuelCharge {
                delivered,
                cost: checked_mul(delivered, k)?,
            })
        }
        FuelCostMode::PerDistanceUnit => {
            let cost = checked_mul(distance, config.fuel_per_distance_unit)?;
            if deliverable == 0 || cost > fuel_available {
                Ok(FuelCharge {
                    delivered: 0,
                    cost: 0,
                })
            } else {
                Ok(FuelCharge {
                    delivered: deliverable,
                    cost,
                })
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn send(
    state: &mut EconomyState,
    config: &EconomyConfig,
    sender_id: ProcessorId,
    from_storage_id: StorageId,
    to_storage_id: StorageId,
    fuel_storage_id: Option<StorageId>,
    from_location_id: LocationId,
    to_location_id: LocationId,
    now: i64,
) -> EngineResult<TransitionResult> {
    let mut sender = state.processor(sender_id)?.clone();
    if sender.kind != ProcessorKind::Sender {
        return Err(EngineError::InvalidProcessorType {
            expected: "sender".to_string(),
        });
    }

    let mut ids = vec![from_storage_id, to_storage_id];
    ids.extend(fuel_storage_id);
    for (i, id) in ids.iter().enumerate() {
        if ids[..i].contains(id) {
            return Err(EngineError::InvalidInput(format!(
                "{} supplied more than once",
                id
            )));
        }
    }

    let from_location = state.location(from_location_id)?.clone();
    let to_location = state.location(to_location_id)?.clone();
    if from_location.id == to_location.id {
        return Err(EngineError::InvalidInput(format!(
            "{} is both origin and destination",
            from_location.id
        )));
    }

    let mut from = state.storage(from_storage_id)?.clone();
    let mut to = state.storage(to_storage_id)?.clone();
    if from.resource_id != sender.output_resource_id || to.resource_id != sender.output_resource_id
    {
        return Err(EngineError::ResourceNotMatching);
    }

    let mut fuel = match fuel_storage_id {
        Some(id) => Some(state.storage(id)?.clone()),
        None => None,
    };
    if sender.fuel_cost_mode != FuelCostMode::None {
        let supplied = fuel
            .as_ref()
            .map(|f| Some(f.resource_id) == sender.fuel_resource_id)
            .unwrap_or(false);
        if !supplied {
            return Err(EngineError::FuelNotSupplied);
        }
    }

    let here = Some(sender.location_id);
    require_same_location(here, Some(from_location.id))?;
    require_same_location(here, from.location_at(now))?;
    if let Some(f) = &fuel {
        require_same_location(here, f.location_at(now))?;
    }
    require_same_location(Some(to_location.id), to.location_at(now))?;

    let accrual = accrue(&sender, now)?;
    let deliverable = accrual
        .total_available
        .min(to.free_capacity())
        .min(from.amount);

    let span = distance(from_location.position, to_location.position)?;
    let fuel_available = fuel.as_ref().map(|f| f.amount).unwrap_or(0);
    let charge = charge_fuel(sender.fuel_cost_mode, config, deliverable, span, fuel_available)?;
    let delivered = charge.delivered;

    let reason = if delivered < accrual.total_available {
        if delivered < deliverable {
            "fuel shortfall"
        } else if from.amount < to.free_capacity() {
            "input shortfall"
        } else {
            "destination storage full"
        }
    } else {
        ""
    };

    from.amount = checked_sub(from.amount, delivered)?;
    to.amount = checked_add(to.amount, delivered)?;
    if let Some(f) = fuel.as_mut() {
        f.amount = checked_sub(f.amount, charge.cost)?;
    }
    let awaiting_units = accrual.settle(&mut sender, delivered)?;

    tracing::debug!(
        target: "economy::sender",
        sender = %sender.id,
        from = %from_location.id,
        to = %to_location.id,
        produced = accrual.produced,
        delivered,
        fuel_spent = charge.cost,
        awaiting_units,
        "sender.sent"
    );

    state.put_processor(sender);
    state.put_storage(from);
    state.put_storage(to);
    if let Some(f) = fuel {
        state.put_storage(f);
    }

    Ok(TransitionResult {
        produced: accrual.produced,
        delivered,
        awaiting_units,
        input_consumed: delivered,
        fuel_spent: charge.cost,
        reason: reason.to_string(),
        ..Default::default()
    })
}
