/// Economy Kernel v1: Storage Ledger
///
/// Capacity-bounded quantities of one resource. `0 <= amount <= capacity`
/// holds for every committed storage. Transfers debit and credit together.

use crate::arithmetic::checked_add;
use crate::domain::{EconomyState, LocationId, Mobility, ResourceId, Storage, StorageId, TransitionResult};
use crate::error::{EngineError, EngineResult};
use crate::registry::{occupy, require_same_location};
use crate::transit::Relocatable;

/// Create an empty storage. A movable storage takes a slot at its location.
pub fn create_storage(
    state: &mut EconomyState,
    resource_id: ResourceId,
    capacity: i64,
    location_id: LocationId,
    mobility: Mobility,
    speed: i64,
) -> EngineResult<StorageId> {
    state.resource(resource_id)?;
    if capacity < 0 {
        return Err(EngineError::InvalidInput(format!(
            "storage capacity must be >= 0, got {}",
            capacity
        )));
    }
    if speed < 0 || (mobility == Mobility::Movable && speed == 0) {
        return Err(EngineError::InvalidInput(format!(
            "invalid speed {} for {:?} storage",
            speed, mobility
        )));
    }

    let mut location = state.location(location_id)?.clone();
    if mobility == Mobility::Movable {
        occupy(&mut location)?;
    }

    let id = StorageId(state.allocate_id()?);
    state.put_location(location);
    state.put_storage(Storage {
        id,
        resource_id,
        amount: 0,
        capacity,
        location_id,
        mobility,
        speed,
        arrives_at: 0,
    });
    Ok(id)
}

/// Move `amount` between two co-located storages of the same resource.
pub fn move_between_storage(
    state: &mut EconomyState,
    from_storage_id: StorageId,
    to_storage_id: StorageId,
    amount: i64,
    now: i64,
) -> EngineResult<TransitionResult> {
    if from_storage_id == to_storage_id {
        return Err(EngineError::InvalidInput(format!(
            "{} is both source and destination",
            from_storage_id
        )));
    }
    if amount < 0 {
        return Err(EngineError::InvalidInput(format!(
            "transfer amount must be >= 0, got {}",
            amount
        )));
    }

    let mut from = state.storage(from_storage_id)?.clone();
    let mut to = state.storage(to_storage_id)?.clone();

    if from.resource_id != to.resource_id {
        return Err(EngineError::ResourceNotMatching);
    }
    require_same_location(from.location_at(now), to.location_at(now))?;
    if from.amount < amount {
        return Err(EngineError::StorageAmountTooLow);
    }
    let credited = checked_add(to.amount, amount)?;
    if credited > to.capacity {
        return Err(EngineError::StorageFull);
    }

    from.amount -= amount;
    to.amount = credited;

    state.put_storage(from);
    state.put_storage(to);

    Ok(TransitionResult {
        delivered: amount,
        ..Default::default()
    })
}
