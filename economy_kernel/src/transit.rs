/// Economy Kernel v1: Transit Engine
///
/// Two-phase movement shared by movable storages and units.
/// Start: occupancy and location change immediately, `arrives_at` is set.
/// Complete: `arrives_at` is cleared once due. Nothing else moves.

use crate::arithmetic::{checked_add, validate_name};
use crate::config::EconomyConfig;
use crate::domain::{
    EconomyState, Location, LocationId, Storage, StorageId, TransitionResult, Unit, UnitId,
};
use crate::error::{EngineError, EngineResult};
use crate::geometry::{distance, travel_time};
use crate::registry::{occupy, vacate};

/// An entity with a location, a speed and an in-transit marker.
pub trait Relocatable {
    fn location_id(&self) -> LocationId;
    fn speed(&self) -> i64;
    fn arrives_at(&self) -> i64;
    fn relocate(&mut self, to: LocationId, arrives_at: i64);
    fn clear_transit(&mut self);

    /// Effective location at `now`; `None` while in transit.
    fn location_at(&self, now: i64) -> Option<LocationId> {
        match self.arrives_at() {
            0 => Some(self.location_id()),
            t if now >= t => Some(self.location_id()),
            _ => None,
        }
    }

    fn is_moving(&self, now: i64) -> bool {
        self.location_at(now).is_none()
    }

    /// Due but not yet marked complete.
    fn has_arrived(&self, now: i64) -> bool {
        self.arrives_at() > 0 && now >= self.arrives_at()
    }
}

impl Relocatable for Storage {
    fn location_id(&self) -> LocationId {
        self.location_id
    }

    fn speed(&self) -> i64 {
        self.speed
    }

    fn arrives_at(&self) -> i64 {
        self.arrives_at
    }

    fn relocate(&mut self, to: LocationId, arrives_at: i64) {
        self.location_id = to;
        self.arrives_at = arrives_at;
    }

    fn clear_transit(&mut self) {
        self.arrives_at = 0;
    }
}

impl Relocatable for Unit {
    fn location_id(&self) -> LocationId {
        self.location_id
    }

    fn speed(&self) -> i64 {
        self.speed
    }

    fn arrives_at(&self) -> i64 {
        self.arrives_at
    }

    fn relocate(&mut self, to: LocationId, arrives_at: i64) {
        self.location_id = to;
        self.arrives_at = arrives_at;
    }

    fn clear_transit(&mut self) {
        self.arrives_at = 0;
    }
}

/// Start a move of `entity` from `from` to `to`. Returns the new `arrives_at`.
///
/// Mutates only the passed copies; the caller commits them together.
pub fn begin_transit<R: Relocatable>(
    entity: &mut R,
    from: &mut Location,
    to: &mut Location,
    now: i64,
) -> EngineResult<i64> {
    if entity.is_moving(now) {
        return Err(EngineError::NotAllowedWhileMoving);
    }
    if entity.location_id() != from.id {
        return Err(EngineError::DifferentLocations);
    }
    if from.id == to.id {
        return Err(EngineError::InvalidInput(format!(
            "{} is both origin and destination",
            from.id
        )));
    }

    occupy(to)?;
    vacate(from)?;

    let travel = travel_time(distance(from.position, to.position)?, entity.speed())?;
    let arrives_at = match travel {
        0 => 0,
        _ => checked_add(now, travel)?,
    };
    entity.relocate(to.id, arrives_at);
    Ok(arrives_at)
}

/// Clear the in-transit marker if due. Returns whether it was cleared.
pub fn complete_transit<R: Relocatable>(entity: &mut R, now: i64) -> bool {
    if entity.has_arrived(now) {
        entity.clear_transit();
        true
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// Storage movement
// ---------------------------------------------------------------------------

pub fn move_storage(
    state: &mut EconomyState,
    storage_id: StorageId,
    from_location_id: LocationId,
    to_location_id: LocationId,
    now: i64,
) -> EngineResult<TransitionResult> {
    let mut storage = state.storage(storage_id)?.clone();
    if !storage.is_movable() || storage.speed <= 0 {
        return Err(EngineError::StorageTypeNotMovable);
    }
    let mut from = state.location(from_location_id)?.clone();
    let mut to = state.location(to_location_id)?.clone();

    let arrives_at = begin_transit(&mut storage, &mut from, &mut to, now)?;

    tracing::debug!(
        target: "economy::transit",
        storage = %storage.id,
        from = %from.id,
        to = %to.id,
        arrives_at,
        "storage.move_started"
    );

    state.put_storage(storage);
    state.put_location(from);
    state.put_location(to);

    Ok(TransitionResult {
        arrives_at,
        arrived: arrives_at == 0,
        ..Default::default()
    })
}

pub fn update_storage_move_status(
    state: &mut EconomyState,
    storage_id: StorageId,
    now: i64,
) -> EngineResult<TransitionResult> {
    let mut storage = state.storage(storage_id)?.clone();
    let arrived = complete_transit(&mut storage, now);
    let arrives_at = storage.arrives_at;
    if arrived {
        state.put_storage(storage);
    }
    Ok(TransitionResult {
        arrives_at,
        arrived,
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Create a unit, falling back to the configured default location.
pub fn create_unit(
    state: &mut EconomyState,
    config: &EconomyConfig,
    name: &str,
    speed: i64,
    location_id: Option<LocationId>,
) -> EngineResult<UnitId> {
    validate_name(name, config.max_name_length)?;
    if speed <= 0 {
        return Err(EngineError::InvalidInput(format!(
            "unit speed must be positive, got {}",
            speed
        )));
    }
    let location_id = location_id.or(config.default_location).ok_or_else(|| {
        EngineError::InvalidInput("no location given and no default location configured".to_string())
    })?;
    let mut location = state.location(location_id)?.clone();
    occupy(&mut location)?;

    let id = UnitId(state.allocate_id()?);
    state.put_location(location);
    state.put_unit(Unit {
        id,
        name: name.to_string(),
        location_id,
        speed,
        arrives_at: 0,
    });
    Ok(id)
}

pub fn move_unit_start(
    state: &mut EconomyState,
    unit_id: UnitId,
    from_location_id: LocationId,
    to_location_id: LocationId,
    now: i64,
) -> EngineResult<TransitionResult> {
    let mut unit = state.unit(unit_id)?.clone();
    let mut from = state.location(from_location_id)?.clone();
    let mut to = state.location(to_location_id)?.clone();

    let arrives_at = begin_transit(&mut unit, &mut from, &mut to, now)?;

    tracing::debug!(
        target: "economy::transit",
        unit = %unit.id,
        from = %from.id,
        to = %to.id,
        arrives_at,
        "unit.move_started"
    );

    state.put_unit(unit);
    state.put_location(from);
    state.put_location(to);

    Ok(TransitionResult {
        arrives_at,
        arrived: arrives_at == 0,
        ..Default::default()
    })
}

/// Clear a unit's in-transit marker once due. `arrived` in the result tells
/// the caller to notify the map subsystem.
pub fn move_unit_complete(
    state: &mut EconomyState,
    unit_id: UnitId,
    now: i64,
) -> EngineResult<TransitionResult> {
    let mut unit = state.unit(unit_id)?.clone();
    let arrived = complete_transit(&mut unit, now);
    let reason = if arrived {
        format!("arrived at {}", unit.location_id)
    } else {
        String::new()
    };
    let arrives_at = unit.arrives_at;
    if arrived {
        state.put_unit(unit);
    }
    Ok(TransitionResult {
        arrives_at,
        arrived,
        reason,
        ..Default::default()
    })
}
