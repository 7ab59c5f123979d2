/// Economy Kernel v1: Location Registry
///
/// Capacity-bounded occupancy records, unique per position.
/// `occupied_space` counts the movable storages and units anchored here.

use crate::arithmetic::{checked_add, checked_sub, validate_name};
use crate::config::EconomyConfig;
use crate::domain::{EconomyState, Location, LocationId};
use crate::error::{EngineError, EngineResult};
use crate::geometry::Position;

pub fn create_location(
    state: &mut EconomyState,
    config: &EconomyConfig,
    name: &str,
    position: Position,
    capacity: i64,
    kind: &str,
) -> EngineResult<LocationId> {
    validate_name(name, config.max_name_length)?;
    validate_name(kind, config.max_name_length)?;
    if capacity < 0 {
        return Err(EngineError::InvalidInput(format!(
            "location capacity must be >= 0, got {}",
            capacity
        )));
    }
    if state.location_at(position).is_some() {
        return Err(EngineError::LocationAlreadyExists {
            x: position.x,
            y: position.y,
        });
    }

    let id = LocationId(state.allocate_id()?);
    state.put_location(Location {
        id,
        name: name.to_string(),
        position,
        capacity,
        occupied_space: 0,
        kind: kind.to_string(),
    });
    Ok(id)
}

/// Take one slot at `location`.
pub fn occupy(location: &mut Location) -> EngineResult<()> {
    if location.is_full() {
        return Err(EngineError::LocationFull);
    }
    location.occupied_space = checked_add(location.occupied_space, 1)?;
    Ok(())
}

/// Release one slot at `location`.
pub fn vacate(location: &mut Location) -> EngineResult<()> {
    if location.occupied_space <= 0 {
        return Err(EngineError::InvariantViolation(format!(
            "{} has no occupant to release",
            location.id
        )));
    }
    location.occupied_space = checked_sub(location.occupied_space, 1)?;
    Ok(())
}

/// Co-location test. An entity in transit has no location and matches nothing.
pub fn same_location(a: Option<LocationId>, b: Option<LocationId>) -> bool {
    match (a, b) {
        (Some(l1), Some(l2)) => l1 == l2,
        _ => false,
    }
}

pub fn require_same_location(a: Option<LocationId>, b: Option<LocationId>) -> EngineResult<()> {
    if same_location(a, b) {
        Ok(())
    } else {
        Err(EngineError::DifferentLocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_initial_state;

    #[test]
    fn positions_are_unique() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        create_location(&mut state, &config, "home", Position::new(1, 2), 5, "plains").unwrap();
        assert_eq!(
            create_location(&mut state, &config, "copy", Position::new(1, 2), 5, "plains"),
            Err(EngineError::LocationAlreadyExists { x: 1, y: 2 })
        );
    }

    #[test]
    fn occupy_respects_capacity() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let id =
            create_location(&mut state, &config, "tiny", Position::new(0, 0), 1, "rock").unwrap();
        let mut location = state.location(id).unwrap().clone();
        occupy(&mut location).unwrap();
        assert_eq!(occupy(&mut location), Err(EngineError::LocationFull));
        vacate(&mut location).unwrap();
        assert_eq!(location.occupied_space, 0);
        assert!(matches!(vacate(&mut location), Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn in_transit_matches_nothing() {
        assert!(same_location(Some(LocationId(1)), Some(LocationId(1))));
        assert!(!same_location(Some(LocationId(1)), Some(LocationId(2))));
        assert!(!same_location(None, Some(LocationId(1))));
        assert!(!same_location(None, None));
    }
}
