/// Economy Kernel v1: Invariant Checks
///
/// Hard-fail validation over a whole state image. Runs after every
/// transition and on snapshot restore. Returns the first failure.

use std::collections::BTreeSet;

use crate::domain::{EconomyState, FuelCostMode, Mobility};
use crate::error::{EngineError, EngineResult};
use crate::geometry::Position;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn validate_invariants(state: &EconomyState) -> EngineResult<()> {
    check_record_keys(state)?;
    check_id_counter(state)?;
    check_recipes(state)?;
    check_storages(state)?;
    check_processors(state)?;
    check_units(state)?;
    check_location_positions(state)?;
    check_occupancy(state)?;
    Ok(())
}

fn violation(name: &str, detail: String) -> EngineError {
    EngineError::InvariantViolation(format!("[INVARIANT:{}] {}", name, detail))
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

/// Map key equals the record's own id.
fn check_record_keys(state: &EconomyState) -> EngineResult<()> {
    let mismatched = state.resources.iter().any(|(k, r)| *k != r.id)
        || state.processors.iter().any(|(k, p)| *k != p.id)
        || state.storages.iter().any(|(k, s)| *k != s.id)
        || state.locations.iter().any(|(k, l)| *k != l.id)
        || state.units.iter().any(|(k, u)| *k != u.id);
    if mismatched {
        return Err(violation("record_keys", "record stored under a foreign key".to_string()));
    }
    Ok(())
}

/// Every issued id is below the counter, and no id is shared across kinds.
fn check_id_counter(state: &EconomyState) -> EngineResult<()> {
    let ids = state
        .resources
        .keys()
        .map(|id| id.raw())
        .chain(state.processors.keys().map(|id| id.raw()))
        .chain(state.storages.keys().map(|id| id.raw()))
        .chain(state.locations.keys().map(|id| id.raw()))
        .chain(state.units.keys().map(|id| id.raw()));
    let mut seen = BTreeSet::new();
    for id in ids {
        if id == 0 || id >= state.next_id {
            return Err(violation(
                "id_counter",
                format!("id {} outside issued range 1..{}", id, state.next_id),
            ));
        }
        if !seen.insert(id) {
            return Err(violation("id_counter", format!("id {} issued twice", id)));
        }
    }
    Ok(())
}

fn check_recipes(state: &EconomyState) -> EngineResult<()> {
    for resource in state.resources.values() {
        if resource.recipe.len() > 2 {
            return Err(violation(
                "recipe_arity",
                format!("{} has {} inputs", resource.id, resource.recipe.len()),
            ));
        }
        for line in &resource.recipe {
            if line.amount <= 0 {
                return Err(violation(
                    "recipe_amount",
                    format!("{} needs {} of {}", resource.id, line.amount, line.resource_id),
                ));
            }
            if !state.resources.contains_key(&line.resource_id) || line.resource_id == resource.id {
                return Err(violation(
                    "recipe_refs",
                    format!("{} references {}", resource.id, line.resource_id),
                ));
            }
        }
    }
    Ok(())
}

/// `0 <= amount <= capacity`, valid references, consistent mobility.
fn check_storages(state: &EconomyState) -> EngineResult<()> {
    for s in state.storages.values() {
        if s.amount < 0 || s.amount > s.capacity {
            return Err(violation(
                "storage_bounds",
                format!("{} holds {} of capacity {}", s.id, s.amount, s.capacity),
            ));
        }
        if !state.resources.contains_key(&s.resource_id)
            || !state.locations.contains_key(&s.location_id)
        {
            return Err(violation("storage_refs", format!("{} has a dangling reference", s.id)));
        }
        if s.arrives_at < 0 {
            return Err(violation("storage_transit", format!("{} arrives at {}", s.id, s.arrives_at)));
        }
        let consistent = match s.mobility {
            Mobility::Movable => s.speed > 0,
            Mobility::Fixed => s.speed >= 0 && s.arrives_at == 0,
        };
        if !consistent {
            return Err(violation(
                "storage_mobility",
                format!("{} is {:?} with speed {}", s.id, s.mobility, s.speed),
            ));
        }
    }
    Ok(())
}

fn check_processors(state: &EconomyState) -> EngineResult<()> {
    for p in state.processors.values() {
        if p.output_rate <= 0 || p.cycle_duration <= 0 {
            return Err(violation(
                "processor_rate",
                format!("{} rate {} per {}", p.id, p.output_rate, p.cycle_duration),
            ));
        }
        if p.awaiting_units < 0 {
            return Err(violation(
                "processor_awaiting",
                format!("{} awaits {}", p.id, p.awaiting_units),
            ));
        }
        let fuel_ok = match p.fuel_resource_id {
            Some(fuel) => state.resources.contains_key(&fuel),
            None => p.fuel_cost_mode == FuelCostMode::None,
        };
        if !fuel_ok
            || !state.resources.contains_key(&p.output_resource_id)
            || !state.locations.contains_key(&p.location_id)
        {
            return Err(violation("processor_refs", format!("{} has a dangling reference", p.id)));
        }
    }
    Ok(())
}

fn check_units(state: &EconomyState) -> EngineResult<()> {
    for u in state.units.values() {
        if u.speed <= 0 || u.arrives_at < 0 {
            return Err(violation(
                "unit_motion",
                format!("{} speed {} arrives at {}", u.id, u.speed, u.arrives_at),
            ));
        }
        if !state.locations.contains_key(&u.location_id) {
            return Err(violation("unit_refs", format!("{} has a dangling reference", u.id)));
        }
    }
    Ok(())
}

fn check_location_positions(state: &EconomyState) -> EngineResult<()> {
    let mut seen: BTreeSet<Position> = BTreeSet::new();
    for l in state.locations.values() {
        if !seen.insert(l.position) {
            return Err(violation(
                "location_positions",
                format!("{} shares position ({}, {})", l.id, l.position.x, l.position.y),
            ));
        }
    }
    Ok(())
}

/// `0 <= occupied_space <= capacity`, and the count matches the occupants.
fn check_occupancy(state: &EconomyState) -> EngineResult<()> {
    for l in state.locations.values() {
        if l.occupied_space < 0 || l.occupied_space > l.capacity {
            return Err(violation(
                "location_bounds",
                format!("{} occupies {} of {}", l.id, l.occupied_space, l.capacity),
            ));
        }
        let counted = state.count_occupants(l.id);
        if counted != l.occupied_space {
            return Err(violation(
                "location_occupancy",
                format!("{} records {} occupants, found {}", l.id, l.occupied_space, counted),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::create_resource;
    use crate::config::EconomyConfig;
    use crate::ledger::create_storage;
    use crate::registry::create_location;
    use crate::state::create_initial_state;

    fn populated() -> (EconomyState, crate::domain::StorageId, crate::domain::LocationId) {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let ore = create_resource(&mut state, &config, "ore", &[]).unwrap();
        let loc = create_location(&mut state, &config, "pit", Position::new(0, 0), 2, "rock")
            .unwrap();
        let s = create_storage(&mut state, ore, 5, loc, Mobility::Movable, 1).unwrap();
        (state, s, loc)
    }

    #[test]
    fn valid_state_passes() {
        let (state, _, _) = populated();
        assert_eq!(validate_invariants(&state), Ok(()));
        assert_eq!(validate_invariants(&create_initial_state()), Ok(()));
    }

    #[test]
    fn overfull_storage_fails() {
        let (mut state, s, _) = populated();
        state.storages.get_mut(&s).unwrap().amount = 6;
        let err = validate_invariants(&state).unwrap_err();
        assert!(err.to_string().contains("[INVARIANT:storage_bounds]"));
    }

    #[test]
    fn occupancy_drift_fails() {
        let (mut state, _, loc) = populated();
        state.locations.get_mut(&loc).unwrap().occupied_space = 0;
        let err = validate_invariants(&state).unwrap_err();
        assert!(err.to_string().contains("[INVARIANT:location_occupancy]"));
    }

    #[test]
    fn stale_id_counter_fails() {
        let (mut state, _, _) = populated();
        state.next_id = 2;
        let err = validate_invariants(&state).unwrap_err();
        assert!(err.to_string().contains("[INVARIANT:id_counter]"));
    }
}
