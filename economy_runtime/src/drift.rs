//! Drift detection: determinism verification and conservation audit.
//!
//! All numeric values are i64. No float arithmetic anywhere.

use std::collections::{BTreeMap, BTreeSet};

use economy_kernel::config::EconomyConfig;
use economy_kernel::domain::{EconomyState, LocationId, ResourceId};
use economy_kernel::events::OperationEnvelope;

use crate::error::{RuntimeError, RuntimeResult};
use crate::replay;

/// Replay the same operations twice and require identical hashes.
/// Returns the agreed hash.
pub fn verify_determinism(
    config: &EconomyConfig,
    envelopes: &[OperationEnvelope],
) -> RuntimeResult<String> {
    let first = replay::rebuild_hash(config, envelopes)?;
    let second = replay::rebuild_hash(config, envelopes)?;
    if first != second {
        tracing::error!(
            target: "economy::drift",
            run1 = %first,
            run2 = %second,
            "determinism.failed"
        );
        return Err(RuntimeError::DeterminismFailure { first, second });
    }
    Ok(first)
}

/// Before/after pair with its delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delta {
    pub before: i64,
    pub after: i64,
    pub delta: i64,
}

impl Delta {
    fn new(before: i64, after: i64) -> Self {
        Self {
            before,
            after,
            delta: after - before,
        }
    }
}

/// Record ids present in only one of the two states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordChanges {
    pub added: Vec<u64>,
    pub removed: Vec<u64>,
}

fn record_changes<K: Ord + Copy, V>(
    a: &BTreeMap<K, V>,
    b: &BTreeMap<K, V>,
    raw: impl Fn(K) -> u64,
) -> RecordChanges {
    let ids_a: BTreeSet<K> = a.keys().copied().collect();
    let ids_b: BTreeSet<K> = b.keys().copied().collect();
    RecordChanges {
        added: ids_b.difference(&ids_a).map(|&k| raw(k)).collect(),
        removed: ids_a.difference(&ids_b).map(|&k| raw(k)).collect(),
    }
}

/// Stock held in storages plus units still awaiting delivery, per resource.
fn stock_by_resource(state: &EconomyState) -> BTreeMap<ResourceId, (i64, i64)> {
    let mut totals: BTreeMap<ResourceId, (i64, i64)> = BTreeMap::new();
    for s in state.storages.values() {
        totals.entry(s.resource_id).or_default().0 += s.amount;
    }
    for p in state.processors.values() {
        totals.entry(p.output_resource_id).or_default().1 += p.awaiting_units;
    }
    totals
}

/// Structured state comparison.
pub fn compare_states(state_a: &EconomyState, state_b: &EconomyState) -> DriftReport {
    let stock_a = stock_by_resource(state_a);
    let stock_b = stock_by_resource(state_b);
    let resource_ids: BTreeSet<ResourceId> = stock_a.keys().chain(stock_b.keys()).copied().collect();

    let mut stock = BTreeMap::new();
    let mut awaiting = BTreeMap::new();
    for id in resource_ids {
        let (held_a, wait_a) = stock_a.get(&id).copied().unwrap_or_default();
        let (held_b, wait_b) = stock_b.get(&id).copied().unwrap_or_default();
        if held_a != held_b {
            stock.insert(id, Delta::new(held_a, held_b));
        }
        if wait_a != wait_b {
            awaiting.insert(id, Delta::new(wait_a, wait_b));
        }
    }

    let mut occupancy = BTreeMap::new();
    for (id, loc_b) in &state_b.locations {
        let before = state_a.locations.get(id).map_or(0, |l| l.occupied_space);
        if before != loc_b.occupied_space {
            occupancy.insert(*id, Delta::new(before, loc_b.occupied_space));
        }
    }

    let in_transit = |s: &EconomyState| {
        (s.storages.values().filter(|x| x.arrives_at > 0).count()
            + s.units.values().filter(|u| u.arrives_at > 0).count()) as i64
    };

    DriftReport {
        stock,
        awaiting,
        occupancy,
        in_transit: Delta::new(in_transit(state_a), in_transit(state_b)),
        resources: record_changes(&state_a.resources, &state_b.resources, |k| k.raw()),
        processors: record_changes(&state_a.processors, &state_b.processors, |k| k.raw()),
        storages: record_changes(&state_a.storages, &state_b.storages, |k| k.raw()),
        locations: record_changes(&state_a.locations, &state_b.locations, |k| k.raw()),
        units: record_changes(&state_a.units, &state_b.units, |k| k.raw()),
    }
}

/// Structured drift report. Maps list only entries that changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    /// Stored amount per resource.
    pub stock: BTreeMap<ResourceId, Delta>,
    /// Awaiting units per output resource.
    pub awaiting: BTreeMap<ResourceId, Delta>,
    pub occupancy: BTreeMap<LocationId, Delta>,
    pub in_transit: Delta,
    pub resources: RecordChanges,
    pub processors: RecordChanges,
    pub storages: RecordChanges,
    pub locations: RecordChanges,
    pub units: RecordChanges,
}

impl DriftReport {
    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
            && self.awaiting.is_empty()
            && self.occupancy.is_empty()
            && self.in_transit.delta == 0
            && [&self.resources, &self.processors, &self.storages, &self.locations, &self.units]
                .iter()
                .all(|c| c.added.is_empty() && c.removed.is_empty())
    }

    /// Net change of one resource across storages and awaiting units.
    /// A pure transfer or relocation nets to zero.
    pub fn net_change(&self, resource: ResourceId) -> i64 {
        self.stock.get(&resource).map_or(0, |d| d.delta)
            + self.awaiting.get(&resource).map_or(0, |d| d.delta)
    }
}
