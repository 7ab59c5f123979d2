/// Economy Kernel v1: State Construction and Record Access
///
/// The state image is the kernel's view of the record store:
/// `allocate_id` creates, the typed getters load, `put_*` commits.
/// Transitions load copies, mutate them, and put them back only once
/// every precondition has passed.

use crate::domain::{
    EconomyState, Location, LocationId, Processor, ProcessorId, Resource, ResourceId, Storage,
    StorageId, Unit, UnitId,
};
use crate::error::{EngineError, EngineResult};
use crate::geometry::Position;

/// Create a fresh, empty state image.
pub fn create_initial_state() -> EconomyState {
    EconomyState::default()
}

fn not_found(kind: &'static str, id: u64) -> EngineError {
    EngineError::RecordNotFound { kind, id }
}

impl EconomyState {
    /// Hand out the next unique record identifier.
    pub fn allocate_id(&mut self) -> EngineResult<u64> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| EngineError::Overflow("record id space exhausted".to_string()))?;
        Ok(id)
    }

    pub fn resource(&self, id: ResourceId) -> EngineResult<&Resource> {
        self.resources
            .get(&id)
            .ok_or_else(|| not_found(ResourceId::KIND, id.raw()))
    }

    pub fn processor(&self, id: ProcessorId) -> EngineResult<&Processor> {
        self.processors
            .get(&id)
            .ok_or_else(|| not_found(ProcessorId::KIND, id.raw()))
    }

    pub fn storage(&self, id: StorageId) -> EngineResult<&Storage> {
        self.storages
            .get(&id)
            .ok_or_else(|| not_found(StorageId::KIND, id.raw()))
    }

    pub fn location(&self, id: LocationId) -> EngineResult<&Location> {
        self.locations
            .get(&id)
            .ok_or_else(|| not_found(LocationId::KIND, id.raw()))
    }

    pub fn unit(&self, id: UnitId) -> EngineResult<&Unit> {
        self.units
            .get(&id)
            .ok_or_else(|| not_found(UnitId::KIND, id.raw()))
    }

    pub fn put_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.id, resource);
    }

    pub fn put_processor(&mut self, processor: Processor) {
        self.processors.insert(processor.id, processor);
    }

    pub fn put_storage(&mut self, storage: Storage) {
        self.storages.insert(storage.id, storage);
    }

    pub fn put_location(&mut self, location: Location) {
        self.locations.insert(location.id, location);
    }

    pub fn put_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Location registered at `position`, if any. Positions are unique.
    pub fn location_at(&self, position: Position) -> Option<&Location> {
        self.locations.values().find(|l| l.position == position)
    }

    /// Number of movable storages and units anchored at `location_id`.
    pub fn count_occupants(&self, location_id: LocationId) -> i64 {
        let storages = self
            .storages
            .values()
            .filter(|s| s.is_movable() && s.location_id == location_id)
            .count();
        let units = self
            .units
            .values()
            .filter(|u| u.location_id == location_id)
            .count();
        (storages + units) as i64
    }

    /// Sum of stored amounts of one resource across all storages.
    pub fn total_stock(&self, resource_id: ResourceId) -> i64 {
        self.storages
            .values()
            .filter(|s| s.resource_id == resource_id)
            .map(|s| s.amount)
            .sum()
    }
}
