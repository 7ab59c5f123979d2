//! Scenario tests driven through the engine, so every step also passes
//! sequencing and the invariant checker.

use economy_kernel::config::{EconomyConfig, InputShortfallPolicy};
use economy_kernel::domain::{
    FuelCostMode, LocationId, Mobility, ProcessorId, ProcessorKind, RecipeInput, ResourceId,
    StorageId, TransitionResult, UnitId,
};
use economy_kernel::engine::EconomyEngine;
use economy_kernel::error::{EngineError, EngineResult};
use economy_kernel::events::Operation;
use economy_kernel::geometry::Position;

struct World {
    engine: EconomyEngine,
}

impl World {
    fn new() -> Self {
        Self::with_config(EconomyConfig::default())
    }

    fn with_config(config: EconomyConfig) -> Self {
        Self {
            engine: EconomyEngine::new(config),
        }
    }

    fn run(&mut self, now: i64, operation: Operation) -> EngineResult<TransitionResult> {
        self.engine.execute(now, "tester", operation).map(|(_, r)| r)
    }

    fn create(&mut self, operation: Operation) -> u64 {
        self.run(0, operation).unwrap().created_id.unwrap()
    }

    fn resource(&mut self, name: &str, recipe: Vec<RecipeInput>) -> ResourceId {
        ResourceId(self.create(Operation::CreateResource {
            name: name.to_string(),
            recipe,
        }))
    }

    fn location(&mut self, name: &str, x: i64, y: i64, capacity: i64) -> LocationId {
        LocationId(self.create(Operation::CreateLocation {
            name: name.to_string(),
            position: Position::new(x, y),
            capacity,
            kind: "plains".to_string(),
        }))
    }

    fn storage(&mut self, resource_id: ResourceId, capacity: i64, location_id: LocationId) -> StorageId {
        StorageId(self.create(Operation::CreateStorage {
            resource_id,
            capacity,
            location_id,
            mobility: Mobility::Fixed,
            speed: 0,
        }))
    }

    fn cart(&mut self, resource_id: ResourceId, location_id: LocationId, speed: i64) -> StorageId {
        StorageId(self.create(Operation::CreateStorage {
            resource_id,
            capacity: 10,
            location_id,
            mobility: Mobility::Movable,
            speed,
        }))
    }

    fn producer(&mut self, output: ResourceId, location_id: LocationId, rate: i64, duration: i64) -> ProcessorId {
        ProcessorId(self.create(Operation::CreateProcessor {
            kind: ProcessorKind::Producer,
            location_id,
            output_resource_id: output,
            fuel_resource_id: None,
            output_rate: rate,
            cycle_duration: duration,
            fuel_cost_mode: FuelCostMode::None,
        }))
    }

    fn amount(&self, id: StorageId) -> i64 {
        self.engine.state().storage(id).unwrap().amount
    }

    fn awaiting(&self, id: ProcessorId) -> i64 {
        self.engine.state().processor(id).unwrap().awaiting_units
    }

    /// Fill a storage from a raw producer at the same location.
    fn fill(&mut self, storage: StorageId, amount: i64) {
        let s = self.engine.state().storage(storage).unwrap().clone();
        let well = self.producer(s.resource_id, s.location_id, amount, 1);
        let r = self
            .run(1, Operation::ProduceZeroInput {
                processor_id: well,
                output_storage_id: storage,
            })
            .unwrap();
        assert_eq!(r.delivered, amount);
    }
}

fn zero_input(processor_id: ProcessorId, output_storage_id: StorageId) -> Operation {
    Operation::ProduceZeroInput {
        processor_id,
        output_storage_id,
    }
}

#[test]
fn five_calls_one_unit_each_after_creation() {
    let mut w = World::new();
    let wheat = w.resource("wheat", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let silo = w.storage(wheat, 999, farm);
    let p = w.producer(wheat, farm, 1, 1);

    for now in 0..5 {
        w.run(now, zero_input(p, silo)).unwrap();
    }
    assert_eq!(w.amount(silo), 4);
    // The silo always has room, so accrual delivers every unit and none stay awaiting.
    assert_eq!(w.awaiting(p), 0);
}

#[test]
fn capacity_throttle_carries_over() {
    let mut w = World::new();
    let wheat = w.resource("wheat", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let silo = w.storage(wheat, 3, farm);
    let p = w.producer(wheat, farm, 5, 1);

    let r = w.run(1, zero_input(p, silo)).unwrap();
    assert_eq!(r.produced, 5);
    assert_eq!(r.delivered, 3);
    assert_eq!(w.amount(silo), 3);
    assert_eq!(w.awaiting(p), 2);
}

#[test]
fn carry_over_is_idempotent_within_a_cycle() {
    let mut w = World::new();
    let wheat = w.resource("wheat", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let silo = w.storage(wheat, 4, farm);
    let spare = w.storage(wheat, 100, farm);
    let p = w.producer(wheat, farm, 6, 10);

    let first = w.run(10, zero_input(p, silo)).unwrap();
    assert_eq!(first.delivered, 4);
    assert_eq!(first.awaiting_units, 2);

    w.run(11, Operation::MoveBetweenStorage {
        from_storage_id: silo,
        to_storage_id: spare,
        amount: 1,
    })
    .unwrap();

    // Same cycle: no new time, only the carry-over is offered.
    let second = w.run(15, zero_input(p, silo)).unwrap();
    assert_eq!(second.produced, 0);
    assert_eq!(second.delivered, 1);
    assert_eq!(w.awaiting(p), 1);
    assert_eq!(w.engine.state().processor(p).unwrap().claimed_at, 10);
}

#[test]
fn two_for_one_recipe_consumes_inputs() {
    let mut w = World::new();
    let a = w.resource("a", vec![]);
    let b = w.resource("b", vec![RecipeInput { resource_id: a, amount: 2 }]);
    let shop = w.location("shop", 0, 0, 3);
    let sa = w.storage(a, 10, shop);
    let sb = w.storage(b, 10, shop);
    w.fill(sa, 5);
    let p = w.producer(b, shop, 1, 1);

    let op = Operation::ProduceOneInput {
        processor_id: p,
        output_storage_id: sb,
        input_storage_id: sa,
    };
    let r = w.run(1, op.clone()).unwrap();
    assert_eq!(r.input_consumed, 2);
    assert_eq!((w.amount(sa), w.amount(sb)), (3, 1));

    w.run(2, op.clone()).unwrap();
    assert_eq!((w.amount(sa), w.amount(sb)), (1, 2));

    // Input can no longer back a unit: zero output, no error.
    let r = w.run(3, op).unwrap();
    assert_eq!(r.delivered, 0);
    assert_eq!(r.reason, "input shortfall");
    assert_eq!((w.amount(sa), w.amount(sb)), (1, 2));
    assert_eq!(w.awaiting(p), 1);
}

#[test]
fn strict_policy_rejects_exhausted_input() {
    let config = EconomyConfig::default().with_input_shortfall(InputShortfallPolicy::Strict);
    let mut w = World::with_config(config);
    let a = w.resource("a", vec![]);
    let b = w.resource("b", vec![RecipeInput { resource_id: a, amount: 2 }]);
    let shop = w.location("shop", 0, 0, 3);
    let sa = w.storage(a, 10, shop);
    let sb = w.storage(b, 10, shop);
    let p = w.producer(b, shop, 1, 1);
    let result = w.run(
        4,
        Operation::ProduceOneInput {
            processor_id: p,
            output_storage_id: sb,
            input_storage_id: sa,
        },
    );
    assert_eq!(result, Err(EngineError::InputStorageAmountTooLow));
}

#[test]
fn two_input_recipe_is_bounded_by_scarcer_input() {
    let mut w = World::new();
    let ore = w.resource("ore", vec![]);
    let coal = w.resource("coal", vec![]);
    let iron = w.resource(
        "iron",
        vec![
            RecipeInput { resource_id: ore, amount: 2 },
            RecipeInput { resource_id: coal, amount: 3 },
        ],
    );
    let forge = w.location("forge", 0, 0, 3);
    let s_ore = w.storage(ore, 50, forge);
    let s_coal = w.storage(coal, 50, forge);
    let s_iron = w.storage(iron, 50, forge);
    w.fill(s_ore, 20);
    w.fill(s_coal, 7);
    let p = w.producer(iron, forge, 10, 1);

    let r = w
        .run(
            1,
            Operation::ProduceTwoInputs {
                processor_id: p,
                output_storage_id: s_iron,
                input_storage_ids: [s_coal, s_ore],
            },
        )
        .unwrap();
    assert_eq!(r.delivered, 2);
    assert_eq!(r.input_consumed, 10);
    assert_eq!(w.amount(s_ore), 16);
    assert_eq!(w.amount(s_coal), 1);
    assert_eq!(w.awaiting(p), 8);
}

#[test]
fn production_across_locations_mutates_nothing() {
    let mut w = World::new();
    let wheat = w.resource("wheat", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let town = w.location("town", 5, 5, 3);
    let silo = w.storage(wheat, 10, town);
    let p = w.producer(wheat, farm, 1, 1);
    let before = w.engine.state().clone();
    let seq = w.engine.last_sequence();

    assert_eq!(w.run(5, zero_input(p, silo)), Err(EngineError::DifferentLocations));
    assert_eq!(w.engine.state(), &before);
    assert_eq!(w.engine.last_sequence(), seq);
}

#[test]
fn movable_storage_two_phase_move() {
    let mut w = World::new();
    let wheat = w.resource("wheat", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let town = w.location("town", 2, 0, 3);
    let cart = w.cart(wheat, farm, 2);

    let r = w
        .run(100, Operation::MoveStorage {
            storage_id: cart,
            from_location_id: farm,
            to_location_id: town,
        })
        .unwrap();
    assert_eq!(r.arrives_at, 101);
    let state = w.engine.state();
    assert_eq!(state.location(farm).unwrap().occupied_space, 0);
    assert_eq!(state.location(town).unwrap().occupied_space, 1);

    let again = w.run(100, Operation::MoveStorage {
        storage_id: cart,
        from_location_id: town,
        to_location_id: farm,
    });
    assert_eq!(again, Err(EngineError::NotAllowedWhileMoving));

    let r = w.run(101, Operation::UpdateStorageMoveStatus { storage_id: cart }).unwrap();
    assert!(r.arrived);
    assert_eq!(w.engine.state().storage(cart).unwrap().arrives_at, 0);
}

#[test]
fn fixed_storage_never_moves() {
    let mut w = World::new();
    let wheat = w.resource("wheat", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let town = w.location("town", 1, 0, 3);
    let silo = w.storage(wheat, 10, farm);
    let result = w.run(0, Operation::MoveStorage {
        storage_id: silo,
        from_location_id: farm,
        to_location_id: town,
    });
    assert_eq!(result, Err(EngineError::StorageTypeNotMovable));

    // Status update on a fixed storage is a harmless no-op.
    let r = w.run(0, Operation::UpdateStorageMoveStatus { storage_id: silo }).unwrap();
    assert!(!r.arrived);
}

#[test]
fn full_destination_blocks_move() {
    let mut w = World::new();
    let wheat = w.resource("wheat", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let hut = w.location("hut", 1, 0, 1);
    w.cart(wheat, hut, 1);
    let cart = w.cart(wheat, farm, 1);
    let result = w.run(0, Operation::MoveStorage {
        storage_id: cart,
        from_location_id: farm,
        to_location_id: hut,
    });
    assert_eq!(result, Err(EngineError::LocationFull));
}

#[test]
fn unit_moves_and_reports_arrival() {
    let mut w = World::new();
    let camp = w.location("camp", 0, 0, 2);
    let ridge = w.location("ridge", 3, 3, 2);
    let scout = UnitId(w.create(Operation::CreateUnit {
        name: "scout".to_string(),
        speed: 3,
        location_id: Some(camp),
    }));

    let r = w
        .run(10, Operation::MoveUnitStart {
            unit_id: scout,
            from_location_id: camp,
            to_location_id: ridge,
        })
        .unwrap();
    assert_eq!(r.arrives_at, 12);

    let early = w.run(11, Operation::MoveUnitComplete { unit_id: scout }).unwrap();
    assert!(!early.arrived);
    let done = w.run(12, Operation::MoveUnitComplete { unit_id: scout }).unwrap();
    assert!(done.arrived);
    assert_eq!(done.reason, format!("arrived at {}", ridge));
}

#[test]
fn unit_falls_back_to_configured_default_location() {
    let mut w = World::new();
    let camp = w.location("camp", 0, 0, 2);
    let config = w.engine.config().clone().with_default_location(camp);
    let mut engine = EconomyEngine::with_state(config, w.engine.state().clone(), w.engine.last_sequence()).unwrap();
    let (_, r) = engine
        .execute(0, "tester", Operation::CreateUnit {
            name: "scout".to_string(),
            speed: 1,
            location_id: None,
        })
        .unwrap();
    let unit = engine.state().unit(UnitId(r.created_id.unwrap())).unwrap();
    assert_eq!(unit.location_id, camp);
    assert_eq!(engine.state().location(camp).unwrap().occupied_space, 1);
}

#[test]
fn send_delivers_to_remote_storage_with_fuel() {
    let mut w = World::new();
    let grain = w.resource("grain", vec![]);
    let coal = w.resource("coal", vec![]);
    let farm = w.location("farm", 0, 0, 3);
    let city = w.location("city", 2, 2, 3);
    let local = w.storage(grain, 50, farm);
    let remote = w.storage(grain, 50, city);
    let fuel = w.storage(coal, 50, farm);
    w.fill(local, 20);
    w.fill(fuel, 6);
    let sender = ProcessorId(w.create(Operation::CreateProcessor {
        kind: ProcessorKind::Sender,
        location_id: farm,
        output_resource_id: grain,
        fuel_resource_id: Some(coal),
        output_rate: 4,
        cycle_duration: 1,
        fuel_cost_mode: FuelCostMode::PerDistanceUnit,
    }));

    let send = Operation::Send {
        sender_id: sender,
        from_storage_id: local,
        to_storage_id: remote,
        fuel_storage_id: Some(fuel),
        from_location_id: farm,
        to_location_id: city,
    };
    let r = w.run(2, send.clone()).unwrap();
    assert_eq!(r.delivered, 8);
    assert_eq!(r.fuel_spent, 4);
    assert_eq!((w.amount(local), w.amount(remote), w.amount(fuel)), (12, 8, 2));

    // Not enough fuel for the flat charge: everything waits.
    let r = w.run(3, send).unwrap();
    assert_eq!(r.delivered, 0);
    assert_eq!(w.awaiting(sender), 4);
    assert_eq!(w.amount(fuel), 2);
}
