/// Economy Kernel v1: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
/// Produces byte-identical output across platforms.
///
/// Rules:
///   - Every record list sorted by id
///   - Recipe lines in declaration order (order is part of the resource)
///   - Record fields in fixed order
///   - UTF-8 JSON, no whitespace, no float, no platform newline

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{EconomyState, FuelCostMode, Location, Mobility, Processor, ProcessorKind, Resource, Storage, Unit};
use crate::KERNEL_VERSION;

/// Canonical serialization of EconomyState to UTF-8 JSON bytes.
/// Includes kernel_version as the first field for identity binding.
pub fn canonical_serialize(state: &EconomyState) -> Result<Vec<u8>, serde_json::Error> {
    let obj = build_canonical_value(state);
    Ok(serde_json::to_string(&obj)?.into_bytes())
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &EconomyState) -> Result<String, serde_json::Error> {
    let bytes = canonical_serialize(state)?;
    Ok(hex_digest(&bytes))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

fn int(v: i64) -> Value {
    Value::Number(v.into())
}

fn id(v: u64) -> Value {
    Value::Number(v.into())
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

fn resource_value(r: &Resource) -> Value {
    let recipe: Vec<Value> = r
        .recipe
        .iter()
        .map(|line| {
            let mut m = Map::new();
            m.insert("resource_id".to_string(), id(line.resource_id.raw()));
            m.insert("amount".to_string(), int(line.amount));
            Value::Object(m)
        })
        .collect();
    let mut m = Map::new();
    m.insert("id".to_string(), id(r.id.raw()));
    m.insert("name".to_string(), text(&r.name));
    m.insert("recipe".to_string(), Value::Array(recipe));
    Value::Object(m)
}

fn processor_value(p: &Processor) -> Value {
    let kind = match p.kind {
        ProcessorKind::Producer => "producer",
        ProcessorKind::Sender => "sender",
    };
    let mode = match p.fuel_cost_mode {
        FuelCostMode::None => "none",
        FuelCostMode::PerOutputUnit => "per_output_unit",
        FuelCostMode::PerDistanceUnit => "per_distance_unit",
    };
    let mut m = Map::new();
    m.insert("id".to_string(), id(p.id.raw()));
    m.insert("location_id".to_string(), id(p.location_id.raw()));
    m.insert("kind".to_string(), text(kind));
    m.insert("output_resource_id".to_string(), id(p.output_resource_id.raw()));
    m.insert(
        "fuel_resource_id".to_string(),
        p.fuel_resource_id.map_or(Value::Null, |f| id(f.raw())),
    );
    m.insert("output_rate".to_string(), int(p.output_rate));
    m.insert("cycle_duration".to_string(), int(p.cycle_duration));
    m.insert("fuel_cost_mode".to_string(), text(mode));
    m.insert("claimed_at".to_string(), int(p.claimed_at));
    m.insert("awaiting_units".to_string(), int(p.awaiting_units));
    Value::Object(m)
}

fn storage_value(s: &Storage) -> Value {
    let mobility = match s.mobility {
        Mobility::Fixed => "fixed",
        Mobility::Movable => "movable",
    };
    let mut m = Map::new();
    m.insert("id".to_string(), id(s.id.raw()));
    m.insert("resource_id".to_string(), id(s.resource_id.raw()));
    m.insert("amount".to_string(), int(s.amount));
    m.insert("capacity".to_string(), int(s.capacity));
    m.insert("location_id".to_string(), id(s.location_id.raw()));
    m.insert("mobility".to_string(), text(mobility));
    m.insert("speed".to_string(), int(s.speed));
    m.insert("arrives_at".to_string(), int(s.arrives_at));
    Value::Object(m)
}

fn location_value(l: &Location) -> Value {
    let mut m = Map::new();
    m.insert("id".to_string(), id(l.id.raw()));
    m.insert("name".to_string(), text(&l.name));
    m.insert("x".to_string(), int(l.position.x));
    m.insert("y".to_string(), int(l.position.y));
    m.insert("capacity".to_string(), int(l.capacity));
    m.insert("occupied_space".to_string(), int(l.occupied_space));
    m.insert("kind".to_string(), text(&l.kind));
    Value::Object(m)
}

fn unit_value(u: &Unit) -> Value {
    let mut m = Map::new();
    m.insert("id".to_string(), id(u.id.raw()));
    m.insert("name".to_string(), text(&u.name));
    m.insert("location_id".to_string(), id(u.location_id.raw()));
    m.insert("speed".to_string(), int(u.speed));
    m.insert("arrives_at".to_string(), int(u.arrives_at));
    Value::Object(m)
}

/// Build the canonical serde_json::Value in strict field order.
///
/// Field order: kernel_version, next_id, resources, locations,
///              processors, storages, units
fn build_canonical_value(state: &EconomyState) -> Value {
    // BTreeMap iteration is already sorted by id
    let resources = state.resources.values().map(resource_value).collect();
    let locations = state.locations.values().map(location_value).collect();
    let processors = state.processors.values().map(processor_value).collect();
    let storages = state.storages.values().map(storage_value).collect();
    let units = state.units.values().map(unit_value).collect();

    // kernel_version MUST be first; it is part of the kernel identity.
    let mut root = Map::new();
    root.insert("kernel_version".to_string(), int(KERNEL_VERSION as i64));
    root.insert("next_id".to_string(), id(state.next_id));
    root.insert("resources".to_string(), Value::Array(resources));
    root.insert("locations".to_string(), Value::Array(locations));
    root.insert("processors".to_string(), Value::Array(processors));
    root.insert("storages".to_string(), Value::Array(storages));
    root.insert("units".to_string(), Value::Array(units));
    Value::Object(root)
}
