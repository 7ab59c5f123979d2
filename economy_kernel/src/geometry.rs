/// Economy Kernel v1: Geometry
///
/// Integer planar positions and the Manhattan metric used for both
/// travel time and distance-based fuel cost.

use serde::{Deserialize, Serialize};

use crate::arithmetic::checked_add;
use crate::error::{EngineError, EngineResult};

/// A location's coordinates on the planar map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Manhattan distance `|dx| + |dy|`.
pub fn distance(a: Position, b: Position) -> EngineResult<i64> {
    let dx = axis_delta(a.x, b.x)?;
    let dy = axis_delta(a.y, b.y)?;
    checked_add(dx, dy)
}

fn axis_delta(a: i64, b: i64) -> EngineResult<i64> {
    a.checked_sub(b)
        .and_then(i64::checked_abs)
        .ok_or_else(|| EngineError::Overflow(format!("|{} - {}| overflows i64", a, b)))
}

/// Time needed to cover `distance` at `speed` (integer floor).
pub fn travel_time(distance: i64, speed: i64) -> EngineResult<i64> {
    if speed <= 0 {
        return Err(EngineError::InvalidInput(format!(
            "speed must be positive, got {}",
            speed
        )));
    }
    Ok(distance / speed)
}
