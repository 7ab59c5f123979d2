/// Economy Kernel v1: Arithmetic Primitives
///
/// All quantities and timestamps are i64. No float.
/// Overflow is reported as an error, never wrapped.

use crate::error::{EngineError, EngineResult};

/// Checked integer addition.
pub fn checked_add(a: i64, b: i64) -> EngineResult<i64> {
    a.checked_add(b)
        .ok_or_else(|| EngineError::Overflow(format!("{} + {} overflows i64", a, b)))
}

/// Checked integer subtraction.
pub fn checked_sub(a: i64, b: i64) -> EngineResult<i64> {
    a.checked_sub(b)
        .ok_or_else(|| EngineError::Overflow(format!("{} - {} overflows i64", a, b)))
}

/// Checked integer multiplication.
pub fn checked_mul(a: i64, b: i64) -> EngineResult<i64> {
    a.checked_mul(b)
        .ok_or_else(|| EngineError::Overflow(format!("{} * {} overflows i64", a, b)))
}

/// Whole units of `per_unit` that fit into `amount`. Zero when `per_unit <= 0`.
pub fn whole_units(amount: i64, per_unit: i64) -> i64 {
    if per_unit <= 0 || amount <= 0 {
        return 0;
    }
    amount / per_unit
}

/// Validate a display name against the configured maximum length (in chars).
pub fn validate_name(name: &str, max: usize) -> EngineResult<()> {
    if name.chars().count() > max {
        return Err(EngineError::NameTooLong { max });
    }
    Ok(())
}
