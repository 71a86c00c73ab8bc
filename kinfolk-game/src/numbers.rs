//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Truncate a f64 toward zero, clamped to the i32 range. Non-finite values become 0.
#[must_use]
pub fn trunc_f64_to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    cast::<f64, i32>(value.clamp(min, max).trunc()).unwrap_or(0)
}

/// Truncate a non-negative f64 into a u32 headcount, saturating at the bounds.
#[must_use]
pub fn trunc_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(value.min(max).trunc()).unwrap_or(0)
}
