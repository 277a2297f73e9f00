//! Movement check between consecutive position samples.

use crate::coord::Coordinate;

/// Returns true when the pointer moved more than `tolerance` units along
/// either axis between `previous` and `current`.
///
/// A delta of exactly `tolerance` is still treated as jitter.
pub fn exceeds_tolerance(previous: Coordinate, current: Coordinate, tolerance: u32) -> bool {
    let dx = (i64::from(current.x) - i64::from(previous.x)).abs();
    let dy = (i64::from(current.y) - i64::from(previous.y)).abs();
    let tolerance = i64::from(tolerance);

    dx > tolerance || dy > tolerance
}
