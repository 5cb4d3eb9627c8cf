//! Utilities related to numbers.

use ieee754;
use num;
use std::fmt;

/// Floating point type used for query coordinates.
#[allow(non_camel_case_types)]
pub type fco = f64;

/// Floating point type used for interpolated quantities.
#[allow(non_camel_case_types)]
pub type fip = f64;

/// Floating point marker trait for easier control over trait bounds.
pub trait MFloat:
    Sync
    + Send
    + num::Float
    + num::cast::FromPrimitive
    + ieee754::Ieee754
    + Into<fco>
    + fmt::Debug
{
}

impl MFloat for f32 {}
impl MFloat for f64 {}

/// Number of decimal places a coordinate is rounded to before any
/// floor/ceil decision, suppressing floating point noise at grid
/// cell boundaries.
pub const COORD_DECIMALS: u32 = 12;

const COORD_SCALE: fco = 1e12;

/// Rounds the given coordinate to `COORD_DECIMALS` decimal places.
pub fn round_coord(coord: fco) -> fco {
    (coord * COORD_SCALE).round() / COORD_SCALE
}

/// Converts a coordinate float into the field value type.
pub fn from_fco<F: MFloat>(value: fco) -> F {
    F::from_f64(value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_rounding_suppresses_boundary_noise() {
        assert_eq!(round_coord(2.999_999_999_999_9), 3.0);
        assert_eq!(round_coord(-1.000_000_000_000_1), -1.0);
        assert_eq!(round_coord(1.25), 1.25);
    }
}
