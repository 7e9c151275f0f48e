//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`. Use [`wrap_2pi`] when the upper bound must be
/// exclusive.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle into the half-open range [0, 2pi).
///
/// Non-finite values are returned unchanged so that callers can still detect
/// them.
pub fn wrap_2pi<T>(angle: T) -> T
where
    T: Float,
{
    if !angle.is_finite() {
        return angle;
    }

    let tau = tau::<T>();
    let wrapped = rem_euclid(angle, tau);

    // rem_euclid can round up onto tau itself for tiny negative inputs
    if wrapped >= tau {
        T::zero()
    } else {
        wrapped
    }
}

/// Counter-clockwise angular distance travelled going from `from` to `to`.
///
/// The result is in [0, 2pi), so a full extra revolution cannot be detected
/// from a single pair of angles.
pub fn ccw_dist<T>(from: T, to: T) -> T
where
    T: Float,
{
    wrap_2pi(to - from)
}

/// Round a value to the nearest multiple of `step`.
pub fn round_to_multiple<T>(value: T, step: T) -> T
where
    T: Float,
{
    (value / step).round() * step
}

fn tau<T: Float>() -> T {
    T::from(std::f64::consts::TAU).unwrap_or_else(T::nan)
}

#[cfg(test)]
mod test {
    use super::*;

    const TAU: f64 = std::f64::consts::TAU;
    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1f64), (60f64, 110f64), 0.5), 85.0);
        assert_eq!(lin_map((0f64, 2f64), (0f64, 1f64), 4.0), 2.0);
    }

    #[test]
    fn test_wrap_2pi() {
        assert_eq!(wrap_2pi(0f64), 0.0);
        assert_eq!(wrap_2pi(TAU), 0.0);
        assert!((wrap_2pi(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-12);
        assert!((wrap_2pi(5.0 * PI) - PI).abs() < 1e-12);
        assert!(wrap_2pi(-1e-18f64) < TAU);
        assert!(wrap_2pi(f64::NAN).is_nan());
    }

    #[test]
    fn test_ccw_dist() {
        assert!((ccw_dist(PI / 2.0, PI) - PI / 2.0).abs() < 1e-12);
        assert!((ccw_dist(3.0 * PI / 2.0, 0.1) - (PI / 2.0 + 0.1)).abs() < 1e-12);
        assert_eq!(ccw_dist(1f64, 1f64), 0.0);
    }

    #[test]
    fn test_round_to_multiple() {
        assert_eq!(round_to_multiple(44.0f64, 30.0), 30.0);
        assert_eq!(round_to_multiple(-16.0f64, 30.0), -30.0);
        assert_eq!(round_to_multiple(14.9f64, 30.0), 0.0);
    }
}
