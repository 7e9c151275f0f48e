//! # Pose store
//!
//! The single source of truth for where the robot thinks it is. The dead-reckoning integrator,
//! the drift corrector and the absolute localisers write to it, everything else reads from it.
//! All three fields are read and written as one unit under a single lock.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard, PoisonError};

use nalgebra::Point2;
use util::maths::wrap_2pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The robot's estimated position and heading in the field frame.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Pose {
    /// Units: centimeters
    pub x_cm: f64,

    /// Units: centimeters
    pub y_cm: f64,

    /// Heading from the positive X axis, counter-clockwise.
    ///
    /// Units: radians, in [0, 2pi) once stored
    pub theta_rad: f64,
}

/// Selects which fields of a [`Pose`] a write applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PoseMask {
    pub x: bool,
    pub y: bool,
    pub theta: bool,
}

/// Thread-safe holder of the robot's pose.
#[derive(Debug, Default)]
pub struct PoseStore {
    pose: Mutex<Pose>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_cm: f64, y_cm: f64, theta_rad: f64) -> Self {
        Self {
            x_cm,
            y_cm,
            theta_rad,
        }
    }

    /// The position part of the pose.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x_cm, self.y_cm)
    }
}

impl PoseMask {
    pub const ALL: PoseMask = PoseMask {
        x: true,
        y: true,
        theta: true,
    };

    pub const XY: PoseMask = PoseMask {
        x: true,
        y: true,
        theta: false,
    };

    pub const THETA: PoseMask = PoseMask {
        x: false,
        y: false,
        theta: true,
    };
}

impl PoseStore {
    /// Create a new store holding the given pose, heading wrapped.
    pub fn new(initial: Pose) -> Self {
        let store = Self::default();
        store.write(initial, PoseMask::ALL);
        store
    }

    /// Atomic snapshot of the whole pose.
    pub fn read(&self) -> Pose {
        *self.lock()
    }

    /// Write the masked fields of `pose`.
    ///
    /// NaN fields are skipped, so a garbled localisation result cannot poison the estimate.
    pub fn write(&self, pose: Pose, mask: PoseMask) {
        let mut current = self.lock();

        if mask.x && !pose.x_cm.is_nan() {
            current.x_cm = pose.x_cm;
        }
        if mask.y && !pose.y_cm.is_nan() {
            current.y_cm = pose.y_cm;
        }
        if mask.theta && !pose.theta_rad.is_nan() {
            current.theta_rad = wrap_2pi(pose.theta_rad);
        }
    }

    /// Read-modify-write the pose under a single lock.
    ///
    /// Fields the closure sets to NaN keep their previous value and the heading is re-wrapped
    /// afterwards.
    pub fn modify<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Pose) -> R,
    {
        let mut current = self.lock();
        let mut next = *current;

        let ret = f(&mut next);

        if !next.x_cm.is_nan() {
            current.x_cm = next.x_cm;
        }
        if !next.y_cm.is_nan() {
            current.y_cm = next.y_cm;
        }
        if !next.theta_rad.is_nan() {
            current.theta_rad = wrap_2pi(next.theta_rad);
        }

        ret
    }

    fn lock(&self) -> MutexGuard<'_, Pose> {
        self.pose.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_masked_write() {
        let store = PoseStore::new(Pose::new(1.0, 2.0, 0.5));

        store.write(Pose::new(10.0, 20.0, 1.5), PoseMask::XY);
        assert_eq!(store.read(), Pose::new(10.0, 20.0, 0.5));

        store.write(Pose::new(0.0, 0.0, 1.5), PoseMask::THETA);
        assert_eq!(store.read(), Pose::new(10.0, 20.0, 1.5));
    }

    #[test]
    fn test_nan_write_ignored() {
        let store = PoseStore::new(Pose::new(1.0, 2.0, 0.5));

        store.write(Pose::new(std::f64::NAN, 7.0, std::f64::NAN), PoseMask::ALL);
        assert_eq!(store.read(), Pose::new(1.0, 7.0, 0.5));

        store.modify(|p| p.x_cm = std::f64::NAN);
        assert_eq!(store.read().x_cm, 1.0);
    }

    #[test]
    fn test_heading_always_wrapped() {
        let store = PoseStore::new(Pose::new(0.0, 0.0, -PI / 2.0));
        assert!((store.read().theta_rad - 3.0 * PI / 2.0).abs() < 1e-12);

        // Mix of integrator-like increments and absolute writes
        let mut step = 0.37;
        for i in 0..2000 {
            if i % 7 == 0 {
                store.write(Pose::new(0.0, 0.0, step * -13.0), PoseMask::THETA);
            } else {
                store.modify(|p| p.theta_rad += step);
            }
            step = -step * 1.01;

            let theta = store.read().theta_rad;
            assert!((0.0..TAU).contains(&theta), "theta {} out of range", theta);
        }

        store.write(Pose::new(0.0, 0.0, TAU), PoseMask::THETA);
        assert_eq!(store.read().theta_rad, 0.0);
    }
}
