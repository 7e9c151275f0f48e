//! # Locomotion module
//!
//! Wraps the two drive motors into a differential drivetrain. Every component that commands
//! the wheels (the navigator, the obstacle swerve and the localisers) goes through a shared
//! [`Drivetrain`] so that the motor conventions live in one place.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use eqpt_if::{Completion, Motor};
use log::trace;

pub use params::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction of an in-place rotation, seen from above.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Spin {
    /// Counter-clockwise: left wheel backward, right wheel forward.
    Ccw,

    /// Clockwise: left wheel forward, right wheel backward.
    Cw,
}

/// Direction of a straight-line drive.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Heading {
    Forward,
    Backward,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The left and right drive motors.
pub struct Drivetrain {
    left: Arc<dyn Motor>,
    right: Arc<dyn Motor>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Drivetrain {
    pub fn new(left: Arc<dyn Motor>, right: Arc<dyn Motor>) -> Self {
        Self { left, right }
    }

    /// Stop both wheels, returning once the left one has come to rest.
    pub fn stop(&self) {
        self.right.stop(Completion::Immediate);
        self.left.stop(Completion::Blocking);
    }

    /// Rotate continuously in place.
    ///
    /// Units: degrees/second of wheel rotation
    pub fn spin(&self, dir: Spin, speed_degs: f64) {
        trace!("Spin {:?} at {:.1} deg/s", dir, speed_degs);

        self.left.set_speed(speed_degs);
        self.right.set_speed(speed_degs);

        match dir {
            Spin::Ccw => {
                self.left.backward();
                self.right.forward();
            }
            Spin::Cw => {
                self.right.backward();
                self.left.forward();
            }
        }
    }

    /// Drive continuously with independent wheel speeds.
    ///
    /// Units: degrees/second of wheel rotation
    pub fn drive(&self, heading: Heading, left_speed_degs: f64, right_speed_degs: f64) {
        self.right.set_speed(right_speed_degs);
        self.left.set_speed(left_speed_degs);

        match heading {
            Heading::Forward => {
                self.right.forward();
                self.left.forward();
            }
            Heading::Backward => {
                self.right.backward();
                self.left.backward();
            }
        }
    }

    /// Turn both wheels forward through the same angle, blocking until done.
    ///
    /// Units: degrees of wheel rotation, degrees/second
    pub fn advance(&self, wheel_deg: f64, speed_degs: f64) {
        self.right.set_speed(speed_degs);
        self.left.set_speed(speed_degs);
        self.right.rotate(wheel_deg, Completion::Immediate);
        self.left.rotate(wheel_deg, Completion::Blocking);
    }

    /// Rotate the chassis in place by a relative angle, open loop, blocking until done.
    ///
    /// Positive angles are counter-clockwise.
    pub fn rotate_by(&self, angle_rad: f64, speed_degs: f64, chassis: &ChassisParams) {
        let wheel_deg = chassis.spin_to_wheel_deg(angle_rad);

        self.right.set_speed(speed_degs);
        self.left.set_speed(speed_degs);
        self.right.rotate(wheel_deg, Completion::Immediate);
        self.left.rotate(-wheel_deg, Completion::Blocking);
    }

    /// Current tachometer counts as `(left, right)`.
    ///
    /// Units: degrees
    pub fn tacho_counts(&self) -> (i64, i64) {
        (self.left.tacho_count(), self.right.tacho_count())
    }

    /// Signed speeds currently demanded of the motors as `(left, right)`.
    ///
    /// Units: degrees/second
    pub fn commanded_speeds(&self) -> (f64, f64) {
        (self.left.commanded_speed(), self.right.commanded_speed())
    }

    /// True if neither motor is being driven.
    pub fn is_stopped(&self) -> bool {
        let (l, r) = self.commanded_speeds();
        l == 0.0 && r == 0.0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMotor;
    use approx::assert_relative_eq;

    fn drivetrain() -> (Arc<SimMotor>, Arc<SimMotor>, Drivetrain) {
        let left = Arc::new(SimMotor::with_time_scale(1000.0));
        let right = Arc::new(SimMotor::with_time_scale(1000.0));
        let dt = Drivetrain::new(left.clone(), right.clone());
        (left, right, dt)
    }

    #[test]
    fn test_spin_conventions() {
        let (_, _, dt) = drivetrain();

        dt.spin(Spin::Ccw, 100.0);
        assert_eq!(dt.commanded_speeds(), (-100.0, 100.0));

        dt.spin(Spin::Cw, 60.0);
        assert_eq!(dt.commanded_speeds(), (60.0, -60.0));

        dt.drive(Heading::Backward, 105.0, 100.0);
        assert_eq!(dt.commanded_speeds(), (-105.0, -100.0));

        dt.stop();
        assert!(dt.is_stopped());
    }

    #[test]
    fn test_rotate_by_turns_wheels_opposite_ways() {
        let (left, right, dt) = drivetrain();
        let chassis = ChassisParams::default();

        dt.rotate_by(std::f64::consts::FRAC_PI_2, 200.0, &chassis);

        let expected = chassis.spin_to_wheel_deg(std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(right.position_deg(), expected, epsilon = 1e-6);
        assert_relative_eq!(left.position_deg(), -expected, epsilon = 1e-6);
        assert!(dt.is_stopped());
    }

    #[test]
    fn test_chassis_conversions() {
        let chassis = ChassisParams::default();

        assert_relative_eq!(
            chassis.wheel_deg_to_cm(360.0),
            2.0 * std::f64::consts::PI * 2.02
        );

        // Half a turn in place moves each wheel along half the track circle
        let wheel_cm = chassis.wheel_deg_to_cm(chassis.spin_to_wheel_deg(std::f64::consts::PI));
        assert_relative_eq!(wheel_cm, std::f64::consts::PI * 15.56 / 2.0, epsilon = 1e-9);
    }
}
