//! # Odometer
//!
//! Dead-reckoning integrator. Each cycle the change in wheel tachometer counts is converted into
//! a pose increment using midpoint-angle integration: the displacement is applied along the
//! heading halfway through the cycle's rotation, which halves the error from treating the
//! cycle's heading as constant.
//!
//! The odometer has no pause gate, position tracking never stops while the robot is powered.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::trace;

use crate::{
    gate::Pausable,
    loco::{ChassisParams, Drivetrain},
    pose::{Pose, PoseStore},
    sched::PeriodicTask,
};

pub use params::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Change in wheel rotation over one integration cycle.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct WheelEncoderDelta {
    /// Units: degrees
    pub left_deg: f64,

    /// Units: degrees
    pub right_deg: f64,
}

/// The dead-reckoning integrator.
pub struct Odometer {
    params: OdometerParams,
    chassis: ChassisParams,
    pose: Arc<PoseStore>,
    drivetrain: Arc<Drivetrain>,

    /// Tacho counts at the previous cycle as `(left, right)`
    prev_counts: Mutex<(i64, i64)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Odometer {
    pub fn new(
        params: OdometerParams,
        chassis: ChassisParams,
        pose: Arc<PoseStore>,
        drivetrain: Arc<Drivetrain>,
    ) -> Self {
        let prev_counts = Mutex::new(drivetrain.tacho_counts());

        Self {
            params,
            chassis,
            pose,
            drivetrain,
            prev_counts,
        }
    }

    /// Read the tachometers and fold the change since the last call into the pose store.
    pub fn update(&self) {
        let (left, right) = self.drivetrain.tacho_counts();

        let delta = {
            let mut prev = self.prev_counts.lock().unwrap_or_else(PoisonError::into_inner);
            let delta = WheelEncoderDelta {
                left_deg: (left - prev.0) as f64,
                right_deg: (right - prev.1) as f64,
            };
            *prev = (left, right);
            delta
        };

        if delta == WheelEncoderDelta::default() {
            return;
        }

        let chassis = &self.chassis;
        let pose = self.pose.modify(|p| {
            *p = integrate(*p, delta, chassis);
            *p
        });

        trace!(
            "Odometer: delta {:?}, pose ({:.2}, {:.2}, {:.4})",
            delta,
            pose.x_cm,
            pose.y_cm,
            pose.theta_rad
        );
    }
}

impl PeriodicTask for Odometer {
    fn name(&self) -> &'static str {
        "Odometer"
    }

    fn period(&self) -> Duration {
        Duration::from_millis(self.params.period_ms)
    }

    fn gate(&self) -> Option<&dyn Pausable> {
        None
    }

    fn step(&self) {
        self.update()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance a pose by one cycle's wheel rotation.
///
/// The returned heading is not wrapped, the pose store does that on write.
pub fn integrate(pose: Pose, delta: WheelEncoderDelta, chassis: &ChassisParams) -> Pose {
    let left_cm = chassis.wheel_deg_to_cm(delta.left_deg);
    let right_cm = chassis.wheel_deg_to_cm(delta.right_deg);

    let disp_cm = (left_cm + right_cm) / 2.0;
    let dtheta_rad = (right_cm - left_cm) / chassis.track_cm;
    let mid_theta = pose.theta_rad + dtheta_rad / 2.0;

    Pose {
        x_cm: pose.x_cm + disp_cm * mid_theta.cos(),
        y_cm: pose.y_cm + disp_cm * mid_theta.sin(),
        theta_rad: pose.theta_rad + dtheta_rad,
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
    use eqpt_if::{Completion, Motor};
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_straight_line() {
        let chassis = ChassisParams::default();
        let delta = WheelEncoderDelta {
            left_deg: 12.0,
            right_deg: 12.0,
        };

        let mut pose = Pose::new(0.0, 0.0, FRAC_PI_2);
        for _ in 0..100 {
            pose = integrate(pose, delta, &chassis);
        }

        let expected_cm = chassis.wheel_deg_to_cm(1200.0);
        assert_relative_eq!(pose.x_cm, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pose.y_cm, expected_cm, epsilon = 1e-9);
        assert_relative_eq!(pose.theta_rad, FRAC_PI_2);
    }

    #[test]
    fn test_pure_rotation() {
        let chassis = ChassisParams::default();

        // A quarter turn counter-clockwise, split over many cycles
        let wheel_deg = chassis.spin_to_wheel_deg(FRAC_PI_2) / 50.0;
        let delta = WheelEncoderDelta {
            left_deg: -wheel_deg,
            right_deg: wheel_deg,
        };

        let mut pose = Pose::new(3.0, -4.0, PI);
        for _ in 0..50 {
            pose = integrate(pose, delta, &chassis);
        }

        assert_relative_eq!(pose.x_cm, 3.0, epsilon = 1e-12);
        assert_relative_eq!(pose.y_cm, -4.0, epsilon = 1e-12);
        assert_relative_eq!(pose.theta_rad, PI + FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_arc_uses_midpoint_heading() {
        let chassis = ChassisParams::default();
        let delta = WheelEncoderDelta {
            left_deg: 20.0,
            right_deg: 40.0,
        };

        let pose = integrate(Pose::default(), delta, &chassis);

        // Closed form for a single step: chord along the mean heading
        let l = chassis.wheel_deg_to_cm(20.0);
        let r = chassis.wheel_deg_to_cm(40.0);
        let dtheta = (r - l) / chassis.track_cm;
        assert_relative_eq!(pose.theta_rad, dtheta);
        assert_relative_eq!(pose.x_cm, (l + r) / 2.0 * (dtheta / 2.0).cos());
        assert_relative_eq!(pose.y_cm, (l + r) / 2.0 * (dtheta / 2.0).sin());
    }

    #[test]
    fn test_update_reads_tachos() {
        let left = Arc::new(SimMotor::with_time_scale(1000.0));
        let right = Arc::new(SimMotor::with_time_scale(1000.0));
        let drivetrain = Arc::new(Drivetrain::new(left.clone(), right.clone()));
        let pose = Arc::new(PoseStore::new(Pose::new(0.0, 0.0, FRAC_PI_2)));

        let odometer = Odometer::new(
            OdometerParams::default(),
            ChassisParams::default(),
            pose.clone(),
            drivetrain,
        );

        // No motion, no change
        odometer.update();
        assert_eq!(pose.read(), Pose::new(0.0, 0.0, FRAC_PI_2));

        left.set_speed(360.0);
        right.set_speed(360.0);
        right.rotate(360.0, Completion::Immediate);
        left.rotate(360.0, Completion::Blocking);
        odometer.update();

        let p = pose.read();
        assert_relative_eq!(p.x_cm, 0.0, epsilon = 1e-9);
        assert_relative_eq!(p.y_cm, 2.0 * PI * 2.02, epsilon = 1e-9);
    }
}
