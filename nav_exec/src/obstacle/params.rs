//! Parameters structure for the ObstacleGuard

use serde::Deserialize;

/// Parameters for obstacle detection and the swerve manoeuvre.
#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleParams {
    /// Target period of the detection loop.
    ///
    /// Units: milliseconds
    pub period_ms: u64,

    /// Forward range under which an obstacle is considered in the way.
    ///
    /// Units: centimeters
    pub threshold_cm: f64,

    // ---- SWERVE ----
    /// Wheel speed used for every leg of the swerve.
    ///
    /// Units: degrees/second
    pub swerve_speed_degs: f64,

    /// First in-place rotation, positive counter-clockwise.
    ///
    /// Units: radians
    pub first_turn_rad: f64,

    /// Units: degrees of wheel rotation
    pub first_leg_deg: f64,

    /// Second in-place rotation, positive counter-clockwise.
    ///
    /// Units: radians
    pub second_turn_rad: f64,

    /// Units: degrees of wheel rotation
    pub second_leg_deg: f64,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            period_ms: 25,
            threshold_cm: 22.0,
            swerve_speed_degs: 200.0,
            first_turn_rad: 1.35,
            first_leg_deg: 850.0,
            second_turn_rad: -0.45,
            second_leg_deg: 300.0,
        }
    }
}
