//! Parameters structure for the Navigator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::f64::consts::PI;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the waypoint navigator.
#[derive(Debug, Clone, Deserialize)]
pub struct NavParams {
    /// Target period of the navigation loop.
    ///
    /// Units: milliseconds
    pub period_ms: u64,

    // ---- TOLERANCES ----
    /// Per-axis distance from a target under which it counts as reached.
    ///
    /// Units: centimeters
    pub dist_tolerance_cm: f64,

    /// Heading error under which the robot drives instead of rotating.
    ///
    /// Units: radians
    pub angle_tolerance_rad: f64,

    // ---- ROTATION ----
    /// Units: degrees/second
    pub min_rotation_speed_degs: f64,

    /// Units: degrees/second
    pub max_rotation_speed_degs: f64,

    /// Heading error at which the rotation speed reaches its maximum.
    ///
    /// Units: radians
    pub rotation_speed_scale_rad: f64,

    // ---- TRANSLATION ----
    /// Units: degrees/second
    pub min_move_speed_degs: f64,

    /// Units: degrees/second
    pub max_move_speed_degs: f64,

    /// Squared distance to target at which the translation speed reaches its maximum.
    ///
    /// Units: centimeters^2
    pub move_speed_scale_cm2: f64,

    /// Fraction added to the left wheel speed when driving, compensating for the heavier left
    /// side of the chassis.
    pub left_adjustment: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for NavParams {
    fn default() -> Self {
        Self {
            period_ms: 20,
            dist_tolerance_cm: 0.6,
            angle_tolerance_rad: PI / 60.0,
            min_rotation_speed_degs: 60.0,
            max_rotation_speed_degs: 110.0,
            rotation_speed_scale_rad: PI / 3.0,
            min_move_speed_degs: 115.0,
            max_move_speed_degs: 300.0,
            move_speed_scale_cm2: 250.0,
            left_adjustment: 0.05,
        }
    }
}
