//! Parameters structures for the absolute localisers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::f64::consts::{FRAC_PI_4, PI};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the wall-angle (ultrasonic) localiser.
#[derive(Debug, Clone, Deserialize)]
pub struct UsLocParams {
    /// Wheel speed while scanning for the walls.
    ///
    /// Units: degrees/second
    pub rotation_speed_degs: f64,

    /// Range under which the sensor is considered to be looking at a wall.
    ///
    /// Units: centimeters
    pub wall_distance_cm: f64,

    /// Time spent rotating back before looking for the second wall, so that the first one is not
    /// detected again.
    ///
    /// Units: milliseconds
    pub cooldown_ms: u64,

    /// Distance of the range sensor ahead of the wheel axis.
    ///
    /// Units: centimeters
    pub sensor_offset_cm: f64,

    /// Fixed trim added to the computed heading.
    ///
    /// Units: radians
    pub heading_trim_rad: f64,

    /// Reference angle used when the first wall was latched at a lower heading than the second.
    ///
    /// Units: degrees
    pub reference_low_deg: f64,

    /// Reference angle used otherwise.
    ///
    /// Units: degrees
    pub reference_high_deg: f64,

    /// Interval between two range readings while waiting for a wall transition.
    ///
    /// Units: milliseconds
    pub poll_interval_ms: u64,
}

/// Parameters for the floor-line (light) localiser.
#[derive(Debug, Clone, Deserialize)]
pub struct LightLocParams {
    /// Heading the robot turns to before spinning, so that all four lines are seen.
    ///
    /// Units: radians
    pub start_heading_rad: f64,

    /// Wheel speed while spinning over the lines.
    ///
    /// Units: degrees/second
    pub spin_speed_degs: f64,

    /// Minimum time between two line detections.
    ///
    /// Units: milliseconds
    pub wait_time_ms: u64,

    /// Distance of the centre floor sensor behind the wheel axis.
    ///
    /// Units: centimeters
    pub sensor_offset_cm: f64,

    /// Largest accepted angle between the first and last line, a wider span is taken as a skipped
    /// or spurious line.
    ///
    /// Depends on how far from the intersection the scan is made and must be checked against the
    /// field in use. A scan centred right on the intersection spans about 3pi/2.
    ///
    /// Units: radians
    pub max_line_span_rad: f64,

    /// Interval between two floor sensor readings while spinning.
    ///
    /// Units: milliseconds
    pub poll_interval_ms: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for UsLocParams {
    fn default() -> Self {
        Self {
            rotation_speed_degs: 100.0,
            wall_distance_cm: 40.0,
            cooldown_ms: 1000,
            sensor_offset_cm: 2.6,
            heading_trim_rad: 0.008,
            reference_low_deg: 225.0,
            reference_high_deg: 45.0,
            poll_interval_ms: 5,
        }
    }
}

impl Default for LightLocParams {
    fn default() -> Self {
        Self {
            start_heading_rad: FRAC_PI_4,
            spin_speed_degs: 200.0,
            wait_time_ms: 400,
            sensor_offset_cm: 16.3,
            max_line_span_rad: PI,
            poll_interval_ms: 2,
        }
    }
}
