//! Parameters structure for OdomCorr

use serde::Deserialize;

/// Parameters for the floor-line drift corrector.
#[derive(Debug, Clone, Deserialize)]
pub struct OdomCorrParams {
    /// Target period of the correction loop.
    ///
    /// Units: milliseconds
    pub period_ms: u64,

    // ---- SENSOR GEOMETRY ----
    /// Lateral distance of each rear floor sensor from the robot's centreline.
    ///
    /// Units: centimeters
    pub x_sensor_dist_cm: f64,

    /// Distance of the rear floor sensors behind the wheel axis.
    ///
    /// Units: centimeters
    pub y_sensor_dist_cm: f64,

    // ---- CORRECTION ----
    /// Largest difference between the two sensors' samples that still counts as the same line.
    ///
    /// Units: centimeters
    pub displacement_threshold_cm: f64,

    /// Offset added along the direction of motion so a robot driving straight ends up exactly
    /// on the line, compensating for the edge detection lag.
    ///
    /// Units: centimeters
    pub correction_cm: f64,

    /// Fixed extra offset added to the perpendicular correction.
    ///
    /// Units: centimeters
    pub overcorrection_cm: f64,

    /// Minimum time between two applied corrections.
    ///
    /// Units: milliseconds
    pub cooldown_ms: u64,
}

impl Default for OdomCorrParams {
    fn default() -> Self {
        Self {
            period_ms: 25,
            x_sensor_dist_cm: 8.6,
            y_sensor_dist_cm: 11.9,
            displacement_threshold_cm: 6.0,
            correction_cm: 3.5,
            overcorrection_cm: 0.27,
            cooldown_ms: 1000,
        }
    }
}
