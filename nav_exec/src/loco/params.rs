//! Parameters structure for the drivetrain

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry of the two-wheeled chassis.
#[derive(Debug, Clone, Deserialize)]
pub struct ChassisParams {
    /// The radius of the drive wheels.
    ///
    /// Units: centimeters
    pub wheel_radius_cm: f64,

    /// Distance between the contact points of the two drive wheels.
    ///
    /// Units: centimeters
    pub track_cm: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ChassisParams {
    fn default() -> Self {
        Self {
            wheel_radius_cm: 2.02,
            track_cm: 15.56,
        }
    }
}

impl ChassisParams {
    /// Linear distance travelled by a wheel turning through the given angle.
    ///
    /// Units: centimeters
    pub fn wheel_deg_to_cm(&self, wheel_deg: f64) -> f64 {
        wheel_deg.to_radians() * self.wheel_radius_cm
    }

    /// Angle each wheel must turn, in opposite directions, to spin the chassis in place by
    /// `angle_rad`.
    ///
    /// Units: degrees
    pub fn spin_to_wheel_deg(&self, angle_rad: f64) -> f64 {
        (angle_rad * (self.track_cm / 2.0) / self.wheel_radius_cm).to_degrees()
    }
}
