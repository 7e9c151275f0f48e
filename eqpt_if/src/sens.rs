//! # Sensor reading interface
//!
//! The sensor filtering layer samples the raw sensors into fixed-size windows and exposes only
//! filtered scalars. The motion core treats every value returned here as already-filtered truth.

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Window filter applied to a scalar reading.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Filter {
    Mean,
    Median,
}

/// The floor-pointing light sensors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FloorSensor {
    /// Rear left sensor, used for drift correction.
    Left,

    /// Rear right sensor, used for drift correction.
    Right,

    /// Centre sensor, used for floor-line localisation.
    Center,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Filtered sensor readings consumed by the motion core.
pub trait Sensors: Send + Sync {
    /// Distance to the nearest object in front of the robot.
    ///
    /// Units: centimeters
    fn front_range_cm(&self, filter: Filter) -> f64;

    /// True if the given floor sensor has just crossed a line edge.
    fn floor_edge(&self, sensor: FloorSensor) -> bool;
}
