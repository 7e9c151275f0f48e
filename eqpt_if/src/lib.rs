//! # Equipment interface crate.
//!
//! Defines the interfaces through which the motion core talks to the robot's
//! equipment: the drive motors, the filtered sensor readings and the speaker.
//! Concrete implementations live with the executables (hardware drivers, or
//! the simulated robot).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive motor handles
pub mod mot;

/// Filtered sensor readings
pub mod sens;

/// Audible cues
pub mod cue;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use cue::Speaker;
pub use mot::{Completion, Motor};
pub use sens::{Filter, FloorSensor, Sensors};
