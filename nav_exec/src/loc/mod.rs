//! # Absolute localisation
//!
//! One-shot procedures replacing the dead-reckoned pose with an estimate anchored to known field
//! features. Each takes the drivetrain away from the navigator for its duration and puts every
//! component it paused back the way it found it on return.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

/// Wall-angle localisation from a corner tile
pub mod us_loc;

/// Floor-line localisation near a grid intersection
pub mod light_loc;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use light_loc::{LightLoc, LightLocOutcome};
pub use params::*;
pub use us_loc::UsLoc;
