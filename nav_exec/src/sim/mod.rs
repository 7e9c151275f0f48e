//! # Simulated robot
//!
//! Implementations of the equipment interfaces without hardware: regulated motors advancing in
//! real (optionally accelerated) time, a ground-truth world giving range and floor-line readings
//! on the tiled field, and test doubles with scripted readings.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod motor;
mod scripted;
mod speaker;
mod world;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use motor::SimMotor;
pub use scripted::ScriptedSensors;
pub use speaker::SimSpeaker;
pub use world::{Block, SensorGeometry, SimWorld};
