//! # Navigation library.
//!
//! Motion and localisation core of a two-wheeled tile robot. Exposes the components so that the
//! executable, the benchmarks and the tests can assemble and drive them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Shared pose estimate
pub mod pose;

/// Pause gates shared by the periodic components
pub mod gate;

/// Periodic loop runner
pub mod sched;

/// Differential drivetrain commands
pub mod loco;

/// Field geometry, grid lines and starting corners
pub mod field;

/// Dead-reckoning from the wheel encoders
pub mod odometer;

/// Grid-line odometry correction
pub mod odom_corr;

/// Waypoint navigation
pub mod nav;

/// Obstacle detection and avoidance
pub mod obstacle;

/// Absolute localisation procedures
pub mod loc;

/// Robot assembly and loop management
pub mod robot;

/// Simulated equipment
pub mod sim;
