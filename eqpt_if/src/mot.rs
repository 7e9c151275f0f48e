//! # Drive motor interface

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Whether a motor command returns straight away or only once it has completed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Return as soon as the command has been issued.
    Immediate,

    /// Block the caller until the motor has finished executing the command.
    Blocking,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A regulated drive motor with a tachometer.
///
/// Handles are shared between the periodic loops, so every method takes `&self` and
/// implementations must provide their own interior synchronisation.
///
/// Speeds are in degrees of wheel rotation per second and are always given as magnitudes, the
/// direction being set by [`Motor::forward`], [`Motor::backward`] or the sign of a
/// [`Motor::rotate`] angle.
pub trait Motor: Send + Sync {
    /// Set the speed used by subsequent movement commands.
    ///
    /// Units: degrees/second
    fn set_speed(&self, speed_degs: f64);

    /// Rotate forwards continuously.
    fn forward(&self);

    /// Rotate backwards continuously.
    fn backward(&self);

    /// Stop the motor.
    fn stop(&self, completion: Completion);

    /// Rotate by the given angle relative to the current position, then stop.
    ///
    /// Units: degrees
    fn rotate(&self, angle_deg: f64, completion: Completion);

    /// Current tachometer count.
    ///
    /// Units: degrees
    fn tacho_count(&self) -> i64;

    /// The signed speed currently demanded of the motor, zero when stopped.
    ///
    /// Units: degrees/second
    fn commanded_speed(&self) -> f64;
}
