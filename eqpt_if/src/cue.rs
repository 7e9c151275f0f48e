//! # Audible cue interface

/// The robot's speaker.
pub trait Speaker: Send + Sync {
    /// A short confirmation tone.
    fn beep(&self);

    /// A failure tone.
    fn buzz(&self);
}
