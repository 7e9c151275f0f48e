//! Simulated regulated motor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use eqpt_if::{Completion, Motor};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Poll interval while a blocking rotation finishes off.
const SETTLE_POLL: Duration = Duration::from_micros(200);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A motor that reaches its commanded speed instantly and integrates its position lazily,
/// whenever it is observed or commanded.
///
/// `time_scale` speeds up simulated time relative to wall-clock time, so that tests can run
/// long manoeuvres quickly.
#[derive(Debug)]
pub struct SimMotor {
    time_scale: f64,
    state: Mutex<MotorState>,
}

#[derive(Debug)]
struct MotorState {
    /// Units: degrees/second, always positive
    speed_degs: f64,

    motion: Motion,

    /// Units: degrees
    position_deg: f64,

    last_update: Instant,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Motion {
    Stopped,

    /// Direction of rotation, +1 forward or -1 backward
    Continuous(f64),

    /// Units: degrees
    ToTarget(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimMotor {
    fn default() -> Self {
        Self::with_time_scale(1.0)
    }
}

impl SimMotor {
    pub fn with_time_scale(time_scale: f64) -> Self {
        Self {
            time_scale,
            state: Mutex::new(MotorState {
                speed_degs: 0.0,
                motion: Motion::Stopped,
                position_deg: 0.0,
                last_update: Instant::now(),
            }),
        }
    }

    /// Exact position of the output shaft.
    ///
    /// Units: degrees
    pub fn position_deg(&self) -> f64 {
        self.lock().position_deg
    }

    /// Lock the state, bringing the position up to date first.
    fn lock(&self) -> MutexGuard<'_, MotorState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.advance(self.time_scale);
        state
    }
}

impl MotorState {
    fn advance(&mut self, time_scale: f64) {
        let now = Instant::now();
        let step_deg = self.speed_degs * (now - self.last_update).as_secs_f64() * time_scale;
        self.last_update = now;

        match self.motion {
            Motion::Stopped => (),
            Motion::Continuous(dir) => self.position_deg += dir * step_deg,
            Motion::ToTarget(target) => {
                let remaining = target - self.position_deg;
                if remaining.abs() <= step_deg {
                    self.position_deg = target;
                    self.motion = Motion::Stopped;
                } else {
                    self.position_deg += remaining.signum() * step_deg;
                }
            }
        }
    }

    fn set_motion(&mut self, motion: Motion) {
        // A motor with no speed set does not move
        self.motion = if self.speed_degs > 0.0 {
            motion
        } else {
            Motion::Stopped
        };
    }
}

impl Motor for SimMotor {
    fn set_speed(&self, speed_degs: f64) {
        let mut state = self.lock();
        state.speed_degs = speed_degs.abs();
        if state.speed_degs == 0.0 {
            state.motion = Motion::Stopped;
        }
    }

    fn forward(&self) {
        self.lock().set_motion(Motion::Continuous(1.0));
    }

    fn backward(&self) {
        self.lock().set_motion(Motion::Continuous(-1.0));
    }

    fn stop(&self, _completion: Completion) {
        self.lock().motion = Motion::Stopped;
    }

    fn rotate(&self, angle_deg: f64, completion: Completion) {
        let wait = {
            let mut state = self.lock();
            let target = state.position_deg + angle_deg;
            state.set_motion(Motion::ToTarget(target));

            match state.motion {
                Motion::ToTarget(_) => {
                    Duration::from_secs_f64(angle_deg.abs() / state.speed_degs / self.time_scale)
                }
                _ => return,
            }
        };

        if completion == Completion::Immediate {
            return;
        }

        thread::sleep(wait);
        while let Motion::ToTarget(_) = self.lock().motion {
            thread::sleep(SETTLE_POLL);
        }
    }

    fn tacho_count(&self) -> i64 {
        self.lock().position_deg.round() as i64
    }

    fn commanded_speed(&self) -> f64 {
        let state = self.lock();
        match state.motion {
            Motion::Stopped => 0.0,
            Motion::Continuous(dir) => dir * state.speed_degs,
            Motion::ToTarget(target) => (target - state.position_deg).signum() * state.speed_degs,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
