//! Sensors with scripted readings

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use eqpt_if::{Filter, FloorSensor, Sensors};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Range reported when nothing has been scripted, the sensor's maximum.
const NO_ECHO_CM: f64 = 255.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sensors replaying queued readings.
///
/// Each range read consumes one queued value, except the last which repeats. Each queued floor
/// edge is reported once, by the first read of that sensor.
#[derive(Debug, Default)]
pub struct ScriptedSensors {
    ranges: Mutex<VecDeque<f64>>,
    edges: Mutex<Vec<FloorSensor>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptedSensors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue range readings.
    ///
    /// Units: centimeters
    pub fn push_ranges(&self, ranges_cm: &[f64]) {
        lock(&self.ranges).extend(ranges_cm.iter().copied());
    }

    /// Queue a line edge on the given floor sensor.
    pub fn push_edge(&self, sensor: FloorSensor) {
        lock(&self.edges).push(sensor);
    }
}

impl Sensors for ScriptedSensors {
    fn front_range_cm(&self, _filter: Filter) -> f64 {
        let mut ranges = lock(&self.ranges);
        if ranges.len() > 1 {
            ranges.pop_front().unwrap_or(NO_ECHO_CM)
        } else {
            ranges.front().copied().unwrap_or(NO_ECHO_CM)
        }
    }

    fn floor_edge(&self, sensor: FloorSensor) -> bool {
        let mut edges = lock(&self.edges);
        match edges.iter().position(|e| *e == sensor) {
            Some(i) => {
                edges.remove(i);
                true
            }
            None => false,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
