//! # Odometry correction
//!
//! Corrects accumulated dead-reckoning drift using the grid lines on the floor. The two rear floor
//! sensors each latch the pose coordinate along the current axis of motion when they cross a line.
//! When both have crossed the same line the difference between the two samples gives the skew of
//! the robot relative to the line, and the along-axis coordinate is snapped to the grid.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eqpt_if::{FloorSensor, Sensors, Speaker};
use log::{debug, trace};

use crate::{
    field::FieldParams,
    gate::{Pausable, RunGate, Switchable},
    pose::{Pose, PoseStore},
    sched::PeriodicTask,
};

pub use params::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const LEFT: usize = 0;
const RIGHT: usize = 1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The floor-line drift corrector.
pub struct OdomCorr {
    params: OdomCorrParams,
    tile_length_cm: f64,
    pose: Arc<PoseStore>,
    sensors: Arc<dyn Sensors>,
    speaker: Arc<dyn Speaker>,
    gate: RunGate<CorrState>,
}

/// Cycle state owned by the corrector's gate.
#[derive(Debug, Default)]
struct CorrState {
    /// Line crossing samples as `[left, right]`, `None` until the sensor sees a line.
    ///
    /// Units: centimeters
    samples: [Option<f64>; 2],

    last_correction: Option<Instant>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OdomCorr {
    /// Create a new corrector, initially paused.
    pub fn new(
        params: OdomCorrParams,
        field: &FieldParams,
        pose: Arc<PoseStore>,
        sensors: Arc<dyn Sensors>,
        speaker: Arc<dyn Speaker>,
    ) -> Self {
        Self {
            params,
            tile_length_cm: field.tile_length_cm,
            pose,
            sensors,
            speaker,
            gate: RunGate::new(CorrState::default(), false),
        }
    }

    /// Discard any pending line crossing samples.
    ///
    /// Called whenever the robot rotates, since samples taken before a rotation no longer
    /// describe the same line.
    pub fn reset(&self) {
        self.gate.with(CorrState::clear_samples);
    }

    /// Execute one cycle, returning the corrected pose if a correction was applied.
    pub fn update(&self) -> Option<Pose> {
        self.gate.cycle(|state| self.cycle(state)).flatten()
    }

    fn cycle(&self, state: &mut CorrState) -> Option<Pose> {
        let pose = self.pose.read();
        let coord = if is_horizontal(pose.theta_rad) {
            pose.x_cm
        } else {
            pose.y_cm
        };

        for &(slot, sensor) in &[(LEFT, FloorSensor::Left), (RIGHT, FloorSensor::Right)] {
            if self.sensors.floor_edge(sensor) {
                state.record(slot, coord, self.tile_length_cm / 2.0);
            }
        }

        let (left, right) = match state.samples {
            [Some(l), Some(r)] if (r - l).abs() < self.params.displacement_threshold_cm => (l, r),
            _ => return None,
        };

        // Whether or not the cooldown allows it, this pair of samples has now been used
        state.clear_samples();

        let cooldown = Duration::from_millis(self.params.cooldown_ms);
        if let Some(last) = state.last_correction {
            if last.elapsed() <= cooldown {
                trace!("OdomCorr: line pair ignored, correction cooling down");
                return None;
            }
        }

        self.speaker.beep();
        state.last_correction = Some(Instant::now());

        let params = &self.params;
        let tile = self.tile_length_cm;
        let corrected = self.pose.modify(|p| {
            *p = compute_correction(*p, left, right, params, tile);
            *p
        });

        debug!(
            "OdomCorr: samples ({:.2}, {:.2}) -> pose ({:.2}, {:.2}, {:.4})",
            left, right, corrected.x_cm, corrected.y_cm, corrected.theta_rad
        );

        Some(corrected)
    }
}

impl CorrState {
    fn clear_samples(&mut self) {
        self.samples = [None, None];
    }

    /// Latch a sample unless it is a re-detection of the line already pending in that slot.
    fn record(&mut self, slot: usize, coord: f64, min_separation: f64) {
        match self.samples[slot] {
            Some(prev) if (coord - prev).abs() <= min_separation => (),
            _ => self.samples[slot] = Some(coord),
        }
    }
}

impl Switchable for OdomCorr {
    fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    fn set_running(&self, running: bool) {
        self.gate
            .set_running(running, |_, state| state.clear_samples());
        debug!("OdomCorr running: {}", running);
    }
}

impl PeriodicTask for OdomCorr {
    fn name(&self) -> &'static str {
        "OdomCorr"
    }

    fn period(&self) -> Duration {
        Duration::from_millis(self.params.period_ms)
    }

    fn gate(&self) -> Option<&dyn Pausable> {
        Some(&self.gate)
    }

    fn step(&self) {
        self.update();
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// True if the heading is closest to the X axis (0 or pi) rather than the Y axis.
pub fn is_horizontal(theta_rad: f64) -> bool {
    quadrant(theta_rad) % 2 == 0
}

/// Correct a pose from the coordinates at which the left and right floor sensors crossed the same
/// grid line.
///
/// Only the heading and the along-axis coordinate change.
pub fn compute_correction(
    pose: Pose,
    left_cm: f64,
    right_cm: f64,
    params: &OdomCorrParams,
    tile_length_cm: f64,
) -> Pose {
    let xs = params.x_sensor_dist_cm;
    let ys = params.y_sensor_dist_cm;

    let dtheta = -((right_cm - left_cm) / (2.0 * xs)).atan();
    let dpos = (xs * dtheta.sin()).abs() + params.overcorrection_cm;

    // Headings facing pi or 3pi/2 flip the sign of the offsets
    let q = quadrant(pose.theta_rad);
    let sign = if q % 4 < 2 { 1.0 } else { -1.0 };

    let theta = pose.theta_rad + dtheta * sign;
    let snap = |coord: f64, line: f64| {
        ((coord - line) / tile_length_cm).round() * tile_length_cm + line
            + sign * params.correction_cm
    };

    let mut corrected = Pose { theta_rad: theta, ..pose };
    if q % 2 == 0 {
        let line = ys * theta.cos() + sign * dpos;
        corrected.x_cm = snap(pose.x_cm, line);
    } else {
        let line = ys * theta.sin() + sign * dpos;
        corrected.y_cm = snap(pose.y_cm, line);
    }

    corrected
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Nearest multiple of a quarter turn, 0 to 4.
fn quadrant(theta_rad: f64) -> i64 {
    ((theta_rad / FRAC_PI_2).round() as i64).rem_euclid(4)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ScriptedSensors, SimSpeaker};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const TILE: f64 = 30.48;

    fn corrector(params: OdomCorrParams) -> (Arc<PoseStore>, Arc<ScriptedSensors>, Arc<SimSpeaker>, OdomCorr) {
        let pose = Arc::new(PoseStore::new(Pose::default()));
        let sensors = Arc::new(ScriptedSensors::new());
        let speaker = Arc::new(SimSpeaker::default());
        let corr = OdomCorr::new(
            params,
            &FieldParams::default(),
            pose.clone(),
            sensors.clone(),
            speaker.clone(),
        );
        (pose, sensors, speaker, corr)
    }

    #[test]
    fn test_axis_selection() {
        assert!(is_horizontal(0.1));
        assert!(is_horizontal(PI - 0.3));
        assert!(is_horizontal(2.0 * PI - 0.1));
        assert!(!is_horizontal(FRAC_PI_2 + 0.5));
        assert!(!is_horizontal(3.0 * FRAC_PI_2));
    }

    #[test]
    fn test_drift_snapping() {
        let params = OdomCorrParams::default();

        // Moving along +X, well past the line at 2 tiles, sensors 3 cm apart
        let pose = Pose::new(2.0 * TILE + 14.0, 47.0, 0.05);
        let corrected = compute_correction(pose, 74.0, 77.0, &params, TILE);

        let dtheta = -(3.0f64 / (2.0 * params.x_sensor_dist_cm)).atan();
        assert_relative_eq!(corrected.theta_rad, 0.05 + dtheta);
        assert_eq!(corrected.y_cm, 47.0);

        // Back out where the sensors put the line, it must be on the grid up to the
        // overcorrection constant
        let line_x = corrected.x_cm
            - params.y_sensor_dist_cm * corrected.theta_rad.cos()
            - (params.x_sensor_dist_cm * dtheta.sin()).abs()
            - params.correction_cm;
        let nearest = (line_x / TILE).round() * TILE;
        assert_relative_eq!(nearest, 2.0 * TILE);
        assert!((line_x - nearest).abs() <= params.overcorrection_cm + 1e-9);
    }

    #[test]
    fn test_snapping_flips_when_facing_down() {
        let params = OdomCorrParams::default();

        // Moving along -Y: only Y and the heading move, offsets point the other way
        let pose = Pose::new(12.0, TILE - 15.0, 3.0 * FRAC_PI_2);
        let corrected = compute_correction(pose, 15.0, 15.0, &params, TILE);

        assert_eq!(corrected.x_cm, 12.0);
        assert_relative_eq!(corrected.theta_rad, 3.0 * FRAC_PI_2);
        let line = params.y_sensor_dist_cm * corrected.theta_rad.sin() - params.overcorrection_cm;
        assert_relative_eq!(
            corrected.y_cm,
            TILE + line - params.correction_cm,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_cycle_applies_correction_once() {
        let (pose, sensors, speaker, corr) = corrector(OdomCorrParams::default());
        corr.set_running(true);

        pose.write(Pose::new(70.0, 10.0, 0.0), crate::pose::PoseMask::ALL);
        sensors.push_edge(FloorSensor::Left);
        assert_eq!(corr.update(), None);

        pose.write(Pose::new(73.0, 10.0, 0.0), crate::pose::PoseMask::ALL);
        sensors.push_edge(FloorSensor::Right);
        let expected =
            compute_correction(Pose::new(73.0, 10.0, 0.0), 70.0, 73.0, &OdomCorrParams::default(), TILE);
        let corrected = corr.update().unwrap();

        assert_relative_eq!(corrected.x_cm, expected.x_cm);
        assert_relative_eq!(pose.read().x_cm, expected.x_cm);
        assert_eq!(speaker.beeps(), 1);

        // A second pair inside the cooldown is consumed without correcting
        sensors.push_edge(FloorSensor::Left);
        sensors.push_edge(FloorSensor::Right);
        assert_eq!(corr.update(), None);
        assert_eq!(speaker.beeps(), 1);
        assert_eq!(corr.gate.read(|s| s.samples), [None, None]);
    }

    #[test]
    fn test_samples_cleared_and_gated() {
        let (_, sensors, _, corr) = corrector(OdomCorrParams::default());

        // Paused: edges are not even read
        sensors.push_edge(FloorSensor::Left);
        assert_eq!(corr.update(), None);
        assert_eq!(corr.gate.read(|s| s.samples), [None, None]);

        corr.set_running(true);
        corr.update();
        assert!(corr.gate.read(|s| s.samples[LEFT].is_some()));

        corr.reset();
        assert_eq!(corr.gate.read(|s| s.samples), [None, None]);

        sensors.push_edge(FloorSensor::Right);
        corr.update();
        corr.set_running(false);
        corr.set_running(true);
        assert_eq!(corr.gate.read(|s| s.samples), [None, None]);
    }

    #[test]
    fn test_same_line_not_recorded_twice() {
        let mut state = CorrState::default();

        state.record(LEFT, 30.0, TILE / 2.0);
        state.record(LEFT, 40.0, TILE / 2.0);
        assert_eq!(state.samples[LEFT], Some(30.0));

        state.record(LEFT, 61.0, TILE / 2.0);
        assert_eq!(state.samples[LEFT], Some(61.0));
    }
}
