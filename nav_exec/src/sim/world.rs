//! Ground-truth world
//!
//! Integrates the true pose of the robot from the simulated motors' exact shaft positions and
//! derives the sensor readings from it: the forward range by casting a ray against the field
//! walls and any block obstacles, and the floor edges by watching each floor sensor move from one
//! grid tile into another.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use eqpt_if::{Filter, FloorSensor, Sensors};
use log::trace;
use nalgebra::{Point2, Vector2};

use super::SimMotor;
use crate::{
    field::FieldParams,
    gate::Pausable,
    loco::ChassisParams,
    odometer::{integrate, WheelEncoderDelta},
    pose::Pose,
    sched::PeriodicTask,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum range the sensor reports.
///
/// Units: centimeters
const MAX_RANGE_CM: f64 = 255.0;

/// Period of the physics integration.
const PHYSICS_PERIOD: Duration = Duration::from_millis(2);

const FLOOR_SENSORS: [FloorSensor; 3] = [FloorSensor::Left, FloorSensor::Right, FloorSensor::Center];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mounting positions of the sensors relative to the centre of the wheel axis.
#[derive(Debug, Clone)]
pub struct SensorGeometry {
    /// Range sensor distance ahead of the wheel axis.
    ///
    /// Units: centimeters
    pub range_ahead_cm: f64,

    /// Rear floor sensors distance behind the wheel axis.
    ///
    /// Units: centimeters
    pub rear_behind_cm: f64,

    /// Rear floor sensors distance either side of the centreline.
    ///
    /// Units: centimeters
    pub rear_lateral_cm: f64,

    /// Centre floor sensor distance behind the wheel axis.
    ///
    /// Units: centimeters
    pub centre_behind_cm: f64,
}

/// An axis-aligned rectangular obstacle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Block {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

/// The simulated field and the robot's true pose on it.
pub struct SimWorld {
    field: FieldParams,
    chassis: ChassisParams,
    geometry: SensorGeometry,
    blocks: Vec<Block>,
    left: Arc<SimMotor>,
    right: Arc<SimMotor>,
    state: Mutex<WorldState>,
}

#[derive(Debug)]
struct WorldState {
    truth: Pose,

    /// Motor positions at the last update as `(left, right)`
    prev_deg: (f64, f64),

    /// Tile each floor sensor was last seen over
    tiles: [(i64, i64); 3],

    /// Edges crossed and not yet read
    pending_edges: [bool; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SensorGeometry {
    fn default() -> Self {
        Self {
            range_ahead_cm: 2.6,
            rear_behind_cm: 11.9,
            rear_lateral_cm: 8.6,
            centre_behind_cm: 16.3,
        }
    }
}

impl Block {
    /// A square block of the given side centred on a point.
    pub fn square(centre: Point2<f64>, side_cm: f64) -> Self {
        let half = Vector2::new(side_cm / 2.0, side_cm / 2.0);
        Self {
            min: centre - half,
            max: centre + half,
        }
    }

    /// Distance along the ray to the block, if it is hit.
    fn ray_hit(&self, origin: Point2<f64>, dir: Vector2<f64>) -> Option<f64> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        for i in 0..2 {
            if dir[i].abs() < 1e-12 {
                if origin[i] < self.min[i] || origin[i] > self.max[i] {
                    return None;
                }
                continue;
            }

            let t1 = (self.min[i] - origin[i]) / dir[i];
            let t2 = (self.max[i] - origin[i]) / dir[i];
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some(t_near.max(0.0))
        } else {
            None
        }
    }
}

impl SimWorld {
    pub fn new(
        field: FieldParams,
        chassis: ChassisParams,
        geometry: SensorGeometry,
        start: Pose,
        left: Arc<SimMotor>,
        right: Arc<SimMotor>,
    ) -> Self {
        let prev_deg = (left.position_deg(), right.position_deg());

        let mut world = Self {
            field,
            chassis,
            geometry,
            blocks: Vec::new(),
            left,
            right,
            state: Mutex::new(WorldState {
                truth: start,
                prev_deg,
                tiles: [(0, 0); 3],
                pending_edges: [false; 3],
            }),
        };

        // Sensors start over whatever tile they are on, no edge
        let state = world.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (i, sensor) in FLOOR_SENSORS.iter().enumerate() {
            let p = floor_sensor_position(&world.geometry, &state.truth, *sensor);
            state.tiles[i] = tile_of(&world.field, p);
        }

        world
    }

    /// Add an obstacle to the field.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// The robot's true pose.
    pub fn truth(&self) -> Pose {
        self.lock().truth
    }

    /// Bring the true pose and the floor sensor states up to date.
    pub fn update(&self) {
        drop(self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.advance(&mut state);
        state
    }

    fn advance(&self, state: &mut WorldState) {
        let now_deg = (self.left.position_deg(), self.right.position_deg());
        let delta = WheelEncoderDelta {
            left_deg: now_deg.0 - state.prev_deg.0,
            right_deg: now_deg.1 - state.prev_deg.1,
        };
        state.prev_deg = now_deg;

        if delta == WheelEncoderDelta::default() {
            return;
        }

        let mut truth = integrate(state.truth, delta, &self.chassis);
        truth.theta_rad = util::maths::wrap_2pi(truth.theta_rad);
        state.truth = truth;

        for (i, sensor) in FLOOR_SENSORS.iter().enumerate() {
            let tile = tile_of(
                &self.field,
                floor_sensor_position(&self.geometry, &truth, *sensor),
            );
            if tile != state.tiles[i] {
                state.tiles[i] = tile;
                state.pending_edges[i] = true;
                trace!("SimWorld: {:?} floor sensor crossed into {:?}", sensor, tile);
            }
        }
    }

    /// Distance from the range sensor to the nearest wall or block straight ahead.
    fn cast_range(&self, truth: &Pose) -> f64 {
        let dir = Vector2::new(truth.theta_rad.cos(), truth.theta_rad.sin());
        let origin = truth.position() + dir * self.geometry.range_ahead_cm;

        let lo = self.field.low_wall_cm();
        let hi = self.field.high_wall_cm();

        let mut range = MAX_RANGE_CM;
        for i in 0..2 {
            let t = if dir[i] > 1e-12 {
                (hi - origin[i]) / dir[i]
            } else if dir[i] < -1e-12 {
                (lo - origin[i]) / dir[i]
            } else {
                continue;
            };
            range = range.min(t.max(0.0));
        }

        for block in &self.blocks {
            if let Some(t) = block.ray_hit(origin, dir) {
                range = range.min(t);
            }
        }

        range
    }
}

impl Sensors for SimWorld {
    fn front_range_cm(&self, _filter: Filter) -> f64 {
        let state = self.lock();
        self.cast_range(&state.truth)
    }

    fn floor_edge(&self, sensor: FloorSensor) -> bool {
        let i = match sensor {
            FloorSensor::Left => 0,
            FloorSensor::Right => 1,
            FloorSensor::Center => 2,
        };

        let mut state = self.lock();
        std::mem::replace(&mut state.pending_edges[i], false)
    }
}

impl PeriodicTask for SimWorld {
    fn name(&self) -> &'static str {
        "SimWorld"
    }

    fn period(&self) -> Duration {
        PHYSICS_PERIOD
    }

    fn gate(&self) -> Option<&dyn Pausable> {
        None
    }

    fn step(&self) {
        self.update()
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn floor_sensor_position(geometry: &SensorGeometry, pose: &Pose, sensor: FloorSensor) -> Point2<f64> {
    let forward = Vector2::new(pose.theta_rad.cos(), pose.theta_rad.sin());
    let leftward = Vector2::new(-forward.y, forward.x);

    let offset = match sensor {
        FloorSensor::Left => -forward * geometry.rear_behind_cm + leftward * geometry.rear_lateral_cm,
        FloorSensor::Right => {
            -forward * geometry.rear_behind_cm - leftward * geometry.rear_lateral_cm
        }
        FloorSensor::Center => -forward * geometry.centre_behind_cm,
    };

    pose.position() + offset
}

fn tile_of(field: &FieldParams, p: Point2<f64>) -> (i64, i64) {
    (
        (p.x / field.tile_length_cm).floor() as i64,
        (p.y / field.tile_length_cm).floor() as i64,
    )
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use eqpt_if::{Completion, Motor};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn world(start: Pose) -> (Arc<SimMotor>, Arc<SimMotor>, SimWorld) {
        let left = Arc::new(SimMotor::with_time_scale(1000.0));
        let right = Arc::new(SimMotor::with_time_scale(1000.0));
        let w = SimWorld::new(
            FieldParams::default(),
            ChassisParams::default(),
            SensorGeometry::default(),
            start,
            left.clone(),
            right.clone(),
        );
        (left, right, w)
    }

    #[test]
    fn test_range_to_walls_and_blocks() {
        let (_, _, w) = world(Pose::new(-15.24, -15.24, PI));

        // Facing the low X wall from the middle of the corner tile
        assert_relative_eq!(w.front_range_cm(Filter::Mean), 15.24 - 2.6, epsilon = 1e-9);

        let (_, _, w) = world(Pose::new(0.0, 0.0, 0.0));
        assert_eq!(w.front_range_cm(Filter::Mean), MAX_RANGE_CM);

        let w = w.with_block(Block::square(Point2::new(40.0, 0.0), 10.0));
        assert_relative_eq!(w.front_range_cm(Filter::Mean), 35.0 - 2.6, epsilon = 1e-9);

        // Looking past the block
        let (_, _, w) = world(Pose::new(0.0, 20.0, 0.0));
        let w = w.with_block(Block::square(Point2::new(40.0, 0.0), 10.0));
        assert_eq!(w.front_range_cm(Filter::Mean), MAX_RANGE_CM);
    }

    #[test]
    fn test_truth_follows_motors_and_edges_latch() {
        // Rear sensors just short of the line at y = 0, heading up
        let (left, right, w) = world(Pose::new(10.0, 10.0, FRAC_PI_2));
        assert!(!w.floor_edge(FloorSensor::Left));

        // Drive up 3 cm, the rear sensors at y - 11.9 cross y = 0
        let wheel_deg = (3.0 / 2.02f64).to_degrees();
        left.set_speed(300.0);
        right.set_speed(300.0);
        right.rotate(wheel_deg, Completion::Immediate);
        left.rotate(wheel_deg, Completion::Blocking);

        let truth = w.truth();
        assert_relative_eq!(truth.x_cm, 10.0, epsilon = 1e-9);
        assert_relative_eq!(truth.y_cm, 13.0, epsilon = 1e-9);

        assert!(w.floor_edge(FloorSensor::Left));
        assert!(w.floor_edge(FloorSensor::Right));
        assert!(!w.floor_edge(FloorSensor::Left));

        // The centre sensor, further back, is still short of the line
        assert!(!w.floor_edge(FloorSensor::Center));
    }
}
