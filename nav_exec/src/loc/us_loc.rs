//! Wall-angle localiser
//!
//! The robot starts on the diagonal of a corner tile. Rotating one way then the other, it latches
//! the heading at which each of the two corner walls comes into range. The walls are 90 degrees
//! apart, so the bisector of the two latched headings gives the absolute heading. The robot then
//! faces each wall in turn and uses the range reading to fix its X and Y coordinates.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use eqpt_if::{Filter, Sensors, Speaker};
use log::{debug, info};
use nalgebra::Point2;

use super::UsLocParams;
use crate::{
    field::{Corner, FieldParams},
    gate::{PauseScope, Switchable},
    loco::{Drivetrain, Spin},
    nav::Navigator,
    obstacle::ObstacleGuard,
    pose::{Pose, PoseMask, PoseStore},
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Which of the two walls across an axis the robot is facing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wall {
    /// The wall at `-tile_length_cm`.
    Low,

    /// The wall at `(map_tile_size - 1) * tile_length_cm`.
    High,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One range measurement of the position-fixing step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WallSighting {
    /// Heading to face the wall.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// The coordinate the reading fixes.
    pub axis: Axis,

    pub wall: Wall,
}

/// The wall-angle localiser.
pub struct UsLoc {
    params: UsLocParams,
    field: FieldParams,
    pose: Arc<PoseStore>,
    sensors: Arc<dyn Sensors>,
    speaker: Arc<dyn Speaker>,
    drivetrain: Arc<Drivetrain>,
    nav: Arc<Navigator>,
    guard: Arc<ObstacleGuard>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl UsLoc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: UsLocParams,
        field: FieldParams,
        pose: Arc<PoseStore>,
        sensors: Arc<dyn Sensors>,
        speaker: Arc<dyn Speaker>,
        drivetrain: Arc<Drivetrain>,
        nav: Arc<Navigator>,
        guard: Arc<ObstacleGuard>,
    ) -> Self {
        Self {
            params,
            field,
            pose,
            sensors,
            speaker,
            drivetrain,
            nav,
            guard,
        }
    }

    /// Localise from the given starting corner, then drive to the corner's interior grid point.
    ///
    /// Returns the pose written once the walls have been measured.
    pub fn localise(&self, corner: Corner) -> Pose {
        info!("UsLoc: localising in {}", corner);

        // The guard would see the walls as obstacles during the navigator's turns
        let _guard = PauseScope::new(&*self.guard);
        let _nav = PauseScope::new(&*self.nav);

        // ---- HEADING ----

        let (a, b) = self.scan_walls();
        let correction = heading_correction(a, b, &self.params)
            + self.params.heading_trim_rad
            + corner.quarter_turns() as f64 * FRAC_PI_2;
        let theta = self.pose.modify(|p| {
            p.theta_rad += correction;
            p.theta_rad
        });

        debug!(
            "UsLoc: walls latched at {:.4} and {:.4} rad, heading now {:.4}",
            a, b, theta
        );

        // ---- POSITION ----

        let mut fix = Pose::default();
        self.nav.set_running(true);
        for sighting in &scan_plan(corner) {
            self.nav.turn_to(sighting.heading_rad);
            self.nav.wait_while_turning();

            let range_cm = self.sensors.front_range_cm(Filter::Mean);
            let coord = wall_coordinate(sighting.wall, range_cm, &self.params, &self.field);
            match sighting.axis {
                Axis::X => fix.x_cm = coord,
                Axis::Y => fix.y_cm = coord,
            }

            debug!(
                "UsLoc: {:?} wall at {:.1} cm, {:?} = {:.2}",
                sighting.wall, range_cm, sighting.axis, coord
            );
        }
        self.nav.set_running(false);

        self.pose.write(fix, PoseMask::XY);
        let pose = self.pose.read();
        self.speaker.beep();

        info!(
            "UsLoc: localised at ({:.2}, {:.2}, {:.4})",
            pose.x_cm, pose.y_cm, pose.theta_rad
        );

        // ---- MOVE TO GRID ----

        let target = interior_corner(corner, &self.field);
        self.nav.travel_to(target.x, target.y, false);
        self.nav.set_running(true);
        self.nav.wait_while_navigating();
        self.nav.set_running(false);

        pose
    }

    /// Latch the headings at which the two walls come into range, returned in detection order.
    fn scan_walls(&self) -> (f64, f64) {
        let p = &self.params;

        self.drivetrain.spin(Spin::Ccw, p.rotation_speed_degs);
        self.wait_range_while(|r| r < p.wall_distance_cm);
        self.wait_range_while(|r| r > p.wall_distance_cm);
        let a = self.pose.read().theta_rad;

        self.drivetrain.spin(Spin::Cw, p.rotation_speed_degs);
        thread::sleep(Duration::from_millis(p.cooldown_ms));
        self.wait_range_while(|r| r < p.wall_distance_cm);
        self.wait_range_while(|r| r > p.wall_distance_cm);
        let b = self.pose.read().theta_rad;

        self.drivetrain.stop();

        (a, b)
    }

    fn wait_range_while<F>(&self, condition: F)
    where
        F: Fn(f64) -> bool,
    {
        let poll = Duration::from_millis(self.params.poll_interval_ms);
        while condition(self.sensors.front_range_cm(Filter::Mean)) {
            thread::sleep(poll);
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Heading offset from the two latched wall headings.
///
/// The reference angle depends on which wall was latched at the lower heading.
pub fn heading_correction(a_rad: f64, b_rad: f64, params: &UsLocParams) -> f64 {
    let reference_deg = if a_rad < b_rad {
        params.reference_low_deg
    } else {
        params.reference_high_deg
    };

    reference_deg.to_radians() - (a_rad + b_rad) / 2.0
}

/// The two walls measured from each corner, in measurement order.
pub fn scan_plan(corner: Corner) -> [WallSighting; 2] {
    let s = |heading_rad, axis, wall| WallSighting {
        heading_rad,
        axis,
        wall,
    };

    match corner.number() {
        1 => [s(3.0 * FRAC_PI_2, Axis::Y, Wall::Low), s(PI, Axis::X, Wall::Low)],
        2 => [s(0.0, Axis::X, Wall::High), s(3.0 * FRAC_PI_2, Axis::Y, Wall::Low)],
        3 => [s(FRAC_PI_2, Axis::Y, Wall::High), s(0.0, Axis::X, Wall::High)],
        _ => [s(PI, Axis::X, Wall::Low), s(FRAC_PI_2, Axis::Y, Wall::High)],
    }
}

/// Coordinate of the robot along the axis of a wall it is facing at the given range.
pub fn wall_coordinate(wall: Wall, range_cm: f64, params: &UsLocParams, field: &FieldParams) -> f64 {
    let dist_cm = range_cm + params.sensor_offset_cm;

    match wall {
        Wall::Low => field.low_wall_cm() + dist_cm,
        Wall::High => field.high_wall_cm() - dist_cm,
    }
}

/// The grid intersection at the inner corner of the starting tile.
pub fn interior_corner(corner: Corner, field: &FieldParams) -> Point2<f64> {
    let far = (field.map_tile_size as f64 - 2.0) * field.tile_length_cm;

    match corner.number() {
        1 => Point2::new(0.0, 0.0),
        2 => Point2::new(far, 0.0),
        3 => Point2::new(far, far),
        _ => Point2::new(0.0, far),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
