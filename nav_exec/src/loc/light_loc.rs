//! Floor-line localiser
//!
//! Near a grid intersection, the robot spins in place and the centre floor sensor, mounted behind
//! the wheel axis, sweeps a circle crossing each of the two grid lines twice. Lines at even
//! detection indices run along Y and fix X, odd indices fix Y. Half the angle between the two
//! crossings of a line gives the distance to it, and their mean gives the heading error.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use eqpt_if::{FloorSensor, Sensors, Speaker};
use log::{debug, info, warn};
use nalgebra::Point2;
use thiserror::Error;
use util::maths::ccw_dist;

use super::LightLocParams;
use crate::{
    field::FieldParams,
    gate::{PauseScope, Switchable},
    loco::{Drivetrain, Spin},
    nav::Navigator,
    obstacle::ObstacleGuard,
    odom_corr::OdomCorr,
    pose::{Pose, PoseStore},
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Result of a floor-line localisation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightLocOutcome {
    /// The pose was corrected to the contained value.
    Localised(Pose),

    /// A line was missed or a spurious one seen, the pose was left untouched.
    Aborted {
        /// Angle between the first and last detected lines.
        ///
        /// Units: radians
        span_rad: f64,
    },
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Correction derived from four line detections.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineFix {
    /// Units: centimeters
    pub x_cm: f64,

    /// Units: centimeters
    pub y_cm: f64,

    /// Amount to add to the current heading.
    ///
    /// Units: radians
    pub theta_correction_rad: f64,
}

#[derive(Debug, Error, PartialEq)]
#[error("Line detections span {span_rad:.3} rad, more than the {max_rad:.3} rad allowed")]
pub struct SpanExceeded {
    pub span_rad: f64,
    pub max_rad: f64,
}

/// The floor-line localiser.
pub struct LightLoc {
    params: LightLocParams,
    field: FieldParams,
    pose: Arc<PoseStore>,
    sensors: Arc<dyn Sensors>,
    speaker: Arc<dyn Speaker>,
    drivetrain: Arc<Drivetrain>,
    nav: Arc<Navigator>,
    corrector: Arc<OdomCorr>,
    guard: Arc<ObstacleGuard>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LightLoc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: LightLocParams,
        field: FieldParams,
        pose: Arc<PoseStore>,
        sensors: Arc<dyn Sensors>,
        speaker: Arc<dyn Speaker>,
        drivetrain: Arc<Drivetrain>,
        nav: Arc<Navigator>,
        corrector: Arc<OdomCorr>,
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
            corrector,
            guard,
        }
    }

    /// Localise against the nearest grid intersection, optionally driving onto it afterwards.
    ///
    /// The guard, corrector and navigator are paused for the duration and each is put back in
    /// the state it was found in on return, whether localised or aborted. A component that was
    /// already paused stays paused.
    pub fn localise(&self, go_to_corner: bool) -> LightLocOutcome {
        let _guard = PauseScope::new(&*self.guard);
        let _corrector = PauseScope::new(&*self.corrector);
        let _nav = PauseScope::new(&*self.nav);

        let corner = self.field.nearest_grid_point(self.pose.read().position());
        info!("LightLoc: localising against ({:.2}, {:.2})", corner.x, corner.y);

        self.nav.turn_to(self.params.start_heading_rad);
        self.nav.set_running(true);
        self.nav.wait_while_navigating();
        self.nav.set_running(false);

        let angles = self.collect_lines();

        let fix = match compute_line_fix(angles, corner, &self.params) {
            Ok(f) => f,
            Err(e) => {
                warn!("LightLoc: aborted, {}", e);
                self.speaker.buzz();
                return LightLocOutcome::Aborted {
                    span_rad: e.span_rad,
                };
            }
        };

        let pose = self.pose.modify(|p| {
            p.x_cm = fix.x_cm;
            p.y_cm = fix.y_cm;
            p.theta_rad += fix.theta_correction_rad;
            *p
        });

        info!(
            "LightLoc: localised at ({:.2}, {:.2}, {:.4})",
            pose.x_cm, pose.y_cm, pose.theta_rad
        );

        if go_to_corner {
            self.nav.travel_to(corner.x, corner.y, false);
            self.nav.set_running(true);
            self.nav.wait_while_navigating();
            self.nav.set_running(false);
        }

        LightLocOutcome::Localised(pose)
    }

    /// Spin counter-clockwise until the centre sensor has crossed four lines, returning the
    /// heading at each crossing.
    fn collect_lines(&self) -> [f64; 4] {
        let wait = Duration::from_millis(self.params.wait_time_ms);
        let poll = Duration::from_millis(self.params.poll_interval_ms);

        let mut angles = [0.0; 4];
        let mut found = 0;
        let mut last_line: Option<Instant> = None;

        self.drivetrain.spin(Spin::Ccw, self.params.spin_speed_degs);

        while found < angles.len() {
            let debounced = last_line.map_or(true, |t| t.elapsed() >= wait);

            if self.sensors.floor_edge(FloorSensor::Center) && debounced {
                last_line = Some(Instant::now());
                angles[found] = self.pose.read().theta_rad;
                debug!("LightLoc: line {} at {:.4} rad", found, angles[found]);
                found += 1;
                self.speaker.beep();
            } else {
                thread::sleep(poll);
            }
        }

        self.drivetrain.stop();

        angles
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the pose correction from the headings at which four successive lines were crossed
/// while spinning counter-clockwise around `corner`.
pub fn compute_line_fix(
    angles: [f64; 4],
    corner: Point2<f64>,
    params: &LightLocParams,
) -> Result<LineFix, SpanExceeded> {
    // Unwrap the headings so they increase monotonically from the first detection
    let mut a = angles;
    for i in 1..a.len() {
        a[i] = a[i - 1] + ccw_dist(angles[i - 1], angles[i]);
    }

    let span_rad = a[3] - a[0];
    if span_rad > params.max_line_span_rad {
        return Err(SpanExceeded {
            span_rad,
            max_rad: params.max_line_span_rad,
        });
    }

    let theta_y = (a[0] - a[2]) / 2.0;
    let theta_x = (a[1] - a[3]) / 2.0;

    Ok(LineFix {
        x_cm: corner.x - params.sensor_offset_cm * theta_y.cos(),
        y_cm: corner.y - params.sensor_offset_cm * theta_x.cos(),
        theta_correction_rad: PI - (a[0] + a[2]) / 2.0,
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
