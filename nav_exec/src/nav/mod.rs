//! # Navigator
//!
//! Pausable periodic loop steering the drivetrain toward the points of a [`WaypointQueue`], or
//! toward a fixed heading, using the pose store as feedback.
//!
//! Each cycle the navigator either rotates in place until the heading error is within tolerance,
//! or drives straight toward the current target with a speed that grows with the squared distance
//! left to cover. Reaching a target moves on to the next point of the queue, reaching the last
//! one stops the motors and leaves the navigator idle.
//!
//! An unreachable target is not an error, the navigator keeps trying for as long as it runs.
//! Callers needing a deadline use the `_timeout` waits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod queue;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::{PI, TAU};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use nalgebra::Point2;
use util::maths::{lin_map, wrap_2pi};

use crate::{
    gate::{Pausable, RunGate, Switchable},
    loco::{Drivetrain, Heading, Spin},
    odom_corr::OdomCorr,
    pose::PoseStore,
    sched::PeriodicTask,
};

pub use params::*;
pub use queue::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the navigator is currently trying to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NavMode {
    /// No target, motors left alone.
    Idle,

    /// Pursuing the queue's points in order.
    SeekingPoint,

    /// Rotating to a fixed heading, no translation.
    TurningToHeading,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The waypoint navigator.
pub struct Navigator {
    params: NavParams,
    pose: Arc<PoseStore>,
    drivetrain: Arc<Drivetrain>,
    corrector: Arc<OdomCorr>,
    gate: RunGate<NavState>,
}

/// Cycle state owned by the navigator's gate.
#[derive(Debug, Default)]
struct NavState {
    queue: WaypointQueue,
    navigating: bool,
    turning: bool,

    /// Units: radians, in [0, 2pi)
    target_theta: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Navigator {
    /// Create a new navigator, initially paused and idle.
    pub fn new(
        params: NavParams,
        pose: Arc<PoseStore>,
        drivetrain: Arc<Drivetrain>,
        corrector: Arc<OdomCorr>,
    ) -> Self {
        Self {
            params,
            pose,
            drivetrain,
            corrector,
            gate: RunGate::new(NavState::default(), false),
        }
    }

    // ---- COMMANDS ----

    /// Go straight to a single point.
    pub fn travel_to(&self, x_cm: f64, y_cm: f64, backwards: bool) {
        self.set_queue(WaypointQueue::single(Point2::new(x_cm, y_cm), backwards));
    }

    /// Go to a point moving along one axis at a time.
    ///
    /// With `y_first` the robot travels along Y before X, otherwise X before Y.
    pub fn travel_to_square(&self, x_cm: f64, y_cm: f64, backwards: bool, y_first: bool) {
        let from = self.pose.read().position();
        self.set_queue(WaypointQueue::square(
            from,
            Point2::new(x_cm, y_cm),
            backwards,
            y_first,
        ));
    }

    /// Rotate in place to the given heading, then stop.
    pub fn turn_to(&self, theta_rad: f64) {
        let theta_rad = wrap_2pi(theta_rad);

        self.gate.with(|state| {
            state.target_theta = theta_rad;
            state.turning = true;
            state.navigating = true;
        });

        debug!("Navigator: turn to {:.4} rad", theta_rad);
    }

    fn set_queue(&self, queue: WaypointQueue) {
        debug!(
            "Navigator: travel to {:?}{}",
            queue.points(),
            if queue.backwards { " backwards" } else { "" }
        );

        self.gate.with(|state| {
            state.queue = queue;
            state.navigating = true;
            state.turning = false;
        });
    }

    // ---- STATUS ----

    pub fn is_navigating(&self) -> bool {
        self.gate.read(|s| s.navigating)
    }

    pub fn is_turning(&self) -> bool {
        self.gate.read(|s| s.turning)
    }

    pub fn mode(&self) -> NavMode {
        self.gate.read(NavState::mode)
    }

    /// The point currently being pursued.
    pub fn target(&self) -> Point2<f64> {
        self.gate.read(|s| s.queue.target())
    }

    /// The last point of the current queue.
    pub fn final_target(&self) -> Point2<f64> {
        self.gate.read(|s| s.queue.final_target())
    }

    /// The heading the navigator is currently steering to.
    pub fn target_theta(&self) -> f64 {
        self.gate.read(|s| s.target_theta)
    }

    /// Consistent copy of the whole queue.
    pub fn queue_snapshot(&self) -> WaypointQueue {
        self.gate.read(|s| s.queue.clone())
    }

    // ---- WAITS ----

    pub fn wait_while_navigating(&self) {
        self.gate.wait_while(|s| s.navigating, None);
    }

    /// Returns `false` if the navigator was still navigating when the timeout elapsed.
    pub fn wait_while_navigating_timeout(&self, timeout: Duration) -> bool {
        self.gate.wait_while(|s| s.navigating, Some(timeout))
    }

    pub fn wait_while_turning(&self) {
        self.gate.wait_while(|s| s.turning, None);
    }

    /// Returns `false` if the navigator was still turning when the timeout elapsed.
    pub fn wait_while_turning_timeout(&self, timeout: Duration) -> bool {
        self.gate.wait_while(|s| s.turning, Some(timeout))
    }

    // ---- CYCLE ----

    /// Execute one navigation cycle, doing nothing if paused.
    pub fn update(&self) {
        self.gate.cycle(|state| self.cycle(state));
    }

    fn cycle(&self, state: &mut NavState) {
        if !state.navigating {
            return;
        }

        let pose = self.pose.read();
        let target = state.queue.target();
        let p = &self.params;

        if !state.turning {
            let mut theta = (pose.y_cm - target.y).atan2(pose.x_cm - target.x) - PI;
            if state.queue.backwards {
                theta += PI;
            }
            state.target_theta = wrap_2pi(theta);
        }

        let err = pose.theta_rad - state.target_theta;
        let away = (pose.x_cm - target.x).abs() > p.dist_tolerance_cm
            || (pose.y_cm - target.y).abs() > p.dist_tolerance_cm;

        trace!(
            "Navigator: target ({:.2}, {:.2}, {:.4}), heading error {:.4}",
            target.x,
            target.y,
            state.target_theta,
            err
        );

        if !away && !state.turning {
            if state.queue.advance() {
                debug!("Navigator: moving on to {:?}", state.queue.target());
            } else {
                self.drivetrain.stop();
                state.navigating = false;
                debug!("Navigator: reached ({:.2}, {:.2})", target.x, target.y);
            }
            return;
        }

        let abs_err = err.abs();
        if abs_err > p.angle_tolerance_rad && abs_err < TAU - p.angle_tolerance_rad {
            let speed = lin_map(
                (0.0, p.rotation_speed_scale_rad),
                (p.min_rotation_speed_degs, p.max_rotation_speed_degs),
                abs_err,
            )
            .min(p.max_rotation_speed_degs);

            // Take the shorter way round
            let dir = if (err > 0.0 && err < PI) || err < -PI {
                Spin::Cw
            } else {
                Spin::Ccw
            };
            self.drivetrain.spin(dir, speed);

            // Samples taken before a rotation no longer describe the same line
            self.corrector.reset();
        } else if state.turning {
            self.drivetrain.stop();
            state.turning = false;
            state.navigating = false;
            state.queue = WaypointQueue::single(pose.position(), false);
            debug!("Navigator: reached heading {:.4}", state.target_theta);
        } else {
            let dist2 = (pose.x_cm - target.x).powi(2) + (pose.y_cm - target.y).powi(2);
            let speed = lin_map(
                (0.0, p.move_speed_scale_cm2),
                (p.min_move_speed_degs, p.max_move_speed_degs),
                dist2,
            )
            .min(p.max_move_speed_degs);

            let heading = if state.queue.backwards {
                Heading::Backward
            } else {
                Heading::Forward
            };
            self.drivetrain
                .drive(heading, speed * (1.0 + p.left_adjustment), speed);
        }
    }
}

impl NavState {
    fn mode(&self) -> NavMode {
        match (self.navigating, self.turning) {
            (false, _) => NavMode::Idle,
            (true, true) => NavMode::TurningToHeading,
            (true, false) => NavMode::SeekingPoint,
        }
    }
}

impl Switchable for Navigator {
    fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    /// Pause or resume, stopping the motors inside the same critical section when pausing.
    fn set_running(&self, running: bool) {
        let drivetrain = &self.drivetrain;
        self.gate.set_running(running, |running, _| {
            if !running {
                drivetrain.stop();
            }
        });
        debug!("Navigator running: {}", running);
    }
}

impl PeriodicTask for Navigator {
    fn name(&self) -> &'static str {
        "Navigator"
    }

    fn period(&self) -> Duration {
        Duration::from_millis(self.params.period_ms)
    }

    fn gate(&self) -> Option<&dyn Pausable> {
        Some(&self.gate)
    }

    fn step(&self) {
        self.update()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        field::FieldParams,
        odom_corr::OdomCorrParams,
        pose::{Pose, PoseMask},
        sched::{self, ShutdownFlag},
        sim::{ScriptedSensors, SimMotor, SimSpeaker},
    };
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;
    use std::thread;
    use std::time::Instant;

    struct Rig {
        pose: Arc<PoseStore>,
        drivetrain: Arc<Drivetrain>,
        nav: Navigator,
    }

    fn rig(params: NavParams) -> Rig {
        let pose = Arc::new(PoseStore::new(Pose::default()));
        let drivetrain = Arc::new(Drivetrain::new(
            Arc::new(SimMotor::with_time_scale(1.0)),
            Arc::new(SimMotor::with_time_scale(1.0)),
        ));
        let corrector = Arc::new(OdomCorr::new(
            OdomCorrParams::default(),
            &FieldParams::default(),
            pose.clone(),
            Arc::new(ScriptedSensors::new()),
            Arc::new(SimSpeaker::default()),
        ));
        let nav = Navigator::new(params, pose.clone(), drivetrain.clone(), corrector);

        Rig {
            pose,
            drivetrain,
            nav,
        }
    }

    fn fast_params() -> NavParams {
        NavParams {
            period_ms: 1,
            ..NavParams::default()
        }
    }

    #[test]
    fn test_idle_issues_no_commands() {
        let r = rig(NavParams::default());
        r.nav.set_running(true);

        r.drivetrain.spin(Spin::Ccw, 50.0);
        r.nav.update();

        assert_eq!(r.nav.mode(), NavMode::Idle);
        assert_eq!(r.drivetrain.commanded_speeds(), (-50.0, 50.0));
    }

    #[test]
    fn test_drive_speed_and_bias() {
        let r = rig(NavParams::default());
        r.nav.set_running(true);

        r.nav.travel_to(10.0, 0.0, false);
        r.nav.update();

        // 100 cm^2 to go: 115 + 100 / 250 * 185
        let (l, rt) = r.drivetrain.commanded_speeds();
        assert_relative_eq!(rt, 189.0);
        assert_relative_eq!(l, 189.0 * 1.05);
        assert_relative_eq!(r.nav.target_theta(), 0.0);

        // Backwards: rear leads, so the robot first has to turn round
        r.nav.travel_to(10.0, 0.0, true);
        r.nav.update();
        assert_relative_eq!(r.nav.target_theta(), PI);
        let (l, rt) = r.drivetrain.commanded_speeds();
        assert!(l > 0.0 && rt < 0.0 || l < 0.0 && rt > 0.0);

        r.pose.write(Pose::new(0.0, 0.0, PI), PoseMask::ALL);
        r.nav.update();
        let (l, rt) = r.drivetrain.commanded_speeds();
        assert_relative_eq!(rt, -189.0);
        assert_relative_eq!(l, -189.0 * 1.05);
    }

    #[test]
    fn test_rotation_direction_and_speed() {
        let r = rig(NavParams::default());
        r.nav.set_running(true);

        // Target straight up: error of -pi/2, turn counter-clockwise at the capped speed
        r.nav.travel_to(0.0, 50.0, false);
        r.nav.update();
        assert_eq!(r.drivetrain.commanded_speeds(), (-110.0, 110.0));

        // Small error to the left of the target: turn clockwise, slowly
        r.pose.write(Pose::new(0.0, 0.0, FRAC_PI_2 + 0.2), PoseMask::ALL);
        r.nav.update();
        let speed = 60.0 + 0.2 / (PI / 3.0) * 50.0;
        let (l, rt) = r.drivetrain.commanded_speeds();
        assert_relative_eq!(l, speed);
        assert_relative_eq!(rt, -speed);

        // Error just short of a full turn counts as aligned
        r.pose.write(Pose::new(0.0, 0.0, FRAC_PI_2 - 0.01), PoseMask::ALL);
        r.nav.update();
        let (l, rt) = r.drivetrain.commanded_speeds();
        assert!(l > 0.0 && rt > 0.0);
    }

    #[test]
    fn test_square_route_completes() {
        let r = rig(NavParams::default());
        r.nav.set_running(true);

        r.nav.travel_to_square(30.0, 60.0, false, false);
        assert_eq!(r.nav.mode(), NavMode::SeekingPoint);
        assert_eq!(r.nav.target(), Point2::new(30.0, 0.0));
        assert_eq!(r.nav.final_target(), Point2::new(30.0, 60.0));

        r.pose.write(Pose::new(30.2, -0.3, 0.0), PoseMask::ALL);
        r.nav.update();
        assert_eq!(r.nav.target(), Point2::new(30.0, 60.0));
        assert!(r.nav.is_navigating());

        r.pose.write(Pose::new(30.0, 60.5, FRAC_PI_2), PoseMask::ALL);
        r.nav.update();
        assert!(!r.nav.is_navigating());
        assert!(r.drivetrain.is_stopped());
        assert!(r.nav.wait_while_navigating_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_turn_to_heading() {
        let r = rig(NavParams::default());
        r.nav.set_running(true);
        r.pose.write(Pose::new(5.0, 6.0, 0.0), PoseMask::ALL);

        r.nav.turn_to(FRAC_PI_2 + TAU);
        assert_eq!(r.nav.mode(), NavMode::TurningToHeading);
        assert_relative_eq!(r.nav.target_theta(), FRAC_PI_2, epsilon = 1e-12);

        r.nav.update();
        assert_eq!(r.drivetrain.commanded_speeds(), (-110.0, 110.0));

        r.pose.write(Pose::new(5.0, 6.0, FRAC_PI_2 + 0.01), PoseMask::ALL);
        r.nav.update();
        assert_eq!(r.nav.mode(), NavMode::Idle);
        assert!(!r.nav.is_turning());
        assert!(r.drivetrain.is_stopped());
        assert_eq!(r.nav.final_target(), Point2::new(5.0, 6.0));
    }

    #[test]
    fn test_queue_atomicity() {
        let r = rig(fast_params());
        let shutdown = ShutdownFlag::default();

        // Both targets lie on the diagonal through the origin, a cycle mixing their
        // coordinates would steer off it
        let allowed = [0.0, PI / 4.0, 5.0 * PI / 4.0];

        let deadline = Instant::now() + Duration::from_millis(200);

        thread::scope(|s| {
            sched::spawn(s, &r.nav, &shutdown);
            r.nav.set_running(true);

            s.spawn(|| {
                let mut flip = false;
                while Instant::now() < deadline {
                    if flip {
                        r.nav.travel_to(100.0, 100.0, false);
                    } else {
                        r.nav.travel_to(-100.0, -100.0, false);
                    }
                    flip = !flip;
                }
            });

            while Instant::now() < deadline {
                let theta = r.nav.target_theta();
                assert!(
                    allowed.iter().any(|a| (theta - a).abs() < 1e-9),
                    "mixed target heading {}",
                    theta
                );

                let q = r.nav.queue_snapshot();
                assert_eq!(q.target().x, q.target().y);
            }

            shutdown.request();
        });
    }

    #[test]
    fn test_pause_stops_motors() {
        let r = rig(fast_params());
        let shutdown = ShutdownFlag::default();

        thread::scope(|s| {
            sched::spawn(s, &r.nav, &shutdown);

            for _ in 0..20 {
                r.nav.travel_to(200.0, 0.0, false);
                r.nav.set_running(true);
                thread::sleep(Duration::from_millis(3));

                r.nav.set_running(false);
                assert_eq!(r.drivetrain.commanded_speeds(), (0.0, 0.0));
            }

            shutdown.request();
        });
    }

    #[test]
    fn test_unreachable_target_idles_until_deadline() {
        let r = rig(fast_params());
        let shutdown = ShutdownFlag::default();

        thread::scope(|s| {
            sched::spawn(s, &r.nav, &shutdown);

            // Nothing integrates the wheel motion, so the target is never reached
            r.nav.travel_to(500.0, 500.0, false);
            r.nav.set_running(true);

            assert!(!r.nav.wait_while_navigating_timeout(Duration::from_millis(50)));
            assert_eq!(r.nav.mode(), NavMode::SeekingPoint);
            assert!(!r.drivetrain.is_stopped());

            r.nav.set_running(false);
            shutdown.request();
        });
    }
}
