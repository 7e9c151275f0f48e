//! # Obstacle guard
//!
//! Watches the forward range reading while the navigator is driving toward a target. When
//! something comes within range the guard takes the drivetrain from the navigator and performs a
//! fixed blind swerve: turn away, drive a short leg, turn back part of the way, drive a second
//! leg. The navigator is then sent to its original final target along an axis-aligned route.
//!
//! The swerve assumes a single block-sized obstacle and is not sensor guided. Once started it
//! runs to completion: pausing the guard waits for it, then prevents the next detection. The
//! navigator and corrector are left in the state the swerve found them in.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;
use std::time::Duration;

use eqpt_if::{Filter, Sensors};
use log::{debug, info};

use crate::{
    gate::{Pausable, PauseScope, RunGate, Switchable},
    loco::{ChassisParams, Drivetrain},
    nav::Navigator,
    odom_corr::OdomCorr,
    pose::PoseStore,
    sched::PeriodicTask,
};

pub use params::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The obstacle detector and swerve executor.
pub struct ObstacleGuard {
    params: ObstacleParams,
    chassis: ChassisParams,
    pose: Arc<PoseStore>,
    sensors: Arc<dyn Sensors>,
    drivetrain: Arc<Drivetrain>,
    nav: Arc<Navigator>,
    corrector: Arc<OdomCorr>,
    gate: RunGate<GuardState>,
}

#[derive(Debug, Default)]
struct GuardState {
    avoiding: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ObstacleGuard {
    /// Create a new guard, initially paused.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: ObstacleParams,
        chassis: ChassisParams,
        pose: Arc<PoseStore>,
        sensors: Arc<dyn Sensors>,
        drivetrain: Arc<Drivetrain>,
        nav: Arc<Navigator>,
        corrector: Arc<OdomCorr>,
    ) -> Self {
        Self {
            params,
            chassis,
            pose,
            sensors,
            drivetrain,
            nav,
            corrector,
            gate: RunGate::new(GuardState::default(), false),
        }
    }

    /// True while a swerve is in progress.
    pub fn is_avoiding(&self) -> bool {
        self.gate.read(|s| s.avoiding)
    }

    /// Block until any swerve in progress has completed.
    pub fn wait_while_avoiding(&self) {
        self.gate.wait_while(|s| s.avoiding, None);
    }

    /// Execute one detection cycle, swerving if an obstacle is in the way.
    ///
    /// Returns `true` if a swerve was performed.
    pub fn update(&self) -> bool {
        let range_cm = self.gate.cycle(|state| {
            if !self.nav.is_running() || !self.nav.is_navigating() {
                return None;
            }

            let range_cm = self.sensors.front_range_cm(Filter::Mean);
            if range_cm < self.params.threshold_cm {
                state.avoiding = true;
                Some(range_cm)
            } else {
                None
            }
        });

        match range_cm.flatten() {
            Some(r) => {
                info!("ObstacleGuard: obstacle at {:.1} cm, swerving", r);
                self.swerve();
                self.gate.with(|s| s.avoiding = false);
                true
            }
            None => false,
        }
    }

    fn swerve(&self) {
        let p = &self.params;

        let _corrector = PauseScope::new(&*self.corrector);

        // Hold position so the navigator stops commanding the wheels
        let target = self.nav.final_target();
        let here = self.pose.read();
        self.nav.travel_to(here.x_cm, here.y_cm, false);
        let nav = PauseScope::new(&*self.nav);

        let dt = &self.drivetrain;
        dt.rotate_by(p.first_turn_rad, p.swerve_speed_degs, &self.chassis);
        dt.advance(p.first_leg_deg, p.swerve_speed_degs);
        dt.rotate_by(p.second_turn_rad, p.swerve_speed_degs, &self.chassis);
        dt.advance(p.second_leg_deg, p.swerve_speed_degs);

        debug!(
            "ObstacleGuard: swerve done, resuming toward ({:.2}, {:.2})",
            target.x, target.y
        );

        self.nav.travel_to_square(target.x, target.y, false, false);
        drop(nav);
    }
}

impl Switchable for ObstacleGuard {
    fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    /// Pausing blocks until any swerve already under way has finished, so the caller owns the
    /// drivetrain once this returns.
    fn set_running(&self, running: bool) {
        self.gate.set_running(running, |_, _| ());
        if !running {
            self.gate.wait_while(|s| s.avoiding, None);
        }
        debug!("ObstacleGuard running: {}", running);
    }
}

impl PeriodicTask for ObstacleGuard {
    fn name(&self) -> &'static str {
        "ObstacleGuard"
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
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        field::FieldParams,
        nav::NavParams,
        odom_corr::OdomCorrParams,
        pose::Pose,
        sim::{ScriptedSensors, SimMotor, SimSpeaker},
    };
    use approx::assert_relative_eq;
    use eqpt_if::Motor;
    use nalgebra::Point2;
    use std::thread;

    struct Rig {
        sensors: Arc<ScriptedSensors>,
        left: Arc<SimMotor>,
        right: Arc<SimMotor>,
        nav: Arc<Navigator>,
        corrector: Arc<OdomCorr>,
        guard: ObstacleGuard,
    }

    fn rig() -> Rig {
        rig_scaled(1000.0)
    }

    fn rig_scaled(time_scale: f64) -> Rig {
        let pose = Arc::new(PoseStore::new(Pose::new(40.0, 15.0, 0.0)));
        let sensors = Arc::new(ScriptedSensors::new());
        let left = Arc::new(SimMotor::with_time_scale(time_scale));
        let right = Arc::new(SimMotor::with_time_scale(time_scale));
        let drivetrain = Arc::new(Drivetrain::new(left.clone(), right.clone()));
        let corrector = Arc::new(OdomCorr::new(
            OdomCorrParams::default(),
            &FieldParams::default(),
            pose.clone(),
            sensors.clone(),
            Arc::new(SimSpeaker::default()),
        ));
        let nav = Arc::new(Navigator::new(
            NavParams::default(),
            pose.clone(),
            drivetrain.clone(),
            corrector.clone(),
        ));
        let guard = ObstacleGuard::new(
            ObstacleParams::default(),
            ChassisParams::default(),
            pose,
            sensors.clone(),
            drivetrain,
            nav.clone(),
            corrector.clone(),
        );

        Rig {
            sensors,
            left,
            right,
            nav,
            corrector,
            guard,
        }
    }

    #[test]
    fn test_swerve_round_trip() {
        let r = rig();
        r.guard.set_running(true);
        r.corrector.set_running(true);
        r.nav.travel_to_square(150.0, 90.0, false, true);
        r.nav.set_running(true);

        // Range dips under the threshold once, then recovers
        r.sensors.push_ranges(&[15.0, 100.0]);

        assert!(r.guard.update());
        assert!(!r.guard.is_avoiding());
        assert_eq!(r.nav.final_target(), Point2::new(150.0, 90.0));
        assert!(r.nav.is_running() && r.nav.is_navigating());
        assert!(r.corrector.is_running());

        // Open loop manoeuvre: opposite wheel rotations for the turns, equal for the legs
        let chassis = ChassisParams::default();
        let turns = chassis.spin_to_wheel_deg(1.35) + chassis.spin_to_wheel_deg(-0.45);
        assert_relative_eq!(r.right.position_deg(), turns + 1150.0, epsilon = 1e-6);
        assert_relative_eq!(r.left.position_deg(), -turns + 1150.0, epsilon = 1e-6);

        // Recovered reading, nothing more to do
        assert!(!r.guard.update());
    }

    #[test]
    fn test_ignores_obstacles_when_not_navigating() {
        let r = rig();
        r.guard.set_running(true);
        r.sensors.push_ranges(&[5.0]);

        // Navigator paused
        r.nav.travel_to(100.0, 15.0, false);
        assert!(!r.guard.update());

        // Navigator running but idle
        r.nav.set_running(true);
        r.nav.turn_to(0.0);
        r.nav.update();
        assert!(!r.nav.is_navigating());
        assert!(!r.guard.update());

        // Guard paused
        r.nav.travel_to(100.0, 15.0, false);
        r.guard.set_running(false);
        assert!(!r.guard.update());

        r.guard.wait_while_avoiding();
        assert_eq!(r.left.position_deg(), 0.0);
    }

    #[test]
    fn test_swerve_leaves_paused_corrector_paused() {
        let r = rig();
        r.guard.set_running(true);
        r.nav.travel_to(150.0, 15.0, false);
        r.nav.set_running(true);
        r.sensors.push_ranges(&[15.0, 100.0]);

        assert!(r.guard.update());
        assert!(r.nav.is_running());
        assert!(!r.corrector.is_running());
    }

    #[test]
    fn test_pause_waits_for_swerve_in_progress() {
        let r = rig_scaled(10.0);
        r.guard.set_running(true);
        r.corrector.set_running(true);
        r.nav.travel_to(150.0, 15.0, false);
        r.nav.set_running(true);
        r.sensors.push_ranges(&[15.0, 100.0]);

        thread::scope(|s| {
            let swerve = s.spawn(|| r.guard.update());

            while !r.guard.is_avoiding() {
                thread::sleep(Duration::from_millis(1));
            }

            // Take the drivetrain the way a localiser does
            let guard = PauseScope::new(&r.guard);
            assert!(!r.guard.is_avoiding());
            assert!(guard.was_running());

            let corrector = PauseScope::new(&*r.corrector);
            let nav = PauseScope::new(&*r.nav);
            assert!(swerve.join().unwrap());

            thread::sleep(Duration::from_millis(20));
            assert!(!r.nav.is_running());
            assert!(!r.corrector.is_running());
            assert_eq!(r.left.commanded_speed(), 0.0);
            assert_eq!(r.right.commanded_speed(), 0.0);

            drop(nav);
            drop(corrector);
            drop(guard);
        });

        assert!(r.nav.is_running());
        assert!(r.corrector.is_running());
        assert!(r.guard.is_running());
        assert_eq!(r.nav.final_target(), Point2::new(150.0, 15.0));
    }
}
