//! # Robot assembly
//!
//! Builds every component around one shared pose store and one drivetrain, and runs the periodic
//! components on their own threads for the lifetime of an application closure.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use std::thread;

use eqpt_if::{Motor, Sensors, Speaker};
use log::{info, warn};
use serde::de::DeserializeOwned;
use thiserror::Error;
use util::params::LoadError;

use crate::{
    field::FieldParams,
    loc::{LightLoc, LightLocParams, UsLoc, UsLocParams},
    loco::{ChassisParams, Drivetrain},
    nav::{NavParams, Navigator},
    obstacle::{ObstacleGuard, ObstacleParams},
    odom_corr::{OdomCorr, OdomCorrParams},
    odometer::{Odometer, OdometerParams},
    pose::{Pose, PoseStore},
    sched::{self, PeriodicTask, ShutdownFlag},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Every parameter set of the robot.
#[derive(Debug, Clone, Default)]
pub struct RobotParams {
    pub chassis: ChassisParams,
    pub field: FieldParams,
    pub odometer: OdometerParams,
    pub odom_corr: OdomCorrParams,
    pub nav: NavParams,
    pub obstacle: ObstacleParams,
    pub us_loc: UsLocParams,
    pub light_loc: LightLocParams,
}

/// Hardware the robot is built on.
pub struct Equipment {
    pub left: Arc<dyn Motor>,
    pub right: Arc<dyn Motor>,
    pub sensors: Arc<dyn Sensors>,
    pub speaker: Arc<dyn Speaker>,
}

/// The assembled robot.
pub struct Robot {
    pub pose: Arc<PoseStore>,
    pub drivetrain: Arc<Drivetrain>,
    pub odometer: Odometer,
    pub corrector: Arc<OdomCorr>,
    pub nav: Arc<Navigator>,
    pub guard: Arc<ObstacleGuard>,
    pub us_loc: UsLoc,
    pub light_loc: LightLoc,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RobotInitError {
    #[error("Failed to load {file}: {source}")]
    ParamLoad {
        file: &'static str,
        source: LoadError,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotParams {
    /// Load every parameter file from the params directory.
    pub fn load() -> Result<Self, RobotInitError> {
        Ok(Self {
            chassis: load_file("chassis.toml")?,
            field: load_file("field.toml")?,
            odometer: load_file("odometer.toml")?,
            odom_corr: load_file("odom_corr.toml")?,
            nav: load_file("nav.toml")?,
            obstacle: load_file("obstacle.toml")?,
            us_loc: load_file("us_loc.toml")?,
            light_loc: load_file("light_loc.toml")?,
        })
    }
}

impl Robot {
    /// Wire the components together.
    ///
    /// The pose starts at the origin facing +Y. The navigator, corrector and guard all start
    /// paused.
    pub fn new(params: &RobotParams, eqpt: Equipment) -> Self {
        let pose = Arc::new(PoseStore::new(Pose::new(0.0, 0.0, FRAC_PI_2)));
        let drivetrain = Arc::new(Drivetrain::new(eqpt.left, eqpt.right));

        let odometer = Odometer::new(
            params.odometer.clone(),
            params.chassis.clone(),
            pose.clone(),
            drivetrain.clone(),
        );

        let corrector = Arc::new(OdomCorr::new(
            params.odom_corr.clone(),
            &params.field,
            pose.clone(),
            eqpt.sensors.clone(),
            eqpt.speaker.clone(),
        ));

        let nav = Arc::new(Navigator::new(
            params.nav.clone(),
            pose.clone(),
            drivetrain.clone(),
            corrector.clone(),
        ));

        let guard = Arc::new(ObstacleGuard::new(
            params.obstacle.clone(),
            params.chassis.clone(),
            pose.clone(),
            eqpt.sensors.clone(),
            drivetrain.clone(),
            nav.clone(),
            corrector.clone(),
        ));

        let us_loc = UsLoc::new(
            params.us_loc.clone(),
            params.field.clone(),
            pose.clone(),
            eqpt.sensors.clone(),
            eqpt.speaker.clone(),
            drivetrain.clone(),
            nav.clone(),
            guard.clone(),
        );

        let light_loc = LightLoc::new(
            params.light_loc.clone(),
            params.field.clone(),
            pose.clone(),
            eqpt.sensors,
            eqpt.speaker,
            drivetrain.clone(),
            nav.clone(),
            corrector.clone(),
            guard.clone(),
        );

        Self {
            pose,
            drivetrain,
            odometer,
            corrector,
            nav,
            guard,
            us_loc,
            light_loc,
        }
    }

    /// Run the periodic components while `app` executes on the calling thread.
    pub fn run<F, R>(&self, app: F) -> R
    where
        F: FnOnce(&Robot) -> R,
    {
        self.run_with(&[], app)
    }

    /// As [`Robot::run`], also running the given background tasks for the same duration.
    ///
    /// Once `app` returns every loop is asked to exit and joined, then the motors are stopped.
    pub fn run_with<F, R>(&self, background: &[&dyn PeriodicTask], app: F) -> R
    where
        F: FnOnce(&Robot) -> R,
    {
        let shutdown = ShutdownFlag::default();

        let tasks: [&dyn PeriodicTask; 4] =
            [&self.odometer, &*self.corrector, &*self.nav, &*self.guard];

        let result = thread::scope(|s| {
            for task in tasks.iter().chain(background.iter()) {
                sched::spawn(s, *task, &shutdown);
            }

            info!("Robot running {} loops", tasks.len() + background.len());

            let result = app(self);

            shutdown.request();
            result
        });

        if self.guard.is_avoiding() {
            warn!("Robot stopped mid-swerve");
        }
        self.drivetrain.stop();

        info!("Robot stopped");

        result
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn load_file<P>(file: &'static str) -> Result<P, RobotInitError>
where
    P: DeserializeOwned,
{
    util::params::load(file).map_err(|source| RobotInitError::ParamLoad { file, source })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
