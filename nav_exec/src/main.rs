//! Navigation executable entry point.
//!
//! Runs the motion core against the simulated robot: localise from a starting corner, drive to a
//! target grid intersection with odometry correction and obstacle avoidance enabled, then
//! optionally refine the pose on the floor lines.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use nalgebra::Point2;
use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;

// Internal
use nav_lib::{
    field::Corner,
    gate::Switchable,
    loc::LightLocOutcome,
    pose::Pose,
    robot::{Equipment, Robot, RobotParams},
    sim::{Block, SensorGeometry, SimMotor, SimSpeaker, SimWorld},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest the robot is given to reach the target.
const TRAVEL_TIMEOUT: Duration = Duration::from_secs(300);

/// Side of the obstacle block placed with `--obstacle`.
///
/// Units: centimeters
const OBSTACLE_SIDE_CM: f64 = 10.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec", about = "Tile robot motion and localisation demo")]
struct Opts {
    /// Starting corner, 1 to 4
    #[structopt(short, long, default_value = "1")]
    corner: u8,

    /// Target X as a number of tiles
    #[structopt(short = "x", long, default_value = "3")]
    target_x: i32,

    /// Target Y as a number of tiles
    #[structopt(short = "y", long, default_value = "3")]
    target_y: i32,

    /// Refine the pose on the floor lines once at the target
    #[structopt(long)]
    light_loc: bool,

    /// Place a block obstacle at the given "x,y" position in centimeters
    #[structopt(long, parse(try_from_str = parse_point))]
    obstacle: Option<Point2<f64>>,

    /// Speed up the simulated motors by this factor
    #[structopt(long, default_value = "1.0")]
    time_scale: f64,

    /// Log level
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Tilebot Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    let corner = Corner::try_from(opts.corner).wrap_err("Invalid starting corner")?;

    // ---- LOAD PARAMETERS ----

    let params = RobotParams::load().wrap_err("Could not load the robot parameters")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE SIMULATION ----

    let left = Arc::new(SimMotor::with_time_scale(opts.time_scale));
    let right = Arc::new(SimMotor::with_time_scale(opts.time_scale));

    // Start on the tile diagonal, facing a little off the bisector
    let start = corner.tile_centre(&params.field);
    let start_heading = (corner.quarter_turns() as f64 + 0.5) * std::f64::consts::FRAC_PI_2 + 0.3;

    let mut world = SimWorld::new(
        params.field.clone(),
        params.chassis.clone(),
        SensorGeometry::default(),
        Pose::new(start.x, start.y, start_heading),
        left.clone(),
        right.clone(),
    );
    if let Some(p) = opts.obstacle {
        info!("Obstacle placed at ({:.1}, {:.1})", p.x, p.y);
        world = world.with_block(Block::square(p, OBSTACLE_SIDE_CM));
    }
    let world = Arc::new(world);

    let speaker = Arc::new(SimSpeaker::default());

    let robot = Robot::new(
        &params,
        Equipment {
            left,
            right,
            sensors: world.clone(),
            speaker: speaker.clone(),
        },
    );

    info!("Initialisation complete\n");

    // ---- MAIN SEQUENCE ----

    let tile = params.field.tile_length_cm;
    let target = Point2::new(
        opts.target_x as f64 * tile,
        opts.target_y as f64 * tile,
    );

    let result = robot.run_with(&[&*world], |r| {
        r.us_loc.localise(corner);

        r.corrector.set_running(true);
        r.guard.set_running(true);
        r.nav.set_running(true);

        info!("Travelling to ({:.2}, {:.2})", target.x, target.y);
        r.nav.travel_to_square(target.x, target.y, false, false);
        if !r.nav.wait_while_navigating_timeout(TRAVEL_TIMEOUT) {
            return Err(eyre!("Target not reached within {:?}", TRAVEL_TIMEOUT));
        }

        if opts.light_loc {
            match r.light_loc.localise(false) {
                LightLocOutcome::Localised(p) => info!(
                    "Refined pose: ({:.2}, {:.2}, {:.4})",
                    p.x_cm, p.y_cm, p.theta_rad
                ),
                LightLocOutcome::Aborted { span_rad } => {
                    warn!("Floor-line localisation aborted (span {:.4} rad)", span_rad)
                }
            }
        }

        Ok(r.pose.read())
    });

    let pose = result?;
    let truth = world.truth();

    info!(
        "Final estimate ({:.2}, {:.2}, {:.4}), truth ({:.2}, {:.2}, {:.4})",
        pose.x_cm, pose.y_cm, pose.theta_rad, truth.x_cm, truth.y_cm, truth.theta_rad
    );
    info!(
        "{} beeps, {} buzzes",
        speaker.beeps(),
        speaker.buzzes()
    );

    Ok(())
}

/// Parse an "x,y" pair.
fn parse_point(s: &str) -> Result<Point2<f64>, Report> {
    let mut parts = s.split(',').map(|p| p.trim().parse::<f64>());

    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Ok(Point2::new(x, y)),
        _ => Err(eyre!("Expected \"x,y\", got \"{}\"", s)),
    }
}
