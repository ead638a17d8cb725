//! Waypoint follower replay executable entry point.
//!
//! # Architecture
//!
//! The executable replays a recorded sequence of vehicle poses against a
//! waypoint path:
//!
//!     - Initialise the session and logging
//!     - Load parameters, the path and the poses
//!     - For each pose:
//!         - Localise the vehicle on the path
//!         - Estimate the cross track error
//!         - Print and record the result
//!     - Save the report into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::{fs::File, path::PathBuf};
use structopt::StructOpt;

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::{self, Session},
};
use wpt_lib::{
    follower::{FollowInput, Params, WaypointFollower},
    nearest::SearchStrategy,
    replay::{self, CycleRecord},
    traffic_light::traffic_light_label,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the parameter file used when none is given on the command line.
const DEFAULT_PARAMS_FILE: &str = "wpt_exec.toml";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Replay recorded poses against a waypoint path.
#[derive(Debug, StructOpt)]
#[structopt(name = "wpt_exec")]
struct Opt {
    /// CSV file of waypoints with the header `x,y,z,yaw,speed`
    #[structopt(long, parse(from_os_str))]
    waypoints: PathBuf,

    /// CSV file of vehicle poses with the header `x,y,z,yaw`
    #[structopt(long, parse(from_os_str))]
    poses: PathBuf,

    /// Parameter file to use instead of the one in the params directory
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Nearest waypoint search strategy, `linear` or `kdtree`
    #[structopt(long)]
    strategy: Option<SearchStrategy>,

    /// Traffic light state code to report alongside the replay
    #[structopt(long)]
    light: Option<i32>,
}

/// Report saved into the session at the end of the replay.
#[derive(Debug, Serialize)]
struct ReplayReport {
    params: Params,
    num_waypoints: usize,
    traffic_light: Option<&'static str>,
    cycles: Vec<CycleRecord>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("wpt_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Waypoint Follower Replay\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params = load_params(&opt)?;

    if let Some(strategy) = opt.strategy {
        params.search_strategy = strategy;
    }

    info!("Parameters: {:?}", params);

    let traffic_light = opt.light.and_then(|code| match traffic_light_label(code) {
        Ok(label) => {
            info!("Traffic light: {}", label);
            Some(label)
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    });

    // ---- LOAD DATA ----

    let path = replay::load_waypoints(&opt.waypoints)
        .wrap_err_with(|| format!("Could not load waypoints from {:?}", opt.waypoints))?;
    let poses = replay::load_poses(&opt.poses)
        .wrap_err_with(|| format!("Could not load poses from {:?}", opt.poses))?;

    let num_waypoints = path.get_num_points();
    info!("Loaded {} waypoints and {} poses", num_waypoints, poses.len());

    if poses.is_empty() {
        return Err(eyre!("The pose file {:?} contains no poses", opt.poses));
    }

    // ---- INITIALISE FOLLOWER ----

    let mut follower =
        WaypointFollower::init(params.clone()).wrap_err("Failed to initialise the follower")?;
    follower.set_path(path).wrap_err("Could not set the path")?;

    // ---- REPLAY ----

    let mut cycles = Vec::with_capacity(poses.len());

    for (i, pose) in poses.iter().enumerate() {
        let (output, report) = follower
            .proc(&FollowInput { pose: *pose })
            .wrap_err_with(|| format!("Follower failed on cycle {}", i))?;

        let flags = match (report.heading_advanced, report.degenerate_fit) {
            (_, true) => format!("{}", "DEGENERATE".red()),
            (true, false) => format!("{}", "ADVANCED".yellow()),
            (false, false) => String::new(),
        };

        println!(
            "{:>6} idx {:>6} cte {} speed {:>7.3} m/s decel {:>8.3} {}",
            i.bold(),
            output.index,
            format!("{:>+9.4} m", output.cte_m).cyan(),
            output.target_speed_ms,
            output.decel_rate,
            flags
        );

        cycles.push(CycleRecord::new(i, pose, &output, &report));
    }

    // ---- SAVE REPORT ----

    let csv_path = session.session_root.join("cycles.csv");
    let csv_file = File::create(&csv_path)
        .wrap_err_with(|| format!("Could not create {:?}", csv_path))?;
    replay::write_cycles(csv_file, &cycles).wrap_err("Could not write the cycle records")?;

    let report_path = session
        .save_json(
            "report.json",
            &ReplayReport {
                params,
                num_waypoints,
                traffic_light,
                cycles,
            },
        )
        .wrap_err("Could not save the replay report")?;

    info!(
        "Replay of {} cycles complete in {:.3} s, report saved to {:?}",
        poses.len(),
        session::get_elapsed_seconds(),
        report_path
    );

    Ok(())
}

/// Load the follower parameters.
///
/// An explicit parameter file must load. Otherwise the default file in the
/// params directory is tried, falling back to the default parameters.
fn load_params(opt: &Opt) -> Result<Params, Report> {
    match &opt.params {
        Some(path) => util::params::load_from(path)
            .wrap_err_with(|| format!("Could not load parameters from {:?}", path)),
        None => match util::params::load(DEFAULT_PARAMS_FILE) {
            Ok(p) => Ok(p),
            Err(e) => {
                warn!("Using default parameters, could not load {}: {}", DEFAULT_PARAMS_FILE, e);
                Ok(Params::default())
            }
        },
    }
}
