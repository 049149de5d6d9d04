//! # Cadence Robot
//!
//! Loads the robot configuration, composes the subsystems and bindings,
//! performs RT setup and runs the fixed-period scheduler loop until
//! Ctrl-C or the tick limit.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;

use cadence_common::prelude::*;
use cadence_robot::config::SimulationConfig;
use cadence_robot::io::ScriptPlayer;
use cadence_robot::{Robot, RobotError};
use cadence_scheduler::cycle::{CycleRunner, rt_setup};
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Cadence Robot: cooperative command scheduler over simulated subsystems
#[derive(Parser, Debug)]
#[command(name = "cadence_robot")]
#[command(version)]
#[command(about = "Fixed-period command scheduler driving a simulated robot")]
struct Args {
    /// Path to the robot configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many ticks (default: run until Ctrl-C).
    #[arg(long)]
    ticks: Option<u64>,

    /// CPU core to pin the loop to (`rt` feature).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (`rt` feature).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, Level::INFO);
            error!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.robot.shared.log_level.into());

    info!("Cadence Robot v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Cadence Robot shutdown complete");
}

fn load_config(args: &Args) -> Result<SimulationConfig, RobotError> {
    let config = SimulationConfig::load(&args.config)?;
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: SimulationConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        config = %args.config.display(),
        period_ms = config.robot.scheduler.period_ms,
        policy = ?config.robot.scheduler.overrun_policy,
        "Config OK"
    );

    let mut robot = Robot::build(&config.robot)?;
    let mut script = ScriptPlayer::new(config.script);
    script.check(robot.io())?;
    robot.teleop_init();

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        cpu_core = args.cpu_core,
        priority = args.rt_priority,
        "RT setup complete"
    );

    let (scheduler, io) = robot.into_parts();
    let mut runner = CycleRunner::new(scheduler, config.robot.scheduler.overrun_policy)
        .with_max_ticks(args.ticks);

    let running = runner.shutdown_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let ticks = runner.run_with(|scheduler| {
        let tick = scheduler.clock().tick + 1;
        if let Err(e) = script.play(tick, &io) {
            warn!(tick, "Script step skipped: {e}");
        }
    })?;

    let stats = runner.stats();
    info!(
        ticks,
        overruns = stats.overruns,
        avg_ns = stats.avg_cycle_ns(),
        max_ns = stats.max_cycle_ns,
        dropped_events = runner.scheduler().dropped_events(),
        "Cycle summary"
    );
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose { Level::DEBUG } else { configured };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
