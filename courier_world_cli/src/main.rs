mod output;
mod replay;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use courier_world_core::{
    config::{DeliveryPolicy, SimulationConfig},
    engine::simulate,
    parse::{load_grid, load_instructions},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, result_path, write_log, write_result_file};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Grid file to load
    #[arg(value_name = "GRID_FILE")]
    grid: PathBuf,

    /// Human instruction script
    #[arg(value_name = "ACTIONS_FILE")]
    actions: PathBuf,

    /// Directory the result file is written to
    #[arg(short, long, value_name = "DIR", default_value = "Results")]
    output_dir: PathBuf,

    /// Result file format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Human position the agent delivers keys to
    #[arg(long, value_enum, default_value_t = Policy::Freeze)]
    policy: Policy,

    /// Print the log to stdout instead of writing a result file
    #[arg(long)]
    stdout: bool,

    /// Play the run back in the terminal once it has been computed
    #[arg(long)]
    replay: bool,

    /// Replay speed in milliseconds per step
    #[arg(long, value_name = "MS", default_value_t = 250)]
    tick_ms: u64,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Where the human stood when asking
    Freeze,
    /// Where the human's next scripted moves take them
    Follow,
}

impl From<Policy> for DeliveryPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Freeze => DeliveryPolicy::FreezeAtRequest,
            Policy::Follow => DeliveryPolicy::FollowScriptedMoves,
        }
    }
}

fn init_tracing(args: &Args) {
    // Log lines on stderr would tear through the replay view
    let default = match (args.replay, args.verbose) {
        (true, _) => "off",
        (false, true) => "debug",
        (false, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let world = load_grid(&args.grid)
        .with_context(|| format!("Failed to load grid {}", args.grid.display()))?;
    let instructions = load_instructions(&args.actions)
        .with_context(|| format!("Failed to load actions {}", args.actions.display()))?;
    info!(
        rows = world.rows(),
        cols = world.cols(),
        instructions = instructions.len(),
        "loaded scenario"
    );

    let config = SimulationConfig::default().with_delivery_policy(args.policy.into());
    let facts = simulate(&world, config, &instructions);

    if args.stdout {
        write_log(io::stdout().lock(), &facts, args.format)?;
    } else {
        let path = result_path(&args.output_dir, &args.grid, args.format);
        write_result_file(&path, &facts, args.format)?;
        info!(path = %path.display(), facts = facts.len(), "result written");
        if !args.replay {
            println!("{}", path.display());
        }
    }

    if args.replay {
        replay::run(&world, &facts, Duration::from_millis(args.tick_ms))?;
    }

    Ok(())
}
