mod config;
mod manager;

use crate::manager::{Manager, parse_schedule};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Experiment directory containing `config.toml`.
    #[arg(long)]
    exp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate comma separated dosing schedules.
    Evaluate {
        #[arg(long = "schedule", required = true, allow_hyphen_values = true)]
        schedules: Vec<String>,
    },

    /// Re-evaluate recorded candidates (`VAR.tsv`) with the first objective.
    Reeval {
        #[arg(long, default_value_t = 0)]
        partition: usize,

        #[arg(long, default_value_t = 1)]
        modulus: usize,
    },

    /// Remove re-evaluation outputs.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(&args.exp_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Evaluate { schedules } => {
            let schedules = schedules
                .iter()
                .map(|arg| parse_schedule(arg))
                .collect::<Result<Vec<_>>>()
                .context("failed to parse schedules")?;
            mgr.evaluate_schedules(&schedules)?
        }
        Command::Reeval { partition, modulus } => mgr.reevaluate(partition, modulus)?,
        Command::Clean => mgr.clean()?,
    }

    Ok(())
}
