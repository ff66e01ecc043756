// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse workout history and personal records synced from a fitness-tracking API", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit CSV on stdout instead of formatted tables
    #[arg(long, global = true)]
    pub csv: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Metric,
    Imperial,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch workouts newer than the cache watermark and merge them in
    Sync {
        /// Refetch the entire workout history instead of a delta sync
        #[arg(long)]
        full: bool,
    },
    /// List routine folders
    Folders,
    /// List routines
    Routines {
        /// Only routines in this folder
        #[arg(long)]
        folder: Option<i64>,
    },
    /// List cached workouts, newest first
    Workouts {
        /// Show only the last N workouts
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Only workouts performed from this routine
        #[arg(long)]
        routine: Option<String>,
    },
    /// Show one cached workout's exercises and sets
    Show {
        /// Workout id
        id: String,
    },
    /// Show personal records (heaviest set per exercise)
    Records,
    /// Show set-by-set history for one exercise
    History {
        /// Exercise title (case-insensitive)
        exercise: String,
    },
    /// Set default display units (metric/imperial)
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Show the path to the local cache directory
    CachePath,
    /// Show the path to the config file
    ConfigPath,
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
