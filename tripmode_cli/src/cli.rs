//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tripmode", version, about = "Sliding-window travel mode classifier")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/tripmode.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Activity played by the simulated IMU.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Activity {
    Still,
    Walking,
    Running,
    Cycling,
    Vehicle,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a labelled recording offline and report accuracy
    Replay {
        /// Directory with linear.csv, gravity.csv and gyro.csv
        #[arg(long, value_name = "DIR")]
        recording: PathBuf,
        /// Tick period in event time (default: [runner] tick_ms)
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
        /// Print every tick, not only the summary
        #[arg(long, action = ArgAction::SetTrue)]
        ticks: bool,
    },
    /// Classify the simulated sensor stream live
    Run {
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long, value_name = "SECS")]
        duration_s: Option<f64>,
        /// Override [simulation] activity
        #[arg(long, value_enum)]
        activity: Option<Activity>,
        /// Start a recording immediately
        #[arg(long, action = ArgAction::SetTrue)]
        record: bool,
        /// Toggle recording on every line read from stdin
        #[arg(long, action = ArgAction::SetTrue)]
        interactive: bool,
    },
    /// Write libsvm training rows for every labelled tick of a recording
    ExportSvm {
        #[arg(long, value_name = "DIR")]
        recording: PathBuf,
        /// Output file (default: stdout)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
    },
    /// Validate config, model and normalization, then classify a short simulated window
    SelfCheck,
}
