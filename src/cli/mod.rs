//! Command-line parsing for the junction characterization tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "jfit", version, about = "p-n junction I–V characterization")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calibrate, fit both junctions, print the report, and optionally export.
    Analyze(AnalyzeArgs),
    /// Write the default analysis config as TOML.
    InitConfig {
        /// Destination file.
        #[arg(value_name = "PATH", default_value = "analysis.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Write synthetic calibration and I–V datasets in the ingest format.
    Simulate(SimulateArgs),
    /// Print a summary of a results JSON written by `analyze --output`.
    Show {
        /// Results file.
        #[arg(value_name = "JSON")]
        results: PathBuf,
    },
}

/// Options for `jfit analyze`.
#[derive(Debug, Args, Clone, Default)]
pub struct AnalyzeArgs {
    /// Analysis config (TOML). Defaults are used when omitted.
    #[arg(short, long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Calibration dataset (overrides the config).
    #[arg(long, value_name = "PATH")]
    pub calibration: Option<PathBuf>,

    /// Germanium I–V dataset (overrides the config).
    #[arg(long, value_name = "PATH")]
    pub germanium: Option<PathBuf>,

    /// Silicon I–V dataset (overrides the config).
    #[arg(long, value_name = "PATH")]
    pub silicon: Option<PathBuf>,

    /// Junction temperature in kelvin; enables the ideality factor.
    #[arg(long, value_name = "K")]
    pub temperature: Option<f64>,

    /// Write all results to a JSON file.
    #[arg(short, long, value_name = "JSON")]
    pub output: Option<PathBuf>,

    /// Write one `<junction>_fit.csv` per junction into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
}

/// Options for `jfit simulate`.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Directory receiving the generated datasets.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Points per dataset.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub points: usize,
}
