//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves the analysis config (file, defaults, CLI overrides)
//! - runs calibration + junction fits
//! - prints the report
//! - writes optional exports
//! - summarizes saved results files

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use crate::cli::{AnalyzeArgs, Cli, Command, SimulateArgs};
use crate::config::AnalysisConfig;
use crate::data::{SyntheticSpec, generate};
use crate::domain::Junction;
use crate::error::AppError;
use crate::io::export::{write_dataset, write_fit_tables};
use crate::io::ingest::DatasetLayout;
use crate::io::results::{read_results_json, write_results_json};
use crate::report::{ResidualRow, compute_residuals};

pub mod pipeline;

/// Entry point for the `jfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init_logging(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::InitConfig { path, force } => handle_init_config(&path, force),
        Command::Simulate(args) => handle_simulate(args),
        Command::Show { results } => handle_show(&results),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_run_summary(&run));

    // Optional exports.
    if let Some(path) = &args.output {
        write_results_json(path, &run)?;
        info!(path = %path.display(), "wrote results JSON");
    }
    if let Some(dir) = &args.export_dir {
        let tables: Vec<(Junction, Vec<ResidualRow>)> = run
            .junctions
            .iter()
            .filter_map(|o| o.analysis())
            .map(|a| (a.junction, compute_residuals(&a.linearized, &a.fit)))
            .collect();
        let written = write_fit_tables(dir, tables.iter().map(|(j, rows)| (*j, rows.as_slice())))?;
        info!(dir = %dir.display(), files = written.len(), "wrote fit tables");
    }

    // Report first, then surface the first junction failure as the exit status.
    if let Some(pipeline::JunctionOutcome::Failed { exit_code, .. }) = run.failures().next() {
        let failed = run.failures().count();
        return Err(AppError::new(
            *exit_code,
            format!("{failed} junction analysis(es) failed; see report above."),
        ));
    }

    Ok(())
}

/// Resolve the run configuration: TOML file (or defaults) plus CLI overrides.
pub fn config_from_args(args: &AnalyzeArgs) -> Result<AnalysisConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(path) = &args.calibration {
        config.calibration = path.clone();
    }
    if let Some(path) = &args.germanium {
        config.junction_mut(Junction::Germanium).data = path.clone();
    }
    if let Some(path) = &args.silicon {
        config.junction_mut(Junction::Silicon).data = path.clone();
    }
    if args.temperature.is_some() {
        config.temperature_kelvin = args.temperature;
    }

    config.validate()?;
    Ok(config)
}

fn handle_init_config(path: &Path, force: bool) -> Result<(), AppError> {
    if path.exists() && !force {
        return Err(AppError::new(
            2,
            format!("'{}' already exists (use --force to overwrite).", path.display()),
        ));
    }
    let text = AnalysisConfig::default().to_toml()?;
    std::fs::write(path, text)
        .map_err(|e| AppError::new(2, format!("Failed to write config '{}': {e}", path.display())))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let spec = SyntheticSpec {
        seed: args.seed,
        points: args.points,
        ..SyntheticSpec::default()
    };
    let written = write_synthetic(&args.out_dir, &spec)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_show(path: &Path) -> Result<(), AppError> {
    let results = read_results_json(path)?;
    info!(path = %path.display(), junctions = results.junctions.len(), "read results JSON");
    println!("{}", crate::report::format_results_file(&results));
    Ok(())
}

/// Generate a synthetic run and write it using the default dataset file names.
pub fn write_synthetic(dir: &Path, spec: &SyntheticSpec) -> Result<Vec<PathBuf>, AppError> {
    let data = generate(spec)?;
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create output dir '{}': {e}", dir.display())))?;

    let defaults = AnalysisConfig::default();
    let file_name = |p: &Path| dir.join(p.file_name().unwrap_or(p.as_os_str()));

    let cal_path = file_name(&defaults.calibration);
    write_dataset(&cal_path, &data.calibration, DatasetLayout::Calibration)?;
    let mut written = vec![cal_path];

    for junction in Junction::ALL {
        let path = file_name(&defaults.junction(junction).data);
        write_dataset(&path, data.junction(junction), DatasetLayout::IvCurve)?;
        written.push(path);
    }

    info!(dir = %dir.display(), seed = spec.seed, "wrote synthetic datasets");
    Ok(written)
}
