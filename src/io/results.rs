//! Read/write the results JSON file.
//!
//! The results file is the portable record of one run:
//! - the calibration series and its fit
//! - per junction: measured and linearized series, fit settings, fit, derived
//!   parameters (or why the junction failed)
//! - the cross-junction thermal-voltage ratio

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::{JunctionOutcome, RunOutput};
use crate::domain::{DataPoint, FitConfig, Junction, JunctionParameters, LinearFitResult, Measured, MeasurementSeries, Scale};
use crate::error::AppError;

/// A series as stored on disk: its scale plus the raw points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub scale: String,
    pub points: Vec<DataPoint>,
}

impl<S: Scale> From<&MeasurementSeries<S>> for SeriesRecord {
    fn from(series: &MeasurementSeries<S>) -> Self {
        Self {
            scale: series.scale_name().to_string(),
            points: series.points().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub series: SeriesRecord,
    pub fit: LinearFitResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JunctionRecord {
    Analyzed {
        junction: String,
        raw: SeriesRecord,
        linearized: SeriesRecord,
        config: FitConfig,
        fit: LinearFitResult,
        parameters: JunctionParameters,
    },
    Failed {
        junction: String,
        exit_code: u8,
        message: String,
    },
}

impl JunctionRecord {
    pub fn junction(&self) -> &str {
        match self {
            JunctionRecord::Analyzed { junction, .. } | JunctionRecord::Failed { junction, .. } => junction,
        }
    }
}

/// On-disk schema of a run's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub calibration: CalibrationRecord,
    pub junctions: Vec<JunctionRecord>,
    /// Germanium over silicon.
    pub thermal_voltage_ratio: Option<Measured>,
}

impl ResultsFile {
    pub fn from_run(run: &RunOutput, generated_at: DateTime<Utc>) -> Self {
        let junctions = run
            .junctions
            .iter()
            .map(|outcome| match outcome {
                JunctionOutcome::Analyzed(a) => JunctionRecord::Analyzed {
                    junction: a.junction.tag().to_string(),
                    raw: SeriesRecord::from(&a.raw),
                    linearized: SeriesRecord::from(&a.linearized),
                    config: a.config,
                    fit: a.fit.clone(),
                    parameters: a.parameters,
                },
                JunctionOutcome::Failed {
                    junction,
                    exit_code,
                    message,
                } => JunctionRecord::Failed {
                    junction: junction.tag().to_string(),
                    exit_code: *exit_code,
                    message: message.clone(),
                },
            })
            .collect();

        Self {
            tool: "jfit".to_string(),
            generated_at,
            calibration: CalibrationRecord {
                series: SeriesRecord::from(&run.calibration.series),
                fit: run.calibration.fit.clone(),
            },
            junctions,
            thermal_voltage_ratio: run.thermal_voltage_ratio,
        }
    }

    pub fn junction(&self, junction: Junction) -> Option<&JunctionRecord> {
        self.junctions.iter().find(|r| r.junction() == junction.tag())
    }
}

/// Write a results JSON file.
pub fn write_results_json(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;

    let results = ResultsFile::from_run(run, Utc::now());
    serde_json::to_writer_pretty(BufWriter::new(file), &results)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))?;

    Ok(())
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display())))?;
    let results: ResultsFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))?;
    Ok(results)
}
