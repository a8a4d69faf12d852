//! Shared analysis pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! calibration fit -> per junction: load -> linearize -> restricted fit -> extract
//! -> cross-junction ratio
//!
//! The CLI then only deals with presentation (printing vs exports).

use tracing::{info, info_span, warn};

use crate::config::AnalysisConfig;
use crate::domain::{
    FitConfig, Junction, JunctionParameters, Linear, LinearFitResult, Logarithmic, Measured,
    MeasurementSeries,
};
use crate::error::{AppError, FitError};
use crate::fit::{LinearCalibrator, LogLinearizer, ParameterExtractor, RestrictedLinearFitter, ratio};
use crate::io::ingest::{DatasetLayout, load_series};

/// Calibration dataset and its line fit.
#[derive(Debug, Clone)]
pub struct CalibrationOutput {
    pub series: MeasurementSeries<Linear>,
    pub fit: LinearFitResult,
}

/// Everything computed for one junction.
#[derive(Debug, Clone)]
pub struct JunctionAnalysis {
    pub junction: Junction,
    pub config: FitConfig,
    /// Measured I–V data, kept for display.
    pub raw: MeasurementSeries<Linear>,
    pub linearized: MeasurementSeries<Logarithmic>,
    pub fit: LinearFitResult,
    pub parameters: JunctionParameters,
}

/// Per-junction result: fits are independent, so one may fail alone.
#[derive(Debug, Clone)]
pub enum JunctionOutcome {
    Analyzed(Box<JunctionAnalysis>),
    Failed {
        junction: Junction,
        exit_code: u8,
        message: String,
    },
}

impl JunctionOutcome {
    pub fn junction(&self) -> Junction {
        match self {
            JunctionOutcome::Analyzed(a) => a.junction,
            JunctionOutcome::Failed { junction, .. } => *junction,
        }
    }

    pub fn analysis(&self) -> Option<&JunctionAnalysis> {
        match self {
            JunctionOutcome::Analyzed(a) => Some(a),
            JunctionOutcome::Failed { .. } => None,
        }
    }

    fn failed(junction: Junction, err: &AppError) -> Self {
        JunctionOutcome::Failed {
            junction,
            exit_code: err.exit_code(),
            message: err.to_string(),
        }
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub calibration: CalibrationOutput,
    pub junctions: Vec<JunctionOutcome>,
    /// Germanium over silicon thermal-voltage ratio (both fits must succeed).
    pub thermal_voltage_ratio: Option<Measured>,
}

impl RunOutput {
    pub fn junction(&self, junction: Junction) -> Option<&JunctionAnalysis> {
        self.junctions
            .iter()
            .find(|o| o.junction() == junction)
            .and_then(JunctionOutcome::analysis)
    }

    pub fn failures(&self) -> impl Iterator<Item = &JunctionOutcome> {
        self.junctions
            .iter()
            .filter(|o| matches!(o, JunctionOutcome::Failed { .. }))
    }
}

/// Fit the calibration series.
pub fn calibrate(series: MeasurementSeries<Linear>) -> Result<CalibrationOutput, FitError> {
    let fit = LinearCalibrator::fit(&series)?;
    Ok(CalibrationOutput { series, fit })
}

/// Linearize, fit and extract one junction's I–V series.
pub fn analyze_junction(
    junction: Junction,
    raw: MeasurementSeries<Linear>,
    config: &FitConfig,
    extractor: &ParameterExtractor,
) -> Result<JunctionAnalysis, FitError> {
    let _span = info_span!("junction", name = junction.tag()).entered();

    let fitter = RestrictedLinearFitter::new(*config)?;
    let linearized = LogLinearizer::linearize(&raw)?;
    let fit = fitter.fit(&linearized)?;
    let parameters = extractor.extract(&fit);

    info!(
        ln_i0 = fit.intercept,
        slope = fit.slope,
        points = fit.points_used,
        bounded = fit.bounded,
        thermal_voltage_mv = parameters.thermal_voltage.value,
        "junction fit done"
    );

    Ok(JunctionAnalysis {
        junction,
        config: *config,
        raw,
        linearized,
        fit,
        parameters,
    })
}

/// Combine already-computed junction outcomes into a run.
pub fn assemble(calibration: CalibrationOutput, junctions: Vec<JunctionOutcome>) -> RunOutput {
    let tv = |j: Junction| {
        junctions
            .iter()
            .find(|o| o.junction() == j)
            .and_then(JunctionOutcome::analysis)
            .map(|a| a.parameters.thermal_voltage)
    };
    let thermal_voltage_ratio = match (tv(Junction::Germanium), tv(Junction::Silicon)) {
        (Some(ge), Some(si)) => Some(ratio(ge, si)),
        _ => None,
    };

    RunOutput {
        calibration,
        junctions,
        thermal_voltage_ratio,
    }
}

/// Execute the full pipeline from the files named in `config`.
///
/// A calibration failure aborts the run. A junction failure (unreadable file,
/// non-positive current, failed fit) is recorded and the other junction is
/// still analyzed.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    info!("calibration underway");
    let cal_series = load_series(&config.calibration, DatasetLayout::Calibration)?;
    let calibration = calibrate(cal_series)
        .map_err(|e| AppError::new(e.exit_code(), format!("Calibration fit failed: {e}")))?;

    let extractor = ParameterExtractor::new().with_temperature(config.temperature_kelvin);

    let mut junctions = Vec::with_capacity(Junction::ALL.len());
    for junction in Junction::ALL {
        let jcfg = config.junction(junction);
        let outcome = load_series(&jcfg.data, DatasetLayout::IvCurve).and_then(|raw| {
            analyze_junction(junction, raw, &jcfg.fit, &extractor).map_err(|e| {
                AppError::new(
                    e.exit_code(),
                    format!("{} fit failed: {e}", junction.display_name()),
                )
            })
        });

        match outcome {
            Ok(analysis) => junctions.push(JunctionOutcome::Analyzed(Box::new(analysis))),
            Err(err) => {
                warn!(junction = junction.tag(), error = %err, "junction analysis failed");
                junctions.push(JunctionOutcome::failed(junction, &err));
            }
        }
    }

    Ok(assemble(calibration, junctions))
}
