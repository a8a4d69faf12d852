//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::{CalibrationOutput, JunctionAnalysis, JunctionOutcome, RunOutput};
use crate::domain::{Junction, LinearFitResult, Measured, Parameter};
use crate::io::results::{JunctionRecord, ResultsFile};
use crate::report::{ResidualRow, compute_residuals};

/// Format the calibration block.
pub fn format_calibration(calibration: &CalibrationOutput) -> String {
    let fit = &calibration.fit;
    let mut out = String::new();

    out.push_str("Calibration (oscilloscope vs multimeter):\n");
    match calibration.series.x_extent() {
        Some((lo, hi)) => out.push_str(&format!("- points: n={} | x=[{lo:.3}, {hi:.3}]\n", fit.points_used)),
        None => out.push_str(&format!("- points: n={}\n", fit.points_used)),
    }
    out.push_str(&format!("- offset: {}\n", fmt_pm(fit.intercept, fit.intercept_error)));
    out.push_str(&format!("- slope : {}\n", fmt_pm(fit.slope, fit.slope_error)));
    out.push_str(&format!("- {}\n", fmt_chi2(fit)));
    out.push('\n');

    out
}

/// Format one analyzed junction: fit parameters, derived quantities and residuals.
pub fn format_junction(analysis: &JunctionAnalysis) -> String {
    let fit = &analysis.fit;
    let params = &analysis.parameters;
    let mut out = String::new();

    out.push_str(&format!("{} junction:\n", analysis.junction.display_name()));
    let range = match fit.x_range {
        Some(r) => format!("[{:.1}, {:.1}]", r.lo, r.hi),
        None => "full".to_string(),
    };
    out.push_str(&format!(
        "- range: {range} | points used: {} of {}\n",
        fit.points_used,
        analysis.linearized.len()
    ));
    out.push_str(&format!("- ln(I0) : {}\n", fmt_param(fit, Parameter::Intercept)));
    out.push_str(&format!("- 1/ηV_T : {}\n", fmt_param(fit, Parameter::Slope)));
    out.push_str(&format!("- ηV_T   : {} mV\n", fmt_measured(params.thermal_voltage)));
    out.push_str(&format!("- I0     : {} mA\n", fmt_measured(params.saturation_current)));
    if let Some(eta) = params.ideality_factor {
        out.push_str(&format!("- η      : {}\n", fmt_measured(eta)));
    }
    if fit.bounded {
        out.push_str(&format!("- solver : bounded, {} iterations\n", fit.iterations));
    }
    out.push_str(&format!("- {}\n", fmt_chi2(fit)));

    out.push('\n');
    out.push_str(&format_residual_table(&compute_residuals(&analysis.linearized, fit)));
    out.push('\n');

    out
}

/// Format the full run: calibration, each junction (or its failure), ratio.
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== jfit - p-n junction characterization ===\n\n");
    out.push_str(&format_calibration(&run.calibration));

    for outcome in &run.junctions {
        match outcome {
            JunctionOutcome::Analyzed(analysis) => out.push_str(&format_junction(analysis)),
            JunctionOutcome::Failed { junction, message, .. } => {
                out.push_str(&format!("{} junction: FAILED\n- {message}\n\n", junction.display_name()));
            }
        }
    }

    match run.thermal_voltage_ratio {
        Some(r) => out.push_str(&format!("ηV_T ratio (Ge/Si): {}\n", fmt_measured(r))),
        None => out.push_str("ηV_T ratio (Ge/Si): n/a\n"),
    }

    out
}

/// Format a saved results file: one compact block per junction, no residual tables.
pub fn format_results_file(results: &ResultsFile) -> String {
    let mut out = String::new();
    let cal = &results.calibration.fit;

    out.push_str(&format!(
        "=== {} results ({}) ===\n\n",
        results.tool,
        results.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str("Calibration:\n");
    out.push_str(&format!("- offset: {}\n", fmt_pm(cal.intercept, cal.intercept_error)));
    out.push_str(&format!("- slope : {}\n", fmt_pm(cal.slope, cal.slope_error)));
    out.push_str(&format!("- {}\n\n", fmt_chi2(cal)));

    for record in &results.junctions {
        let name = Junction::ALL
            .into_iter()
            .find(|j| j.tag() == record.junction())
            .map_or(record.junction(), |j| j.display_name());
        match record {
            JunctionRecord::Analyzed { fit, parameters, .. } => {
                out.push_str(&format!("{name} junction:\n"));
                out.push_str(&format!("- ηV_T : {} mV\n", fmt_measured(parameters.thermal_voltage)));
                out.push_str(&format!("- I0   : {} mA\n", fmt_measured(parameters.saturation_current)));
                if let Some(eta) = parameters.ideality_factor {
                    out.push_str(&format!("- η    : {}\n", fmt_measured(eta)));
                }
                if !fit.active_bounds.is_empty() {
                    let pinned: Vec<&str> = fit.active_bounds.iter().map(|p| p.name()).collect();
                    out.push_str(&format!("- at bound: {}\n", pinned.join(", ")));
                }
                out.push_str(&format!("- {}\n\n", fmt_chi2(fit)));
            }
            JunctionRecord::Failed { exit_code, message, .. } => {
                out.push_str(&format!("{name} junction: FAILED (exit {exit_code})\n- {message}\n\n"));
            }
        }
    }

    match results.thermal_voltage_ratio {
        Some(r) => out.push_str(&format!("ηV_T ratio (Ge/Si): {}\n", fmt_measured(r))),
        None => out.push_str("ηV_T ratio (Ge/Si): n/a\n"),
    }

    out
}

/// Format residual rows as a table; out-of-range points are marked with `-`.
pub fn format_residual_table(rows: &[ResidualRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>10} {:>10} {:>10} {:>10} {:>10} {:>8} {}\n",
            "x", "ln I", "σ", "fit", "residual", "pull", "fit"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<10} {:-<10} {:-<10} {:-<10} {:-<8} {:-<3}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        let marker = if r.in_range { "*" } else { "-" };
        out.push_str(&format!(
            "{:>10.3} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>8.2} {marker}\n",
            r.x, r.y, r.sigma_y, r.y_fit, r.residual, r.pull
        ));
    }

    out
}

fn fmt_param(fit: &LinearFitResult, param: Parameter) -> String {
    let base = fmt_pm(fit.value(param), fit.error(param));
    if fit.is_pinned(param) {
        format!("{base} (at bound)")
    } else {
        base
    }
}

fn fmt_measured(m: Measured) -> String {
    fmt_pm(m.value, m.error)
}

fn fmt_pm(value: f64, error: f64) -> String {
    format!("{value:.6e} ± {error:.2e}")
}

fn fmt_chi2(fit: &LinearFitResult) -> String {
    if fit.ndf == 0 {
        format!("χ²={:.4} ndf=0", fit.chi_square)
    } else {
        format!(
            "χ²={:.4} ndf={} χ²/ndf={:.4}",
            fit.chi_square, fit.ndf, fit.reduced_chi_square
        )
    }
}
