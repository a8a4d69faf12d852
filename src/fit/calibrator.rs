//! Instrument calibration: a plain weighted line fit over every point.

use tracing::info;

use crate::domain::{LinearFitResult, MeasurementSeries, Scale};
use crate::error::FitError;
use crate::fit::fitter::fit_closed_form;

/// Fits `y = offset + slope·x` over the full series with weights `1/σy²`.
///
/// Points with `σy = 0` enter with weight 1. There is no range restriction and
/// no bound, so the result equals an unrestricted [`RestrictedLinearFitter`]
/// fit of the same series.
///
/// [`RestrictedLinearFitter`]: crate::fit::RestrictedLinearFitter
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearCalibrator;

impl LinearCalibrator {
    pub fn fit<S: Scale>(series: &MeasurementSeries<S>) -> Result<LinearFitResult, FitError> {
        info!(points = series.len(), "fitting calibration line");
        let fit = fit_closed_form(series.points(), None)?;
        info!(
            offset = fit.intercept,
            slope = fit.slope,
            reduced_chi_square = fit.reduced_chi_square,
            "calibration done"
        );
        Ok(fit)
    }
}
