//! Log transform of a current series.
//!
//! The diode law `I = I0·exp(V / ηV_T)` becomes the straight line
//! `ln I = ln I0 + V / ηV_T`. Uncertainties follow the first-order
//! propagation `σ_lnI = σ_I / I`.

use tracing::debug;

use crate::domain::{DataPoint, Linear, Logarithmic, MeasurementSeries};
use crate::error::FitError;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogLinearizer;

impl LogLinearizer {
    /// Produce the log-scale version of `series`.
    ///
    /// Every y must be strictly positive. The precondition is checked for all
    /// points before anything is transformed, so on error no output exists and
    /// the input is untouched. x and σx are carried over unchanged.
    pub fn linearize(series: &MeasurementSeries<Linear>) -> Result<MeasurementSeries<Logarithmic>, FitError> {
        if let Some((index, p)) = series.points().iter().enumerate().find(|(_, p)| p.y <= 0.0) {
            return Err(FitError::NonPositiveValue { index, value: p.y });
        }

        let points: Vec<DataPoint> = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let sigma_y = p.sigma_y / p.y;
                debug!(
                    index = i,
                    y = p.y,
                    sigma_y = p.sigma_y,
                    ln_y = p.y.ln(),
                    ln_sigma = sigma_y,
                    "linearized point"
                );
                DataPoint::new(p.x, p.y.ln(), p.sigma_x, sigma_y)
            })
            .collect();

        // Tiny currents can overflow σy/y; that surfaces as invalid data.
        MeasurementSeries::from_points(points)
    }
}
