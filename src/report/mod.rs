//! Reporting utilities: residuals, worst points, and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{LinearFitResult, MeasurementSeries, Scale};

/// One point of a fitted series together with its fit diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualRow {
    pub x: f64,
    pub y: f64,
    pub sigma_y: f64,
    pub y_fit: f64,
    /// `y - y_fit`.
    pub residual: f64,
    /// Residual in units of σy (the raw residual when σy = 0, matching weight 1).
    pub pull: f64,
    /// Whether the point was inside the fit range.
    pub in_range: bool,
}

/// Compute fitted values and residuals for every point of `series`,
/// including points outside the fit range.
pub fn compute_residuals<S: Scale>(series: &MeasurementSeries<S>, fit: &LinearFitResult) -> Vec<ResidualRow> {
    series
        .points()
        .iter()
        .map(|p| {
            let y_fit = fit.predict(p.x);
            let residual = p.y - y_fit;
            let pull = if p.sigma_y > 0.0 { residual / p.sigma_y } else { residual };
            ResidualRow {
                x: p.x,
                y: p.y,
                sigma_y: p.sigma_y,
                y_fit,
                residual,
                pull,
                in_range: fit.x_range.is_none_or(|r| r.contains(p.x)),
            }
        })
        .collect()
}

/// The `top_n` in-range rows with the largest |pull|, worst first.
pub fn worst_pulls(rows: &[ResidualRow], top_n: usize) -> Vec<ResidualRow> {
    let mut sorted: Vec<ResidualRow> = rows.iter().filter(|r| r.in_range).copied().collect();
    sorted.sort_by(|a, b| b.pull.abs().partial_cmp(&a.pull.abs()).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitConfig, Linear, MeasurementSeries};
    use crate::fit::RestrictedLinearFitter;
    use approx::assert_relative_eq;

    fn series() -> MeasurementSeries<Linear> {
        MeasurementSeries::from_rows(&[
            [0.0, 1.0, 0.0, 0.5],
            [1.0, 3.0, 0.0, 0.5],
            [2.0, 5.5, 0.0, 0.5],
            [3.0, 7.0, 0.0, 0.5],
            [10.0, 40.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn residuals_cover_every_point() {
        let fit = RestrictedLinearFitter::new(FitConfig::unrestricted().with_range(0.0, 3.0))
            .unwrap()
            .fit(&series())
            .unwrap();
        let rows = compute_residuals(&series(), &fit);

        assert_eq!(rows.len(), 5);
        assert!(rows[..4].iter().all(|r| r.in_range));
        assert!(!rows[4].in_range);
        for r in &rows[..4] {
            assert_relative_eq!(r.residual, r.y - fit.predict(r.x), epsilon = 1e-12);
            assert_relative_eq!(r.pull, r.residual / 0.5, epsilon = 1e-12);
        }
        // Zero sigma: the pull falls back to the raw residual.
        assert_relative_eq!(rows[4].pull, rows[4].residual, epsilon = 1e-12);
    }

    #[test]
    fn worst_pulls_ignore_out_of_range_points() {
        let fit = RestrictedLinearFitter::new(FitConfig::unrestricted().with_range(0.0, 3.0))
            .unwrap()
            .fit(&series())
            .unwrap();
        let rows = compute_residuals(&series(), &fit);
        let worst = worst_pulls(&rows, 2);

        assert_eq!(worst.len(), 2);
        assert!(worst.iter().all(|r| r.in_range));
        assert!(worst[0].pull.abs() >= worst[1].pull.abs());
    }
}
