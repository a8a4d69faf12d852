//! Weighted least squares for the straight-line model.
//!
//! Every fit in this project solves
//!
//! ```text
//! minimize Σ w_i (y_i - p0 - p1·x_i)^2,   w_i = 1/σy_i²  (1 when σy_i = 0)
//! ```
//!
//! Implementation choices:
//! - Rows are scaled by `sqrt(w_i)`, turning the problem into ordinary least
//!   squares on `(X_w, y_w)`.
//! - The closed-form solution comes from an SVD of `X_w`, which is robust for
//!   tall matrices. A relative singular-value check flags degenerate designs
//!   (e.g. all x identical) instead of returning a pseudo-inverse solution.
//! - Parameter covariance is the inverse of the weighted normal matrix
//!   `X_wᵀ X_w`. The bounded solver works on that same 2×2 matrix.

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use crate::domain::DataPoint;
use crate::models::{PARAM_COUNT, design_row, predict};

/// Smallest accepted ratio `σ_min / σ_max` of the singular values of `X_w`.
const RANK_TOL: f64 = 1e-12;

/// Row-weighted design `(X_w, y_w)` for a set of points.
#[derive(Debug, Clone)]
pub struct WeightedSystem {
    xw: DMatrix<f64>,
    yw: DVector<f64>,
}

impl WeightedSystem {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DataPoint>) -> Self {
        let points: Vec<&DataPoint> = points.into_iter().collect();
        let n = points.len();
        let mut xw = DMatrix::<f64>::zeros(n, PARAM_COUNT);
        let mut yw = DVector::<f64>::zeros(n);

        for (i, p) in points.iter().enumerate() {
            let sw = p.weight().sqrt();
            let row = design_row(p.x);
            for j in 0..PARAM_COUNT {
                xw[(i, j)] = row[j] * sw;
            }
            yw[i] = p.y * sw;
        }

        Self { xw, yw }
    }

    pub fn rows(&self) -> usize {
        self.yw.len()
    }

    /// `X_wᵀ X_w`.
    pub fn normal_matrix(&self) -> Matrix2<f64> {
        let a = self.xw.tr_mul(&self.xw);
        Matrix2::new(a[(0, 0)], a[(0, 1)], a[(1, 0)], a[(1, 1)])
    }

    /// `X_wᵀ y_w`.
    pub fn normal_rhs(&self) -> Vector2<f64> {
        let b = self.xw.tr_mul(&self.yw);
        Vector2::new(b[0], b[1])
    }

    /// Weighted residual sum of squares (chi-square) at `params`.
    pub fn rss(&self, params: &[f64; PARAM_COUNT]) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.rows() {
            let sw = self.xw[(i, 0)];
            // Row i is `sw·[1, x]`, so the fitted weighted value is `sw·(p0 + p1·x)`.
            let fitted = params[0] * sw + params[1] * self.xw[(i, 1)];
            let r = self.yw[i] - fitted;
            sum += r * r;
        }
        sum
    }

    /// `Σ w_i y_i²`, the RSS of the zero line.
    pub fn weighted_sum_of_squares(&self) -> f64 {
        self.yw.norm_squared()
    }

    /// Closed-form weighted solution, `None` when the design is degenerate.
    pub fn solve(&self) -> Option<[f64; PARAM_COUNT]> {
        let beta = solve_least_squares(&self.xw, &self.yw)?;
        Some([beta[0], beta[1]])
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the design is rank deficient or the solution is not finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() {
        return None;
    }
    let svd = x.clone().svd(true, true);

    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    if !(s_max.is_finite() && s_max > 0.0) || s_min <= RANK_TOL * s_max {
        return None;
    }

    let beta = svd.solve(y, RANK_TOL * s_max).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

/// Invert a weighted normal matrix, `None` when it is numerically singular.
pub fn invert_normal_matrix(m: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    let det = m.determinant();
    let scale = (m[(0, 0)] * m[(1, 1)]).abs();
    if !det.is_finite() || scale == 0.0 || det.abs() <= RANK_TOL * scale {
        return None;
    }
    let inv = m.try_inverse()?;
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

/// Unweighted residual `y - y_fit` for one point.
pub fn residual(point: &DataPoint, params: &[f64; PARAM_COUNT]) -> f64 {
    point.y - predict(params, point.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points(rows: &[(f64, f64, f64)]) -> Vec<DataPoint> {
        rows.iter()
            .map(|&(x, y, s)| DataPoint::new(x, y, 0.0, s))
            .collect()
    }

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(beta[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn weights_pull_the_line_towards_precise_points() {
        // Two precise points on y = x, one imprecise point far off the line.
        let pts = points(&[(0.0, 0.0, 0.01), (1.0, 1.0, 0.01), (2.0, 10.0, 100.0)]);
        let system = WeightedSystem::from_points(&pts);
        let [p0, p1] = system.solve().unwrap();
        assert_relative_eq!(p0, 0.0, epsilon = 1e-4);
        assert_relative_eq!(p1, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn rss_matches_explicit_sum() {
        let pts = points(&[(0.0, 1.0, 0.5), (1.0, 2.0, 1.0), (2.0, 2.0, 0.0)]);
        let system = WeightedSystem::from_points(&pts);
        let params = [1.0, 1.0];
        let expected: f64 = pts
            .iter()
            .map(|p| p.weight() * residual(p, &params).powi(2))
            .sum();
        assert_relative_eq!(system.rss(&params), expected, epsilon = 1e-12);
    }

    #[test]
    fn identical_x_is_singular() {
        let pts = points(&[(5.0, 1.0, 1.0), (5.0, 2.0, 1.0), (5.0, 3.0, 1.0)]);
        let system = WeightedSystem::from_points(&pts);
        assert!(system.solve().is_none());
        assert!(invert_normal_matrix(&system.normal_matrix()).is_none());
    }

    #[test]
    fn normal_matrix_inverse_is_parameter_covariance() {
        let pts = points(&[(0.0, 0.0, 1.0), (1.0, 1.0, 1.0), (2.0, 2.0, 1.0)]);
        let system = WeightedSystem::from_points(&pts);
        let cov = invert_normal_matrix(&system.normal_matrix()).unwrap();
        // Unit weights, x = 0,1,2: Var(slope) = 1/Σ(x-x̄)² = 1/2.
        assert_relative_eq!(cov[(1, 1)], 0.5, epsilon = 1e-12);
        // Var(intercept) = Σx² / (n·Σ(x-x̄)²) = 5/6.
        assert_relative_eq!(cov[(0, 0)], 5.0 / 6.0, epsilon = 1e-12);
    }
}
