//! Model evaluation for the first-degree polynomial.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given x (for the normal equations)
//! - predict y(x) given the parameters (for residuals and reports)

/// Number of parameters of the line model (`p0` intercept, `p1` slope).
pub const PARAM_COUNT: usize = 2;

/// Design row `[1, x]`.
pub fn design_row(x: f64) -> [f64; PARAM_COUNT] {
    [1.0, x]
}

/// Predict `y(x) = p0 + p1·x`.
pub fn predict(params: &[f64; PARAM_COUNT], x: f64) -> f64 {
    params[0] + params[1] * x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_matches_design_row_dot_product() {
        let params = [-3.0, 0.5];
        let x = 8.0;
        let row = design_row(x);
        let dot: f64 = row.iter().zip(params.iter()).map(|(a, b)| a * b).sum();
        assert_eq!(predict(&params, x), dot);
        assert_eq!(predict(&params, x), 1.0);
    }
}
