//! Range-restricted, optionally bounded straight-line fits.
//!
//! Given a series and a [`FitConfig`]:
//!
//! 1. select the points with `lo ≤ x ≤ hi` (all points without a range)
//! 2. if no parameter has a finite bound, solve the weighted normal equations
//!    in closed form
//! 3. otherwise run an iterative bounded solve from the configured initial
//!    guess, keeping every iterate inside the parameter box
//!
//! Restricting the range only changes which points enter the sums; the problem
//! stays linear, so the closed form applies whenever no bound is set.

use nalgebra::{Matrix2, Vector2};
use tracing::{debug, trace};

use crate::domain::{
    Bound, DataPoint, FitConfig, LinearFitResult, MeasurementSeries, Parameter, Scale, XRange,
};
use crate::error::FitError;
use crate::math::{WeightedSystem, invert_normal_matrix};
use crate::models::PARAM_COUNT;

/// Minimum number of points a line fit needs.
pub const MIN_POINTS: usize = 2;

/// Relative distance within which a parameter counts as sitting on its bound.
const BOUND_RTOL: f64 = 1e-9;

/// Gradient components below this fraction of their terms count as zero.
const STATIONARY_RTOL: f64 = 1e-6;

/// Fits `y = intercept + slope·x` to the part of a series inside the configured range.
#[derive(Debug, Clone)]
pub struct RestrictedLinearFitter {
    config: FitConfig,
}

impl RestrictedLinearFitter {
    pub fn new(config: FitConfig) -> Result<Self, FitError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn fit<S: Scale>(&self, series: &MeasurementSeries<S>) -> Result<LinearFitResult, FitError> {
        let selected = select_points(series.points(), self.config.x_range);
        debug!(
            total = series.len(),
            selected = selected.len(),
            range = ?self.config.x_range,
            "selected points for line fit"
        );

        if self.config.bounds.any_finite() {
            fit_bounded(&selected, &self.config)
        } else {
            fit_closed_form(&selected, self.config.x_range)
        }
    }
}

/// Points whose x lies inside `range` (inclusive), or all points.
pub fn select_points(points: &[DataPoint], range: Option<XRange>) -> Vec<DataPoint> {
    match range {
        Some(r) => points.iter().copied().filter(|p| r.contains(p.x)).collect(),
        None => points.to_vec(),
    }
}

fn ensure_enough(points: &[DataPoint]) -> Result<(), FitError> {
    if points.len() < MIN_POINTS {
        return Err(FitError::InsufficientData {
            required: MIN_POINTS,
            available: points.len(),
        });
    }
    Ok(())
}

/// Closed-form weighted fit over `points`.
///
/// `x_range` is only recorded in the result; callers pass already-selected points.
pub fn fit_closed_form(points: &[DataPoint], x_range: Option<XRange>) -> Result<LinearFitResult, FitError> {
    ensure_enough(points)?;

    let system = WeightedSystem::from_points(points);
    let params = system.solve().ok_or(FitError::SingularFit)?;
    let cov = invert_normal_matrix(&system.normal_matrix()).ok_or(FitError::SingularFit)?;

    let chi_square = system.rss(&params);
    Ok(build_result(
        params,
        [cov[(0, 0)].sqrt(), cov[(1, 1)].sqrt()],
        chi_square,
        points.len(),
        PARAM_COUNT,
        x_range,
        Vec::new(),
        false,
        0,
    ))
}

/// Iterative bounded fit over `points`.
///
/// Each iteration:
/// - computes the gradient of the weighted RSS and holds parameters that sit on
///   a bound (within [`BOUND_RTOL`]) with the gradient pushing outward
/// - takes a Newton step on the free parameters, stopped at the first bound it
///   meets
/// - falls back to an exact, clamped coordinate sweep when that step does not
///   lower the RSS
///
/// The loop stops once the relative change of the RSS drops below the
/// configured tolerance and the gradient vanishes on the free parameters.
/// Running out of iterations is a [`FitError::Convergence`].
pub fn fit_bounded(points: &[DataPoint], config: &FitConfig) -> Result<LinearFitResult, FitError> {
    ensure_enough(points)?;

    let system = WeightedSystem::from_points(points);
    let a = system.normal_matrix();
    let b = system.normal_rhs();
    let boxes = Parameter::ALL.map(|p| config.bounds.interval(p));

    let guess = config.initial_guess;
    let mut params = [boxes[0].clamp(guess[0]), boxes[1].clamp(guess[1])];
    let mut relative_change = f64::INFINITY;
    // RSS changes below machine precision of the problem count as converged,
    // otherwise a perfect fit (RSS ~ 0) would chase rounding noise.
    let rss_floor = (f64::EPSILON * system.weighted_sum_of_squares()).max(f64::MIN_POSITIVE);

    for iteration in 1..=config.solver.max_iterations {
        let grad = gradient(&a, &b, &params);
        let mut free = Vec::with_capacity(PARAM_COUNT);
        for j in 0..PARAM_COUNT {
            match blocking_bound(params[j], grad[j], &boxes[j], guess[j]) {
                Some(edge) => params[j] = edge,
                None => free.push(j),
            }
        }
        let rss = system.rss(&params);
        let grad = gradient(&a, &b, &params);

        let mut candidate = params;
        if !free.is_empty() {
            let stepped = newton_step(&a, &grad, &free)
                .map(|delta| step_to_boundary(&params, &delta, &boxes))
                .filter(|next| system.rss(next) < rss);
            candidate = match stepped {
                Some(next) => next,
                None => coordinate_sweep(&a, &b, &params, &free, |j, v| boxes[j].clamp(v)),
            };
        }

        let new_rss = system.rss(&candidate);
        relative_change = (rss - new_rss).abs() / rss.max(rss_floor);
        trace!(iteration, rss = new_rss, relative_change, ?candidate, ?free, "bounded fit step");

        params = candidate;

        // Converged only when the free gradient vanishes as well.
        if relative_change < config.solver.tolerance && is_stationary(&a, &b, &params, &boxes, &guess) {
            debug!(iterations = iteration, rss = new_rss, "bounded fit converged");
            return finish_bounded(&system, &a, &b, params, boxes, points.len(), config, iteration);
        }
    }

    Err(FitError::Convergence {
        iterations: config.solver.max_iterations,
        relative_change,
    })
}

/// Half-gradient of the weighted RSS: `A·p − b`.
fn gradient(a: &Matrix2<f64>, b: &Vector2<f64>, params: &[f64; PARAM_COUNT]) -> [f64; PARAM_COUNT] {
    let g = a * Vector2::new(params[0], params[1]) - b;
    [g[0], g[1]]
}

/// The bound a parameter rests on when the descent direction leaves the box.
///
/// "Rests on" allows a relative distance of [`BOUND_RTOL`], so an iterate that
/// a backtracked step left just inside the box is still held at the bound.
fn blocking_bound(value: f64, grad: f64, bound: &Bound, guess: f64) -> Option<f64> {
    let near = |edge: f64| {
        let scale = edge.abs().max(value.abs()).max(guess.abs());
        (value - edge).abs() <= BOUND_RTOL * scale
    };
    let (lower, upper) = (bound.lower(), bound.upper());
    if grad > 0.0 && lower.is_finite() && (value <= lower || near(lower)) {
        Some(lower)
    } else if grad < 0.0 && upper.is_finite() && (value >= upper || near(upper)) {
        Some(upper)
    } else {
        None
    }
}

/// `true` when the gradient component is negligible next to the terms it sums.
fn negligible_gradient(a: &Matrix2<f64>, b: &Vector2<f64>, params: &[f64; PARAM_COUNT], j: usize, grad: f64) -> bool {
    let scale = (a[(j, 0)] * params[0]).abs() + (a[(j, 1)] * params[1]).abs() + b[j].abs();
    grad.abs() <= STATIONARY_RTOL * scale
}

/// First-order optimality in the box: each gradient component is negligible
/// or blocked by the bound its parameter rests on.
fn is_stationary(
    a: &Matrix2<f64>,
    b: &Vector2<f64>,
    params: &[f64; PARAM_COUNT],
    boxes: &[Bound; PARAM_COUNT],
    guess: &[f64; PARAM_COUNT],
) -> bool {
    let grad = gradient(a, b, params);
    (0..PARAM_COUNT).all(|j| {
        negligible_gradient(a, b, params, j, grad[j])
            || blocking_bound(params[j], grad[j], &boxes[j], guess[j]).is_some()
    })
}

/// Newton direction on the free parameters (active ones stay put).
fn newton_step(a: &Matrix2<f64>, grad: &[f64; PARAM_COUNT], free: &[usize]) -> Option<[f64; PARAM_COUNT]> {
    let mut delta = [0.0; PARAM_COUNT];
    match free {
        [j] => {
            let ajj = a[(*j, *j)];
            if ajj <= 0.0 {
                return None;
            }
            delta[*j] = -grad[*j] / ajj;
        }
        _ => {
            let inv = invert_normal_matrix(a)?;
            let d = -(inv * Vector2::new(grad[0], grad[1]));
            delta = [d[0], d[1]];
        }
    }
    if delta.iter().all(|v| v.is_finite()) {
        Some(delta)
    } else {
        None
    }
}

/// Move along `delta` until the first bound it meets, or the full step.
///
/// The RSS is a convex quadratic and `delta` a Newton direction, so every point
/// of the shortened step improves on `params`. The blocking parameter lands
/// exactly on its bound and is held there on the next iteration.
fn step_to_boundary(
    params: &[f64; PARAM_COUNT],
    delta: &[f64; PARAM_COUNT],
    boxes: &[Bound; PARAM_COUNT],
) -> [f64; PARAM_COUNT] {
    let mut alpha = 1.0;
    let mut blocking = None;
    for j in 0..PARAM_COUNT {
        let target = params[j] + delta[j];
        let edge = if target < boxes[j].lower() {
            boxes[j].lower()
        } else if target > boxes[j].upper() {
            boxes[j].upper()
        } else {
            continue;
        };
        let reach = ((edge - params[j]) / delta[j]).max(0.0);
        if reach < alpha {
            alpha = reach;
            blocking = Some((j, edge));
        }
    }

    let mut next = [0.0; PARAM_COUNT];
    for j in 0..PARAM_COUNT {
        next[j] = boxes[j].clamp(params[j] + alpha * delta[j]);
    }
    if let Some((j, edge)) = blocking {
        next[j] = edge;
    }
    next
}

/// Exact minimization along each free coordinate in turn, clamped to its bound.
fn coordinate_sweep(
    a: &Matrix2<f64>,
    b: &Vector2<f64>,
    params: &[f64; PARAM_COUNT],
    free: &[usize],
    project: impl Fn(usize, f64) -> f64,
) -> [f64; PARAM_COUNT] {
    let mut next = *params;
    for &j in free {
        let ajj = a[(j, j)];
        if ajj <= 0.0 {
            continue;
        }
        let k = 1 - j;
        next[j] = project(j, (b[j] - a[(j, k)] * next[k]) / ajj);
    }
    next
}

#[allow(clippy::too_many_arguments)]
fn finish_bounded(
    system: &WeightedSystem,
    a: &Matrix2<f64>,
    b: &Vector2<f64>,
    mut params: [f64; PARAM_COUNT],
    boxes: [Bound; PARAM_COUNT],
    n: usize,
    config: &FitConfig,
    iterations: usize,
) -> Result<LinearFitResult, FitError> {
    let grad = gradient(a, b, &params);
    let mut pinned = Vec::new();
    for p in Parameter::ALL {
        let j = p.index();
        if negligible_gradient(a, b, &params, j, grad[j]) {
            continue;
        }
        if let Some(edge) = blocking_bound(params[j], grad[j], &boxes[j], config.initial_guess[j]) {
            params[j] = edge;
            pinned.push(p);
        }
    }

    // Covariance of the free parameters; pinned ones carry no error.
    let errors = match pinned.as_slice() {
        [] => {
            let cov = invert_normal_matrix(a).ok_or(FitError::SingularFit)?;
            [cov[(0, 0)].sqrt(), cov[(1, 1)].sqrt()]
        }
        [only] => {
            let free = 1 - only.index();
            let afree = a[(free, free)];
            if afree <= 0.0 {
                return Err(FitError::SingularFit);
            }
            let mut errors = [0.0; PARAM_COUNT];
            errors[free] = (1.0 / afree).sqrt();
            errors
        }
        _ => [0.0; PARAM_COUNT],
    };

    let free_count = PARAM_COUNT - pinned.len();
    let chi_square = system.rss(&params);
    Ok(build_result(
        params,
        errors,
        chi_square,
        n,
        free_count,
        config.x_range,
        pinned,
        true,
        iterations,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    params: [f64; PARAM_COUNT],
    errors: [f64; PARAM_COUNT],
    chi_square: f64,
    points_used: usize,
    free_params: usize,
    x_range: Option<XRange>,
    active_bounds: Vec<Parameter>,
    bounded: bool,
    iterations: usize,
) -> LinearFitResult {
    let ndf = points_used.saturating_sub(free_params);
    let reduced_chi_square = if ndf > 0 {
        chi_square / ndf as f64
    } else {
        f64::NAN
    };
    LinearFitResult {
        intercept: params[0],
        slope: params[1],
        intercept_error: errors[0],
        slope_error: errors[1],
        chi_square,
        ndf,
        reduced_chi_square,
        points_used,
        x_range,
        bounded,
        active_bounds,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Linear, ParameterBounds};
    use crate::fit::LinearCalibrator;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn line_series(a: f64, b: f64, xs: &[f64], sigma: f64) -> MeasurementSeries<Linear> {
        let rows: Vec<[f64; 3]> = xs.iter().map(|&x| [x, a + b * x, sigma]).collect();
        MeasurementSeries::from_rows(&rows).unwrap()
    }

    /// Exact minimum of the weighted RSS over the box: the free optimum when it
    /// is feasible, otherwise the best point on an edge (one parameter on a
    /// bound, the other minimized along it and clamped).
    fn box_minimum(points: &[DataPoint], bounds: &ParameterBounds) -> ([f64; PARAM_COUNT], f64) {
        let system = WeightedSystem::from_points(points);
        let a = system.normal_matrix();
        let b = system.normal_rhs();
        let boxes = Parameter::ALL.map(|p| bounds.interval(p));

        let mut candidates = Vec::new();
        let free = a.try_inverse().unwrap() * b;
        if (0..PARAM_COUNT).all(|j| boxes[j].clamp(free[j]) == free[j]) {
            candidates.push([free[0], free[1]]);
        }
        for j in 0..PARAM_COUNT {
            let k = 1 - j;
            for edge in [boxes[j].lower(), boxes[j].upper()] {
                if !edge.is_finite() {
                    continue;
                }
                let mut p = [0.0; PARAM_COUNT];
                p[j] = edge;
                p[k] = boxes[k].clamp((b[k] - a[(k, j)] * edge) / a[(k, k)]);
                candidates.push(p);
            }
        }
        candidates
            .into_iter()
            .map(|p| (p, system.rss(&p)))
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .unwrap()
    }

    #[test]
    fn recovers_exact_line_with_zero_chi_square() {
        let series = line_series(-2.5, 0.75, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 0.1);
        let fit = RestrictedLinearFitter::new(FitConfig::unrestricted())
            .unwrap()
            .fit(&series)
            .unwrap();
        assert_relative_eq!(fit.intercept, -2.5, epsilon = 1e-9);
        assert_relative_eq!(fit.slope, 0.75, epsilon = 1e-9);
        assert!(fit.reduced_chi_square.abs() < 1e-12);
        assert_eq!(fit.ndf, 4);
        assert!(!fit.bounded);
        assert_eq!(fit.iterations, 0);
    }

    #[test]
    fn unrestricted_fit_matches_calibrator() {
        let rows = [
            [0.0, 0.3, 0.2],
            [1.0, 1.1, 0.1],
            [2.0, 2.4, 0.3],
            [3.0, 2.9, 0.1],
            [4.0, 4.2, 0.2],
        ];
        let series: MeasurementSeries = MeasurementSeries::from_rows(&rows).unwrap();
        let a = RestrictedLinearFitter::new(FitConfig::unrestricted())
            .unwrap()
            .fit(&series)
            .unwrap();
        let b = LinearCalibrator::fit(&series).unwrap();
        assert_relative_eq!(a.intercept, b.intercept, epsilon = 1e-12);
        assert_relative_eq!(a.slope, b.slope, epsilon = 1e-12);
        assert_relative_eq!(a.intercept_error, b.intercept_error, epsilon = 1e-12);
        assert_relative_eq!(a.slope_error, b.slope_error, epsilon = 1e-12);
        assert_relative_eq!(a.chi_square, b.chi_square, epsilon = 1e-12);
    }

    #[test]
    fn range_excludes_outlier() {
        let mut rows: Vec<[f64; 3]> = (0..6).map(|i| [i as f64, 1.0 + 2.0 * i as f64, 0.1]).collect();
        // Far outside the range and far off the line.
        rows.push([20.0, -500.0, 0.1]);
        let series: MeasurementSeries = MeasurementSeries::from_rows(&rows).unwrap();

        let skewed = RestrictedLinearFitter::new(FitConfig::unrestricted())
            .unwrap()
            .fit(&series)
            .unwrap();
        assert!((skewed.slope - 2.0).abs() > 1.0);

        let fit = RestrictedLinearFitter::new(FitConfig::unrestricted().with_range(0.0, 5.0))
            .unwrap()
            .fit(&series)
            .unwrap();
        assert_eq!(fit.points_used, 6);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn too_few_points_in_range_is_insufficient() {
        let series = line_series(0.0, 1.0, &[0.0, 1.0, 2.0, 3.0], 0.1);
        let err = RestrictedLinearFitter::new(FitConfig::unrestricted().with_range(2.5, 10.0))
            .unwrap()
            .fit(&series)
            .unwrap_err();
        assert_eq!(
            err,
            FitError::InsufficientData {
                required: 2,
                available: 1
            }
        );
    }

    #[test]
    fn identical_x_is_singular() {
        let series: MeasurementSeries =
            MeasurementSeries::from_rows(&[[5.0, 1.0, 0.1], [5.0, 2.0, 0.1], [5.0, 3.0, 0.1]]).unwrap();
        let err = RestrictedLinearFitter::new(FitConfig::unrestricted())
            .unwrap()
            .fit(&series)
            .unwrap_err();
        assert_eq!(err, FitError::SingularFit);
    }

    #[test]
    fn bounded_fit_clamps_slope_at_bound() {
        let series = line_series(1.0, 2.0, &[0.0, 1.0, 2.0, 3.0, 4.0], 1.0);
        let config = FitConfig::unrestricted()
            .with_initial_guess(0.0, 0.0)
            .with_bound(Parameter::Slope, Bound::new(0.0, 1.5));
        let fit = RestrictedLinearFitter::new(config).unwrap().fit(&series).unwrap();

        assert!(fit.bounded);
        assert_relative_eq!(fit.slope, 1.5, epsilon = 1e-12);
        // With the slope pinned, the intercept is the mean of y - 1.5x = 1 + 0.5x.
        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-9);
        assert_eq!(fit.active_bounds, vec![Parameter::Slope]);
        assert_eq!(fit.slope_error, 0.0);
        assert_relative_eq!(fit.intercept_error, (1.0f64 / 5.0).sqrt(), epsilon = 1e-12);
        assert_eq!(fit.ndf, 4);
    }

    #[test]
    fn inactive_bound_matches_closed_form() {
        let rows = [
            [100.0, 0.1, 0.05],
            [150.0, 2.2, 0.05],
            [200.0, 3.9, 0.05],
            [250.0, 6.1, 0.05],
        ];
        let series: MeasurementSeries = MeasurementSeries::from_rows(&rows).unwrap();
        let open = RestrictedLinearFitter::new(FitConfig::unrestricted())
            .unwrap()
            .fit(&series)
            .unwrap();
        let bounded = RestrictedLinearFitter::new(
            FitConfig::unrestricted().with_bound(Parameter::Slope, Bound::at_least(0.0)),
        )
        .unwrap()
        .fit(&series)
        .unwrap();

        assert!(bounded.bounded);
        assert!(bounded.active_bounds.is_empty());
        assert_relative_eq!(bounded.slope, open.slope, epsilon = 1e-9, max_relative = 1e-9);
        assert_relative_eq!(bounded.intercept, open.intercept, epsilon = 1e-7, max_relative = 1e-9);
        assert_relative_eq!(bounded.slope_error, open.slope_error, max_relative = 1e-9);
        assert_eq!(bounded.ndf, open.ndf);
    }

    #[test]
    fn bounded_fit_starts_from_clamped_guess() {
        let series = line_series(1.0, -1.0, &[0.0, 1.0, 2.0, 3.0], 0.5);
        // Guess outside the box; the optimum with slope >= 0 has the slope pinned at 0.
        let config = FitConfig::unrestricted()
            .with_initial_guess(50.0, -10.0)
            .with_bound(Parameter::Slope, Bound::at_least(0.0));
        let fit = RestrictedLinearFitter::new(config).unwrap().fit(&series).unwrap();
        assert_eq!(fit.slope, 0.0);
        // Mean of y = 1 - x over x = 0..3.
        assert_relative_eq!(fit.intercept, -0.5, epsilon = 1e-9);
        assert!(fit.is_pinned(Parameter::Slope));
    }

    #[test]
    fn both_parameters_pinned() {
        let series = line_series(1.0, 2.0, &[0.0, 1.0, 2.0], 1.0);
        let config = FitConfig::unrestricted()
            .with_bound(Parameter::Intercept, Bound::at_most(0.0))
            .with_bound(Parameter::Slope, Bound::at_most(0.0));
        let fit = RestrictedLinearFitter::new(config).unwrap().fit(&series).unwrap();
        assert_eq!(fit.intercept, 0.0);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.active_bounds.len(), 2);
        assert_eq!(fit.ndf, 3);
        assert_eq!((fit.intercept_error, fit.slope_error), (0.0, 0.0));
    }

    #[test]
    fn iteration_cap_is_a_convergence_error() {
        let series = line_series(1.0, 2.0, &[0.0, 1.0, 2.0, 3.0, 4.0], 1.0);
        let config = FitConfig::unrestricted()
            .with_initial_guess(0.0, 0.0)
            .with_bound(Parameter::Slope, Bound::new(0.0, 1.5))
            .with_max_iterations(1);
        let err = RestrictedLinearFitter::new(config).unwrap().fit(&series).unwrap_err();
        assert!(matches!(err, FitError::Convergence { iterations: 1, .. }));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let err = RestrictedLinearFitter::new(FitConfig::unrestricted().with_range(3.0, 1.0)).unwrap_err();
        assert!(matches!(err, FitError::InvalidConfig(_)));
    }

    #[test]
    fn two_points_leave_no_degrees_of_freedom() {
        let series = line_series(0.0, 1.0, &[0.0, 1.0], 0.1);
        let fit = RestrictedLinearFitter::new(FitConfig::unrestricted())
            .unwrap()
            .fit(&series)
            .unwrap();
        assert_eq!(fit.ndf, 0);
        assert!(fit.reduced_chi_square.is_nan());
    }

    #[test]
    fn iterate_just_inside_the_bound_is_held_there() {
        let series: MeasurementSeries = MeasurementSeries::from_rows(&[
            [-348.7277, -7.2663, 0.06137],
            [-313.8764, -8.4243, 0.52298],
        ])
        .unwrap();
        let min_slope = 0.016616608119821755;
        let config = FitConfig::unrestricted()
            .with_initial_guess(47.117, 0.17111)
            .with_bound(Parameter::Slope, Bound::at_least(min_slope));
        let fit = RestrictedLinearFitter::new(config).unwrap().fit(&series).unwrap();

        assert_eq!(fit.slope, min_slope);
        assert_eq!(fit.active_bounds, vec![Parameter::Slope]);
        assert_eq!(fit.slope_error, 0.0);
        assert_eq!(fit.ndf, 1);
        assert_relative_eq!(fit.intercept, -1.4952, epsilon = 1e-3);
        assert_relative_eq!(fit.chi_square, 10.88, epsilon = 0.01);

        let (best, rss) = box_minimum(series.points(), &config.bounds);
        assert_relative_eq!(fit.intercept, best[0], epsilon = 1e-9, max_relative = 1e-9);
        assert_relative_eq!(fit.chi_square, rss, max_relative = 1e-9);
    }

    #[test]
    fn bounded_fits_reach_the_box_minimum() {
        let mut rng = StdRng::seed_from_u64(7);
        for case in 0..300 {
            let n = rng.gen_range(2..=6);
            let x0 = rng.gen_range(-400.0..200.0);
            let rows: Vec<[f64; 3]> = (0..n)
                .map(|i| {
                    [
                        x0 + 30.0 * i as f64 + rng.gen_range(0.0..20.0),
                        rng.gen_range(-10.0..10.0),
                        rng.gen_range(0.05..0.6),
                    ]
                })
                .collect();
            let series: MeasurementSeries = MeasurementSeries::from_rows(&rows).unwrap();
            let open = fit_closed_form(series.points(), None).unwrap();

            // Slope bound close to the free optimum, on either side, at varied distances.
            let offset = open.slope.abs().max(1e-3) * rng.gen_range(-0.5..0.5) * 10f64.powi(-rng.gen_range(0..8));
            let min_slope = open.slope + offset;
            let config = FitConfig::unrestricted()
                .with_initial_guess(rng.gen_range(-50.0..50.0), rng.gen_range(-0.2..0.2))
                .with_bound(Parameter::Slope, Bound::at_least(min_slope));
            let fit = RestrictedLinearFitter::new(config)
                .unwrap()
                .fit(&series)
                .unwrap_or_else(|e| panic!("case {case}: {e}"));

            let (best, rss) = box_minimum(series.points(), &config.bounds);
            assert!(fit.slope >= min_slope, "case {case}: slope {} below {min_slope}", fit.slope);
            assert!(
                fit.chi_square <= rss + 1e-8 * (1.0 + rss),
                "case {case}: chi2 {} vs box minimum {rss}",
                fit.chi_square
            );
            assert_relative_eq!(fit.slope, best[1], epsilon = 1e-6, max_relative = 1e-6);
        }
    }
}
