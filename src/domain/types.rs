//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - read from the analysis TOML (fit settings per junction)
//! - used in-memory during fitting
//! - exported to JSON/CSV

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FitError;

/// Which junction a dataset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Junction {
    Germanium,
    Silicon,
}

impl Junction {
    pub const ALL: [Junction; 2] = [Junction::Germanium, Junction::Silicon];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Junction::Germanium => "Germanium",
            Junction::Silicon => "Silicon",
        }
    }

    /// Short tag used in file names and exports.
    pub fn tag(self) -> &'static str {
        match self {
            Junction::Germanium => "ge",
            Junction::Silicon => "si",
        }
    }
}

/// The two parameters of the straight line `y = intercept + slope·x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Intercept,
    Slope,
}

impl Parameter {
    pub const ALL: [Parameter; 2] = [Parameter::Intercept, Parameter::Slope];

    /// Position in the parameter vector (`0` intercept, `1` slope).
    pub fn index(self) -> usize {
        match self {
            Parameter::Intercept => 0,
            Parameter::Slope => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Intercept => "intercept",
            Parameter::Slope => "slope",
        }
    }
}

/// Inclusive x sub-range a fit is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XRange {
    pub lo: f64,
    pub hi: f64,
}

impl XRange {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lo <= x && x <= self.hi
    }
}

/// Interval constraint on one parameter. A missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bound {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn lower(&self) -> f64 {
        self.min.unwrap_or(f64::NEG_INFINITY)
    }

    pub fn upper(&self) -> f64 {
        self.max.unwrap_or(f64::INFINITY)
    }

    /// `true` if at least one side is a finite number.
    pub fn is_finite(&self) -> bool {
        self.lower().is_finite() || self.upper().is_finite()
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower()).min(self.upper())
    }
}

/// Optional bounds per line parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intercept: Option<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope: Option<Bound>,
}

impl ParameterBounds {
    pub fn get(&self, param: Parameter) -> Option<Bound> {
        match param {
            Parameter::Intercept => self.intercept,
            Parameter::Slope => self.slope,
        }
    }

    /// The effective interval for a parameter (`(-inf, inf)` when unset).
    pub fn interval(&self, param: Parameter) -> Bound {
        self.get(param).unwrap_or_default()
    }

    /// `true` if any parameter has a finite bound.
    pub fn any_finite(&self) -> bool {
        Parameter::ALL
            .iter()
            .any(|&p| self.get(p).is_some_and(|b| b.is_finite()))
    }
}

/// Settings of the iterative bounded solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Relative change of the weighted RSS below which the solve stops.
    pub tolerance: f64,
    /// Iteration cap; reaching it without convergence is an error.
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 500,
        }
    }
}

/// How a straight-line fit is restricted and constrained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Points outside this range are ignored. `None` uses every point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_range: Option<XRange>,
    /// Starting `[intercept, slope]` for the bounded solver.
    pub initial_guess: [f64; 2],
    pub bounds: ParameterBounds,
    pub solver: SolverSettings,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            x_range: None,
            initial_guess: [1.0, 0.02],
            bounds: ParameterBounds::default(),
            solver: SolverSettings::default(),
        }
    }
}

impl FitConfig {
    /// Full range, no bounds.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, lo: f64, hi: f64) -> Self {
        self.x_range = Some(XRange::new(lo, hi));
        self
    }

    pub fn with_bound(mut self, param: Parameter, bound: Bound) -> Self {
        match param {
            Parameter::Intercept => self.bounds.intercept = Some(bound),
            Parameter::Slope => self.bounds.slope = Some(bound),
        }
        self
    }

    pub fn with_initial_guess(mut self, intercept: f64, slope: f64) -> Self {
        self.initial_guess = [intercept, slope];
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.solver.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<(), FitError> {
        if let Some(range) = self.x_range {
            if !(range.lo.is_finite() && range.hi.is_finite()) {
                return Err(FitError::InvalidConfig(format!(
                    "x_range ends must be finite, got [{}, {}]",
                    range.lo, range.hi
                )));
            }
            if range.lo > range.hi {
                return Err(FitError::InvalidConfig(format!(
                    "x_range lo ({}) is greater than hi ({})",
                    range.lo, range.hi
                )));
            }
        }
        for param in Parameter::ALL {
            let Some(bound) = self.bounds.get(param) else {
                continue;
            };
            if bound.min.is_some_and(f64::is_nan) || bound.max.is_some_and(f64::is_nan) {
                return Err(FitError::InvalidConfig(format!(
                    "{} bound contains NaN",
                    param.name()
                )));
            }
            if bound.lower() > bound.upper() {
                return Err(FitError::InvalidConfig(format!(
                    "{} bound min ({}) is greater than max ({})",
                    param.name(),
                    bound.lower(),
                    bound.upper()
                )));
            }
        }
        if self.initial_guess.iter().any(|v| !v.is_finite()) {
            return Err(FitError::InvalidConfig(format!(
                "initial guess must be finite, got {:?}",
                self.initial_guess
            )));
        }
        if !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0) {
            return Err(FitError::InvalidConfig(format!(
                "solver tolerance must be > 0, got {}",
                self.solver.tolerance
            )));
        }
        if self.solver.max_iterations == 0 {
            return Err(FitError::InvalidConfig(
                "solver max_iterations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Output of a straight-line fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFitResult {
    pub intercept: f64,
    pub slope: f64,
    pub intercept_error: f64,
    pub slope_error: f64,
    /// Weighted residual sum of squares.
    pub chi_square: f64,
    /// Degrees of freedom: points used minus free parameters.
    pub ndf: usize,
    /// `chi_square / ndf`, NaN when `ndf == 0` (`null` in JSON).
    #[serde(deserialize_with = "nan_if_null")]
    pub reduced_chi_square: f64,
    pub points_used: usize,
    pub x_range: Option<XRange>,
    /// Whether the iterative bounded solver produced this result.
    pub bounded: bool,
    /// Parameters that ended pinned at one of their bounds.
    pub active_bounds: Vec<Parameter>,
    /// Solver iterations (0 for the closed-form path).
    pub iterations: usize,
}

impl LinearFitResult {
    /// Evaluate the fitted line.
    pub fn predict(&self, x: f64) -> f64 {
        crate::models::predict(&[self.intercept, self.slope], x)
    }

    pub fn value(&self, param: Parameter) -> f64 {
        match param {
            Parameter::Intercept => self.intercept,
            Parameter::Slope => self.slope,
        }
    }

    pub fn error(&self, param: Parameter) -> f64 {
        match param {
            Parameter::Intercept => self.intercept_error,
            Parameter::Slope => self.slope_error,
        }
    }

    pub fn is_pinned(&self, param: Parameter) -> bool {
        self.active_bounds.contains(&param)
    }
}

/// A value with its propagated standard error.
///
/// A zero slope gives an infinite `η·V_T` with a NaN error. JSON writes both as
/// `null`, which reads back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measured {
    #[serde(deserialize_with = "nan_if_null")]
    pub value: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub error: f64,
}

impl Measured {
    pub fn new(value: f64, error: f64) -> Self {
        Self { value, error }
    }

    /// `|error / value|`.
    pub fn relative_error(&self) -> f64 {
        (self.error / self.value).abs()
    }
}

/// Physical quantities derived from a linearized junction fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JunctionParameters {
    /// `η·V_T = 1/slope`, in x units (mV).
    pub thermal_voltage: Measured,
    /// `I0 = exp(intercept)`, in y units (mA).
    pub saturation_current: Measured,
    /// `η = η·V_T / (kT/q)` when a temperature is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideality_factor: Option<Measured>,
}
