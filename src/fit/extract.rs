//! Physical quantities from a linearized junction fit.
//!
//! For `ln I = p0 + p1·V`:
//!
//! - `ηV_T = 1/p1`, `σ = σ_p1 / p1²`
//! - `I0 = exp(p0)`, `σ = exp(p0)·σ_p0`
//!
//! A zero slope is not an error here; the infinities propagate to the caller.

use crate::domain::{JunctionParameters, LinearFitResult, Measured};

/// Boltzmann constant over elementary charge, in mV/K.
pub const K_OVER_Q_MV_PER_K: f64 = 8.617_333_262e-2;

/// Thermal voltage `kT/q` in mV.
pub fn thermal_voltage_at(temperature_kelvin: f64) -> f64 {
    K_OVER_Q_MV_PER_K * temperature_kelvin
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterExtractor {
    temperature_kelvin: Option<f64>,
}

impl ParameterExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also derive the ideality factor at this junction temperature.
    pub fn with_temperature(mut self, temperature_kelvin: Option<f64>) -> Self {
        self.temperature_kelvin = temperature_kelvin;
        self
    }

    pub fn extract(&self, fit: &LinearFitResult) -> JunctionParameters {
        let thermal_voltage = thermal_voltage(fit);
        let ideality_factor = self.temperature_kelvin.map(|t| {
            let vt = thermal_voltage_at(t);
            Measured::new(thermal_voltage.value / vt, thermal_voltage.error / vt)
        });
        JunctionParameters {
            thermal_voltage,
            saturation_current: saturation_current(fit),
            ideality_factor,
        }
    }
}

/// `1/slope` with error `σ_slope / slope²`.
pub fn thermal_voltage(fit: &LinearFitResult) -> Measured {
    let slope = fit.slope;
    Measured::new(1.0 / slope, fit.slope_error / (slope * slope))
}

/// `exp(intercept)` with error `exp(intercept)·σ_intercept`.
pub fn saturation_current(fit: &LinearFitResult) -> Measured {
    let value = fit.intercept.exp();
    Measured::new(value, value * fit.intercept_error)
}

/// `a / b` with relative errors added in quadrature.
pub fn ratio(a: Measured, b: Measured) -> Measured {
    let value = a.value / b.value;
    let rel = a.relative_error().hypot(b.relative_error());
    Measured::new(value, (value * rel).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fit(intercept: f64, intercept_error: f64, slope: f64, slope_error: f64) -> LinearFitResult {
        LinearFitResult {
            intercept,
            slope,
            intercept_error,
            slope_error,
            chi_square: 0.0,
            ndf: 1,
            reduced_chi_square: 0.0,
            points_used: 3,
            x_range: None,
            bounded: false,
            active_bounds: Vec::new(),
            iterations: 0,
        }
    }

    #[test]
    fn derives_thermal_voltage_and_saturation_current() {
        let params = ParameterExtractor::new().extract(&fit(-9.0, 0.2, 0.04, 0.002));
        assert_relative_eq!(params.thermal_voltage.value, 25.0, epsilon = 1e-12);
        assert_relative_eq!(params.thermal_voltage.error, 0.002 / 0.0016, epsilon = 1e-12);
        assert_relative_eq!(params.saturation_current.value, (-9.0f64).exp(), epsilon = 1e-15);
        assert_relative_eq!(params.saturation_current.error, (-9.0f64).exp() * 0.2, epsilon = 1e-15);
        assert!(params.ideality_factor.is_none());
    }

    #[test]
    fn ideality_factor_uses_thermal_voltage_at_temperature() {
        let params = ParameterExtractor::new()
            .with_temperature(Some(300.0))
            .extract(&fit(0.0, 0.0, 1.0 / 51.704, 0.0));
        let eta = params.ideality_factor.unwrap();
        assert_relative_eq!(eta.value, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn ratio_adds_relative_errors_in_quadrature() {
        let r = ratio(Measured::new(50.0, 3.0), Measured::new(25.0, 1.0));
        assert_relative_eq!(r.value, 2.0, epsilon = 1e-12);
        // 6% and 4% → sqrt(0.0036 + 0.0016).
        assert_relative_eq!(r.error, 2.0 * 0.0052f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn zero_slope_propagates_infinity() {
        let tv = thermal_voltage(&fit(0.0, 0.0, 0.0, 0.1));
        assert!(tv.value.is_infinite());
        assert!(tv.error.is_infinite());
    }
}
