//! Synthetic lab datasets.
//!
//! Generates a calibration line and one forward-bias I–V curve per junction,
//! with Gaussian noise and the matching error columns, so the tool can be run
//! end to end without measurements.
//!
//! Units follow the lab files: voltages in mV, currents in mA.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::debug;

use crate::domain::{DataPoint, Junction, Linear, MeasurementSeries};
use crate::error::AppError;

/// Ground truth for the calibration line `y = offset + slope·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationTruth {
    pub offset: f64,
    pub slope: f64,
    /// Absolute noise on y, also written as the σy column.
    pub sigma: f64,
    pub x_max: f64,
}

impl Default for CalibrationTruth {
    fn default() -> Self {
        Self {
            offset: -5.0,
            slope: 0.99,
            sigma: 5.0,
            x_max: 1000.0,
        }
    }
}

/// Ground truth for a diode curve `I = I0·(exp(V/ηV_T) - 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeTruth {
    /// Saturation current (mA).
    pub saturation_current: f64,
    /// `η·V_T` (mV).
    pub thermal_voltage: f64,
    pub v_min: f64,
    pub v_max: f64,
    /// Voltage reading error (mV); jitter on V and the σV column.
    pub sigma_v: f64,
    /// Relative current error; log-normal noise on I and `σI = rel·I`.
    pub relative_noise: f64,
}

impl DiodeTruth {
    pub fn default_for(junction: Junction) -> Self {
        match junction {
            Junction::Germanium => Self {
                saturation_current: 1e-3,
                thermal_voltage: 45.0,
                v_min: 50.0,
                v_max: 450.0,
                sigma_v: 0.5,
                relative_noise: 0.02,
            },
            Junction::Silicon => Self {
                saturation_current: 1e-8,
                thermal_voltage: 50.0,
                v_min: 300.0,
                v_max: 800.0,
                sigma_v: 0.5,
                relative_noise: 0.02,
            },
        }
    }

    pub fn current(&self, v: f64) -> f64 {
        self.saturation_current * (v / self.thermal_voltage).exp_m1()
    }
}

/// Everything needed to generate one synthetic run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSpec {
    pub seed: u64,
    /// Points per dataset.
    pub points: usize,
    pub calibration: CalibrationTruth,
    pub germanium: DiodeTruth,
    pub silicon: DiodeTruth,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            seed: 42,
            points: 40,
            calibration: CalibrationTruth::default(),
            germanium: DiodeTruth::default_for(Junction::Germanium),
            silicon: DiodeTruth::default_for(Junction::Silicon),
        }
    }
}

impl SyntheticSpec {
    pub fn diode(&self, junction: Junction) -> &DiodeTruth {
        match junction {
            Junction::Germanium => &self.germanium,
            Junction::Silicon => &self.silicon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub calibration: MeasurementSeries<Linear>,
    pub germanium: MeasurementSeries<Linear>,
    pub silicon: MeasurementSeries<Linear>,
}

impl SyntheticData {
    pub fn junction(&self, junction: Junction) -> &MeasurementSeries<Linear> {
        match junction {
            Junction::Germanium => &self.germanium,
            Junction::Silicon => &self.silicon,
        }
    }
}

pub fn generate(spec: &SyntheticSpec) -> Result<SyntheticData, AppError> {
    if spec.points < 2 {
        return Err(AppError::new(2, "Synthetic datasets need at least 2 points."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let calibration = calibration_series(&mut rng, &normal, &spec.calibration, spec.points)?;
    let germanium = diode_series(&mut rng, &normal, &spec.germanium, spec.points)?;
    let silicon = diode_series(&mut rng, &normal, &spec.silicon, spec.points)?;

    debug!(seed = spec.seed, points = spec.points, "generated synthetic datasets");
    Ok(SyntheticData {
        calibration,
        germanium,
        silicon,
    })
}

fn calibration_series(
    rng: &mut StdRng,
    normal: &Normal<f64>,
    truth: &CalibrationTruth,
    n: usize,
) -> Result<MeasurementSeries<Linear>, AppError> {
    if !(truth.sigma.is_finite() && truth.sigma > 0.0 && truth.x_max.is_finite() && truth.x_max > 0.0) {
        return Err(AppError::new(2, "Invalid calibration noise or range."));
    }

    let points = grid(0.0, truth.x_max, n)
        .map(|x| {
            let y = truth.offset + truth.slope * x + truth.sigma * normal.sample(rng);
            DataPoint::new(x, y, 0.0, truth.sigma)
        })
        .collect();

    MeasurementSeries::from_points(points).map_err(AppError::from)
}

fn diode_series(
    rng: &mut StdRng,
    normal: &Normal<f64>,
    truth: &DiodeTruth,
    n: usize,
) -> Result<MeasurementSeries<Linear>, AppError> {
    if !(truth.v_min.is_finite() && truth.v_max > truth.v_min && truth.v_min > 0.0) {
        return Err(AppError::new(2, "Invalid synthetic voltage range."));
    }
    if !(truth.saturation_current > 0.0 && truth.thermal_voltage > 0.0 && truth.relative_noise >= 0.0) {
        return Err(AppError::new(2, "Invalid synthetic diode parameters."));
    }

    let points = grid(truth.v_min, truth.v_max, n)
        .map(|v_set| {
            let v = v_set + truth.sigma_v * normal.sample(rng);
            // Log-normal noise keeps every current strictly positive.
            let i = truth.current(v) * (truth.relative_noise * normal.sample(rng)).exp();
            DataPoint::new(v, i, truth.sigma_v, truth.relative_noise * i)
        })
        .collect();

    MeasurementSeries::from_points(points).map_err(AppError::from)
}

fn grid(lo: f64, hi: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = (hi - lo) / (n as f64 - 1.0);
    (0..n).map(move |i| lo + step * i as f64)
}
