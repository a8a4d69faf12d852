//! Measurement series: the container every pipeline stage reads.
//!
//! A series is an ordered list of `(x, y, σx, σy)` points. The scale of the
//! y-values is part of the type:
//!
//! - `MeasurementSeries<Linear>`: y is the measured quantity (e.g. current in mA)
//! - `MeasurementSeries<Logarithmic>`: y is `ln` of that quantity
//!
//! Only a linear series can be linearized, so an already-transformed series
//! cannot be transformed twice, and reports can label axes from the type.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::FitError;

mod sealed {
    pub trait Sealed {}
}

/// Scale marker for the y-values of a series.
pub trait Scale: sealed::Sealed + Copy + Default + std::fmt::Debug {
    /// Short machine name (`"linear"` / `"log"`), used in exports.
    const NAME: &'static str;
}

/// y holds the measured value itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Linear;

/// y holds the natural logarithm of the measured value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Logarithmic;

impl sealed::Sealed for Linear {}
impl sealed::Sealed for Logarithmic {}

impl Scale for Linear {
    const NAME: &'static str = "linear";
}

impl Scale for Logarithmic {
    const NAME: &'static str = "log";
}

/// One measured sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub sigma_x: f64,
    pub sigma_y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64, sigma_x: f64, sigma_y: f64) -> Self {
        Self { x, y, sigma_x, sigma_y }
    }

    /// Least-squares weight `1/σy²`.
    ///
    /// A point with `σy = 0` gets weight 1 instead of an infinite weight.
    pub fn weight(&self) -> f64 {
        if self.sigma_y > 0.0 {
            1.0 / (self.sigma_y * self.sigma_y)
        } else {
            1.0
        }
    }

    fn validate(&self, index: usize) -> Result<(), FitError> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("sigma_x", self.sigma_x),
            ("sigma_y", self.sigma_y),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(invalid(index, format!("{name} is not finite ({value})")));
            }
        }
        if self.sigma_x < 0.0 {
            return Err(invalid(index, format!("negative sigma_x ({})", self.sigma_x)));
        }
        if self.sigma_y < 0.0 {
            return Err(invalid(index, format!("negative sigma_y ({})", self.sigma_y)));
        }
        Ok(())
    }
}

fn invalid(index: usize, reason: String) -> FitError {
    FitError::InvalidData { index, reason }
}

/// Ordered sequence of measured points, tagged with the scale of y.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries<S: Scale = Linear> {
    points: Vec<DataPoint>,
    scale: PhantomData<S>,
}

impl<S: Scale> Default for MeasurementSeries<S> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            scale: PhantomData,
        }
    }
}

impl<S: Scale> MeasurementSeries<S> {
    /// Build a series from validated points.
    pub fn from_points(points: Vec<DataPoint>) -> Result<Self, FitError> {
        for (i, p) in points.iter().enumerate() {
            p.validate(i)?;
        }
        Ok(Self {
            points,
            scale: PhantomData,
        })
    }

    /// Build a series from numeric rows.
    ///
    /// Rows have either 3 values `(x, y, σy)` with `σx = 0`, or 4 values
    /// `(x, y, σx, σy)`.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, FitError> {
        let mut points = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let point = match *row.as_ref() {
                [x, y, sigma_y] => DataPoint::new(x, y, 0.0, sigma_y),
                [x, y, sigma_x, sigma_y] => DataPoint::new(x, y, sigma_x, sigma_y),
                ref other => {
                    return Err(invalid(
                        i,
                        format!("expected 3 or 4 values, got {}", other.len()),
                    ));
                }
            };
            points.push(point);
        }
        Self::from_points(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&DataPoint> {
        self.points.get(index)
    }

    pub fn x(&self, index: usize) -> Option<f64> {
        self.point(index).map(|p| p.x)
    }

    pub fn y(&self, index: usize) -> Option<f64> {
        self.point(index).map(|p| p.y)
    }

    pub fn sigma_x(&self, index: usize) -> Option<f64> {
        self.point(index).map(|p| p.sigma_x)
    }

    pub fn sigma_y(&self, index: usize) -> Option<f64> {
        self.point(index).map(|p| p.sigma_y)
    }

    /// Overwrite the y-value of one point.
    pub fn set_y(&mut self, index: usize, y: f64) -> Result<(), FitError> {
        let mut point = *self.point_checked(index)?;
        point.y = y;
        point.validate(index)?;
        self.points[index] = point;
        Ok(())
    }

    /// Overwrite the y-uncertainty of one point.
    pub fn set_sigma_y(&mut self, index: usize, sigma_y: f64) -> Result<(), FitError> {
        let mut point = *self.point_checked(index)?;
        point.sigma_y = sigma_y;
        point.validate(index)?;
        self.points[index] = point;
        Ok(())
    }

    /// `(min x, max x)`, or `None` for an empty series.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        let mut iter = self.points.iter().map(|p| p.x);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
    }

    pub fn scale_name(&self) -> &'static str {
        S::NAME
    }

    fn point_checked(&self, index: usize) -> Result<&DataPoint, FitError> {
        self.points.get(index).ok_or_else(|| {
            invalid(
                index,
                format!("index out of range for series of {} points", self.points.len()),
            )
        })
    }
}
