//! Line model shared by the calibration and junction fits.
//!
//! Both fits use the first-degree polynomial `y = p0 + p1·x`; keeping its
//! design row and evaluation here lets fitting and reporting code stay generic.

pub mod model;

pub use model::*;
