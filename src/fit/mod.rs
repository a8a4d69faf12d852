//! Fitting and transformation engine.
//!
//! Responsibilities:
//!
//! - calibrate one instrument against another (`LinearCalibrator`)
//! - move current data into log space with error propagation (`LogLinearizer`)
//! - fit the linearized data over a chosen range, optionally bounded
//!   (`RestrictedLinearFitter`)
//! - turn line parameters into junction quantities (`ParameterExtractor`)

pub mod calibrator;
pub mod extract;
pub mod fitter;
pub mod linearize;

pub use calibrator::*;
pub use extract::*;
pub use fitter::*;
pub use linearize::*;
