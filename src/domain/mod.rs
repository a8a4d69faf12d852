//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the measurement container (`MeasurementSeries`, `DataPoint`, scale markers)
//! - fit settings (`FitConfig`, `XRange`, `ParameterBounds`)
//! - fit outputs (`LinearFitResult`, `JunctionParameters`, `Measured`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
