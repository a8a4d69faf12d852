//! Input/output helpers.
//!
//! - text dataset ingest + validation (`ingest`)
//! - per-junction CSV tables and dataset writing (`export`)
//! - results JSON read/write (`results`)

pub mod export;
pub mod ingest;
pub mod results;

pub use export::*;
pub use ingest::*;
pub use results::*;
