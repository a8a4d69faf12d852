//! `junction-fit` library crate.
//!
//! The binary (`jfit`) is a thin wrapper around this library so that:
//!
//! - the fitting core is testable without spawning processes
//! - calibration, linearization and bounded fits are reusable on their own
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
