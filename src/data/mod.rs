//! Synthetic dataset generation (`jfit simulate`).

pub mod synthetic;

pub use synthetic::*;
