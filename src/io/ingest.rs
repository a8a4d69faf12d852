//! Text dataset ingest.
//!
//! Lab datasets are plain text: one sample per line, whitespace-separated
//! numbers. Blank lines and lines starting with `#` are skipped. The number of
//! columns is fixed by the dataset layout:
//!
//! - calibration: `x y σy` (multimeter ΔV, oscilloscope ΔV, error)
//! - I–V curve: `V I σV σI` (mV, mA)
//!
//! Design goals:
//! - **Strict rows**: a malformed line is an error naming file and line (exit code 2)
//! - **Separation of concerns**: no fitting logic here

use std::path::Path;

use crate::domain::{Linear, MeasurementSeries};
use crate::error::{AppError, FitError};

/// Column layout of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetLayout {
    /// `x y σy`
    Calibration,
    /// `x y σx σy`
    IvCurve,
}

impl DatasetLayout {
    pub fn columns(self) -> usize {
        match self {
            DatasetLayout::Calibration => 3,
            DatasetLayout::IvCurve => 4,
        }
    }

    pub fn column_names(self) -> &'static str {
        match self {
            DatasetLayout::Calibration => "x y sigma_y",
            DatasetLayout::IvCurve => "x y sigma_x sigma_y",
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Numeric rows together with the line each one came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    pub rows: Vec<Vec<f64>>,
    pub lines: Vec<usize>,
}

/// Parse dataset text into rows of exactly `layout.columns()` numbers.
pub fn parse_rows(text: &str, layout: DatasetLayout) -> Result<ParsedRows, RowError> {
    let mut parsed = ParsedRows::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = trimmed
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| RowError {
                    line,
                    message: format!("'{tok}' is not a number"),
                })
            })
            .collect::<Result<Vec<f64>, RowError>>()?;

        if row.len() != layout.columns() {
            return Err(RowError {
                line,
                message: format!(
                    "expected {} columns ({}), found {}",
                    layout.columns(),
                    layout.column_names(),
                    row.len()
                ),
            });
        }

        parsed.rows.push(row);
        parsed.lines.push(line);
    }

    Ok(parsed)
}

/// Build a series from dataset text, reporting failures by line.
pub fn series_from_text(text: &str, layout: DatasetLayout) -> Result<MeasurementSeries<Linear>, RowError> {
    let parsed = parse_rows(text, layout)?;
    MeasurementSeries::from_rows(&parsed.rows).map_err(|e| match e {
        FitError::InvalidData { index, reason } => RowError {
            line: parsed.lines.get(index).copied().unwrap_or(0),
            message: reason,
        },
        other => RowError {
            line: 0,
            message: other.to_string(),
        },
    })
}

/// Load a dataset file into a linear-scale series.
pub fn load_series(path: &Path, layout: DatasetLayout) -> Result<MeasurementSeries<Linear>, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to open dataset '{}': {e}", path.display())))?;

    let series = series_from_text(&text, layout)
        .map_err(|e| AppError::new(2, format!("Invalid dataset '{}', {e}", path.display())))?;

    tracing::debug!(path = %path.display(), points = series.len(), "loaded dataset");
    Ok(series)
}
