//! Export per-junction fit tables and datasets as plain text.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::{Junction, MeasurementSeries, Scale};
use crate::error::AppError;
use crate::io::ingest::DatasetLayout;
use crate::report::ResidualRow;

/// File name of a junction's fit table inside an export directory.
pub fn fit_csv_name(junction: Junction) -> String {
    format!("{}_fit.csv", junction.tag())
}

/// Write a junction's residual rows to a CSV file.
pub fn write_fit_csv(path: &Path, rows: &[ResidualRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut file = BufWriter::new(file);

    writeln!(file, "x,ln_i,sigma,y_fit,residual,pull,in_range")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in rows {
        writeln!(
            file,
            "{:.6},{:.10},{:.10},{:.10},{:.10},{:.6},{}",
            r.x, r.y, r.sigma_y, r.y_fit, r.residual, r.pull, r.in_range
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    file.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Write every junction's fit table into `dir`, creating it if needed.
pub fn write_fit_tables<'a>(
    dir: &Path,
    tables: impl IntoIterator<Item = (Junction, &'a [ResidualRow])>,
) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let mut written = Vec::new();
    for (junction, rows) in tables {
        let path = dir.join(fit_csv_name(junction));
        write_fit_csv(&path, rows)?;
        written.push(path);
    }
    Ok(written)
}

/// Write a series in the whitespace-delimited ingest format for `layout`.
pub fn write_dataset<S: Scale>(
    path: &Path,
    series: &MeasurementSeries<S>,
    layout: DatasetLayout,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create dataset '{}': {e}", path.display())))?;
    let mut file = BufWriter::new(file);
    let write_err = |e: std::io::Error| AppError::new(2, format!("Failed to write dataset '{}': {e}", path.display()));

    writeln!(file, "# {}", layout.column_names()).map_err(write_err)?;
    for p in series.points() {
        match layout {
            DatasetLayout::Calibration => writeln!(file, "{:.6} {:.6} {:.6}", p.x, p.y, p.sigma_y),
            DatasetLayout::IvCurve => writeln!(
                file,
                "{:.6} {:.9e} {:.6} {:.9e}",
                p.x, p.y, p.sigma_x, p.sigma_y
            ),
        }
        .map_err(write_err)?;
    }
    file.flush().map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Linear;
    use crate::io::ingest::load_series;

    #[test]
    fn fit_csv_has_header_and_one_line_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            ResidualRow {
                x: 100.0,
                y: 0.0,
                sigma_y: 0.05,
                y_fit: 0.01,
                residual: -0.01,
                pull: -0.2,
                in_range: true,
            },
            ResidualRow {
                x: 500.0,
                y: 3.0,
                sigma_y: 0.1,
                y_fit: 4.0,
                residual: -1.0,
                pull: -10.0,
                in_range: false,
            },
        ];
        let written = write_fit_tables(dir.path(), [(Junction::Silicon, rows.as_slice())]).unwrap();
        assert_eq!(written, vec![dir.path().join("si_fit.csv")]);

        let text = std::fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "x,ln_i,sigma,y_fit,residual,pull,in_range");
        assert!(lines[1].ends_with(",true"));
        assert!(lines[2].starts_with("500.000000,"));
        assert!(lines[2].ends_with(",false"));
    }

    #[test]
    fn written_datasets_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iv.txt");
        let series: MeasurementSeries<Linear> =
            MeasurementSeries::from_rows(&[[100.0, 1.5e-3, 0.5, 2e-5], [200.0, 2.25e-1, 0.5, 3e-3]]).unwrap();

        write_dataset(&path, &series, DatasetLayout::IvCurve).unwrap();
        let loaded = load_series(&path, DatasetLayout::IvCurve).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.x(1), Some(200.0));
        approx::assert_relative_eq!(loaded.y(0).unwrap(), 1.5e-3, max_relative = 1e-9);
        approx::assert_relative_eq!(loaded.sigma_y(1).unwrap(), 3e-3, max_relative = 1e-9);
    }
}
