//! Export the sampled background grid to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per output bin, one column per tabulated function.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{BackgroundFunction, BackgroundSamples};
use crate::error::AppError;

/// Write the grid samples to a CSV file.
pub fn write_samples_csv(path: &Path, samples: &BackgroundSamples) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_samples(file, samples)
}

/// Write the grid samples as CSV to any writer.
pub fn write_samples<W: Write>(mut out: W, samples: &BackgroundSamples) -> Result<(), AppError> {
    // Header
    let mut header = String::from("z");
    for func in BackgroundFunction::ALL {
        header.push(',');
        header.push_str(func.label());
    }
    writeln!(out, "{header}").map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for i in 0..samples.len() {
        let mut row = format!("{:.10}", samples.z[i]);
        for func in BackgroundFunction::ALL {
            row.push_str(&format!(",{:.15e}", samples.column(func)[i]));
        }
        writeln!(out, "{row}").map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
