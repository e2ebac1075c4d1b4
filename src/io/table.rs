//! Read/write background table snapshots (JSON).
//!
//! A snapshot is the portable representation of a built table:
//! - the parameters it was built from
//! - the raw grid samples (interpolants are rebuilt on load)
//!
//! The schema is defined by `domain::TableFile`.

use std::fs::File;
use std::path::Path;

use crate::background::BackgroundTable;
use crate::domain::TableFile;
use crate::error::AppError;

/// Write a table snapshot JSON file.
pub fn write_table_json(path: &Path, table: &BackgroundTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create table JSON '{}': {e}", path.display())))?;

    let snapshot = TableFile {
        tool: "bg".to_string(),
        parameters: table.parameters().clone(),
        samples: table.samples().clone(),
    };

    serde_json::to_writer_pretty(file, &snapshot)
        .map_err(|e| AppError::new(2, format!("Failed to write table JSON: {e}")))?;

    Ok(())
}

/// Read a table snapshot JSON file.
pub fn read_table_json(path: &Path) -> Result<TableFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open table JSON '{}': {e}", path.display())))?;
    let snapshot: TableFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid table JSON: {e}")))?;
    Ok(snapshot)
}

/// Read a snapshot and rebuild its interpolants.
pub fn load_table(path: &Path) -> Result<BackgroundTable, AppError> {
    let snapshot = read_table_json(path)?;
    Ok(BackgroundTable::from_samples(snapshot.parameters, snapshot.samples)?)
}
