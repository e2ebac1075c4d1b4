//! Load cosmological parameters from JSON.
//!
//! Missing fields fall back to `CosmologicalParameters::default()`.

use std::fs::File;
use std::path::Path;

use crate::domain::CosmologicalParameters;
use crate::error::AppError;

/// Read and validate a parameter file.
pub fn read_params_json(path: &Path) -> Result<CosmologicalParameters, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open parameter JSON '{}': {e}", path.display())))?;
    let params: CosmologicalParameters =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid parameter JSON: {e}")))?;
    params.validate()?;
    Ok(params)
}
