//! Shared "build pipeline" logic used by the `build` and `eval` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! parameters -> tracer biases -> staged background build -> table
//!
//! The commands can then focus on presentation (summaries vs evaluations).

use crate::background::{BackgroundBuilder, BackgroundTable, TracerBiases, TracerPair};
use crate::cli::ModelArgs;
use crate::domain::CosmologicalParameters;
use crate::error::AppError;

/// Parameters from `--params` if given, otherwise from the individual flags.
///
/// Both sources are validated exactly once.
pub fn resolve_parameters(model: &ModelArgs) -> Result<CosmologicalParameters, AppError> {
    match &model.params {
        // `read_params_json` validates what it reads.
        Some(path) => Ok(crate::io::read_params_json(path)?),
        None => {
            let params = model.flag_parameters();
            params.validate()?;
            Ok(params)
        }
    }
}

/// Constant-bias tracers covering the output grid.
pub fn tracer_pair(model: &ModelArgs, z_max: f64) -> Result<TracerPair, AppError> {
    let first = TracerBiases::constant(model.bias1, model.s1, model.fevo1, z_max)?;
    let second = TracerBiases::constant(model.bias2, model.s2, model.fevo2, z_max)?;
    Ok(TracerPair::new(first, second))
}

/// Execute the full build and return the finished table.
pub fn run_build(model: &ModelArgs) -> Result<BackgroundTable, AppError> {
    let params = resolve_parameters(model)?;
    let tracers = tracer_pair(model, params.z_max)?;

    let table = BackgroundBuilder::new(params, &tracers)
        .parallel(!model.serial)
        .build()?;
    Ok(table)
}
