//! Command-line parsing for the background evolution engine.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the numerical code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{BackgroundFunction, CosmologicalParameters, DarkEnergy, InterpMethod};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bg", version, about = "Cosmological background evolution tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a background table, print a summary, and optionally export it.
    Build(BuildArgs),
    /// Build a background table and evaluate one function at given points.
    Eval(EvalArgs),
    /// Summarize a previously exported table snapshot.
    Show(ShowArgs),
}

/// Cosmology and tracer options shared by `build` and `eval`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Parameter JSON file (overrides the individual flags below).
    #[arg(long, value_name = "JSON")]
    pub params: Option<PathBuf>,

    /// Cold dark matter density today.
    #[arg(long, default_value_t = 0.25)]
    pub omega_cdm: f64,

    /// Baryon density today.
    #[arg(long, default_value_t = 0.05)]
    pub omega_baryon: f64,

    /// Radiation density today.
    #[arg(long, default_value_t = 5e-5)]
    pub omega_gamma: f64,

    /// Dark-energy density today.
    #[arg(long, default_value_t = 0.69995)]
    pub omega_de: f64,

    /// Dark-energy equation of state today (CPL w0).
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub w0: f64,

    /// Dark-energy equation of state evolution (CPL wa).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub wa: f64,

    /// Number of output redshift bins.
    #[arg(long, default_value_t = 50)]
    pub bins: usize,

    /// Upper redshift of the output grid.
    #[arg(long, default_value_t = 15.0)]
    pub z_max: f64,

    /// Interpolation scheme for the output table.
    #[arg(long, value_enum, default_value_t = InterpMethod::Cubic)]
    pub interp: InterpMethod,

    /// Matter bias of the first tracer.
    #[arg(long, default_value_t = 1.0)]
    pub bias1: f64,

    /// Magnification bias of the first tracer.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub s1: f64,

    /// Evolution bias of the first tracer.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub fevo1: f64,

    /// Matter bias of the second tracer.
    #[arg(long, default_value_t = 1.0)]
    pub bias2: f64,

    /// Magnification bias of the second tracer.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub s2: f64,

    /// Evolution bias of the second tracer.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub fevo2: f64,

    /// Compute bins sequentially instead of on the thread pool.
    #[arg(long)]
    pub serial: bool,
}

impl ModelArgs {
    /// Parameters from the individual flags (ignores `--params`).
    pub fn flag_parameters(&self) -> CosmologicalParameters {
        CosmologicalParameters {
            omega_cdm: self.omega_cdm,
            omega_baryon: self.omega_baryon,
            omega_gamma: self.omega_gamma,
            omega_de: self.omega_de,
            dark_energy: DarkEnergy {
                w0: self.w0,
                wa: self.wa,
            },
            background_bins: self.bins,
            z_max: self.z_max,
            interp_method: self.interp,
        }
    }
}

/// Options for `bg build`.
#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Maximum number of grid rows shown in the summary.
    #[arg(long, default_value_t = 16)]
    pub rows: usize,

    /// Export the sampled grid to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export a table snapshot (parameters + samples) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for `bg eval`.
#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Function to evaluate.
    #[arg(long, value_enum, default_value_t = BackgroundFunction::ComovingDistance)]
    pub function: BackgroundFunction,

    /// Points to evaluate at: redshifts, or comoving distances with `--chi`.
    /// `--at` is an alias that reads better for distances.
    #[arg(long = "z", visible_alias = "at", value_name = "POINT", required = true, num_args = 1..)]
    pub points: Vec<f64>,

    /// Evaluate the inverse z(chi) at the given comoving distances.
    #[arg(long)]
    pub chi: bool,

    /// Evaluate d(function)/dz instead of the value.
    #[arg(long, conflicts_with = "chi")]
    pub derivative: bool,
}

/// Options for `bg show`.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Table JSON produced by `bg build --export-json`.
    #[arg(long, value_name = "JSON")]
    pub table: PathBuf,

    /// Maximum number of grid rows shown.
    #[arg(long, default_value_t = 16)]
    pub rows: usize,
}
