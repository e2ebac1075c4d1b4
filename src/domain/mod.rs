//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration (`CosmologicalParameters`, `DarkEnergy`, `InterpMethod`)
//! - names of tabulated functions (`BackgroundFunction`)
//! - build lifecycle (`BuildStage`) and sampled outputs (`BackgroundSamples`)

pub mod types;

pub use types::*;
