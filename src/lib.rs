//! `cosmo-background` library crate.
//!
//! Builds tables of cosmological background functions of redshift (scale
//! factor, Hubble rates, linear growth, comoving distance and the relativistic
//! G1/G2 terms) for a given parameter set.
//!
//! The binary (`bg`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - downstream statistics code can embed the engine directly

pub mod app;
pub mod background;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod report;
