//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - loaded from a JSON parameter file
//! - threaded through the background build
//! - exported alongside a sampled table and reloaded later

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::BackgroundError;

/// Upper redshift of the fine equation-of-state grid.
pub const EOS_Z_MAX: f64 = 100.0;

/// Number of intervals of the fine equation-of-state grid (16385 samples).
pub const EOS_GRID_INTERVALS: usize = 16384;

/// Default upper redshift of the output grid.
pub const DEFAULT_Z_MAX: f64 = 15.0;

/// Below this redshift the relativistic terms G1/G2 are set to zero.
pub const G_TERM_Z_MIN: f64 = 1e-10;

/// Interpolation scheme used for tabulated functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InterpMethod {
    /// Piecewise-linear.
    Linear,
    /// Natural cubic spline (zero second derivative at both ends).
    Cubic,
}

/// Dark-energy equation of state in the CPL form `w(z) = w0 + wa·z/(1+z)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DarkEnergy {
    pub w0: f64,
    pub wa: f64,
}

impl Default for DarkEnergy {
    fn default() -> Self {
        // Cosmological constant.
        Self { w0: -1.0, wa: 0.0 }
    }
}

impl DarkEnergy {
    pub fn w(&self, z: f64) -> f64 {
        self.w0 + self.wa * z / (1.0 + z)
    }
}

/// Cosmological input parameters for a single background build.
///
/// Density fractions are today's values in units of the critical density.
/// The bias interpolants that enter G1/G2 are injected separately
/// (see `background::BiasProvider`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmologicalParameters {
    pub omega_cdm: f64,
    pub omega_baryon: f64,
    pub omega_gamma: f64,
    pub omega_de: f64,

    /// Used only when no explicit `w(z)` interpolant is injected.
    pub dark_energy: DarkEnergy,

    /// Number of output redshift bins (`N`, grid is `z_i = z_max·i/(N-1)`).
    pub background_bins: usize,

    /// Upper bound of the output grid.
    pub z_max: f64,

    pub interp_method: InterpMethod,
}

impl Default for CosmologicalParameters {
    fn default() -> Self {
        Self {
            omega_cdm: 0.25,
            omega_baryon: 0.05,
            omega_gamma: 5e-5,
            omega_de: 0.69995,
            dark_energy: DarkEnergy::default(),
            background_bins: 50,
            z_max: DEFAULT_Z_MAX,
            interp_method: InterpMethod::Cubic,
        }
    }
}

impl CosmologicalParameters {
    /// Total matter density today, `Ω_cdm + Ω_baryon`.
    pub fn omega_m(&self) -> f64 {
        self.omega_cdm + self.omega_baryon
    }

    /// Sum of all density fractions (≈ 1 for a flat universe).
    pub fn omega_total(&self) -> f64 {
        self.omega_m() + self.omega_gamma + self.omega_de
    }

    /// Reject parameter sets the engine cannot build a background for.
    pub fn validate(&self) -> Result<(), BackgroundError> {
        let densities = [
            ("omega_cdm", self.omega_cdm),
            ("omega_baryon", self.omega_baryon),
            ("omega_gamma", self.omega_gamma),
            ("omega_de", self.omega_de),
        ];
        for (name, value) in densities {
            if !value.is_finite() || value < 0.0 {
                return Err(BackgroundError::InvalidParameters(format!(
                    "{name} must be finite and >= 0 (got {value})"
                )));
            }
        }
        if self.omega_m() >= 1.0 {
            return Err(BackgroundError::InvalidParameters(format!(
                "omega_cdm + omega_baryon must be < 1 (got {})",
                self.omega_m()
            )));
        }
        if !(self.dark_energy.w0.is_finite() && self.dark_energy.wa.is_finite()) {
            return Err(BackgroundError::InvalidParameters(
                "dark energy w0/wa must be finite".to_string(),
            ));
        }
        if self.background_bins < 2 {
            return Err(BackgroundError::InvalidParameters(format!(
                "background_bins must be >= 2 (got {})",
                self.background_bins
            )));
        }
        if !(self.z_max.is_finite() && self.z_max > 0.0 && self.z_max <= EOS_Z_MAX) {
            return Err(BackgroundError::InvalidParameters(format!(
                "z_max must lie in (0, {EOS_Z_MAX}] (got {})",
                self.z_max
            )));
        }
        let total = self.omega_total();
        if (total - 1.0).abs() > 1e-3 {
            log::warn!("density fractions sum to {total:.6}; the background assumes flatness");
        }
        Ok(())
    }
}

/// Named functions stored in a background table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundFunction {
    /// Scale factor `a(z)`.
    ScaleFactor,
    /// Hubble rate `H(z)` in units of `H0`.
    Hubble,
    /// Conformal Hubble rate `𝓗(z) = a·H`.
    ConformalHubble,
    /// Derivative of `𝓗` with respect to conformal time, closed form.
    ConformalHubblePrime,
    /// Linear growth factor `D1(z)`.
    GrowthFactor,
    /// Growth rate `f = dlnD1/dlna`.
    GrowthRate,
    /// `g(z) = (1+z)·D1(z)`.
    GrowthG,
    /// Dimensionless comoving distance `χ(z)`.
    ComovingDistance,
    G1,
    G2,
}

impl BackgroundFunction {
    pub const ALL: [BackgroundFunction; 10] = [
        BackgroundFunction::ScaleFactor,
        BackgroundFunction::Hubble,
        BackgroundFunction::ConformalHubble,
        BackgroundFunction::ConformalHubblePrime,
        BackgroundFunction::GrowthFactor,
        BackgroundFunction::GrowthRate,
        BackgroundFunction::GrowthG,
        BackgroundFunction::ComovingDistance,
        BackgroundFunction::G1,
        BackgroundFunction::G2,
    ];

    /// Column label used in exports and terminal output.
    pub fn label(self) -> &'static str {
        match self {
            BackgroundFunction::ScaleFactor => "a",
            BackgroundFunction::Hubble => "H",
            BackgroundFunction::ConformalHubble => "conformal_H",
            BackgroundFunction::ConformalHubblePrime => "conformal_H_prime",
            BackgroundFunction::GrowthFactor => "D1",
            BackgroundFunction::GrowthRate => "f",
            BackgroundFunction::GrowthG => "g",
            BackgroundFunction::ComovingDistance => "chi",
            BackgroundFunction::G1 => "G1",
            BackgroundFunction::G2 => "G2",
        }
    }
}

/// Stages of a background build. Transitions are strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildStage {
    Uninitialized,
    BuildingEos,
    IntegratingGrid,
    Finalized,
}

/// Raw arrays sampled on the output redshift grid.
///
/// This is the portable representation of a table: the interpolants can be
/// rebuilt from it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSamples {
    pub z: Vec<f64>,
    pub a: Vec<f64>,
    pub hubble: Vec<f64>,
    pub conformal_hubble: Vec<f64>,
    pub conformal_hubble_prime: Vec<f64>,
    pub growth_factor: Vec<f64>,
    pub growth_rate: Vec<f64>,
    pub growth_g: Vec<f64>,
    pub comoving_distance: Vec<f64>,
    pub g1: Vec<f64>,
    pub g2: Vec<f64>,
}

impl BackgroundSamples {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            z: Vec::with_capacity(n),
            a: Vec::with_capacity(n),
            hubble: Vec::with_capacity(n),
            conformal_hubble: Vec::with_capacity(n),
            conformal_hubble_prime: Vec::with_capacity(n),
            growth_factor: Vec::with_capacity(n),
            growth_rate: Vec::with_capacity(n),
            growth_g: Vec::with_capacity(n),
            comoving_distance: Vec::with_capacity(n),
            g1: Vec::with_capacity(n),
            g2: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Sample column for a named function.
    pub fn column(&self, func: BackgroundFunction) -> &[f64] {
        match func {
            BackgroundFunction::ScaleFactor => &self.a,
            BackgroundFunction::Hubble => &self.hubble,
            BackgroundFunction::ConformalHubble => &self.conformal_hubble,
            BackgroundFunction::ConformalHubblePrime => &self.conformal_hubble_prime,
            BackgroundFunction::GrowthFactor => &self.growth_factor,
            BackgroundFunction::GrowthRate => &self.growth_rate,
            BackgroundFunction::GrowthG => &self.growth_g,
            BackgroundFunction::ComovingDistance => &self.comoving_distance,
            BackgroundFunction::G1 => &self.g1,
            BackgroundFunction::G2 => &self.g2,
        }
    }
}

/// A saved table file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFile {
    pub tool: String,
    pub parameters: CosmologicalParameters,
    pub samples: BackgroundSamples,
}
