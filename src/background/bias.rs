//! Tracer bias inputs for the relativistic G1/G2 terms.
//!
//! The engine never owns bias data. Callers hand it a [`BiasProvider`] that
//! exposes the matter, magnification and evolution bias of two tracer
//! populations as pre-built interpolants over redshift.

use crate::domain::{G_TERM_Z_MIN, InterpMethod};
use crate::error::BackgroundError;
use crate::math::Interpolant;

/// Which of the two correlated tracer populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tracer {
    First,
    Second,
}

/// Bias interpolants of a single tracer population, all functions of `z`.
#[derive(Debug, Clone)]
pub struct TracerBiases {
    pub matter_bias: Interpolant,
    pub magnification_bias: Interpolant,
    pub evolution_bias: Interpolant,
}

impl TracerBiases {
    pub fn new(matter_bias: Interpolant, magnification_bias: Interpolant, evolution_bias: Interpolant) -> Self {
        Self {
            matter_bias,
            magnification_bias,
            evolution_bias,
        }
    }

    /// Redshift-independent biases tabulated over `[0, z_max]`.
    pub fn constant(
        matter_bias: f64,
        magnification_bias: f64,
        evolution_bias: f64,
        z_max: f64,
    ) -> Result<Self, BackgroundError> {
        let flat = |value: f64| Interpolant::build(vec![0.0, z_max], vec![value, value], InterpMethod::Linear);
        Ok(Self::new(flat(matter_bias)?, flat(magnification_bias)?, flat(evolution_bias)?))
    }

    /// Whether every bias interpolant covers `[0, z_max]`.
    pub fn covers(&self, z_max: f64) -> bool {
        [&self.matter_bias, &self.magnification_bias, &self.evolution_bias]
            .iter()
            .all(|f| f.contains(0.0) && f.contains(z_max))
    }

    /// Relativistic correction term of this tracer at `z`:
    ///
    /// ```text
    /// G = 𝓗'/𝓗² + (2 - 5s)/(χ·𝓗) + 5s - f_evo
    /// ```
    ///
    /// Identically zero for `z <= 1e-10`, where `χ → 0` makes the expression singular.
    pub fn relativistic_term(
        &self,
        z: f64,
        conformal_hubble: f64,
        conformal_hubble_prime: f64,
        comoving_distance: f64,
    ) -> Result<f64, BackgroundError> {
        if z <= G_TERM_Z_MIN {
            return Ok(0.0);
        }
        let s = self.magnification_bias.evaluate(z)?;
        let fevo = self.evolution_bias.evaluate(z)?;
        Ok(conformal_hubble_prime / (conformal_hubble * conformal_hubble)
            + (2.0 - 5.0 * s) / (comoving_distance * conformal_hubble)
            + 5.0 * s
            - fevo)
    }
}

/// Injected capability providing the bias interpolants of both tracers.
pub trait BiasProvider: Sync {
    fn biases(&self, tracer: Tracer) -> &TracerBiases;
}

/// The usual provider: two tracer populations side by side.
#[derive(Debug, Clone)]
pub struct TracerPair {
    pub first: TracerBiases,
    pub second: TracerBiases,
}

impl TracerPair {
    pub fn new(first: TracerBiases, second: TracerBiases) -> Self {
        Self { first, second }
    }

    /// Both tracers share the same biases (auto-correlation).
    pub fn symmetric(biases: TracerBiases) -> Self {
        Self {
            first: biases.clone(),
            second: biases,
        }
    }
}

impl BiasProvider for TracerPair {
    fn biases(&self, tracer: Tracer) -> &TracerBiases {
        match tracer {
            Tracer::First => &self.first,
            Tracer::Second => &self.second,
        }
    }
}
