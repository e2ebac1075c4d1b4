//! Dark-energy equation of state and its two derived integrals.
//!
//! From an input `w(z)` interpolant this builds, on a fixed grid of
//! `EOS_GRID_INTERVALS + 1` points over `z ∈ [0, 100]`:
//!
//! ```text
//! W(z) = exp(3 ∫_0^z (1 + w(z')) / (1 + z') dz')
//! X(z) = Ω_m/(1 - Ω_m) · exp(-3 ∫_{1/(1+z)}^1 w(a)/a da)
//! ```
//!
//! `W` scales the dark-energy density and `X` is the matter to dark-energy
//! density ratio. The grid does not depend on the number of output bins.

use rayon::prelude::*;

use crate::domain::{CosmologicalParameters, DarkEnergy, EOS_GRID_INTERVALS, EOS_Z_MAX, InterpMethod};
use crate::error::BackgroundError;
use crate::math::{Interpolant, QuadratureSettings, integrate, linspace};

impl DarkEnergy {
    /// Tabulate `w(z)` on the equation-of-state grid.
    pub fn tabulate(&self, method: InterpMethod) -> Result<Interpolant, BackgroundError> {
        let zs = linspace(0.0, EOS_Z_MAX, EOS_GRID_INTERVALS + 1)?;
        let de = *self;
        Interpolant::tabulate(zs, method, move |z| de.w(z))
    }
}

/// `w`, `W` and `X` interpolants for one parameter set.
#[derive(Debug, Clone)]
pub struct EquationOfStateBundle {
    w: Interpolant,
    w_integral: Interpolant,
    x_ratio: Interpolant,
}

impl EquationOfStateBundle {
    pub fn w(&self, z: f64) -> Result<f64, BackgroundError> {
        self.w.evaluate(z)
    }

    pub fn w_derivative(&self, z: f64) -> Result<f64, BackgroundError> {
        self.w.derivative(z)
    }

    /// `W(z)`, the dark-energy density relative to today.
    pub fn big_w(&self, z: f64) -> Result<f64, BackgroundError> {
        self.w_integral.evaluate(z)
    }

    /// `X(z)`, the matter to dark-energy density ratio.
    pub fn x(&self, z: f64) -> Result<f64, BackgroundError> {
        self.x_ratio.evaluate(z)
    }

    pub fn x_derivative(&self, z: f64) -> Result<f64, BackgroundError> {
        self.x_ratio.derivative(z)
    }

    /// Upper redshift covered by all three interpolants.
    pub fn z_max(&self) -> f64 {
        self.w.x_max().min(self.w_integral.x_max()).min(self.x_ratio.x_max())
    }
}

/// Builds an [`EquationOfStateBundle`] from a caller-supplied `w(z)`.
#[derive(Debug, Clone, Copy)]
pub struct EquationOfStateModel {
    omega_m: f64,
    quadrature: QuadratureSettings,
    parallel: bool,
}

impl EquationOfStateModel {
    pub fn new(params: &CosmologicalParameters) -> Self {
        Self {
            omega_m: params.omega_m(),
            quadrature: QuadratureSettings::default(),
            parallel: true,
        }
    }

    pub fn with_quadrature(mut self, quadrature: QuadratureSettings) -> Self {
        self.quadrature = quadrature;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Integrate `W` and `X` on the fine grid.
    ///
    /// `w` must cover `[0, 100]`. Quadratures that stop short of their
    /// tolerance are kept and counted, not treated as failures.
    pub fn build(&self, w: Interpolant) -> Result<EquationOfStateBundle, BackgroundError> {
        if !(w.contains(0.0) && w.contains(EOS_Z_MAX)) {
            return Err(BackgroundError::domain(format!(
                "w(z) must cover [0, {EOS_Z_MAX}] (got [{}, {}])",
                w.x_min(),
                w.x_max()
            )));
        }
        if !(self.omega_m > 0.0 && self.omega_m < 1.0) {
            return Err(BackgroundError::InvalidParameters(format!(
                "omega_m must lie in (0, 1) (got {})",
                self.omega_m
            )));
        }

        let zs = linspace(0.0, EOS_Z_MAX, EOS_GRID_INTERVALS + 1)?;
        let ratio_today = self.omega_m / (1.0 - self.omega_m);

        let point = |z: f64| -> Result<(f64, f64, usize), BackgroundError> {
            let w_int = integrate(
                |zp| Ok((1.0 + w.evaluate(zp)?) / (1.0 + zp)),
                0.0,
                z,
                &self.quadrature,
            )?;
            let big_w = (3.0 * w_int.value).exp();

            if z == 0.0 {
                return Ok((big_w, ratio_today, usize::from(!w_int.converged)));
            }

            let a_lower = 1.0 / (1.0 + z);
            let x_int = integrate(
                |a| {
                    // 1/a - 1 can round just outside the tabulated range.
                    let zp = (1.0 / a - 1.0).clamp(0.0, EOS_Z_MAX);
                    Ok(w.evaluate(zp)? / a)
                },
                a_lower,
                1.0,
                &self.quadrature,
            )?;
            let x = ratio_today * (-3.0 * x_int.value).exp();
            let shortfalls = usize::from(!w_int.converged) + usize::from(!x_int.converged);
            Ok((big_w, x, shortfalls))
        };

        let rows: Vec<(f64, f64, usize)> = if self.parallel {
            zs.par_iter().map(|&z| point(z)).collect::<Result<_, _>>()?
        } else {
            zs.iter().map(|&z| point(z)).collect::<Result<_, _>>()?
        };

        let shortfalls: usize = rows.iter().map(|r| r.2).sum();
        if shortfalls > 0 {
            log::warn!(
                "{shortfalls} equation-of-state quadratures stopped short of rtol={}",
                self.quadrature.epsrel
            );
        }

        let big_w: Vec<f64> = rows.iter().map(|r| r.0).collect();
        let x: Vec<f64> = rows.iter().map(|r| r.1).collect();

        // W and X are sampled finely enough that linear interpolation suffices.
        let w_integral = Interpolant::build(zs.clone(), big_w, InterpMethod::Linear)?;
        let x_ratio = Interpolant::build(zs, x, InterpMethod::Linear)?;

        Ok(EquationOfStateBundle {
            w,
            w_integral,
            x_ratio,
        })
    }
}
