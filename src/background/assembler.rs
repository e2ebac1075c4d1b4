//! Background build orchestration.
//!
//! A build runs once per parameter set:
//!
//! `Uninitialized → BuildingEos → IntegratingGrid → Finalized`
//!
//! There is no incremental rebuild: changing parameters means creating a new
//! builder. Bins on the output grid are independent of each other and may be
//! computed in parallel; each task owns its ODE stepper state and only reads
//! the shared equation-of-state bundle.

use std::time::Instant;

use rayon::prelude::*;

use crate::background::bias::{BiasProvider, Tracer};
use crate::background::distance::DistanceIntegrator;
use crate::background::eos::{EquationOfStateBundle, EquationOfStateModel};
use crate::background::growth::{A_INITIAL, GrowthSolver};
use crate::background::table::BackgroundTable;
use crate::domain::{BackgroundSamples, BuildStage, CosmologicalParameters, InterpMethod};
use crate::error::BackgroundError;
use crate::math::{Interpolant, QuadratureSettings, StepControl, linspace};

/// All quantities of a single output bin.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BinRow {
    z: f64,
    a: f64,
    hubble: f64,
    conformal_hubble: f64,
    conformal_hubble_prime: f64,
    growth_factor: f64,
    growth_rate: f64,
    growth_g: f64,
    comoving_distance: f64,
    g1: f64,
    g2: f64,
    quadrature_converged: bool,
}

/// Single-use builder for a [`BackgroundTable`].
pub struct BackgroundBuilder<'a> {
    params: CosmologicalParameters,
    biases: &'a dyn BiasProvider,
    w: Option<Interpolant>,
    quadrature: QuadratureSettings,
    step_control: StepControl,
    parallel: bool,
    stage: BuildStage,
}

impl<'a> BackgroundBuilder<'a> {
    pub fn new(params: CosmologicalParameters, biases: &'a dyn BiasProvider) -> Self {
        Self {
            params,
            biases,
            w: None,
            quadrature: QuadratureSettings::default(),
            step_control: StepControl::default(),
            parallel: true,
            stage: BuildStage::Uninitialized,
        }
    }

    /// Use a caller-built `w(z)` instead of tabulating `params.dark_energy`.
    pub fn with_equation_of_state(mut self, w: Interpolant) -> Self {
        self.w = Some(w);
        self
    }

    pub fn with_quadrature(mut self, quadrature: QuadratureSettings) -> Self {
        self.quadrature = quadrature;
        self
    }

    pub fn with_step_control(mut self, step_control: StepControl) -> Self {
        self.step_control = step_control;
        self
    }

    /// Compute bins on the rayon pool (default) or sequentially.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn parameters(&self) -> &CosmologicalParameters {
        &self.params
    }

    fn advance(&mut self, next: BuildStage) {
        log::debug!("background stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    /// Run the whole build.
    ///
    /// On failure no table is returned and the builder stays in the stage
    /// that failed. A builder can only be built once.
    pub fn build(&mut self) -> Result<BackgroundTable, BackgroundError> {
        if self.stage != BuildStage::Uninitialized {
            return Err(BackgroundError::InvalidParameters(format!(
                "background builder already used (stage {:?})",
                self.stage
            )));
        }
        self.params.validate()?;
        self.check_biases()?;

        let started = Instant::now();

        self.advance(BuildStage::BuildingEos);
        let w = match self.w.take() {
            Some(w) => w,
            // w(z) is sampled on the same fine grid as W and X.
            None => self.params.dark_energy.tabulate(InterpMethod::Linear)?,
        };
        let eos = EquationOfStateModel::new(&self.params)
            .with_quadrature(self.quadrature)
            .parallel(self.parallel)
            .build(w)?;
        log::info!("equation of state built in {:.2?}", started.elapsed());

        self.advance(BuildStage::IntegratingGrid);
        let grid_started = Instant::now();
        let zs = linspace(0.0, self.params.z_max, self.params.background_bins)?;
        if self.params.z_max > 1.0 / A_INITIAL - 1.0 {
            log::warn!(
                "z_max={} lies before the growth initial condition (a={A_INITIAL}); D1 is frozen there",
                self.params.z_max
            );
        }

        let rows = self.integrate_grid(&eos, &zs)?;
        let shortfalls = rows.iter().filter(|r| !r.quadrature_converged).count();
        if shortfalls > 0 {
            log::warn!(
                "{shortfalls} comoving-distance quadratures stopped short of rtol={}",
                self.quadrature.epsrel
            );
        }
        log::info!(
            "integrated {} bins up to z={} in {:.2?}",
            rows.len(),
            self.params.z_max,
            grid_started.elapsed()
        );

        let mut samples = BackgroundSamples::with_capacity(rows.len());
        for r in &rows {
            samples.z.push(r.z);
            samples.a.push(r.a);
            samples.hubble.push(r.hubble);
            samples.conformal_hubble.push(r.conformal_hubble);
            samples.conformal_hubble_prime.push(r.conformal_hubble_prime);
            samples.growth_factor.push(r.growth_factor);
            samples.growth_rate.push(r.growth_rate);
            samples.growth_g.push(r.growth_g);
            samples.comoving_distance.push(r.comoving_distance);
            samples.g1.push(r.g1);
            samples.g2.push(r.g2);
        }
        let table = BackgroundTable::from_samples(self.params.clone(), samples)?;

        self.advance(BuildStage::Finalized);
        log::info!(
            "background ready: {} bins, chi_max={:.6} ({:.2?} total)",
            table.len(),
            table.chi_max(),
            started.elapsed()
        );
        Ok(table)
    }

    fn check_biases(&self) -> Result<(), BackgroundError> {
        for tracer in [Tracer::First, Tracer::Second] {
            if !self.biases.biases(tracer).covers(self.params.z_max) {
                return Err(BackgroundError::InvalidParameters(format!(
                    "{tracer:?} tracer biases do not cover [0, {}]",
                    self.params.z_max
                )));
            }
        }
        Ok(())
    }

    fn integrate_grid(&self, eos: &EquationOfStateBundle, zs: &[f64]) -> Result<Vec<BinRow>, BackgroundError> {
        let growth = GrowthSolver::with_control(eos, self.step_control);
        let distance = DistanceIntegrator::new(&self.params, eos).with_quadrature(self.quadrature);
        let biases = self.biases;

        let bin = |&z: &f64| -> Result<BinRow, BackgroundError> {
            let a = 1.0 / (1.0 + z);
            let hubble = distance.hubble(z)?;
            let conformal_hubble = a * hubble;
            let conformal_hubble_prime = distance.conformal_hubble_prime(z)?;
            let g = growth.solve(z)?;
            let chi = distance.comoving_distance(z)?;

            let g1 = biases.biases(Tracer::First).relativistic_term(
                z,
                conformal_hubble,
                conformal_hubble_prime,
                chi.value,
            )?;
            let g2 = biases.biases(Tracer::Second).relativistic_term(
                z,
                conformal_hubble,
                conformal_hubble_prime,
                chi.value,
            )?;

            log::debug!("bin z={z:.4}: D1={:.6} f={:.6} chi={:.6}", g.d1, g.f, chi.value);
            Ok(BinRow {
                z,
                a,
                hubble,
                conformal_hubble,
                conformal_hubble_prime,
                growth_factor: g.d1,
                growth_rate: g.f,
                growth_g: g.g,
                comoving_distance: chi.value,
                g1,
                g2,
                quadrature_converged: chi.converged,
            })
        };

        if self.parallel {
            zs.par_iter().map(bin).collect()
        } else {
            zs.iter().map(bin).collect()
        }
    }
}
