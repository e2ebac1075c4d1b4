//! Expansion rate and comoving distance.

use crate::background::eos::EquationOfStateBundle;
use crate::domain::CosmologicalParameters;
use crate::error::BackgroundError;
use crate::math::{QuadratureEstimate, QuadratureSettings, integrate};

/// Closed-form Hubble quantities and the comoving-distance quadrature.
///
/// All rates are in units of `H0`; distances in units of `c/H0`.
#[derive(Debug, Clone, Copy)]
pub struct DistanceIntegrator<'a> {
    omega_m: f64,
    omega_gamma: f64,
    omega_de: f64,
    eos: &'a EquationOfStateBundle,
    quadrature: QuadratureSettings,
}

impl<'a> DistanceIntegrator<'a> {
    pub fn new(params: &CosmologicalParameters, eos: &'a EquationOfStateBundle) -> Self {
        Self {
            omega_m: params.omega_m(),
            omega_gamma: params.omega_gamma,
            omega_de: params.omega_de,
            eos,
            quadrature: QuadratureSettings::default(),
        }
    }

    pub fn with_quadrature(mut self, quadrature: QuadratureSettings) -> Self {
        self.quadrature = quadrature;
        self
    }

    /// `E(z) = H(z)/H0 = sqrt(Ω_m(1+z)³ + Ω_γ(1+z)⁴ + Ω_de·W(z))`.
    pub fn hubble(&self, z: f64) -> Result<f64, BackgroundError> {
        let u = 1.0 + z;
        let u3 = u * u * u;
        Ok((self.omega_m * u3 + self.omega_gamma * u3 * u + self.omega_de * self.eos.big_w(z)?).sqrt())
    }

    /// `𝓗 = a·H`.
    pub fn conformal_hubble(&self, z: f64) -> Result<f64, BackgroundError> {
        Ok(self.hubble(z)? / (1.0 + z))
    }

    /// Derivative of `𝓗` with respect to conformal time:
    ///
    /// ```text
    /// 𝓗' = -[(1+z)³(2(1+z)Ω_γ + Ω_m) + (1+3w)Ω_de·W] / (2(1+z)²)
    /// ```
    pub fn conformal_hubble_prime(&self, z: f64) -> Result<f64, BackgroundError> {
        let u = 1.0 + z;
        let w = self.eos.w(z)?;
        let big_w = self.eos.big_w(z)?;
        Ok(-(u * u * u * (2.0 * u * self.omega_gamma + self.omega_m) + (1.0 + 3.0 * w) * self.omega_de * big_w)
            / (u * u)
            / 2.0)
    }

    /// `χ(z) = ∫_0^z dz'/E(z')`.
    pub fn comoving_distance(&self, z: f64) -> Result<QuadratureEstimate, BackgroundError> {
        integrate(|zp| Ok(1.0 / self.hubble(zp)?), 0.0, z, &self.quadrature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::eos::EquationOfStateModel;
    use crate::domain::{DarkEnergy, InterpMethod};

    fn setup(de: DarkEnergy) -> (CosmologicalParameters, EquationOfStateBundle) {
        let params = CosmologicalParameters {
            dark_energy: de,
            ..Default::default()
        };
        let w = de.tabulate(InterpMethod::Cubic).unwrap();
        let eos = EquationOfStateModel::new(&params).build(w).unwrap();
        (params, eos)
    }

    #[test]
    fn hubble_is_normalised_today_and_matches_lcdm() {
        let (p, eos) = setup(DarkEnergy::default());
        let d = DistanceIntegrator::new(&p, &eos);
        assert!((d.hubble(0.0).unwrap() - 1.0).abs() < 1e-12);
        for &z in &[0.5, 2.0, 14.0] {
            let u: f64 = 1.0 + z;
            let expected = (p.omega_m() * u.powi(3) + p.omega_gamma * u.powi(4) + p.omega_de).sqrt();
            assert!((d.hubble(z).unwrap() - expected).abs() < 1e-12 * expected);
        }
    }

    #[test]
    fn conformal_hubble_prime_is_the_conformal_time_derivative() {
        // d/dτ = -H·d/dz, checked against a central difference of 𝓗(z).
        let (p, eos) = setup(DarkEnergy { w0: -0.9, wa: 0.2 });
        let d = DistanceIntegrator::new(&p, &eos);
        for &z in &[0.3, 1.1, 4.0] {
            let h = 1e-5;
            let dz = (d.conformal_hubble(z + h).unwrap() - d.conformal_hubble(z - h).unwrap()) / (2.0 * h);
            let expected = -d.hubble(z).unwrap() * dz;
            let got = d.conformal_hubble_prime(z).unwrap();
            assert!((got - expected).abs() < 1e-3 * (1.0 + expected.abs()), "z={z}: {got} vs {expected}");
        }
    }

    #[test]
    fn comoving_distance_grows_and_starts_at_zero() {
        let (p, eos) = setup(DarkEnergy::default());
        let d = DistanceIntegrator::new(&p, &eos);
        assert_eq!(d.comoving_distance(0.0).unwrap().value, 0.0);

        let mut last = 0.0;
        for i in 1..=15 {
            let chi = d.comoving_distance(i as f64).unwrap();
            assert!(chi.converged);
            assert!(chi.value > last);
            last = chi.value;
        }
        // Low-redshift limit χ ≈ z.
        let near = d.comoving_distance(1e-3).unwrap().value;
        assert!((near / 1e-3 - 1.0).abs() < 1e-3);
    }

    #[test]
    fn beyond_eos_grid_is_out_of_range() {
        let (p, eos) = setup(DarkEnergy::default());
        let d = DistanceIntegrator::new(&p, &eos);
        assert!(matches!(d.hubble(150.0), Err(BackgroundError::OutOfRange { .. })));
    }
}
