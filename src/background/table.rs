//! The finished background: named interpolants over `[0, z_max]` plus `z(χ)`.

use crate::domain::{BackgroundFunction, BackgroundSamples, CosmologicalParameters, InterpMethod};
use crate::error::BackgroundError;
use crate::math::Interpolant;

/// One interpolant per [`BackgroundFunction`], looked up by name.
#[derive(Debug, Clone)]
struct FunctionInterpolants {
    scale_factor: Interpolant,
    hubble: Interpolant,
    conformal_hubble: Interpolant,
    conformal_hubble_prime: Interpolant,
    growth_factor: Interpolant,
    growth_rate: Interpolant,
    growth_g: Interpolant,
    comoving_distance: Interpolant,
    g1: Interpolant,
    g2: Interpolant,
}

impl FunctionInterpolants {
    fn build(samples: &BackgroundSamples, method: InterpMethod) -> Result<Self, BackgroundError> {
        let fit = |func| Interpolant::build(samples.z.clone(), samples.column(func).to_vec(), method);
        Ok(Self {
            scale_factor: fit(BackgroundFunction::ScaleFactor)?,
            hubble: fit(BackgroundFunction::Hubble)?,
            conformal_hubble: fit(BackgroundFunction::ConformalHubble)?,
            conformal_hubble_prime: fit(BackgroundFunction::ConformalHubblePrime)?,
            growth_factor: fit(BackgroundFunction::GrowthFactor)?,
            growth_rate: fit(BackgroundFunction::GrowthRate)?,
            growth_g: fit(BackgroundFunction::GrowthG)?,
            comoving_distance: fit(BackgroundFunction::ComovingDistance)?,
            g1: fit(BackgroundFunction::G1)?,
            g2: fit(BackgroundFunction::G2)?,
        })
    }

    fn get(&self, func: BackgroundFunction) -> &Interpolant {
        match func {
            BackgroundFunction::ScaleFactor => &self.scale_factor,
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

/// Immutable, thread-safe table of background functions of redshift.
#[derive(Debug, Clone)]
pub struct BackgroundTable {
    parameters: CosmologicalParameters,
    samples: BackgroundSamples,
    functions: FunctionInterpolants,
    /// `z(χ)`.
    inverse: Interpolant,
}

impl BackgroundTable {
    /// Wrap raw grid samples into interpolants.
    ///
    /// Fails with `NonFiniteResult` if any sample is NaN/Inf and with
    /// `NonMonotoneInverse` if `χ` is not strictly increasing.
    pub fn from_samples(
        parameters: CosmologicalParameters,
        samples: BackgroundSamples,
    ) -> Result<Self, BackgroundError> {
        let n = samples.len();
        for func in BackgroundFunction::ALL {
            let column = samples.column(func);
            if column.len() != n {
                return Err(BackgroundError::domain(format!(
                    "column {} has {} samples, expected {n}",
                    func.label(),
                    column.len()
                )));
            }
            if let Some(i) = column.iter().position(|v| !v.is_finite()) {
                return Err(BackgroundError::non_finite(func.label(), samples.z[i]));
            }
        }

        let chi = &samples.comoving_distance;
        if let Some(i) = chi.windows(2).position(|w| w[1] <= w[0]) {
            return Err(BackgroundError::NonMonotoneInverse(format!(
                "chi({})={} >= chi({})={}",
                samples.z[i],
                chi[i],
                samples.z[i + 1],
                chi[i + 1]
            )));
        }

        let method = parameters.interp_method;
        let functions = FunctionInterpolants::build(&samples, method)?;
        let inverse = Interpolant::build(chi.clone(), samples.z.clone(), method)?;

        Ok(Self {
            parameters,
            samples,
            functions,
            inverse,
        })
    }

    fn function(&self, func: BackgroundFunction) -> &Interpolant {
        self.functions.get(func)
    }

    /// Value of `func` at redshift `z`.
    pub fn evaluate(&self, func: BackgroundFunction, z: f64) -> Result<f64, BackgroundError> {
        self.function(func).evaluate(z)
    }

    /// `d func/dz` at redshift `z`.
    pub fn derivative(&self, func: BackgroundFunction, z: f64) -> Result<f64, BackgroundError> {
        self.function(func).derivative(z)
    }

    pub fn scale_factor(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::ScaleFactor, z)
    }

    pub fn hubble(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::Hubble, z)
    }

    pub fn conformal_hubble(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::ConformalHubble, z)
    }

    pub fn conformal_hubble_prime(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::ConformalHubblePrime, z)
    }

    pub fn growth_factor(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::GrowthFactor, z)
    }

    pub fn growth_rate(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::GrowthRate, z)
    }

    pub fn comoving_distance(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::ComovingDistance, z)
    }

    pub fn g1(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::G1, z)
    }

    pub fn g2(&self, z: f64) -> Result<f64, BackgroundError> {
        self.evaluate(BackgroundFunction::G2, z)
    }

    /// Redshift at comoving distance `chi`, valid on `[0, χ_max]`.
    pub fn z_of_chi(&self, chi: f64) -> Result<f64, BackgroundError> {
        self.inverse.evaluate(chi)
    }

    pub fn z_max(&self) -> f64 {
        self.function(BackgroundFunction::ScaleFactor).x_max()
    }

    pub fn chi_max(&self) -> f64 {
        self.inverse.x_max()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &BackgroundSamples {
        &self.samples
    }

    pub fn parameters(&self) -> &CosmologicalParameters {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_samples(n: usize) -> BackgroundSamples {
        let mut s = BackgroundSamples::with_capacity(n);
        for i in 0..n {
            let z = 2.0 * i as f64 / (n - 1) as f64;
            s.z.push(z);
            s.a.push(1.0 / (1.0 + z));
            s.hubble.push(1.0 + z);
            s.conformal_hubble.push(1.0);
            s.conformal_hubble_prime.push(0.0);
            s.growth_factor.push(1.0 / (1.0 + z));
            s.growth_rate.push(1.0);
            s.growth_g.push(1.0);
            s.comoving_distance.push((1.0 + z).ln());
            s.g1.push(0.0);
            s.g2.push(0.0);
        }
        s
    }

    #[test]
    fn evaluates_named_functions_and_inverse() {
        let table = BackgroundTable::from_samples(CosmologicalParameters::default(), toy_samples(21)).unwrap();
        assert_eq!(table.len(), 21);
        assert_eq!(table.z_max(), 2.0);
        assert_eq!(table.scale_factor(0.0).unwrap(), 1.0);
        assert_eq!(table.hubble(1.0).unwrap(), 2.0);
        assert!((table.comoving_distance(1.0).unwrap() - 2f64.ln()).abs() < 1e-12);
        assert!((table.z_of_chi(2f64.ln()).unwrap() - 1.0).abs() < 1e-12);
        assert!((table.derivative(BackgroundFunction::Hubble, 0.5).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn each_function_reads_its_own_column() {
        let mut s = toy_samples(6);
        for (k, func) in BackgroundFunction::ALL.into_iter().enumerate() {
            if func == BackgroundFunction::ComovingDistance {
                continue;
            }
            let column = match func {
                BackgroundFunction::ScaleFactor => &mut s.a,
                BackgroundFunction::Hubble => &mut s.hubble,
                BackgroundFunction::ConformalHubble => &mut s.conformal_hubble,
                BackgroundFunction::ConformalHubblePrime => &mut s.conformal_hubble_prime,
                BackgroundFunction::GrowthFactor => &mut s.growth_factor,
                BackgroundFunction::GrowthRate => &mut s.growth_rate,
                BackgroundFunction::GrowthG => &mut s.growth_g,
                BackgroundFunction::G1 => &mut s.g1,
                BackgroundFunction::G2 => &mut s.g2,
                BackgroundFunction::ComovingDistance => unreachable!(),
            };
            for (i, v) in column.iter_mut().enumerate() {
                *v = 100.0 * k as f64 + i as f64;
            }
        }
        let table = BackgroundTable::from_samples(CosmologicalParameters::default(), s.clone()).unwrap();
        for func in BackgroundFunction::ALL {
            for (i, &z) in s.z.iter().enumerate() {
                let expected = s.column(func)[i];
                let got = table.evaluate(func, z).unwrap();
                assert!((got - expected).abs() < 1e-9 * (1.0 + expected.abs()), "{}({z}) = {got}", func.label());
            }
        }
    }

    #[test]
    fn queries_outside_the_grid_fail() {
        let table = BackgroundTable::from_samples(CosmologicalParameters::default(), toy_samples(5)).unwrap();
        assert!(matches!(table.hubble(3.0), Err(BackgroundError::OutOfRange { .. })));
        assert!(matches!(
            table.z_of_chi(table.chi_max() + 0.1),
            Err(BackgroundError::OutOfRange { .. })
        ));
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let mut s = toy_samples(5);
        s.g2[3] = f64::NAN;
        match BackgroundTable::from_samples(CosmologicalParameters::default(), s) {
            Err(BackgroundError::NonFiniteResult { quantity, z }) => {
                assert_eq!(quantity, "G2");
                assert_eq!(z, 1.5);
            }
            other => panic!("expected NonFiniteResult, got {other:?}"),
        }
    }

    #[test]
    fn flat_distance_cannot_be_inverted() {
        let mut s = toy_samples(5);
        s.comoving_distance[2] = s.comoving_distance[1];
        assert!(matches!(
            BackgroundTable::from_samples(CosmologicalParameters::default(), s),
            Err(BackgroundError::NonMonotoneInverse(_))
        ));
    }
}
