//! Linear growth factor.
//!
//! Solves, in the scale factor `a`, for `y0 = D1` and `y1 = dD1/da`:
//!
//! ```text
//! y0' = y1
//! y1' = -3/(2a)·(1 - w/(1+X))·y1 + 3/(2a²)·X/(1+X)·y0,    z = 1/a - 1
//! ```
//!
//! Every query restarts from `a = 0.05` with `D1 = a` and `D1' = 1`, the
//! growing mode deep in matter domination.

use crate::background::eos::EquationOfStateBundle;
use crate::domain::EOS_Z_MAX;
use crate::error::BackgroundError;
use crate::math::{DormandPrince, OdeSystem, State, StepControl};

/// Scale factor at which every growth integration starts.
pub const A_INITIAL: f64 = 0.05;

/// `[D1, dD1/da]` at `A_INITIAL`.
pub const GROWTH_INITIAL_STATE: [f64; 2] = [0.05, 1.0];

/// The growth ODE with coefficients drawn from an equation-of-state bundle.
#[derive(Debug, Clone, Copy)]
pub struct GrowthSystem<'a> {
    eos: &'a EquationOfStateBundle,
}

/// `w/(1+X)` and `X/(1+X)` together with their `z`-derivatives.
struct Coefficients {
    q: f64,
    r: f64,
    dq_dz: f64,
    dr_dz: f64,
}

impl<'a> GrowthSystem<'a> {
    pub fn new(eos: &'a EquationOfStateBundle) -> Self {
        Self { eos }
    }

    fn redshift(a: f64) -> f64 {
        (1.0 / a - 1.0).clamp(0.0, EOS_Z_MAX)
    }

    fn coefficients(&self, z: f64, with_derivatives: bool) -> Result<Coefficients, BackgroundError> {
        let w = self.eos.w(z)?;
        let x = self.eos.x(z)?;
        let one_plus_x = 1.0 + x;
        let q = w / one_plus_x;
        let r = x / one_plus_x;

        let (dq_dz, dr_dz) = if with_derivatives {
            let dw = self.eos.w_derivative(z)?;
            let dx = self.eos.x_derivative(z)?;
            let sq = one_plus_x * one_plus_x;
            (dw / one_plus_x - w * dx / sq, dx / sq)
        } else {
            (0.0, 0.0)
        };

        Ok(Coefficients { q, r, dq_dz, dr_dz })
    }
}

impl OdeSystem<2> for GrowthSystem<'_> {
    fn rhs(&self, a: f64, y: &[f64; 2], dydt: &mut [f64; 2]) -> Result<(), BackgroundError> {
        let c = self.coefficients(Self::redshift(a), false)?;
        dydt[0] = y[1];
        dydt[1] = -1.5 / a * (1.0 - c.q) * y[1] + 1.5 / (a * a) * c.r * y[0];
        Ok(())
    }

    fn jacobian(
        &self,
        a: f64,
        y: &[f64; 2],
        dfdy: &mut [[f64; 2]; 2],
        dfdt: &mut [f64; 2],
    ) -> Result<(), BackgroundError> {
        let c = self.coefficients(Self::redshift(a), true)?;
        let a2 = a * a;

        dfdy[0] = [0.0, 1.0];
        dfdy[1] = [1.5 * c.r / a2, -1.5 / a * (1.0 - c.q)];

        // dz/da = -1/a².
        let dq_da = -c.dq_dz / a2;
        let dr_da = -c.dr_dz / a2;
        dfdt[0] = 0.0;
        dfdt[1] = 1.5 / a2 * (1.0 - c.q) * y[1] + 1.5 / a * dq_da * y[1] - 3.0 / (a2 * a) * c.r * y[0]
            + 1.5 / a2 * dr_da * y[0];
        Ok(())
    }
}

/// Growth quantities at a single redshift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthSample {
    /// `D1(z)`.
    pub d1: f64,
    /// `dD1/da` at `a = 1/(1+z)`.
    pub d1_prime: f64,
    /// `f = dlnD1/dlna`.
    pub f: f64,
    /// `g = (1+z)·D1`.
    pub g: f64,
}

/// Integrates the growth system from `A_INITIAL` to each requested redshift.
#[derive(Debug, Clone, Copy)]
pub struct GrowthSolver<'a> {
    system: GrowthSystem<'a>,
    stepper: DormandPrince,
}

impl<'a> GrowthSolver<'a> {
    pub fn new(eos: &'a EquationOfStateBundle) -> Self {
        Self::with_control(eos, StepControl::default())
    }

    pub fn with_control(eos: &'a EquationOfStateBundle, control: StepControl) -> Self {
        Self {
            system: GrowthSystem::new(eos),
            stepper: DormandPrince::new(control),
        }
    }

    /// Growth at redshift `z`.
    ///
    /// Targets earlier than `A_INITIAL` (`z > 19`) return the initial state.
    pub fn solve(&self, z: f64) -> Result<GrowthSample, BackgroundError> {
        if !(z.is_finite() && z >= 0.0) {
            return Err(BackgroundError::domain(format!("growth requested at invalid redshift {z}")));
        }
        let a_target = 1.0 / (1.0 + z);
        let start = State {
            t: A_INITIAL,
            y: GROWTH_INITIAL_STATE,
        };
        let out = self.stepper.evolve(&self.system, start, a_target).map_err(|err| match err {
            BackgroundError::NumericalDivergence(msg) => {
                BackgroundError::NumericalDivergence(format!("growth at z={z}: {msg}"))
            }
            other => other,
        })?;

        let [d1, d1_prime] = out.state.y;
        log::trace!(
            "growth z={z}: {} accepted / {} rejected steps",
            out.accepted,
            out.rejected
        );
        Ok(GrowthSample {
            d1,
            d1_prime,
            f: d1_prime * a_target / d1,
            g: (1.0 + z) * d1,
        })
    }
}
