//! Adaptive explicit Runge–Kutta integration for small ODE systems.
//!
//! Systems implement [`OdeSystem`] with a fixed state size `N`. Besides the
//! right-hand side, a system supplies its analytic Jacobian; steppers that
//! need it (implicit or Rosenbrock-type) can use it, and it doubles as a
//! cross-check of the right-hand side in tests.
//!
//! The stepper is the Dormand–Prince embedded pair of orders 5 and 4 with
//! first-same-as-last reuse. Each call to [`DormandPrince::evolve`] starts from
//! a fresh step size, so results never depend on earlier calls.
//!
//! This is a lower order than the 8(7) Prince–Dormand pair often used for
//! growth integrals. The error control is the same (`rtol` on each component),
//! so accuracy is held to `rtol`; only the step count differs.

use crate::error::BackgroundError;

/// The state of an ODE system at a single point in the solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State<const N: usize> {
    /// The independent variable.
    pub t: f64,
    /// The dependent variables at `t`.
    pub y: [f64; N],
}

/// A first-order system `dy/dt = f(t, y)` with `N` state variables.
pub trait OdeSystem<const N: usize> {
    /// Evaluate `f(t, y)` into `dydt`.
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]) -> Result<(), BackgroundError>;

    /// Evaluate `∂f/∂y` into `dfdy` (row `i` = component `i` of `f`) and
    /// the explicit time derivative `∂f/∂t` into `dfdt`.
    fn jacobian(
        &self,
        t: f64,
        y: &[f64; N],
        dfdy: &mut [[f64; N]; N],
        dfdt: &mut [f64; N],
    ) -> Result<(), BackgroundError>;
}

/// Error control and step-size settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepControl {
    pub atol: f64,
    pub rtol: f64,
    pub initial_step: f64,
    pub max_steps: usize,
}

impl Default for StepControl {
    fn default() -> Self {
        Self {
            atol: 0.0,
            rtol: 1e-6,
            initial_step: 1e-6,
            max_steps: 100_000,
        }
    }
}

/// Outcome of a single `evolve` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evolution<const N: usize> {
    pub state: State<N>,
    pub accepted: usize,
    pub rejected: usize,
}

// Dormand–Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// Difference between the 5th- and 4th-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Adaptive Dormand–Prince integrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DormandPrince {
    pub control: StepControl,
}

impl DormandPrince {
    pub fn new(control: StepControl) -> Self {
        Self { control }
    }

    /// Advance `start` until `t >= t_end`, landing exactly on `t_end`.
    ///
    /// If `start.t >= t_end` the state is returned unchanged. Fails with
    /// `NumericalDivergence` when the step size underflows, the step budget
    /// is exhausted, or the solution stops being finite.
    pub fn evolve<S, const N: usize>(
        &self,
        system: &S,
        start: State<N>,
        t_end: f64,
    ) -> Result<Evolution<N>, BackgroundError>
    where
        S: OdeSystem<N>,
    {
        let mut t = start.t;
        let mut y = start.y;
        let mut accepted = 0usize;
        let mut rejected = 0usize;

        if !(t < t_end) {
            return Ok(Evolution {
                state: start,
                accepted,
                rejected,
            });
        }

        let mut h = self.control.initial_step.abs();
        let mut k1 = [0.0; N];
        system.rhs(t, &y, &mut k1)?;

        while t < t_end {
            if accepted + rejected >= self.control.max_steps {
                return Err(BackgroundError::NumericalDivergence(format!(
                    "step budget of {} exhausted at t={t}",
                    self.control.max_steps
                )));
            }

            let remaining = t_end - t;
            let last = h >= remaining;
            let h_try = if last { remaining } else { h };

            let (y_new, k7, err) = self.attempt(system, t, &y, &k1, h_try)?;
            let err_norm = self.error_norm(&y, &y_new, &err);

            if err_norm <= 1.0 {
                t = if last { t_end } else { t + h_try };
                y = y_new;
                k1 = k7;
                accepted += 1;

                if y.iter().any(|v| !v.is_finite()) {
                    return Err(BackgroundError::NumericalDivergence(format!(
                        "non-finite state at t={t}"
                    )));
                }

                let factor = if err_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                h = h_try * factor;
            } else {
                rejected += 1;
                let factor = if err_norm.is_finite() {
                    (SAFETY * err_norm.powf(-0.2)).max(MIN_FACTOR)
                } else {
                    MIN_FACTOR
                };
                h = h_try * factor;
                if h <= f64::EPSILON * t.abs().max(1.0) {
                    return Err(BackgroundError::NumericalDivergence(format!(
                        "step size underflow (h={h:e}) at t={t}"
                    )));
                }
            }
        }

        Ok(Evolution {
            state: State { t, y },
            accepted,
            rejected,
        })
    }

    /// One trial step: returns the 5th-order solution, `f` at the new point
    /// and the embedded error estimate.
    #[allow(clippy::type_complexity)]
    fn attempt<S, const N: usize>(
        &self,
        system: &S,
        t: f64,
        y: &[f64; N],
        k1: &[f64; N],
        h: f64,
    ) -> Result<([f64; N], [f64; N], [f64; N]), BackgroundError>
    where
        S: OdeSystem<N>,
    {
        let mut k2 = [0.0; N];
        let mut k3 = [0.0; N];
        let mut k4 = [0.0; N];
        let mut k5 = [0.0; N];
        let mut k6 = [0.0; N];
        let mut k7 = [0.0; N];
        let mut tmp = [0.0; N];

        for i in 0..N {
            tmp[i] = y[i] + h * A21 * k1[i];
        }
        system.rhs(t + C2 * h, &tmp, &mut k2)?;

        for i in 0..N {
            tmp[i] = y[i] + h * (A31 * k1[i] + A32 * k2[i]);
        }
        system.rhs(t + C3 * h, &tmp, &mut k3)?;

        for i in 0..N {
            tmp[i] = y[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
        }
        system.rhs(t + C4 * h, &tmp, &mut k4)?;

        for i in 0..N {
            tmp[i] = y[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
        }
        system.rhs(t + C5 * h, &tmp, &mut k5)?;

        for i in 0..N {
            tmp[i] = y[i]
                + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
        }
        system.rhs(t + h, &tmp, &mut k6)?;

        let mut y_new = [0.0; N];
        for i in 0..N {
            y_new[i] = y[i]
                + h * (A71 * k1[i] + A73 * k3[i] + A74 * k4[i] + A75 * k5[i] + A76 * k6[i]);
        }
        system.rhs(t + h, &y_new, &mut k7)?;

        let mut err = [0.0; N];
        for i in 0..N {
            err[i] = h
                * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
        }

        Ok((y_new, k7, err))
    }

    /// Max-norm of the error scaled by `atol + rtol·max(|y|, |y_new|)`.
    fn error_norm<const N: usize>(&self, y: &[f64; N], y_new: &[f64; N], err: &[f64; N]) -> f64 {
        let mut norm: f64 = 0.0;
        for i in 0..N {
            let scale = (self.control.atol + self.control.rtol * y[i].abs().max(y_new[i].abs()))
                .max(f64::MIN_POSITIVE);
            let e = err[i].abs() / scale;
            if !e.is_finite() {
                return f64::INFINITY;
            }
            norm = norm.max(e);
        }
        norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Harmonic oscillator `y'' = -y`.
    struct Oscillator;

    impl OdeSystem<2> for Oscillator {
        fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) -> Result<(), BackgroundError> {
            dydt[0] = y[1];
            dydt[1] = -y[0];
            Ok(())
        }

        fn jacobian(
            &self,
            _t: f64,
            _y: &[f64; 2],
            dfdy: &mut [[f64; 2]; 2],
            dfdt: &mut [f64; 2],
        ) -> Result<(), BackgroundError> {
            *dfdy = [[0.0, 1.0], [-1.0, 0.0]];
            *dfdt = [0.0, 0.0];
            Ok(())
        }
    }

    /// `y' = y/t` has the exact solution `y = t`.
    struct Linear;

    impl OdeSystem<1> for Linear {
        fn rhs(&self, t: f64, y: &[f64; 1], dydt: &mut [f64; 1]) -> Result<(), BackgroundError> {
            dydt[0] = y[0] / t;
            Ok(())
        }

        fn jacobian(
            &self,
            t: f64,
            y: &[f64; 1],
            dfdy: &mut [[f64; 1]; 1],
            dfdt: &mut [f64; 1],
        ) -> Result<(), BackgroundError> {
            dfdy[0][0] = 1.0 / t;
            dfdt[0] = -y[0] / (t * t);
            Ok(())
        }
    }

    #[test]
    fn oscillator_matches_closed_form() {
        let stepper = DormandPrince::new(StepControl {
            atol: 1e-12,
            rtol: 1e-10,
            ..Default::default()
        });
        let out = stepper
            .evolve(&Oscillator, State { t: 0.0, y: [0.0, 1.0] }, 10.0)
            .unwrap();
        assert_eq!(out.state.t, 10.0);
        assert!((out.state.y[0] - 10f64.sin()).abs() < 1e-8);
        assert!((out.state.y[1] - 10f64.cos()).abs() < 1e-8);
        assert!(out.accepted > 10);
    }

    #[test]
    fn lands_exactly_on_target_and_is_repeatable() {
        let stepper = DormandPrince::default();
        let start = State { t: 0.05, y: [0.05] };
        let a = stepper.evolve(&Linear, start, 0.73).unwrap();
        let b = stepper.evolve(&Linear, start, 0.73).unwrap();
        assert_eq!(a.state.t, 0.73);
        assert!((a.state.y[0] - 0.73).abs() < 1e-9);
        assert_eq!(a, b);
    }

    #[test]
    fn target_behind_start_is_a_no_op() {
        let stepper = DormandPrince::default();
        let start = State { t: 0.5, y: [0.5] };
        let out = stepper.evolve(&Linear, start, 0.25).unwrap();
        assert_eq!(out.state, start);
        assert_eq!(out.accepted, 0);
    }

    #[test]
    fn step_budget_is_enforced() {
        let stepper = DormandPrince::new(StepControl {
            max_steps: 3,
            ..Default::default()
        });
        let r = stepper.evolve(&Oscillator, State { t: 0.0, y: [0.0, 1.0] }, 100.0);
        assert!(matches!(r, Err(BackgroundError::NumericalDivergence(_))));
    }
}
