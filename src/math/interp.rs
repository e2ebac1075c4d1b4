//! One-dimensional interpolants over a fixed sample table.
//!
//! An `Interpolant` owns strictly increasing abscissas and the matching
//! ordinates, and evaluates either a piecewise-linear or a natural cubic spline
//! through them. Queries outside `[x_first, x_last]` fail; there is no
//! extrapolation.
//!
//! Lookups remember the last interval hit, so sweeping nearby `x` values costs
//! O(1) per query. The cache is an atomic so a finished table can be shared
//! across threads; a cache hit is only accepted when it is the same interval a
//! fresh binary search would pick, which keeps results independent of query
//! order.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::InterpMethod;
use crate::error::BackgroundError;

#[derive(Debug)]
pub struct Interpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots (all zero for linear interpolation).
    y2s: Vec<f64>,
    method: InterpMethod,
    last: AtomicUsize,
}

impl Clone for Interpolant {
    fn clone(&self) -> Self {
        Self {
            xs: self.xs.clone(),
            ys: self.ys.clone(),
            y2s: self.y2s.clone(),
            method: self.method,
            last: AtomicUsize::new(0),
        }
    }
}

impl Interpolant {
    /// Build an interpolant from sample pairs.
    ///
    /// Fails with `Domain` if the arrays differ in length, hold fewer than two
    /// points, contain non-finite values, or `xs` is not strictly increasing.
    pub fn build(xs: Vec<f64>, ys: Vec<f64>, method: InterpMethod) -> Result<Self, BackgroundError> {
        if xs.len() != ys.len() {
            return Err(BackgroundError::domain(format!(
                "xs and ys differ in length ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(BackgroundError::domain(format!(
                "need at least 2 samples (got {})",
                xs.len()
            )));
        }
        if let Some(i) = xs.iter().chain(ys.iter()).position(|v| !v.is_finite()) {
            return Err(BackgroundError::domain(format!(
                "non-finite sample at position {}",
                i % xs.len()
            )));
        }
        if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(BackgroundError::domain(format!(
                "xs must be strictly increasing (x[{}]={} >= x[{}]={})",
                i,
                xs[i],
                i + 1,
                xs[i + 1]
            )));
        }

        let y2s = match method {
            InterpMethod::Linear => vec![0.0; xs.len()],
            InterpMethod::Cubic => natural_second_derivatives(&xs, &ys),
        };

        Ok(Self {
            xs,
            ys,
            y2s,
            method,
            last: AtomicUsize::new(0),
        })
    }

    /// Tabulate `f` on the given abscissas and build an interpolant through it.
    pub fn tabulate<F>(xs: Vec<f64>, method: InterpMethod, f: F) -> Result<Self, BackgroundError>
    where
        F: Fn(f64) -> f64,
    {
        let ys = xs.iter().map(|&x| f(x)).collect();
        Self::build(xs, ys, method)
    }

    pub fn method(&self) -> InterpMethod {
        self.method
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn x_min(&self) -> f64 {
        self.xs[0]
    }

    pub fn x_max(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }

    /// Value at `x`.
    pub fn evaluate(&self, x: f64) -> Result<f64, BackgroundError> {
        let i = self.locate(x)?;
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let h = x1 - x0;
        let a = (x1 - x) / h;
        let b = (x - x0) / h;

        // y0 + b·(y1 - y0) keeps constant tables exact.
        let value = match self.method {
            InterpMethod::Linear => y0 + b * (y1 - y0),
            InterpMethod::Cubic => {
                y0 + b * (y1 - y0)
                    + ((a * a * a - a) * self.y2s[i] + (b * b * b - b) * self.y2s[i + 1]) * h * h
                        / 6.0
            }
        };
        Ok(value)
    }

    /// First derivative `dy/dx` at `x`.
    pub fn derivative(&self, x: f64) -> Result<f64, BackgroundError> {
        let i = self.locate(x)?;
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let h = x1 - x0;
        let slope = (self.ys[i + 1] - self.ys[i]) / h;

        let value = match self.method {
            InterpMethod::Linear => slope,
            InterpMethod::Cubic => {
                let a = (x1 - x) / h;
                let b = (x - x0) / h;
                slope - (3.0 * a * a - 1.0) / 6.0 * h * self.y2s[i]
                    + (3.0 * b * b - 1.0) / 6.0 * h * self.y2s[i + 1]
            }
        };
        Ok(value)
    }

    /// Index `i` of the interval `[x_i, x_{i+1}]` used for `x`.
    ///
    /// Canonical rule: the largest `i` with `x_i <= x`, capped at `n - 2`.
    fn locate(&self, x: f64) -> Result<usize, BackgroundError> {
        if !self.contains(x) {
            return Err(BackgroundError::OutOfRange {
                x,
                min: self.x_min(),
                max: self.x_max(),
            });
        }

        let last_interval = self.xs.len() - 2;
        let cached = self.last.load(Ordering::Relaxed);
        if cached <= last_interval
            && self.xs[cached] <= x
            && (x < self.xs[cached + 1] || cached == last_interval)
        {
            return Ok(cached);
        }

        let i = self
            .xs
            .partition_point(|&v| v <= x)
            .saturating_sub(1)
            .min(last_interval);
        self.last.store(i, Ordering::Relaxed);
        Ok(i)
    }
}

/// Second derivatives of the natural cubic spline through `(xs, ys)`.
///
/// Solves the tridiagonal continuity system with `M_0 = M_{n-1} = 0`.
fn natural_second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

    // Forward sweep (Thomas algorithm).
    let mut cp = vec![0.0; n];
    let mut dp = vec![0.0; n];
    for i in 1..n - 1 {
        let sub = h[i - 1];
        let diag = 2.0 * (h[i - 1] + h[i]);
        let sup = h[i];
        let rhs = 6.0 * (slope[i] - slope[i - 1]);
        let denom = diag - sub * cp[i - 1];
        cp[i] = sup / denom;
        dp[i] = (rhs - sub * dp[i - 1]) / denom;
    }

    // Back substitution.
    for i in (1..n - 1).rev() {
        m[i] = dp[i] - cp[i] * m[i + 1];
    }
    m
}

/// `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// Points are computed as `min + (max - min)·i/(steps - 1)`; the last point is
/// pinned to `max`.
pub fn linspace(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, BackgroundError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(BackgroundError::domain(format!(
            "invalid grid range: min={min}, max={max} (must be finite and max>min)"
        )));
    }
    if steps < 2 {
        return Err(BackgroundError::domain("grid needs at least 2 points"));
    }

    let span = max - min;
    let last = (steps - 1) as f64;
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps - 1 {
        out.push(min + span * i as f64 / last);
    }
    out.push(max);
    Ok(out)
}
