//! Gauss–Kronrod rules on `[-1, 1]`.
//!
//! A `(2n+1)`-point Kronrod rule extends the `n`-point Gauss–Legendre rule by
//! `n+1` extra nodes so that the difference between both estimates can serve
//! as an error estimate without wasting the Gauss evaluations.
//!
//! Rather than carrying long constant tables we derive the rule once:
//!
//! - Gauss nodes: Newton iteration on `P_n` (Legendre recurrence).
//! - Kronrod nodes: roots of the Stieltjes polynomial `E_{n+1}`, written as a
//!   sum of Legendre polynomials of the same parity and fixed by
//!   `∫ P_n E_{n+1} P_k = 0` for `k <= n`. Its roots interlace the Gauss nodes,
//!   so plain bisection between neighbours finds all of them.
//! - Kronrod weights: the rule must integrate `P_0 .. P_{2n}` exactly, which is
//!   a square linear system in the Legendre basis (solved with LU).

use std::sync::OnceLock;

use nalgebra::{DMatrix, DVector};

use crate::error::BackgroundError;

/// Gauss points of the 61-point Kronrod rule.
pub const GK61_GAUSS_POINTS: usize = 30;

/// A Gauss–Kronrod pair on `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct GaussKronrodRule {
    /// All `2n+1` abscissas, ascending.
    pub nodes: Vec<f64>,
    /// Kronrod weight of each node.
    pub kronrod_weights: Vec<f64>,
    /// Gauss weight of each node (zero on Kronrod-only nodes).
    pub gauss_weights: Vec<f64>,
}

impl GaussKronrodRule {
    /// Derive the `(2n+1)`-point rule extending `n`-point Gauss–Legendre.
    pub fn new(n: usize) -> Result<Self, BackgroundError> {
        if n < 1 {
            return Err(BackgroundError::domain("Gauss-Kronrod rule needs n >= 1"));
        }

        let (gauss_nodes, gauss_w) = gauss_legendre(n);
        let stieltjes = stieltjes_coefficients(n)?;
        let extra = stieltjes_roots(n, &stieltjes, &gauss_nodes)?;

        let mut nodes: Vec<(f64, f64)> = gauss_nodes
            .iter()
            .copied()
            .zip(gauss_w.iter().copied())
            .chain(extra.into_iter().map(|x| (x, 0.0)))
            .collect();
        nodes.sort_by(|a, b| a.0.total_cmp(&b.0));

        let xs: Vec<f64> = nodes.iter().map(|(x, _)| *x).collect();
        let gauss_weights: Vec<f64> = nodes.iter().map(|(_, w)| *w).collect();
        let kronrod_weights = interpolatory_weights(&xs)?;

        Ok(Self {
            nodes: xs,
            kronrod_weights,
            gauss_weights,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The 61-point rule used by the adaptive integrator, derived on first use.
pub fn gauss_kronrod_61() -> Result<&'static GaussKronrodRule, BackgroundError> {
    static RULE: OnceLock<Result<GaussKronrodRule, BackgroundError>> = OnceLock::new();
    RULE.get_or_init(|| GaussKronrodRule::new(GK61_GAUSS_POINTS))
        .as_ref()
        .map_err(Clone::clone)
}

/// `P_0(x) .. P_n(x)` by the three-term recurrence.
fn legendre_all(n: usize, x: f64) -> Vec<f64> {
    let mut p = Vec::with_capacity(n + 1);
    p.push(1.0);
    if n >= 1 {
        p.push(x);
    }
    for k in 1..n {
        let kf = k as f64;
        let next = ((2.0 * kf + 1.0) * x * p[k] - kf * p[k - 1]) / (kf + 1.0);
        p.push(next);
    }
    p
}

/// `(P_n(x), P_n'(x))` for `|x| < 1`.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let p = legendre_all(n, x);
    let pn = p[n];
    let pn1 = if n >= 1 { p[n - 1] } else { 0.0 };
    let dp = n as f64 * (x * pn - pn1) / (x * x - 1.0);
    (pn, dp)
}

/// Nodes (ascending) and weights of the `m`-point Gauss–Legendre rule.
fn gauss_legendre(m: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = Vec::with_capacity(m);
    let mut weights = Vec::with_capacity(m);
    let mf = m as f64;

    for i in 0..m {
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (mf + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_with_derivative(m, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() <= 1e-16 {
                break;
            }
        }
        let (_, dp) = legendre_with_derivative(m, x);
        nodes.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    // cos() walks from +1 down to -1.
    nodes.reverse();
    weights.reverse();
    (nodes, weights)
}

/// Legendre degrees spanning `E_{n+1}`: `n+1, n-1, n-3, ...`.
fn stieltjes_degrees(n: usize) -> Vec<usize> {
    (0..=(n + 1) / 2).map(|i| n + 1 - 2 * i).collect()
}

/// Coefficients of `E_{n+1}` on `stieltjes_degrees(n)`, leading one fixed to 1.
fn stieltjes_coefficients(n: usize) -> Result<Vec<f64>, BackgroundError> {
    let degrees = stieltjes_degrees(n);
    let unknowns = degrees.len() - 1;
    if unknowns == 0 {
        return Ok(vec![1.0]);
    }

    // ∫ P_n P_d P_k has degree at most 3n+1; this rule integrates it exactly.
    let (qx, qw) = gauss_legendre(2 * n + 2);
    let tables: Vec<Vec<f64>> = qx.iter().map(|&x| legendre_all(n + 1, x)).collect();
    let triple = |d: usize, k: usize| -> f64 {
        tables
            .iter()
            .zip(qw.iter())
            .map(|(p, w)| w * p[n] * p[d] * p[k])
            .sum()
    };

    // Only odd k give non-trivial conditions (parity of P_n·E_{n+1} is odd).
    let ks: Vec<usize> = (1..=n).step_by(2).collect();
    if ks.len() != unknowns {
        return Err(BackgroundError::domain(format!(
            "Stieltjes system for n={n} is not square ({} x {unknowns})",
            ks.len()
        )));
    }

    let m = DMatrix::from_fn(unknowns, unknowns, |r, c| triple(degrees[c + 1], ks[r]));
    let rhs = DVector::from_fn(unknowns, |r, _| -triple(degrees[0], ks[r]));
    let sol = m
        .lu()
        .solve(&rhs)
        .ok_or_else(|| BackgroundError::domain(format!("singular Stieltjes system for n={n}")))?;

    let mut coeffs = Vec::with_capacity(degrees.len());
    coeffs.push(1.0);
    coeffs.extend(sol.iter().copied());
    Ok(coeffs)
}

fn stieltjes_eval(n: usize, coeffs: &[f64], x: f64) -> f64 {
    let p = legendre_all(n + 1, x);
    stieltjes_degrees(n)
        .iter()
        .zip(coeffs.iter())
        .map(|(&d, c)| c * p[d])
        .sum()
}

/// The `n+1` roots of `E_{n+1}`, one in each gap of `[-1, g_1, .., g_n, 1]`.
fn stieltjes_roots(n: usize, coeffs: &[f64], gauss_nodes: &[f64]) -> Result<Vec<f64>, BackgroundError> {
    let mut brackets = Vec::with_capacity(gauss_nodes.len() + 2);
    brackets.push(-1.0);
    brackets.extend_from_slice(gauss_nodes);
    brackets.push(1.0);

    let mut roots = Vec::with_capacity(n + 1);
    for w in brackets.windows(2) {
        let (mut lo, mut hi) = (w[0], w[1]);
        let mut f_lo = stieltjes_eval(n, coeffs, lo);
        let f_hi = stieltjes_eval(n, coeffs, hi);
        if f_lo * f_hi > 0.0 {
            return Err(BackgroundError::domain(format!(
                "no Kronrod node bracketed in [{lo}, {hi}] for n={n}"
            )));
        }
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            let f_mid = stieltjes_eval(n, coeffs, mid);
            if f_mid == 0.0 {
                lo = mid;
                hi = mid;
                break;
            }
            if (f_mid < 0.0) == (f_lo < 0.0) {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }
        roots.push(0.5 * (lo + hi));
    }
    Ok(roots)
}

/// Weights making the rule exact for `P_0 .. P_{m-1}` on the given nodes.
fn interpolatory_weights(nodes: &[f64]) -> Result<Vec<f64>, BackgroundError> {
    let m = nodes.len();
    let tables: Vec<Vec<f64>> = nodes.iter().map(|&x| legendre_all(m - 1, x)).collect();
    let vander = DMatrix::from_fn(m, m, |k, j| tables[j][k]);
    let mut moments = DVector::zeros(m);
    moments[0] = 2.0;
    let w = vander
        .lu()
        .solve(&moments)
        .ok_or_else(|| BackgroundError::domain("singular Kronrod weight system"))?;
    Ok(w.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // QUADPACK qk15 tables (non-negative half).
    const XGK15: [f64; 8] = [
        0.991455371120812639206854697526329,
        0.949107912342758524526189684047851,
        0.864864423359769072789712788640926,
        0.741531185599394439863864773280788,
        0.586087235467691130294144845693013,
        0.405845151377397166906606412076961,
        0.207784955007898467600689403773245,
        0.000000000000000000000000000000000,
    ];
    const WGK15: [f64; 8] = [
        0.022935322010529224963732008058970,
        0.063092092629978553290700663189204,
        0.104790010322250183839876322541518,
        0.140653259715525918745189590510238,
        0.169004726639267902826583426598550,
        0.190350578064785409913256402421014,
        0.204432940075298892414161999234649,
        0.209482141084727828012999174891714,
    ];
    const WG7: [f64; 4] = [
        0.129484966168869693270611432679082,
        0.279705391489276667901467771423780,
        0.381830050505118944950369775488975,
        0.417959183673469387755102040816327,
    ];

    #[test]
    fn derived_15_point_rule_matches_quadpack() {
        let rule = GaussKronrodRule::new(7).unwrap();
        assert_eq!(rule.len(), 15);
        // Ascending nodes: index 7 is the centre, 7+j mirrors XGK15[7-j].
        for j in 0..8 {
            let x = rule.nodes[14 - j];
            let w = rule.kronrod_weights[14 - j];
            assert!((x - XGK15[j]).abs() < 1e-12, "node {j}: {x} vs {}", XGK15[j]);
            assert!((w - WGK15[j]).abs() < 1e-12, "weight {j}: {w} vs {}", WGK15[j]);
        }
        // Gauss nodes sit at odd positions of the QUADPACK table.
        for (j, wg) in WG7.iter().enumerate() {
            let idx = 14 - (2 * j + 1);
            assert!((rule.gauss_weights[idx] - wg).abs() < 1e-12);
        }
        assert_eq!(rule.gauss_weights[14], 0.0);
    }

    #[test]
    fn rule_61_integrates_high_degree_polynomials() {
        let rule = gauss_kronrod_61().unwrap();
        assert_eq!(rule.len(), 61);

        let wsum: f64 = rule.kronrod_weights.iter().sum();
        let gsum: f64 = rule.gauss_weights.iter().sum();
        assert!((wsum - 2.0).abs() < 1e-13);
        assert!((gsum - 2.0).abs() < 1e-13);

        // Kronrod: exact to degree 3n+1 = 91. Gauss: exact to 2n-1 = 59.
        for k in (0..=90).step_by(2) {
            let exact = 2.0 / (k as f64 + 1.0);
            let kr: f64 = rule
                .nodes
                .iter()
                .zip(&rule.kronrod_weights)
                .map(|(x, w)| w * x.powi(k))
                .sum();
            assert!((kr - exact).abs() < 1e-11, "k={k}: {kr} vs {exact}");
            if k <= 58 {
                let g: f64 = rule
                    .nodes
                    .iter()
                    .zip(&rule.gauss_weights)
                    .map(|(x, w)| w * x.powi(k))
                    .sum();
                assert!((g - exact).abs() < 1e-11, "gauss k={k}: {g} vs {exact}");
            }
        }
    }

    #[test]
    fn nodes_are_symmetric_and_interior() {
        let rule = gauss_kronrod_61().unwrap();
        let n = rule.len();
        for i in 0..n {
            assert!(rule.nodes[i].abs() < 1.0);
            assert!((rule.nodes[i] + rule.nodes[n - 1 - i]).abs() < 1e-13);
            assert!(rule.kronrod_weights[i] > 0.0);
        }
    }
}
