//! Formatted terminal output for background tables.
//!
//! We keep formatting code in one place so:
//! - the numerical code stays free of presentation concerns
//! - output changes are localized

use crate::background::BackgroundTable;
use crate::domain::{BackgroundFunction, BackgroundSamples, CosmologicalParameters};
use crate::error::BackgroundError;

/// Exponent of the `f ≈ Ω_m(z)^γ` growth-index approximation.
pub const GROWTH_INDEX: f64 = 0.55;

/// One row of the growth-index sanity check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthIndexCheck {
    pub z: f64,
    pub growth_rate: f64,
    /// `Ω_m(z)^0.55`.
    pub approximation: f64,
}

/// Compare `f(z)` with `Ω_m(z)^0.55` at each sampled redshift.
///
/// `Ω_m(z) = Ω_m(1+z)³/H(z)²`.
pub fn growth_index_checks(samples: &BackgroundSamples, params: &CosmologicalParameters) -> Vec<GrowthIndexCheck> {
    samples
        .z
        .iter()
        .zip(&samples.hubble)
        .zip(&samples.growth_rate)
        .map(|((&z, &h), &f)| {
            let omega_m_z = params.omega_m() * (1.0 + z).powi(3) / (h * h);
            GrowthIndexCheck {
                z,
                growth_rate: f,
                approximation: omega_m_z.powf(GROWTH_INDEX),
            }
        })
        .collect()
}

/// Format the build summary: parameters, key values and a sampled table.
pub fn format_build_summary(table: &BackgroundTable, max_rows: usize) -> Result<String, BackgroundError> {
    let p = table.parameters();
    let mut out = String::new();

    out.push_str("=== bg - background evolution ===\n");
    out.push_str(&format!(
        "Omega: cdm={} baryon={} gamma={} de={} (sum={:.6})\n",
        p.omega_cdm,
        p.omega_baryon,
        p.omega_gamma,
        p.omega_de,
        p.omega_total()
    ));
    out.push_str(&format!(
        "Dark energy: w0={} wa={}\n",
        p.dark_energy.w0, p.dark_energy.wa
    ));
    out.push_str(&format!(
        "Grid: {} bins on z=[0, {}] | interpolation={:?}\n",
        table.len(),
        table.z_max(),
        p.interp_method
    ));

    out.push_str("\nKey values:\n");
    out.push_str(&format!("- H(0)       = {:.10}\n", table.hubble(0.0)?));
    out.push_str(&format!("- D1(0)      = {:.10}\n", table.growth_factor(0.0)?));
    out.push_str(&format!("- f(0)       = {:.10}\n", table.growth_rate(0.0)?));
    out.push_str(&format!(
        "- chi(z_max) = {:.10} (z_max={})\n",
        table.chi_max(),
        table.z_max()
    ));

    let checks = growth_index_checks(table.samples(), p);
    let worst = checks
        .iter()
        .map(|c| (c.growth_rate - c.approximation).abs())
        .fold(0.0, f64::max);
    if let Some(today) = checks.first() {
        out.push_str(&format!(
            "- f(0) vs Omega_m(0)^{GROWTH_INDEX} = {:.6} (max |diff| over grid {:.2e})\n",
            today.approximation, worst
        ));
    }

    out.push('\n');
    out.push_str(&format_samples_table(table.samples(), max_rows));
    Ok(out)
}

/// Fixed-width table of grid samples, thinned to at most `max_rows` rows
/// (first and last bins are always shown).
pub fn format_samples_table(samples: &BackgroundSamples, max_rows: usize) -> String {
    let columns = [
        BackgroundFunction::ScaleFactor,
        BackgroundFunction::Hubble,
        BackgroundFunction::GrowthFactor,
        BackgroundFunction::GrowthRate,
        BackgroundFunction::ComovingDistance,
        BackgroundFunction::G1,
        BackgroundFunction::G2,
    ];

    let mut out = String::new();
    out.push_str(&format!("{:>8}", "z"));
    for c in columns {
        out.push_str(&format!(" {:>13}", c.label()));
    }
    out.push('\n');
    out.push_str(&format!("{:-<8}", ""));
    for _ in columns {
        out.push_str(&format!(" {:-<13}", ""));
    }
    out.push('\n');

    for i in thinned_rows(samples.len(), max_rows) {
        out.push_str(&format!("{:>8.4}", samples.z[i]));
        for c in columns {
            out.push_str(&format!(" {:>13.6e}", samples.column(c)[i]));
        }
        out.push('\n');
    }
    out
}

/// Format `(x, value)` pairs for `bg eval`.
pub fn format_evaluations(label: &str, input: &str, rows: &[(f64, f64)]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{input:>12} {label:>20}\n"));
    for (x, v) in rows {
        out.push_str(&format!("{x:>12.6} {v:>20.12e}\n"));
    }
    out
}

fn thinned_rows(n: usize, max_rows: usize) -> Vec<usize> {
    if n == 0 || max_rows == 0 {
        return Vec::new();
    }
    if n <= max_rows {
        return (0..n).collect();
    }
    if max_rows == 1 {
        return vec![0];
    }
    let mut rows: Vec<usize> = (0..max_rows).map(|k| k * (n - 1) / (max_rows - 1)).collect();
    rows.dedup();
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> BackgroundSamples {
        let mut s = BackgroundSamples::with_capacity(3);
        for (z, h, f) in [(0.0, 1.0, 0.5), (1.0, 1.8, 0.8), (2.0, 3.0, 0.9)] {
            s.z.push(z);
            s.a.push(1.0 / (1.0 + z));
            s.hubble.push(h);
            s.conformal_hubble.push(h / (1.0 + z));
            s.conformal_hubble_prime.push(0.0);
            s.growth_factor.push(1.0 / (1.0 + z));
            s.growth_rate.push(f);
            s.growth_g.push(1.0);
            s.comoving_distance.push(z);
            s.g1.push(0.0);
            s.g2.push(0.0);
        }
        s
    }

    #[test]
    fn growth_index_uses_matter_fraction() {
        let params = CosmologicalParameters::default();
        let checks = growth_index_checks(&samples(), &params);
        assert_eq!(checks.len(), 3);
        assert!((checks[0].approximation - params.omega_m().powf(GROWTH_INDEX)).abs() < 1e-15);
        let om1 = params.omega_m() * 8.0 / (1.8 * 1.8);
        assert!((checks[1].approximation - om1.powf(GROWTH_INDEX)).abs() < 1e-15);
    }

    #[test]
    fn thinning_keeps_endpoints() {
        assert_eq!(thinned_rows(50, 5), vec![0, 12, 24, 36, 49]);
        assert_eq!(thinned_rows(3, 10), vec![0, 1, 2]);
        assert!(thinned_rows(0, 10).is_empty());
    }

    #[test]
    fn samples_table_has_header_and_rows() {
        let text = format_samples_table(&samples(), 10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("chi"));
        assert!(lines[0].contains("G2"));
    }
}
