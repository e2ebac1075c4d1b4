use cosmo_background::background::{BackgroundBuilder, BackgroundTable, TracerBiases, TracerPair};
use cosmo_background::domain::{BackgroundFunction, CosmologicalParameters};
use cosmo_background::error::BackgroundError;

fn reference_tracers(z_max: f64) -> TracerPair {
    TracerPair::new(
        TracerBiases::constant(1.0, 0.2, 0.0, z_max).unwrap(),
        TracerBiases::constant(1.5, 0.4, 0.5, z_max).unwrap(),
    )
}

fn reference_table() -> BackgroundTable {
    let params = CosmologicalParameters::default();
    let tracers = reference_tracers(params.z_max);
    BackgroundBuilder::new(params, &tracers).build().unwrap()
}

#[test]
fn reference_lcdm_scenario() {
    let table = reference_table();
    let p = table.parameters().clone();
    let s = table.samples();

    assert_eq!(s.len(), 50);
    assert_eq!(table.z_max(), 15.0);
    assert_eq!(table.scale_factor(0.0).unwrap(), 1.0);
    assert!((table.hubble(0.0).unwrap() - 1.0).abs() < 1e-12);
    assert_eq!(table.comoving_distance(0.0).unwrap(), 0.0);

    for i in 1..s.len() {
        assert!(
            s.growth_factor[i] < s.growth_factor[i - 1],
            "D1 not decreasing at z={}",
            s.z[i]
        );
        assert!(s.comoving_distance[i] > s.comoving_distance[i - 1]);
    }

    for (i, &z) in s.z.iter().enumerate() {
        let u: f64 = 1.0 + z;
        let h = (p.omega_m() * u.powi(3) + p.omega_gamma * u.powi(4) + p.omega_de).sqrt();
        assert!((s.hubble[i] - h).abs() < 1e-10 * h, "H({z}) = {} vs {h}", s.hubble[i]);
        assert!(s.growth_rate[i] > 0.0 && s.growth_rate[i] < 1.2, "f({z}) = {}", s.growth_rate[i]);
        assert!((s.growth_g[i] - u * s.growth_factor[i]).abs() < 1e-14 * s.growth_g[i]);
    }

    assert_eq!(table.g1(0.0).unwrap(), 0.0);
    assert_eq!(table.g2(0.0).unwrap(), 0.0);
}

#[test]
fn scale_factor_tracks_inverse_redshift() {
    let table = reference_table();
    for &z in table.samples().z.iter() {
        assert_eq!(table.scale_factor(z).unwrap(), 1.0 / (1.0 + z));
    }
    // Between knots the natural spline is limited by the end condition at z=0.
    for i in 0..=300 {
        let z = 15.0 * i as f64 / 300.0;
        let a = table.scale_factor(z).unwrap();
        let expected = 1.0 / (1.0 + z);
        assert!((a - expected).abs() < 1e-2, "a({z}) = {a}, expected {expected}");
    }
}

#[test]
fn comoving_distance_round_trips() {
    let table = reference_table();
    for &z in table.samples().z.iter() {
        let chi = table.comoving_distance(z).unwrap();
        assert!((table.z_of_chi(chi).unwrap() - z).abs() < 1e-10);
    }
    for &z in &[0.05, 0.7, 2.3, 9.1, 14.2] {
        let chi = table.comoving_distance(z).unwrap();
        let back = table.z_of_chi(chi).unwrap();
        assert!((back - z).abs() < 2e-2 * (1.0 + z), "z(chi({z})) = {back}");
    }
}

#[test]
fn growth_tracks_matter_domination_early() {
    let table = reference_table();
    // D1 = a at a=0.05; at z=15 dark energy is still negligible.
    let d1 = table.growth_factor(15.0).unwrap();
    assert!((d1 * 16.0 - 1.0).abs() < 5e-3, "D1(15)·(1+z) = {}", d1 * 16.0);

    // f ≈ Ω_m(z)^0.55 to within a few percent.
    let p = table.parameters();
    for &z in &[0.0, 0.5, 2.0] {
        let h = table.hubble(z).unwrap();
        let om = p.omega_m() * (1.0f64 + z).powi(3) / (h * h);
        let f = table.growth_rate(z).unwrap();
        assert!((f - om.powf(0.55)).abs() < 0.02, "f({z}) = {f}, Ω_m(z)^0.55 = {}", om.powf(0.55));
    }
}

#[test]
fn rebuilds_are_identical() {
    let a = reference_table();
    let b = reference_table();
    assert_eq!(a.samples(), b.samples());

    let params = CosmologicalParameters::default();
    let tracers = reference_tracers(params.z_max);
    let serial = BackgroundBuilder::new(params, &tracers).parallel(false).build().unwrap();
    assert_eq!(a.samples(), serial.samples());
}

#[test]
fn no_extrapolation_past_the_grid() {
    let table = reference_table();
    for func in BackgroundFunction::ALL {
        assert!(matches!(
            table.evaluate(func, table.z_max() + 1.0),
            Err(BackgroundError::OutOfRange { .. })
        ));
    }
    assert!(matches!(
        table.z_of_chi(table.chi_max() * 1.01),
        Err(BackgroundError::OutOfRange { .. })
    ));
}

#[test]
fn snapshot_json_round_trips() {
    let table = reference_table();
    let dir = std::env::temp_dir().join(format!("cosmo-background-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("table.json");

    cosmo_background::io::write_table_json(&path, &table).unwrap();
    let loaded = cosmo_background::io::load_table(&path).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(loaded.len(), table.len());
    assert_eq!(loaded.parameters().background_bins, table.parameters().background_bins);
    for func in BackgroundFunction::ALL {
        for (x, y) in loaded.samples().column(func).iter().zip(table.samples().column(func)) {
            assert!((x - y).abs() <= 1e-14 * y.abs(), "{}: {x} vs {y}", func.label());
        }
    }
    let (h_loaded, h) = (loaded.hubble(3.3).unwrap(), table.hubble(3.3).unwrap());
    assert!((h_loaded - h).abs() < 1e-12 * h);
}
