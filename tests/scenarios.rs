//! End-to-end scenarios exercising the composition and decay machinery
//! together, the way a host simulation would.

use std::sync::{Arc, Once};

use fuelcycle_core::{Basis, Composition, DecayDatabase, Error, NuclideId, NuclideRegistry, Recipe};

static LOG_INIT: Once = Once::new();

/// Routes `log` output to stderr for `cargo test -- --nocapture`, the same
/// role `stderrlog` plays behind the teacher's own CLI entry point.
fn init_logging() {
    LOG_INIT.call_once(|| {
        let _ = stderrlog::new().verbosity(3).quiet(false).init();
    });
}

fn harness() -> (Arc<NuclideRegistry>, Arc<DecayDatabase>) {
    init_logging();
    (
        Arc::new(NuclideRegistry::new()),
        Arc::new(DecayDatabase::new()),
    )
}

fn temp_decay_file(contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "fuelcycle-core-scenario-{}-{}.txt",
        std::process::id(),
        contents.len()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn s1_natural_uranium_recipe() {
    let (registry, db) = harness();
    let recipe = Recipe {
        name: "natural uranium".to_string(),
        basis: Basis::Mass,
        unit_label: Some("kg".to_string()),
        total: Some(1.0),
        nuclides: vec![
            ("U-235".to_string(), 0.00720),
            ("U-238".to_string(), 0.99280),
        ],
    };
    let composition = Composition::from_recipe(&recipe, registry, db).unwrap();

    assert!((composition.total_mass_kg() - 1.0).abs() < 1e-9);
    let expected_atoms = 2.561e24;
    assert!((composition.total_atoms() - expected_atoms).abs() / expected_atoms < 1e-3);
}

#[test]
fn s2_cs137_decays_one_half_life() {
    let (registry, db) = harness();
    let path = temp_decay_file("Cs-137 9.4906e8 1\nBa-137 1.0\n");
    db.load_decay_info(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let recipe = Recipe {
        name: "cs137 source".to_string(),
        basis: Basis::Mass,
        unit_label: Some("kg".to_string()),
        total: Some(1.0),
        nuclides: vec![("Cs-137".to_string(), 1.0)],
    };
    let mut composition = Composition::from_recipe(&recipe, registry, db).unwrap();
    let initial_mass = composition.total_mass_kg();

    composition.decay(360.99).unwrap();

    let cs137: NuclideId = "Cs-137".parse().unwrap();
    let ba137: NuclideId = "Ba-137".parse().unwrap();

    assert!((composition.mass_of(cs137) - 0.5).abs() < 1e-4);
    assert!((composition.mass_of(ba137) - 0.5).abs() < 1e-4);
    assert!((composition.total_mass_kg() - initial_mass).abs() < crate_epsilon());
}

#[test]
fn s3_absorb_combines_masses_and_empties_source() {
    let (registry, db) = harness();
    let a_recipe = Recipe {
        name: "a".to_string(),
        basis: Basis::Mass,
        unit_label: Some("kg".to_string()),
        total: Some(1.0),
        nuclides: vec![("U-235".to_string(), 1.0)],
    };
    let b_recipe = Recipe {
        name: "b".to_string(),
        basis: Basis::Mass,
        unit_label: Some("kg".to_string()),
        total: Some(2.0),
        nuclides: vec![("U-235".to_string(), 1.0)],
    };
    let mut a = Composition::from_recipe(&a_recipe, registry.clone(), db.clone()).unwrap();
    let mut b = Composition::from_recipe(&b_recipe, registry, db).unwrap();

    a.absorb(&mut b, 0.0).unwrap();

    assert!((a.total_mass_kg() - 3.0).abs() < 1e-9);
    assert!(b.total_mass_kg().abs() < crate_epsilon());
}

#[test]
fn s4_extract_excess_mass_fails() {
    let (registry, db) = harness();
    let recipe = Recipe {
        name: "a".to_string(),
        basis: Basis::Mass,
        unit_label: Some("kg".to_string()),
        total: Some(1.0),
        nuclides: vec![("U-235".to_string(), 1.0)],
    };
    let mut a = Composition::from_recipe(&recipe, registry, db).unwrap();

    let err = a.extract_mass(1.5, 0.0).unwrap_err();
    assert!(matches!(err, Error::InsufficientInventory { .. }));
}

#[test]
fn s5_branch_split_preserves_ratio() {
    let (registry, db) = harness();
    // A synthetic parent with a 0.7/0.3 branch split, half-life 100 months
    // expressed in seconds for the file format.
    let half_life_months = 100.0;
    let half_life_s = half_life_months * fuelcycle_core::decay::SECONDS_PER_MONTH;
    let path = temp_decay_file(&format!(
        "Rf-300 {half_life_s} 2\nDb-300 0.7\nSg-300 0.3\n"
    ));
    db.load_decay_info(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let recipe = Recipe {
        name: "synthetic parent".to_string(),
        basis: Basis::Atoms,
        unit_label: Some("mol".to_string()),
        total: Some(6.022_140_76e23),
        nuclides: vec![("Rf-300".to_string(), 1.0)],
    };
    let mut composition = Composition::from_recipe(&recipe, registry, db).unwrap();
    composition.decay(half_life_months).unwrap();

    let parent: NuclideId = "Rf-300".parse().unwrap();
    let a: NuclideId = "Db-300".parse().unwrap();
    let b: NuclideId = "Sg-300".parse().unwrap();

    let total_atoms = 6.022_140_76e23;
    assert!((composition.atoms_of(parent) - 0.5 * total_atoms).abs() / total_atoms < 1e-6);

    let daughter_sum = composition.atoms_of(a) + composition.atoms_of(b);
    assert!((composition.atoms_of(a) / daughter_sum - 0.7).abs() < 1e-6);
    assert!((composition.atoms_of(b) / daughter_sum - 0.3).abs() < 1e-6);
}

#[test]
fn s6_bad_branch_sum_names_the_parent() {
    let db = DecayDatabase::new();
    let path = temp_decay_file("Co-60 1.663e8 1\nNi-60 0.9\n");
    let err = db.load_decay_info(&path).unwrap_err();
    let _ = std::fs::remove_file(&path);

    match err {
        Error::BranchSumInvalid { parent, .. } => assert_eq!(parent, "Co-60"),
        other => panic!("expected BranchSumInvalid, got {other:?}"),
    }
}

fn crate_epsilon() -> f64 {
    fuelcycle_core::config::epsilon_kg()
}
