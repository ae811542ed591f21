//! The user-facing composition object: a bag of isotopes carrying both
//! atom-count and mass accounting.
//!
//! Atoms are the canonical basis; mass is derived from the registry on
//! every [`Composition::rationalize`] call rather than stored and
//! independently mutated, satisfying the basis-consistency invariant by
//! construction instead of by bookkeeping discipline.

mod ops;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::decay::DecayDatabase;
use crate::error::Error;
use crate::nuclide::registry::NuclideRegistry;
use crate::nuclide::NuclideId;
use crate::recorder::{MutationEvent, Recorder};

/// Avogadro's number.
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// How the caller expressed quantities at construction time: `comp_map`
/// values were fractions of a total mass, or of a total atom count. Once a
/// [`Composition`] exists this is metadata only — atoms are canonical
/// internally regardless of which basis built it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Basis {
    Mass,
    Atoms,
}

/// The two states in the composition state machine: empty compositions
/// carry no tracked material; populated ones do. There is no stored field
/// for this — it is always derived from the current totals against the
/// conservation tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Empty,
    Populated,
}

/// The upstream recipe shape from spec §6: `{name, basis, unit_label?,
/// total?, nuclides}`. Produced by an XML/JSON/YAML loader outside this
/// crate; `nuclides` pairs a nuclide-identifier string with its relative
/// weight in `basis` units. If `total` is absent the weights are taken as
/// already-absolute quantities rather than fractions to be scaled.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Recipe {
    pub name: String,
    pub basis: Basis,
    pub unit_label: Option<String>,
    pub total: Option<f64>,
    pub nuclides: Vec<(String, f64)>,
}

/// A bag of isotopes: atom-count and mass accounting for one quantity of
/// material, evolved in place by [`Composition::change`],
/// [`Composition::absorb`], [`Composition::extract`],
/// [`Composition::extract_mass`], and [`Composition::decay`].
pub struct Composition {
    serial_id: u64,
    name: String,
    unit_label: String,
    basis: Basis,
    atoms: HashMap<NuclideId, f64>,
    total_atoms: f64,
    total_mass_kg: f64,
    last_decay_time: Option<f64>,
    registry: Arc<NuclideRegistry>,
    decay_database: Arc<DecayDatabase>,
    recorder: Option<Box<dyn Recorder + Send>>,
}

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

fn next_serial() -> u64 {
    NEXT_SERIAL.fetch_add(1, Ordering::Relaxed)
}

/// `mass_i = atoms_i * atomic_mass_g_per_mol / N_A * 1e-3` (kg).
pub(crate) fn atoms_to_mass_kg(atoms: f64, atomic_mass_g_per_mol: f64) -> f64 {
    atoms * atomic_mass_g_per_mol / AVOGADRO * 1e-3
}

pub(crate) fn mass_kg_to_atoms(mass_kg: f64, atomic_mass_g_per_mol: f64) -> f64 {
    mass_kg * 1e3 / atomic_mass_g_per_mol * AVOGADRO
}

/// Divides `map` by the larger of its sum and `eps`, so normalizing an
/// empty map yields an empty map instead of dividing by zero.
pub fn normalize(map: &HashMap<NuclideId, f64>, eps: f64) -> HashMap<NuclideId, f64> {
    let sum: f64 = map.values().sum();
    let denom = sum.max(eps);
    map.iter().map(|(&id, &v)| (id, v / denom)).collect()
}

impl Composition {
    /// An empty composition with no tracked nuclides.
    pub fn empty(
        name: impl Into<String>,
        unit_label: impl Into<String>,
        registry: Arc<NuclideRegistry>,
        decay_database: Arc<DecayDatabase>,
    ) -> Self {
        Self {
            serial_id: next_serial(),
            name: name.into(),
            unit_label: unit_label.into(),
            basis: Basis::Atoms,
            atoms: HashMap::new(),
            total_atoms: 0.0,
            total_mass_kg: 0.0,
            last_decay_time: None,
            registry,
            decay_database,
            recorder: None,
        }
    }

    /// Builds a composition from the upstream recipe shape (spec §6). The
    /// recipe's nuclide weights are normalized to sum to 1 and then scaled
    /// by `recipe.total` (mass in kg if `basis = Mass`, atom count if
    /// `basis = Atoms`); if `total` is absent the weights are treated as
    /// already-absolute quantities in `basis` units.
    pub fn from_recipe(
        recipe: &Recipe,
        registry: Arc<NuclideRegistry>,
        decay_database: Arc<DecayDatabase>,
    ) -> Result<Self, Error> {
        let eps = crate::config::epsilon_kg();

        let mut weights: HashMap<NuclideId, f64> = HashMap::new();
        for (id_str, value) in &recipe.nuclides {
            let id: NuclideId = id_str.parse()?;
            if !registry.is_valid(id) {
                return Err(Error::InvalidNuclide(id_str.clone()));
            }
            *weights.entry(id).or_insert(0.0) += *value;
        }

        let scale = recipe.total.unwrap_or_else(|| weights.values().sum());
        let normalized = normalize(&weights, eps);
        let scaled: HashMap<NuclideId, f64> = normalized
            .into_iter()
            .map(|(id, fraction)| (id, fraction * scale))
            .collect();

        let atoms = match recipe.basis {
            Basis::Atoms => scaled,
            Basis::Mass => scaled
                .into_iter()
                .map(|(id, mass_kg)| {
                    let atomic_mass = registry.atomic_mass(id);
                    (id, mass_kg_to_atoms(mass_kg, atomic_mass))
                })
                .collect(),
        };

        let mut composition = Self {
            serial_id: next_serial(),
            name: recipe.name.clone(),
            unit_label: recipe.unit_label.clone().unwrap_or_default(),
            basis: recipe.basis,
            atoms,
            total_atoms: 0.0,
            total_mass_kg: 0.0,
            last_decay_time: None,
            registry,
            decay_database,
            recorder: None,
        };
        composition.rationalize();
        Ok(composition)
    }

    /// Attaches a recorder; mutations from this point on emit one
    /// [`MutationEvent`] per call. Replaces any previously attached
    /// recorder.
    pub fn with_recorder(mut self, recorder: impl Recorder + Send + 'static) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }

    pub fn serial_id(&self) -> u64 {
        self.serial_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn state(&self) -> State {
        let eps = crate::config::epsilon_kg();
        if self.total_mass_kg.abs() < eps && self.total_atoms.abs() < eps {
            State::Empty
        } else {
            State::Populated
        }
    }

    pub fn total_mass_kg(&self) -> f64 {
        self.total_mass_kg
    }

    pub fn total_atoms(&self) -> f64 {
        self.total_atoms
    }

    /// Mass of isotope `id`, 0 if absent.
    pub fn mass_of(&self, id: NuclideId) -> f64 {
        self.atoms
            .get(&id)
            .map(|&n| atoms_to_mass_kg(n, self.registry.atomic_mass(id)))
            .unwrap_or(0.0)
    }

    /// Atom count of isotope `id`, 0 if absent.
    pub fn atoms_of(&self, id: NuclideId) -> f64 {
        self.atoms.get(&id).copied().unwrap_or(0.0)
    }

    /// Mass of element `z`, summed over its isotopes.
    pub fn mass_of_element(&self, z: u32) -> f64 {
        self.atoms
            .iter()
            .filter(|(id, _)| id.z() == z)
            .map(|(&id, &n)| atoms_to_mass_kg(n, self.registry.atomic_mass(id)))
            .sum()
    }

    /// A fresh composition holding `fraction` (in `[0, 1]`) of `self`'s
    /// material, with the same normalized isotopic proportions. Pure: does
    /// not mutate `self`.
    pub fn fractional_subcomposition(&self, fraction: f64) -> Composition {
        let atoms: HashMap<NuclideId, f64> = self
            .atoms
            .iter()
            .map(|(&id, &n)| (id, n * fraction))
            .collect();

        let mut sub = Composition {
            serial_id: next_serial(),
            name: self.name.clone(),
            unit_label: self.unit_label.clone(),
            basis: self.basis,
            atoms,
            total_atoms: 0.0,
            total_mass_kg: 0.0,
            last_decay_time: self.last_decay_time,
            registry: self.registry.clone(),
            decay_database: self.decay_database.clone(),
            recorder: None,
        };
        sub.rationalize();
        sub
    }

    /// Re-derives mass from atoms nuclide-by-nuclide, recomputes the
    /// cached totals, and drops any entry whose mass-equivalent magnitude
    /// has fallen below the conservation tolerance.
    fn rationalize(&mut self) {
        let eps = crate::config::epsilon_kg();
        let registry = self.registry.clone();
        self.atoms
            .retain(|&id, &mut n| atoms_to_mass_kg(n, registry.atomic_mass(id)).abs() >= eps);

        self.total_atoms = self.atoms.values().sum();
        self.total_mass_kg = self
            .atoms
            .iter()
            .map(|(&id, &n)| atoms_to_mass_kg(n, registry.atomic_mass(id)))
            .sum();
    }

    fn atom_tolerance(&self, id: NuclideId) -> f64 {
        mass_kg_to_atoms(crate::config::epsilon_kg(), self.registry.atomic_mass(id))
    }

    fn emit(&mut self, time: f64) {
        log::debug!(
            "composition {serial} mutated at t={time}: total_mass_kg={mass}, total_atoms={atoms}",
            serial = self.serial_id,
            mass = self.total_mass_kg,
            atoms = self.total_atoms,
        );
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(MutationEvent {
                serial_id: self.serial_id,
                time,
                total_mass_kg: self.total_mass_kg,
                total_atoms: self.total_atoms,
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn harness() -> (Arc<NuclideRegistry>, Arc<DecayDatabase>) {
        (Arc::new(NuclideRegistry::new()), Arc::new(DecayDatabase::new()))
    }

    #[test]
    fn empty_composition_has_zero_totals() {
        let (registry, db) = harness();
        let c = Composition::empty("c", "kg", registry, db);
        assert_eq!(c.total_mass_kg(), 0.0);
        assert_eq!(c.total_atoms(), 0.0);
        assert_eq!(c.state(), State::Empty);
    }

    #[test]
    fn natural_uranium_recipe() {
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
        let c = Composition::from_recipe(&recipe, registry, db).unwrap();

        assert!((c.total_mass_kg() - 1.0).abs() < 1e-9);
        let expected_atoms = 2.561e24;
        assert!((c.total_atoms() - expected_atoms).abs() / expected_atoms < 1e-3);
        assert_eq!(c.state(), State::Populated);
    }

    #[test]
    fn fractional_subcomposition_scales_totals_only() {
        let (registry, db) = harness();
        let recipe = Recipe {
            name: "u235 only".to_string(),
            basis: Basis::Mass,
            unit_label: Some("kg".to_string()),
            total: Some(2.0),
            nuclides: vec![("U-235".to_string(), 1.0)],
        };
        let c = Composition::from_recipe(&recipe, registry, db).unwrap();
        let half = c.fractional_subcomposition(0.5);

        assert!((half.total_mass_kg() - 1.0).abs() < 1e-9);
        let u235: NuclideId = "U-235".parse().unwrap();
        assert!((half.atoms_of(u235) - c.atoms_of(u235) * 0.5).abs() < 1.0);
    }
}
