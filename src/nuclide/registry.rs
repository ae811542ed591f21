//! Read-only nuclide registry: `Z`, `A`, atomic mass, and validity.
//!
//! Process-wide, built once and never mutated. A caller-held reference
//! (rather than an ambient global) is the injected handle threaded through
//! [`crate::decay::DecayDatabase`] and [`crate::composition::Composition`]
//! constructors.

use once_cell::sync::Lazy;

use super::NuclideId;

/// A small table of isotope-specific atomic masses (g/mol) for the
/// nuclides a fuel-cycle simulation encounters most often. Anything not
/// listed here falls back to its mass number as an integer approximation
/// (accurate to within a few hundredths of a percent for any nuclide,
/// since atomic mass in g/mol tracks mass number closely) rather than
/// failing outright, so nuclides that only appear as transient decay-chain
/// members still participate numerically.
#[rustfmt::skip]
const KNOWN_ATOMIC_MASSES: &[(u32, f64)] = &[
    (NuclideId::from_parts(92, 233, 0).raw(), 233.039_635),
    (NuclideId::from_parts(92, 234, 0).raw(), 234.040_952),
    (NuclideId::from_parts(92, 235, 0).raw(), 235.043_930),
    (NuclideId::from_parts(92, 236, 0).raw(), 236.045_568),
    (NuclideId::from_parts(92, 238, 0).raw(), 238.050_788),
    (NuclideId::from_parts(94, 238, 0).raw(), 238.049_560),
    (NuclideId::from_parts(94, 239, 0).raw(), 239.052_163),
    (NuclideId::from_parts(94, 240, 0).raw(), 240.053_813),
    (NuclideId::from_parts(94, 241, 0).raw(), 241.056_851),
    (NuclideId::from_parts(94, 242, 0).raw(), 242.058_743),
    (NuclideId::from_parts(95, 241, 0).raw(), 241.056_829),
    (NuclideId::from_parts(93, 237, 0).raw(), 237.048_173),
    (NuclideId::from_parts(90, 232, 0).raw(), 232.038_054),
    (NuclideId::from_parts(38, 90, 0).raw(), 89.907_730),
    (NuclideId::from_parts(39, 90, 0).raw(), 89.907_138),
    (NuclideId::from_parts(55, 137, 0).raw(), 136.907_090),
    (NuclideId::from_parts(56, 137, 0).raw(), 136.905_827),
    (NuclideId::from_parts(53, 131, 0).raw(), 130.906_125),
    (NuclideId::from_parts(54, 131, 0).raw(), 130.905_082),
    (NuclideId::from_parts(36, 85, 0).raw(), 84.912_527),
    (NuclideId::from_parts(60, 144, 0).raw(), 143.910_093),
    (NuclideId::from_parts(58, 144, 0).raw(), 143.913_647),
    (NuclideId::from_parts(1, 1, 0).raw(), 1.007_825),
    (NuclideId::from_parts(1, 2, 0).raw(), 2.014_102),
    (NuclideId::from_parts(1, 3, 0).raw(), 3.016_049),
    (NuclideId::from_parts(2, 4, 0).raw(), 4.002_602),
    (NuclideId::from_parts(8, 16, 0).raw(), 15.994_915),
];

static ATOMIC_MASS_TABLE: Lazy<std::collections::HashMap<u32, f64>> =
    Lazy::new(|| KNOWN_ATOMIC_MASSES.iter().copied().collect());

/// Read-only table of per-nuclide physical constants, plus identifier
/// validation. Cheap to construct; safe to share across threads once built
/// (it never changes after `new`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NuclideRegistry;

impl NuclideRegistry {
    pub fn new() -> Self {
        Self
    }

    /// `1 <= Z <= 118` and `A >= Z`.
    pub fn is_valid(&self, id: NuclideId) -> bool {
        id.is_valid()
    }

    pub fn z(&self, id: NuclideId) -> u32 {
        id.z()
    }

    pub fn a(&self, id: NuclideId) -> u32 {
        id.a()
    }

    /// Atomic mass in g/mol. Falls back to the nuclide's mass number for
    /// anything not in the builtin table, logging the fallback.
    pub fn atomic_mass(&self, id: NuclideId) -> f64 {
        match ATOMIC_MASS_TABLE.get(&id.ground_state().raw()) {
            Some(&mass) => mass,
            None => {
                log::warn!(
                    "nuclide {id} not in the builtin atomic mass table; \
                     falling back to mass number {a} as an approximation",
                    a = id.a()
                );
                id.a() as f64
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validity_predicate() {
        let registry = NuclideRegistry::new();
        assert!(registry.is_valid(NuclideId::from_parts(92, 235, 0)));
        assert!(!registry.is_valid(NuclideId::from_parts(0, 1, 0)));
        assert!(!registry.is_valid(NuclideId::from_parts(92, 10, 0)));
        assert!(!registry.is_valid(NuclideId::from_parts(119, 300, 0)));
    }

    #[test]
    fn known_atomic_mass() {
        let registry = NuclideRegistry::new();
        let u235 = NuclideId::from_parts(92, 235, 0);
        assert!((registry.atomic_mass(u235) - 235.043_930).abs() < 1e-3);
    }

    #[test]
    fn unknown_nuclide_falls_back_to_mass_number() {
        let registry = NuclideRegistry::new();
        let exotic = NuclideId::from_parts(50, 140, 0);
        assert_eq!(registry.atomic_mass(exotic), 140.0);
    }
}
