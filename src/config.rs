//! Process-wide tolerances, set once before the first [`crate::Composition`]
//! is created and read by every public operation thereafter.
//!
//! This is the one piece of process-wide mutable state in the crate; the
//! registry and decay database are threaded through constructors instead of
//! living behind a global, per the dependency-injection preference in the
//! design notes. Tolerances are a host-level convention shared across the
//! wider simulation, so they follow the host's own "set once at bootstrap"
//! lifecycle rather than being tied to any one composition or database.

use once_cell::sync::OnceCell;

/// Default mass-conservation tolerance, in kilograms.
pub const DEFAULT_EPSILON_KG: f64 = 1e-6;

/// Simulation-wide tolerances consumed from the host.
#[derive(Debug, Clone, Copy)]
pub struct Tolerances {
    /// Mass-conservation tolerance (kg). Quantities below this are zero.
    pub epsilon_kg: f64,
    /// Resource-matching tolerance used by callers outside this crate; the
    /// decay engine only reads it back out for those callers' convenience.
    pub epsilon_resource: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            epsilon_kg: DEFAULT_EPSILON_KG,
            epsilon_resource: DEFAULT_EPSILON_KG,
        }
    }
}

static TOLERANCES: OnceCell<Tolerances> = OnceCell::new();

/// Sets the process-wide tolerances. Must be called before the first
/// [`crate::Composition`] is created; later calls are ignored (a `log::warn!`
/// is emitted the first time this happens, the same no-op-and-warn policy
/// [`crate::decay::DecayDatabase::load_decay_info`] uses for its own
/// one-time initialization).
pub fn set_tolerances(tolerances: Tolerances) {
    if TOLERANCES.set(tolerances).is_err() {
        log::warn!("set_tolerances called after tolerances were already established; ignoring");
    }
}

/// Returns the active tolerances, falling back to [`Tolerances::default`]
/// if the host never called [`set_tolerances`].
pub fn tolerances() -> Tolerances {
    *TOLERANCES.get_or_init(Tolerances::default)
}

/// Convenience accessor for the mass-conservation tolerance.
pub fn epsilon_kg() -> f64 {
    tolerances().epsilon_kg
}
