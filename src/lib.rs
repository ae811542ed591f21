//! Isotopic material model and Bateman decay engine for a nuclear
//! fuel-cycle simulator.
//!
//! The crate is deliberately small in scope: it tracks how much of which
//! nuclide a composition holds, derives mass from atom counts through a
//! nuclide registry, and evolves those atom counts forward in time against
//! a loaded decay database. It does not schedule simulation ticks, persist
//! state, or decide what a fuel-cycle facility does with the material —
//! those are host concerns, reached through the [`recorder`] callback and
//! the dependency-injected [`decay::DecayDatabase`] /
//! [`nuclide::registry::NuclideRegistry`] handles.

pub mod composition;
pub mod config;
pub mod decay;
pub mod error;
pub mod nuclide;
pub mod recorder;

pub use composition::{Basis, Composition, Recipe};
pub use decay::{DecayDatabase, DecaySolver};
pub use error::Error;
pub use nuclide::registry::NuclideRegistry;
pub use nuclide::{Element, NuclideId};
pub use recorder::{MutationEvent, NullRecorder, Recorder};
