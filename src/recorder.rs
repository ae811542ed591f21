//! Outbound interface to recorders (see spec §6): every composition
//! mutation emits one event through an injected callback. Replaces the
//! unbounded in-memory history map a naive port of the source would keep.

/// One mutation event: `(composition_serial, time, total_mass, total_atoms)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationEvent {
    pub serial_id: u64,
    pub time: f64,
    pub total_mass_kg: f64,
    pub total_atoms: f64,
}

/// Receives [`MutationEvent`]s as they happen. Optional: a composition with
/// no recorder attached mutates silently.
pub trait Recorder {
    fn record(&mut self, event: MutationEvent);
}

/// A recorder that discards everything; the default when none is injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record(&mut self, _event: MutationEvent) {}
}

impl<F> Recorder for F
where
    F: FnMut(MutationEvent),
{
    fn record(&mut self, event: MutationEvent) {
        self(event)
    }
}
