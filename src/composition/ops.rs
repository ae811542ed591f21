//! Mutating operations on [`Composition`]: the ones that change atom
//! counts in place and emit a recorder event, plus the two decay
//! overloads.

use std::collections::HashMap;

use crate::decay::DecaySolver;
use crate::error::Error;
use crate::nuclide::NuclideId;

use super::Composition;

impl Composition {
    /// Adjusts nuclide `id` by `delta_atoms` (positive or negative) at
    /// simulation time `time`. Rejects a change that would drive the
    /// nuclide's mass more than `epsilon_kg` below zero rather than
    /// silently clamping it, since a negative inventory usually signals a
    /// bug upstream rather than a rounding artifact.
    pub fn change(&mut self, id: NuclideId, delta_atoms: f64, time: f64) -> Result<(), Error> {
        let current = self.atoms.get(&id).copied().unwrap_or(0.0);
        let updated = current + delta_atoms;
        let atomic_mass = self.registry.atomic_mass(id);
        let updated_mass = super::atoms_to_mass_kg(updated, atomic_mass);

        if updated_mass < -crate::config::epsilon_kg() {
            return Err(Error::ConservationViolated {
                nuclide: id.to_string(),
                value: updated_mass,
            });
        }

        self.atoms.insert(id, updated.max(0.0));
        self.rationalize();
        self.emit(time);
        Ok(())
    }

    /// Moves every nuclide out of `other` and into `self`, leaving `other`
    /// empty. Both compositions must share a unit label.
    pub fn absorb(&mut self, other: &mut Composition, time: f64) -> Result<(), Error> {
        if self.unit_label != other.unit_label {
            return Err(Error::UnitMismatch {
                lhs: self.unit_label.clone(),
                rhs: other.unit_label.clone(),
            });
        }

        for (&id, &amount) in &other.atoms {
            *self.atoms.entry(id).or_insert(0.0) += amount;
        }
        other.atoms.clear();

        self.rationalize();
        other.rationalize();
        self.emit(time);
        other.emit(time);
        Ok(())
    }

    /// Subtracts the quantities held by `other` from `self`, nuclide by
    /// nuclide. `other` is not mutated — it describes an amount, not a
    /// composition to be emptied. Fails if `self` cannot cover any
    /// requested nuclide within the conservation tolerance.
    pub fn extract(&mut self, other: &Composition, time: f64) -> Result<(), Error> {
        if self.unit_label != other.unit_label {
            return Err(Error::UnitMismatch {
                lhs: self.unit_label.clone(),
                rhs: other.unit_label.clone(),
            });
        }

        for (&id, &requested) in &other.atoms {
            let available = self.atoms.get(&id).copied().unwrap_or(0.0);
            let tolerance = self.atom_tolerance(id);
            if requested > available + tolerance {
                return Err(Error::InsufficientInventory {
                    nuclide: id.to_string(),
                    requested,
                    available,
                });
            }
        }

        for (&id, &requested) in &other.atoms {
            *self.atoms.entry(id).or_insert(0.0) -= requested;
        }

        self.rationalize();
        self.emit(time);
        Ok(())
    }

    /// Splits off `mass_kg` of material, preserving `self`'s isotopic
    /// proportions, and returns it as a new owned composition — a fresh
    /// value, never an alias into `self`. Fails if `self` does not hold at
    /// least `mass_kg` within the conservation tolerance.
    pub fn extract_mass(&mut self, mass_kg: f64, time: f64) -> Result<Composition, Error> {
        let eps = crate::config::epsilon_kg();
        if mass_kg > self.total_mass_kg + eps {
            return Err(Error::InsufficientInventory {
                nuclide: "<whole composition>".to_string(),
                requested: mass_kg,
                available: self.total_mass_kg,
            });
        }

        let fraction = if self.total_mass_kg > eps {
            (mass_kg / self.total_mass_kg).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let extracted_atoms: HashMap<NuclideId, f64> = self
            .atoms
            .iter()
            .map(|(&id, &n)| (id, n * fraction))
            .collect();
        for (&id, &n) in &extracted_atoms {
            if let Some(remaining) = self.atoms.get_mut(&id) {
                *remaining -= n;
            }
        }
        self.rationalize();
        self.emit(time);

        let mut extracted = Composition {
            serial_id: super::next_serial(),
            name: format!("{}-extract", self.name),
            unit_label: self.unit_label.clone(),
            basis: super::Basis::Mass,
            atoms: extracted_atoms,
            total_atoms: 0.0,
            total_mass_kg: 0.0,
            last_decay_time: self.last_decay_time,
            registry: self.registry.clone(),
            decay_database: self.decay_database.clone(),
            recorder: None,
        };
        extracted.rationalize();
        extracted.emit(time);
        Ok(extracted)
    }

    /// Evolves this composition's atom counts forward by `months` months
    /// via the Bateman decay solver, against the decay database this
    /// composition was built with. Advances the internal decay clock by
    /// the same amount, so a later no-argument-style call via
    /// [`Composition::decay_to`] picks up from here.
    pub fn decay(&mut self, months: f64) -> Result<(), Error> {
        let solver = DecaySolver::new(&self.decay_database, &self.registry);
        self.atoms = solver.evolve(&self.atoms, months)?;
        let new_clock = self.last_decay_time.unwrap_or(0.0) + months;
        self.last_decay_time = Some(new_clock);
        self.rationalize();
        self.emit(new_clock);
        Ok(())
    }

    /// Decays this composition up to absolute simulation time `now`,
    /// computing the elapsed months from the last time it was decayed (or
    /// since construction, if it never has been). This is the argless
    /// `decay()` call from the original design, translated into an
    /// explicit `now` parameter: the core has no ambient clock of its own,
    /// so the host must supply the current time rather than this crate
    /// inventing one.
    pub fn decay_to(&mut self, now: f64) -> Result<(), Error> {
        let elapsed = now - self.last_decay_time.unwrap_or(0.0);
        self.decay(elapsed)
    }
}
