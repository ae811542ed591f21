//! Decay solver: `v' = exp(A*t) * v` for an elapsed time `t` in months.
//!
//! `A` is fixed after the owning [`super::DecayDatabase`] is built. Rather
//! than forming the full-length dense exponential the source keeps (wasteful
//! once a database carries thousands of nuclides), every call restricts `A`
//! to the *reachable support* of the input vector — the nuclides obtainable
//! from its non-zero entries by forward traversal of the daughters relation
//! — and only ever does dense linear algebra on that restriction.

use std::collections::{HashMap, HashSet};

use nalgebra::{DMatrix, DVector};

use crate::error::Error;
use crate::nuclide::registry::NuclideRegistry;
use crate::nuclide::NuclideId;

use super::DecayDatabase;

/// Avogadro's number, for converting the mass-denominated conservation
/// tolerance into a per-nuclide atom-count tolerance. Mirrors
/// `crate::composition::AVOGADRO`; duplicated here rather than imported so
/// this module does not take on a dependency on the composition layer built
/// on top of it.
const AVOGADRO: f64 = 6.022_140_76e23;

/// Order-(6,6) Padé coefficients for the scaling-and-squaring matrix
/// exponential (Moler & Van Loan). `c_k = c_{k-1} * (p-k+1) / (k*(2p-k+1))`
/// for `p = 6`.
const C0: f64 = 1.0;
const C1: f64 = 0.5;
const C2: f64 = 0.113_636_363_636_363_6;
const C3: f64 = 0.015_151_515_151_515_15;
const C4: f64 = 0.001_262_626_262_626_262_7;
const C5: f64 = 6.313_131_313_131_313e-5;
const C6: f64 = 1.501_501_501_501_501_6e-6;

/// Computes `exp(A*t) * v` for compositions expressed against a fixed
/// [`DecayDatabase`].
pub struct DecaySolver<'a> {
    database: &'a DecayDatabase,
    registry: &'a NuclideRegistry,
}

impl<'a> DecaySolver<'a> {
    pub fn new(database: &'a DecayDatabase, registry: &'a NuclideRegistry) -> Self {
        Self { database, registry }
    }

    /// Converts the mass-denominated conservation tolerance into an
    /// atom-count tolerance for `id`, the same conversion
    /// `Composition::atom_tolerance` applies before comparing against an
    /// atoms-basis map.
    fn atom_tolerance(&self, id: NuclideId) -> f64 {
        let atomic_mass = self.registry.atomic_mass(id);
        crate::config::epsilon_kg() * 1e3 / atomic_mass * AVOGADRO
    }

    /// Evolves `v` forward by `months` months. Nuclides in `v` that are
    /// absent from the decay database pass through unchanged (they are
    /// stable as far as this database knows).
    ///
    /// `evolve(v, 0.0)` returns a value-identical copy without touching the
    /// Padé machinery at all, so the zero-time identity property holds
    /// bitwise rather than merely within tolerance.
    pub fn evolve(
        &self,
        v: &HashMap<NuclideId, f64>,
        months: f64,
    ) -> Result<HashMap<NuclideId, f64>, Error> {
        if months == 0.0 {
            return Ok(v.clone());
        }

        let mut tracked_seed: Vec<(usize, f64)> = Vec::new();
        let mut result: HashMap<NuclideId, f64> = HashMap::new();
        for (&id, &amount) in v {
            match self.database.index_of(id) {
                Some(idx) => tracked_seed.push((idx, amount)),
                None => {
                    result.insert(id, amount);
                }
            }
        }

        if tracked_seed.is_empty() {
            return Ok(result);
        }

        let support = self.reachable_support(tracked_seed.iter().map(|&(i, _)| i));
        let local_index: HashMap<usize, usize> = support
            .iter()
            .enumerate()
            .map(|(local, &global)| (global, local))
            .collect();
        let m = support.len();

        let mut v_hat = DVector::<f64>::zeros(m);
        for &(global, amount) in &tracked_seed {
            v_hat[local_index[&global]] += amount;
        }

        let mut a_hat = DMatrix::<f64>::zeros(m, m);
        let matrix = self.database.matrix();
        for (local_col, &global_col) in support.iter().enumerate() {
            for &(row, value) in matrix.column(global_col) {
                if let Some(&local_row) = local_index.get(&row) {
                    a_hat[(local_row, local_col)] = value;
                }
            }
        }

        let e = expm(&a_hat, months)?;
        let v_evolved = &e * &v_hat;

        for (local, &global) in support.iter().enumerate() {
            let id = self.database.nuclide_at(global);
            let value = v_evolved[local];
            let tolerance = self.atom_tolerance(id);
            let clamped = if value < 0.0 {
                if -value > tolerance {
                    return Err(Error::SolverNonPhysical {
                        nuclide: id.to_string(),
                        value,
                    });
                }
                0.0
            } else {
                value
            };
            if clamped != 0.0 {
                result.insert(id, clamped);
            }
        }

        Ok(result)
    }

    /// The nuclides reachable from `seeds` by forward traversal of the
    /// daughters relation: a plain stack-and-visited-set walk, the same
    /// shape as the source's per-root decay-chain cache, generalized so it
    /// tolerates a multi-nuclide seed set and cyclic reentry.
    fn reachable_support(&self, seeds: impl Iterator<Item = usize>) -> Vec<usize> {
        let matrix = self.database.matrix();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut order: Vec<usize> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();

        for seed in seeds {
            if visited.insert(seed) {
                order.push(seed);
                stack.push(seed);
            }
        }

        while let Some(node) = stack.pop() {
            for daughter in matrix.daughters_of(node) {
                if visited.insert(daughter) {
                    order.push(daughter);
                    stack.push(daughter);
                }
            }
        }

        order
    }
}

/// Matrix infinity norm: the largest absolute row sum.
fn inf_norm(m: &DMatrix<f64>) -> f64 {
    (0..m.nrows())
        .map(|r| (0..m.ncols()).map(|c| m[(r, c)].abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// `exp(a * t)` via scaling-and-squaring with an order-(6,6) Padé rational.
fn expm(a: &DMatrix<f64>, t: f64) -> Result<DMatrix<f64>, Error> {
    let n = a.nrows();
    if n == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }

    let m0 = a * t;
    let norm = inf_norm(&m0);
    let s = if norm > 1.0 {
        norm.log2().ceil().max(0.0) as i32
    } else {
        0
    };
    log::debug!("decay solver: {n}x{n} reachable support, scaling exponent s={s}");
    let m = m0 / 2f64.powi(s);

    let m2 = &m * &m;
    let m4 = &m2 * &m2;
    let m6 = &m4 * &m2;

    let mut v = DMatrix::<f64>::identity(n, n) * C0;
    v.zip_apply(&m2, |acc, x| acc + C2 * x);
    v.zip_apply(&m4, |acc, x| acc + C4 * x);
    v.zip_apply(&m6, |acc, x| acc + C6 * x);

    let mut u_inner = DMatrix::<f64>::identity(n, n) * C1;
    u_inner.zip_apply(&m2, |acc, x| acc + C3 * x);
    u_inner.zip_apply(&m4, |acc, x| acc + C5 * x);
    let u = &m * &u_inner;

    let mut n_mat = v.clone();
    n_mat += &u;
    let mut d_mat = v;
    d_mat -= &u;

    let lu = d_mat.lu();
    let mut e = lu.solve(&n_mat).ok_or_else(|| {
        Error::Unexpected(anyhow::anyhow!(
            "singular Pade denominator while evolving a {n}x{n} decay submatrix"
        ))
    })?;

    for _ in 0..s {
        e = &e * &e;
    }

    Ok(e)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decay::DecayDatabase;

    fn isclose(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= 1e-12 + rel * b.abs()
    }

    fn cs137_database() -> DecayDatabase {
        let path = std::env::temp_dir().join(format!(
            "fuelcycle-core-solver-test-{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "Cs-137 9.4906e8 1\nBa-137 1.0\n").unwrap();
        let db = DecayDatabase::new();
        db.load_decay_info(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        db
    }

    #[test]
    fn zero_time_is_bitwise_identity() {
        let db = cs137_database();
        let registry = NuclideRegistry::new();
        let solver = DecaySolver::new(&db, &registry);
        let cs137: NuclideId = "Cs-137".parse().unwrap();
        let mut v = HashMap::new();
        v.insert(cs137, 1.234e24);

        let v2 = solver.evolve(&v, 0.0).unwrap();
        assert_eq!(v2.get(&cs137).copied(), v.get(&cs137).copied());
    }

    #[test]
    fn half_life_halves_the_parent() {
        let db = cs137_database();
        let registry = NuclideRegistry::new();
        let solver = DecaySolver::new(&db, &registry);
        let cs137: NuclideId = "Cs-137".parse().unwrap();
        let ba137: NuclideId = "Ba-137".parse().unwrap();
        let mut v = HashMap::new();
        v.insert(cs137, 1.0);

        // One half-life in months.
        let half_life_months = 9.4906e8 / crate::decay::SECONDS_PER_MONTH;
        let v2 = solver.evolve(&v, half_life_months).unwrap();

        assert!(isclose(v2[&cs137], 0.5, 1e-4));
        assert!(isclose(v2[&ba137], 0.5, 1e-4));
    }

    #[test]
    fn semigroup_property() {
        let db = cs137_database();
        let registry = NuclideRegistry::new();
        let solver = DecaySolver::new(&db, &registry);
        let cs137: NuclideId = "Cs-137".parse().unwrap();
        let mut v = HashMap::new();
        v.insert(cs137, 1.0);

        let t1 = 1.0e4;
        let t2 = 2.5e4;
        let step = solver.evolve(&solver.evolve(&v, t1).unwrap(), t2).unwrap();
        let direct = solver.evolve(&v, t1 + t2).unwrap();

        for (id, value) in &direct {
            assert!(isclose(step[id], *value, 1e-9));
        }
    }

    #[test]
    fn unknown_nuclide_passes_through() {
        let db = cs137_database();
        let registry = NuclideRegistry::new();
        let solver = DecaySolver::new(&db, &registry);
        let exotic: NuclideId = "Xe-133".parse().unwrap();
        let mut v = HashMap::new();
        v.insert(exotic, 42.0);

        let v2 = solver.evolve(&v, 10.0).unwrap();
        assert_eq!(v2[&exotic], 42.0);
    }
}
