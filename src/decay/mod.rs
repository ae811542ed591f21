//! Decay database: loads parent/daughter records from a tabular text file
//! and assembles the sparse decay-transition matrix the solver evolves.

pub mod chain;
pub mod matrix;
pub mod solver;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::nuclide::NuclideId;

pub use matrix::DecayMatrix;
pub use solver::DecaySolver;

/// Seconds in a simulated month: `86400 * 365.25 / 12`.
pub const SECONDS_PER_MONTH: f64 = 86_400.0 * 365.25 / 12.0;

/// One parent row: its column/row index in `A` and its decay constant, in
/// inverse months.
#[derive(Debug, Clone, Copy)]
pub struct ParentEntry {
    pub index: usize,
    pub lambda_per_month: f64,
}

struct Loaded {
    ids: Vec<NuclideId>,
    index: HashMap<NuclideId, usize>,
    parents: HashMap<NuclideId, ParentEntry>,
    matrix: DecayMatrix,
}

/// Parent-nuclide to (column index, decay constant) and column to
/// daughter-list relations, and the `A` matrix they determine. Built once
/// via [`DecayDatabase::load_decay_info`] and immutable afterwards; safe to
/// share (e.g. behind an `Arc`) across every [`crate::composition::Composition`]
/// in the process.
#[derive(Default)]
pub struct DecayDatabase {
    loaded: OnceCell<Loaded>,
}

impl DecayDatabase {
    pub fn new() -> Self {
        Self {
            loaded: OnceCell::new(),
        }
    }

    /// Loads the database from `path`. A second call on an already-loaded
    /// database is a no-op that logs a warning, matching the "build once,
    /// read-only thereafter" lifecycle.
    pub fn load_decay_info(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        if self.loaded.get().is_some() {
            log::warn!(
                "load_decay_info called again on an already-loaded decay database; ignoring \
                 {path}",
                path = path.as_ref().display()
            );
            return Ok(());
        }

        let loaded = parse_file(path.as_ref())?;
        // `OnceCell::set` can only fail if another thread won the race; the
        // concurrency model promises bootstrap-time, single-threaded loading,
        // so losing that race would itself indicate a caller bug. Treat it
        // the same as the already-loaded case above rather than panicking.
        if self.loaded.set(loaded).is_err() {
            log::warn!("decay database was loaded concurrently; discarding this load");
        }
        Ok(())
    }

    fn data(&self) -> &Loaded {
        self.loaded
            .get()
            .expect("decay database used before load_decay_info")
    }

    /// Whether `load_decay_info` has successfully built the matrix yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// The assembled sparse transition matrix `A`.
    pub fn matrix(&self) -> &DecayMatrix {
        &self.data().matrix
    }

    /// The row/column index of `id` in `A`, if it appears in the database
    /// (as either a parent or a daughter).
    pub fn index_of(&self, id: NuclideId) -> Option<usize> {
        self.data().index.get(&id).copied()
    }

    pub fn nuclide_at(&self, index: usize) -> NuclideId {
        self.data().ids[index]
    }

    /// Decay constant (inverse months) for `id`, if it is a parent in this
    /// database. Nuclides that only ever appear as daughters are stable
    /// within the database (`None`).
    pub fn lambda(&self, id: NuclideId) -> Option<f64> {
        self.data().parents.get(&id).map(|p| p.lambda_per_month)
    }

    pub fn parent_entry(&self, id: NuclideId) -> Option<ParentEntry> {
        self.data().parents.get(&id).copied()
    }
}

/// One line of lookahead over a decay data file: skips blank and
/// `#`-prefixed lines, and tracks 1-based line numbers for diagnostics.
struct RecordReader {
    path: PathBuf,
    lines: std::iter::Enumerate<std::io::Lines<BufReader<File>>>,
}

impl RecordReader {
    fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::IOError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines().enumerate(),
        })
    }

    fn next_record(&mut self) -> Result<Option<(usize, String)>, Error> {
        for (i, line) in &mut self.lines {
            let line = line.map_err(|e| Error::IOError {
                path: self.path.display().to_string(),
                source: e,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(Some((i + 1, trimmed.to_string())));
        }
        Ok(None)
    }

    fn malformed(&self, line: usize, message: impl Into<String>) -> Error {
        Error::MalformedRecord {
            path: self.path.display().to_string(),
            line,
            message: message.into(),
        }
    }
}

fn parse_file(path: &Path) -> Result<Loaded, Error> {
    let mut reader = RecordReader::open(path)?;

    let mut parent_order: Vec<NuclideId> = Vec::new();
    let mut seen_parents: HashSet<NuclideId> = HashSet::new();
    let mut parent_lambda: HashMap<NuclideId, f64> = HashMap::new();
    let mut daughters_of: HashMap<NuclideId, Vec<(NuclideId, f64)>> = HashMap::new();

    while let Some((line, text)) = reader.next_record()? {
        let mut fields = text.split_whitespace();
        let iso = fields
            .next()
            .ok_or_else(|| reader.malformed(line, "missing parent nuclide"))?;
        let half_life_s: f64 = fields
            .next()
            .ok_or_else(|| reader.malformed(line, "missing half-life"))?
            .parse()
            .map_err(|_| reader.malformed(line, "half-life is not a finite number"))?;
        let n_daughters: usize = fields
            .next()
            .ok_or_else(|| reader.malformed(line, "missing daughter count"))?
            .parse()
            .map_err(|_| reader.malformed(line, "daughter count is not an integer"))?;

        if !half_life_s.is_finite() || half_life_s <= 0.0 {
            return Err(reader.malformed(line, "half-life must be a finite positive number"));
        }

        let parent: NuclideId = iso
            .parse()
            .map_err(|_| Error::InvalidNuclide(iso.to_string()))?;

        if !seen_parents.insert(parent) {
            return Err(Error::DuplicateParent {
                line,
                parent: parent.to_string(),
            });
        }
        parent_order.push(parent);

        let lambda_per_second = std::f64::consts::LN_2 / half_life_s;
        let lambda_per_month = lambda_per_second * SECONDS_PER_MONTH;
        parent_lambda.insert(parent, lambda_per_month);

        let mut daughters = Vec::with_capacity(n_daughters);
        let mut branch_sum = 0.0;
        for _ in 0..n_daughters {
            let (dline, dtext) = reader
                .next_record()?
                .ok_or_else(|| reader.malformed(line, "unexpected end of file reading daughters"))?;
            let mut dfields = dtext.split_whitespace();
            let diso = dfields
                .next()
                .ok_or_else(|| reader.malformed(dline, "missing daughter nuclide"))?;
            let branch: f64 = dfields
                .next()
                .ok_or_else(|| reader.malformed(dline, "missing branch ratio"))?
                .parse()
                .map_err(|_| reader.malformed(dline, "branch ratio is not a finite number"))?;
            let daughter: NuclideId = diso
                .parse()
                .map_err(|_| Error::InvalidNuclide(diso.to_string()))?;
            branch_sum += branch;
            daughters.push((daughter, branch));
        }

        if n_daughters > 0 && (branch_sum - 1.0).abs() > 1e-3 {
            return Err(Error::BranchSumInvalid {
                line,
                parent: parent.to_string(),
                sum: branch_sum,
            });
        }

        daughters_of.insert(parent, daughters);
    }

    let mut ids: Vec<NuclideId> = Vec::new();
    let mut index: HashMap<NuclideId, usize> = HashMap::new();
    let mut intern = |id: NuclideId, ids: &mut Vec<NuclideId>, index: &mut HashMap<NuclideId, usize>| {
        *index.entry(id).or_insert_with(|| {
            ids.push(id);
            ids.len() - 1
        })
    };

    for &parent in &parent_order {
        intern(parent, &mut ids, &mut index);
    }
    for daughters in daughters_of.values() {
        for &(daughter, _) in daughters {
            intern(daughter, &mut ids, &mut index);
        }
    }

    let n = ids.len();
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for &parent in &parent_order {
        let j = index[&parent];
        let lambda = parent_lambda[&parent];
        let mut column = vec![(j, -lambda)];
        for &(daughter, branch) in &daughters_of[&parent] {
            let row = index[&daughter];
            column.push((row, branch * lambda));
        }
        columns[j] = column;
    }

    let parents = parent_order
        .iter()
        .map(|&p| {
            (
                p,
                ParentEntry {
                    index: index[&p],
                    lambda_per_month: parent_lambda[&p],
                },
            )
        })
        .collect();

    Ok(Loaded {
        ids,
        index,
        parents,
        matrix: DecayMatrix::new(n, columns),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn write_temp(contents: &str) -> tempfile_path::TempPath {
        tempfile_path::TempPath::with_contents(contents)
    }

    mod tempfile_path {
        use std::io::Write;
        use std::path::{Path, PathBuf};

        /// Minimal drop-cleanup temp file helper, avoiding a `tempfile` dev
        /// dependency for a handful of fixture files.
        pub struct TempPath(PathBuf);

        impl TempPath {
            pub fn with_contents(contents: &str) -> Self {
                let mut path = std::env::temp_dir();
                path.push(format!(
                    "fuelcycle-core-test-{}-{}.txt",
                    std::process::id(),
                    NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
                ));
                let mut f = std::fs::File::create(&path).unwrap();
                f.write_all(contents.as_bytes()).unwrap();
                Self(path)
            }
        }

        static NEXT: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

        impl AsRef<Path> for TempPath {
            fn as_ref(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
    }

    #[test]
    fn loads_simple_chain() {
        let path = write_temp(
            "# Cs-137 -> Ba-137 (stable)\n\
             Cs-137 9.4906e8 1\n\
             Ba-137 1.0\n",
        );
        let db = DecayDatabase::new();
        db.load_decay_info(&path).unwrap();

        let cs137: NuclideId = "Cs-137".parse().unwrap();
        let ba137: NuclideId = "Ba-137".parse().unwrap();
        assert!(db.lambda(cs137).is_some());
        assert!(db.lambda(ba137).is_none());
        assert_eq!(db.matrix().dim(), 2);
    }

    #[test]
    fn rejects_duplicate_parent() {
        let path = write_temp(
            "Cs-137 9.4906e8 0\n\
             Cs-137 9.4906e8 0\n",
        );
        let db = DecayDatabase::new();
        let err = db.load_decay_info(&path).unwrap_err();
        assert!(matches!(err, Error::DuplicateParent { .. }));
    }

    #[test]
    fn rejects_bad_branch_sum() {
        let path = write_temp(
            "Co-60 1.663e8 1\n\
             Ni-60 0.9\n",
        );
        let db = DecayDatabase::new();
        let err = db.load_decay_info(&path).unwrap_err();
        assert!(matches!(err, Error::BranchSumInvalid { .. }));
    }

    #[test]
    fn second_load_is_a_noop() {
        let path = write_temp("Cs-137 9.4906e8 0\n");
        let db = DecayDatabase::new();
        db.load_decay_info(&path).unwrap();
        db.load_decay_info(&path).unwrap();
        assert_eq!(db.matrix().dim(), 1);
    }
}
