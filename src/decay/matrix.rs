//! The sparse decay-transition matrix `A`.
//!
//! Column `j` represents parent nuclide `p_j`: a diagonal entry
//! `A[j,j] = -lambda_{p_j}` plus one off-diagonal entry per daughter,
//! `A[row(d), j] = +b * lambda_{p_j}`. Nuclides that only ever appear as a
//! daughter (never a parent) get an all-zero column — they are stable
//! inside this database. Stored column-major as one `Vec<(row, value)>`
//! per column rather than as a dense array, per the redesign in the design
//! notes: a simulation's decay database can carry thousands of nuclides,
//! and most of them decay into only a handful of daughters.
#[derive(Debug, Clone)]
pub struct DecayMatrix {
    n: usize,
    columns: Vec<Vec<(usize, f64)>>,
}

impl DecayMatrix {
    pub(crate) fn new(n: usize, columns: Vec<Vec<(usize, f64)>>) -> Self {
        debug_assert_eq!(columns.len(), n);
        Self { n, columns }
    }

    /// The matrix is `n x n`.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// The sparse entries of column `j`: `(row, value)` pairs, diagonal
    /// included when nonzero.
    pub fn column(&self, j: usize) -> &[(usize, f64)] {
        &self.columns[j]
    }

    /// Daughter row indices reachable in one step from column `j`, i.e.
    /// every off-diagonal entry (the diagonal is decay-in-place, not a
    /// transition to a different nuclide).
    pub fn daughters_of(&self, j: usize) -> impl Iterator<Item = usize> + '_ {
        self.columns[j]
            .iter()
            .filter(move |&&(row, _)| row != j)
            .map(|&(row, _)| row)
    }
}
