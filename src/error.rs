//! Crate-wide error taxonomy.
//!
//! One variant per failure kind in the error-handling design: nothing is
//! swallowed, every failure propagates synchronously to the caller that
//! triggered it.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid nuclide identifier: {0}")]
    InvalidNuclide(String),

    #[error("decay file line {line}: parent {parent} declared twice")]
    DuplicateParent { line: usize, parent: String },

    #[error("decay file line {line}: branch ratios for parent {parent} sum to {sum}, expected 1.0 +/- 1e-3")]
    BranchSumInvalid {
        line: usize,
        parent: String,
        sum: f64,
    },

    #[error("unit mismatch: {lhs} vs {rhs}")]
    UnitMismatch { lhs: String, rhs: String },

    #[error("insufficient inventory of {nuclide}: requested {requested}, have {available}")]
    InsufficientInventory {
        nuclide: String,
        requested: f64,
        available: f64,
    },

    #[error("conservation violated for {nuclide}: would drive quantity to {value}")]
    ConservationViolated { nuclide: String, value: f64 },

    #[error("decay solver produced a non-physical entry for {nuclide}: {value}")]
    SolverNonPhysical { nuclide: String, value: f64 },

    #[error("decay file {path}: {source}")]
    IOError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decay file {path} line {line}: {message}")]
    MalformedRecord {
        path: String,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
