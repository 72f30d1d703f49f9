// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Malformed input record. Fatal for that structure only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructureError {
    #[error("{id}: no lattice parameters")]
    MissingLattice { id: String },

    #[error("{id}: degenerate lattice ({reason})")]
    DegenerateLattice { id: String, reason: String },

    #[error("{id}: implausible cell ({reason})")]
    ImplausibleCell { id: String, reason: String },

    #[error("{id}: neighbor list too large ({reason})")]
    NeighborLimit { id: String, reason: String },

    #[error("{id}: structure has no sites")]
    NoSites { id: String },

    #[error("{id}: site {site} references unknown element '{element}'")]
    UnknownElement {
        id: String,
        site: usize,
        element: String,
    },

    #[error("{id}: site {site} has non-finite fractional coordinates")]
    InvalidCoordinates { id: String, site: usize },

    #[error("{id}: space group number {number} outside 1..=230")]
    InvalidSpaceGroup { id: String, number: u16 },
}

/// Internal invariant violation inside one validator.
/// Contained to the (structure, validator) pair by the runner.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidatorError {
    #[error("assignment covers {found} sites, structure has {expected}")]
    AssignmentLength { expected: usize, found: usize },

    #[error("site index {site} out of range")]
    SiteOutOfRange { site: usize },

    #[error("validator produced a non-finite score ({value})")]
    NonFiniteScore { value: f64 },

    #[error("validator panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Internal(String),
}

/// Checkpoint persistence failure. Fatal for the batch.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize report for {id}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt checkpoint {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoint store lock poisoned")]
    Poisoned,
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("could not build worker pool: {0}")]
    WorkerPool(String),
}

impl PipelineError {
    /// Only persistence failures escalate and stop a sweep
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::Structure(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("could not read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse corpus {path} (line {line}): {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
