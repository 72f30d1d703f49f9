// src/lib.rs
pub mod aggregate;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod oxidation;
pub mod physics;
pub mod pipeline;
pub mod present;
pub mod reference;
pub mod utils;
pub mod validators;

pub use aggregate::{Annotation, ConfidenceReport, ScoreAggregator};
pub use config::AuditConfig;
pub use error::{PipelineError, StructureError};
pub use model::{OxidationAssignment, StructureRecord, ValidationResult};
pub use oxidation::OxidationStateResolver;
pub use pipeline::{CheckpointStore, DirectoryStore, MemoryStore, Orchestrator};
pub use reference::ReferenceTables;
