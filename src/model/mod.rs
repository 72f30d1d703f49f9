//src/model/mod.rs
pub mod elements;
pub mod oxidation;
pub mod result;
pub mod structure;
pub mod symmetry;

// Re-exports for cleaner imports
pub use oxidation::{Confidence, MethodTag, OxidationAssignment};
pub use result::{Evidence, Independence, Tier, ValidationResult};
pub use structure::{CompoundClass, StructureRecord};
