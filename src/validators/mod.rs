// src/validators/mod.rs

pub mod bond_valence_sum;
pub mod charge_neutrality;
pub mod goldschmidt;
pub mod pauling;
pub mod shannon_radii;
pub mod space_group;

use serde_json::{json, Value};
use std::panic::{self, AssertUnwindSafe};

use crate::config::ValidatorConfig;
use crate::error::ValidatorError;
use crate::model::oxidation::OxidationAssignment;
use crate::model::result::{Evidence, Independence, Tier, ValidationResult};
use crate::model::structure::{CompoundClass, StructureRecord};
use crate::physics::neighbors::{Geometry, Neighbor};
use crate::reference::ReferenceTables;

pub use bond_valence_sum::BondValenceSumValidator;
pub use charge_neutrality::ChargeNeutralityValidator;
pub use goldschmidt::GoldschmidtValidator;
pub use pauling::PaulingRule2Validator;
pub use shannon_radii::ShannonRadiiValidator;
pub use space_group::SpaceGroupValidator;

/// Cap on per-site or per-bond detail lists kept as evidence
pub const MAX_WORST: usize = 10;

/// Everything a validator may look at for one structure
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub structure: &'a StructureRecord,
    pub assignment: &'a OxidationAssignment,
    pub geometry: &'a Geometry,
    pub tables: &'a ReferenceTables,
    pub config: &'a ValidatorConfig,
    pub shell_tolerance: f64,
}

impl ValidationContext<'_> {
    pub fn id(&self) -> &str {
        &self.structure.id
    }

    /// Assignment must describe exactly this structure's sites
    pub fn checked_assignment(&self) -> Result<&OxidationAssignment, ValidatorError> {
        if self.assignment.len() != self.structure.sites.len() {
            return Err(ValidatorError::AssignmentLength {
                expected: self.structure.sites.len(),
                found: self.assignment.len(),
            });
        }
        Ok(self.assignment)
    }

    pub fn element(&self, site: usize) -> Result<&str, ValidatorError> {
        self.structure
            .sites
            .get(site)
            .map(|s| s.element.as_str())
            .ok_or(ValidatorError::SiteOutOfRange { site })
    }

    /// First shell of assigned anions around `site`
    pub fn anion_shell(&self, site: usize) -> Vec<&Neighbor> {
        self.geometry
            .first_shell(site, |j| self.assignment.is_anion(j), self.shell_tolerance)
    }

    /// Cations whose own first anion shell contains `anion`.
    ///
    /// Bonds are defined from the cation polyhedra, so a large A-site
    /// cation still counts even when a small B cation sits much closer.
    pub fn bonded_cations(&self, anion: usize) -> Vec<&Neighbor> {
        self.geometry
            .filtered(anion, |j| self.assignment.is_cation(j))
            .filter(|n| {
                self.anion_shell(n.site)
                    .last()
                    .is_some_and(|far| n.distance <= far.distance + 1e-9)
            })
            .collect()
    }

    /// Oxidation context recorded on every result
    pub fn base_evidence(&self) -> Evidence {
        let mut ev = Evidence::new();
        ev.insert(
            "oxi_state_confidence".into(),
            Value::from(self.assignment.confidence().as_str()),
        );
        ev.insert("oxi_state_methods".into(), json!(self.assignment.method_tag_counts()));
        ev
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applicability {
    Applicable,
    NotApplicable(String),
}

impl Applicability {
    pub fn is_applicable(&self) -> bool {
        matches!(self, Applicability::Applicable)
    }

    /// Shared gate: some site must carry an oxidation state
    pub fn requires_assignment(ctx: &ValidationContext) -> Self {
        if ctx.assignment.exists() {
            Applicability::Applicable
        } else {
            Applicability::NotApplicable("no oxidation state assignment available".into())
        }
    }
}

/// One independent plausibility check.
///
/// Implementations are stateless: the result depends only on the context.
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;

    fn tier(&self) -> Tier;

    /// Stamped on every result this validator produces
    fn independence(&self) -> Independence;

    /// Reference values assume O²⁻ as the only anion
    fn assumes_oxide_anion(&self) -> bool {
        false
    }

    fn applicability(&self, ctx: &ValidationContext) -> Applicability;

    fn is_applicable(&self, ctx: &ValidationContext) -> bool {
        self.applicability(ctx).is_applicable()
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError>;

    fn skip(&self, ctx: &ValidationContext, reason: &str, evidence: Evidence) -> ValidationResult {
        ValidationResult::not_applicable(ctx.id(), self.name(), self.tier(), reason, evidence)
    }
}

/// All six checks in their canonical order
pub fn default_validators() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(ChargeNeutralityValidator),
        Box::new(ShannonRadiiValidator),
        Box::new(PaulingRule2Validator),
        Box::new(BondValenceSumValidator),
        Box::new(SpaceGroupValidator),
        Box::new(GoldschmidtValidator),
    ]
}

/// Run one validator on one structure.
///
/// Never fails: errors and panics inside the validator become
/// `applicable = false` with an `error` note.
pub fn run(validator: &dyn Validator, ctx: &ValidationContext) -> ValidationResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match validator.applicability(ctx) {
        Applicability::Applicable => validator.evaluate(ctx),
        Applicability::NotApplicable(reason) => {
            Ok(validator.skip(ctx, &reason, ctx.base_evidence()))
        }
    }))
    .unwrap_or_else(|payload| Err(ValidatorError::Panicked(panic_message(payload.as_ref()))));

    let result = match outcome {
        Ok(result) => match result.score() {
            Some(value) if !value.is_finite() => {
                contained_failure(validator, ctx, ValidatorError::NonFiniteScore { value })
            }
            _ => result,
        },
        Err(e) => contained_failure(validator, ctx, e),
    }
    .with_independence(validator.independence());

    if validator.assumes_oxide_anion() && ctx.structure.compound_class != CompoundClass::PureOxide {
        result.with_evidence(
            "compound_class_warning",
            Value::from(compound_class_warning(validator.name(), ctx.structure.compound_class)),
        )
    } else {
        result
    }
}

fn contained_failure(
    validator: &dyn Validator,
    ctx: &ValidationContext,
    error: ValidatorError,
) -> ValidationResult {
    log::warn!("{}: validator {} failed: {}", ctx.id(), validator.name(), error);
    let mut evidence = ctx.base_evidence();
    evidence.insert("error".into(), Value::from(error.to_string()));
    validator.skip(ctx, "validator error", evidence)
}

fn compound_class_warning(validator: &str, class: CompoundClass) -> String {
    format!(
        "This {} contains non-oxide anions; {} reference values assume O2- and may not apply",
        class, validator
    )
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Round for readable evidence; scores themselves are never rounded
pub(crate) fn round(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::GeometryConfig;
    use crate::oxidation::OxidationStateResolver;
    use std::sync::Arc;

    /// Owned inputs for building a `ValidationContext` in tests
    pub struct Fixture {
        pub structure: StructureRecord,
        pub assignment: OxidationAssignment,
        pub geometry: Geometry,
        pub tables: ReferenceTables,
        pub config: ValidatorConfig,
    }

    impl Fixture {
        pub fn new(structure: StructureRecord) -> Self {
            let tables = ReferenceTables::embedded();
            let geometry = Geometry::compute(&structure, GeometryConfig::default().cutoff).unwrap();
            let assignment = OxidationStateResolver::new(Arc::new(tables.clone()), Default::default())
                .resolve_with_geometry(&structure, &geometry)
                .unwrap();
            Self {
                structure,
                assignment,
                geometry,
                tables,
                config: ValidatorConfig::default(),
            }
        }

        pub fn with_assignment(mut self, assignment: OxidationAssignment) -> Self {
            self.assignment = assignment;
            self
        }

        pub fn ctx(&self) -> ValidationContext<'_> {
            ValidationContext {
                structure: &self.structure,
                assignment: &self.assignment,
                geometry: &self.geometry,
                tables: &self.tables,
                config: &self.config,
                shell_tolerance: GeometryConfig::default().shell_tolerance,
            }
        }
    }
}
