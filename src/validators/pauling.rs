// src/validators/pauling.rs

use serde_json::{json, Value};

use super::{round, Applicability, ValidationContext, Validator, MAX_WORST};
use crate::error::ValidatorError;
use crate::model::result::{Independence, Tier, ValidationResult};

/// Pauling's second rule (electrostatic valence principle).
///
/// Around each anion the cation bond strengths z/CN should sum to the
/// anion's |valence|. Cation CN counts anion neighbors only.
pub struct PaulingRule2Validator;

impl Validator for PaulingRule2Validator {
    fn name(&self) -> &'static str {
        "pauling_rule2"
    }

    fn tier(&self) -> Tier {
        Tier::One
    }

    fn independence(&self) -> Independence {
        Independence::FullyIndependent
    }

    fn assumes_oxide_anion(&self) -> bool {
        true
    }

    fn applicability(&self, ctx: &ValidationContext) -> Applicability {
        if !ctx.structure.has_element("O") {
            return Applicability::NotApplicable("no oxygen sites in structure".into());
        }
        Applicability::requires_assignment(ctx)
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError> {
        let assignment = ctx.checked_assignment()?;
        let tolerance = ctx.config.pauling_tolerance;

        let mut n_checked = 0usize;
        let mut n_oxygen = 0usize;
        let mut n_violations = 0usize;
        let mut worst: Vec<(f64, Value)> = Vec::new();

        for i in 0..ctx.structure.sites.len() {
            let Some(valence) = assignment.state(i).filter(|&s| s < 0) else {
                continue;
            };
            let cations = ctx.bonded_cations(i);

            let mut strength_sum = 0.0;
            let mut contributions = Vec::with_capacity(cations.len());
            for n in &cations {
                let z = assignment
                    .state(n.site)
                    .ok_or(ValidatorError::SiteOutOfRange { site: n.site })?;
                let cn = ctx.anion_shell(n.site).len();
                if cn == 0 {
                    continue;
                }
                let strength = z as f64 / cn as f64;
                strength_sum += strength;
                contributions.push(json!({
                    "site": n.site,
                    "element": ctx.element(n.site)?,
                    "oxi_state": z,
                    "cn": cn,
                    "strength": round(strength, 3),
                }));
            }
            if contributions.is_empty() {
                continue;
            }

            let expected = valence.unsigned_abs() as f64;
            let deviation = (strength_sum - expected).abs() / expected;
            n_checked += 1;
            if ctx.element(i)? == "O" {
                n_oxygen += 1;
            }
            if deviation > tolerance {
                n_violations += 1;
                worst.push((
                    deviation,
                    json!({
                        "anion_site": i,
                        "element": ctx.element(i)?,
                        "bond_strength_sum": round(strength_sum, 3),
                        "expected": expected,
                        "deviation": round(deviation, 3),
                        "cation_contributions": contributions,
                    }),
                ));
            }
        }

        let mut evidence = ctx.base_evidence();
        if n_checked == 0 {
            return Ok(self.skip(ctx, "no anion site has assigned cation neighbors", evidence));
        }

        worst.sort_by(|a, b| b.0.total_cmp(&a.0));
        let worst: Vec<Value> = worst.into_iter().take(MAX_WORST).map(|(_, v)| v).collect();
        let fraction = n_violations as f64 / n_checked as f64;

        evidence.insert("n_anion_sites_checked".into(), Value::from(n_checked));
        evidence.insert("n_oxygen_sites_checked".into(), Value::from(n_oxygen));
        evidence.insert("n_violations".into(), Value::from(n_violations));
        evidence.insert("tolerance".into(), Value::from(tolerance));
        evidence.insert("worst_sites".into(), Value::from(worst));

        ValidationResult::computed(ctx.id(), self.name(), self.tier(), fraction, evidence)
    }
}
