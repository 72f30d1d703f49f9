// src/validators/charge_neutrality.rs

use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{Applicability, ValidationContext, Validator};
use crate::error::ValidatorError;
use crate::model::result::{Independence, Tier, ValidationResult};

/// Net formal charge of the cell; 0 means neutral
pub struct ChargeNeutralityValidator;

impl Validator for ChargeNeutralityValidator {
    fn name(&self) -> &'static str {
        "charge_neutrality"
    }

    fn tier(&self) -> Tier {
        Tier::One
    }

    fn independence(&self) -> Independence {
        Independence::FullyIndependent
    }

    fn applicability(&self, ctx: &ValidationContext) -> Applicability {
        if ctx.assignment.is_fully_assigned() {
            return Applicability::Applicable;
        }
        let missing = ctx.assignment.unassigned_sites();
        if missing.len() == ctx.structure.sites.len() {
            Applicability::NotApplicable("no oxidation state assignment available".into())
        } else {
            Applicability::NotApplicable(format!("{} sites without an oxidation state", missing.len()))
        }
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError> {
        let assignment = ctx.checked_assignment()?;

        let mut net: i64 = 0;
        let mut per_element: BTreeMap<&str, (Vec<i32>, u64, i64)> = BTreeMap::new();
        for (i, site) in assignment.sites().iter().enumerate() {
            let Some(state) = site.state else {
                return Ok(self.skip(ctx, "site without an oxidation state", ctx.base_evidence()));
            };
            net += state as i64;

            let entry = per_element.entry(ctx.element(i)?).or_default();
            if !entry.0.contains(&state) {
                entry.0.push(state);
            }
            entry.1 += 1;
            entry.2 += state as i64;
        }

        let element_charges: BTreeMap<&str, Value> = per_element
            .into_iter()
            .map(|(el, (states, count, charge))| {
                (el, json!({ "oxi_states": states, "count": count, "charge": charge }))
            })
            .collect();

        let mut evidence = ctx.base_evidence();
        evidence.insert("total_charge".into(), Value::from(net));
        evidence.insert("element_charges".into(), json!(element_charges));

        ValidationResult::computed(ctx.id(), self.name(), self.tier(), net as f64, evidence)
    }
}
