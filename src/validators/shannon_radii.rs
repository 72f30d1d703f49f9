// src/validators/shannon_radii.rs

use serde_json::{json, Value};
use std::collections::BTreeSet;

use super::{round, Applicability, ValidationContext, Validator, MAX_WORST};
use crate::error::ValidatorError;
use crate::model::result::{Independence, Tier, ValidationResult};
use crate::physics::radii::RadiusSource;

/// Cation-anion distances against summed Shannon radii.
///
/// Score is the fraction of first-shell bonds deviating by more than the
/// tolerance from r_cation + r_anion.
pub struct ShannonRadiiValidator;

impl Validator for ShannonRadiiValidator {
    fn name(&self) -> &'static str {
        "shannon_radii"
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
        let gate = Applicability::requires_assignment(ctx);
        if !gate.is_applicable() {
            return gate;
        }

        // Every assigned ion needs some radius, whatever its coordination
        let mut missing = BTreeSet::new();
        for (site, a) in ctx.structure.sites.iter().zip(ctx.assignment.sites()) {
            if let Some(state) = a.state {
                if ctx.tables.radii.lookup(&site.element, state, 6).is_none() {
                    missing.insert(format!("{}({:+})", site.element, state));
                }
            }
        }
        if missing.is_empty() {
            Applicability::Applicable
        } else {
            Applicability::NotApplicable(format!(
                "no Shannon radius for {}",
                missing.into_iter().collect::<Vec<_>>().join(", ")
            ))
        }
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError> {
        let assignment = ctx.checked_assignment()?;
        let radii = &ctx.tables.radii;
        let tolerance = ctx.config.shannon_tolerance;

        let mut n_checked = 0usize;
        let mut n_violations = 0usize;
        let mut n_nearest_cn = 0usize;
        let mut n_fallback = 0usize;
        let mut missing: BTreeSet<String> = BTreeSet::new();
        let mut violations: Vec<(f64, Value)> = Vec::new();

        let mut tally = |source: RadiusSource| match source {
            RadiusSource::Exact => {}
            RadiusSource::NearestCn => n_nearest_cn += 1,
            RadiusSource::Fallback => n_fallback += 1,
        };

        for i in 0..ctx.structure.sites.len() {
            let Some(state_i) = assignment.state(i).filter(|&s| s > 0) else {
                continue;
            };
            let el_i = ctx.element(i)?;
            let shell = ctx.anion_shell(i);
            if shell.is_empty() {
                continue;
            }

            let Some(r_i) = radii.lookup(el_i, state_i, shell.len()) else {
                missing.insert(format!("{}({:+},CN={})", el_i, state_i, shell.len()));
                continue;
            };
            tally(r_i.source);

            for n in shell {
                let el_j = ctx.element(n.site)?;
                let state_j = assignment
                    .state(n.site)
                    .ok_or(ValidatorError::SiteOutOfRange { site: n.site })?;
                let cn_j = ctx.bonded_cations(n.site).len();
                let Some(r_j) = radii.lookup(el_j, state_j, cn_j) else {
                    missing.insert(format!("{}({:+},CN={})", el_j, state_j, cn_j));
                    continue;
                };
                tally(r_j.source);

                let expected = r_i.radius + r_j.radius;
                let deviation = (n.distance - expected).abs() / expected;
                n_checked += 1;
                if deviation > tolerance {
                    n_violations += 1;
                    violations.push((
                        deviation,
                        json!({
                            "site_i": i, "el_i": el_i, "oxi_i": state_i,
                            "site_j": n.site, "el_j": el_j, "oxi_j": state_j,
                            "expected": round(expected, 3),
                            "actual": round(n.distance, 3),
                            "deviation": round(deviation, 3),
                        }),
                    ));
                }
            }
        }

        let mut evidence = ctx.base_evidence();
        if n_checked == 0 {
            evidence.insert(
                "missing_params".into(),
                json!(missing.into_iter().take(MAX_WORST).collect::<Vec<_>>()),
            );
            return Ok(self.skip(ctx, "no cation-anion bonds could be checked", evidence));
        }

        violations.sort_by(|a, b| b.0.total_cmp(&a.0));
        let worst: Vec<Value> = violations.into_iter().take(MAX_WORST).map(|(_, v)| v).collect();
        let fraction = n_violations as f64 / n_checked as f64;

        evidence.insert("n_bonds_checked".into(), Value::from(n_checked));
        evidence.insert("n_violations".into(), Value::from(n_violations));
        evidence.insert("tolerance".into(), Value::from(tolerance));
        evidence.insert("n_nearest_cn_radii".into(), Value::from(n_nearest_cn));
        evidence.insert("n_fallback_radii".into(), Value::from(n_fallback));
        evidence.insert("worst_violations".into(), Value::from(worst));
        if !missing.is_empty() {
            evidence.insert(
                "missing_params".into(),
                json!(missing.into_iter().take(MAX_WORST).collect::<Vec<_>>()),
            );
        }

        ValidationResult::computed(ctx.id(), self.name(), self.tier(), fraction, evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::structure::fixtures::{perovskite, rock_salt};
    use crate::model::structure::LatticeParams;
    use crate::validators::run;
    use crate::validators::testing::Fixture;

    #[test]
    fn ideal_perovskite_has_no_violations() {
        let fx = Fixture::new(perovskite());
        let r = run(&ShannonRadiiValidator, &fx.ctx());
        assert!(r.applicable());
        assert_eq!(r.score(), Some(0.0));
        // Sr: 12 bonds, Ti: 6 bonds
        assert_eq!(r.evidence()["n_bonds_checked"], 18);
    }

    #[test]
    fn compressed_cell_violates() {
        let mut rec = perovskite();
        rec.lattice = Some(LatticeParams::cubic(2.8));
        let assignment = Fixture::new(perovskite()).assignment;
        let fx = Fixture::new(rec).with_assignment(assignment);
        let r = run(&ShannonRadiiValidator, &fx.ctx());
        let score = r.score().unwrap();
        assert!(score > 0.0 && score <= 1.0);
        assert!(!r.evidence()["worst_violations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn rock_salt_is_checked_with_chloride_radii() {
        let fx = Fixture::new(rock_salt());
        let r = run(&ShannonRadiiValidator, &fx.ctx());
        assert!(r.applicable());
        // 2.82 Å vs 1.02 + 1.81 = 2.83 Å
        assert_eq!(r.score(), Some(0.0));
    }
}
