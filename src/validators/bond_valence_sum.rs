// src/validators/bond_valence_sum.rs

use serde_json::{json, Value};

use super::{round, Applicability, ValidationContext, Validator, MAX_WORST};
use crate::error::ValidatorError;
use crate::model::result::{Independence, Tier, ValidationResult};
use crate::physics::bond_valence::{global_instability_index, site_bvs};

/// Global instability index over the assigned sites.
///
/// BVS is signed (negative on anions) and compared to the signed state;
/// only opposite-sign neighbors inside the geometry cutoff contribute.
pub struct BondValenceSumValidator;

impl Validator for BondValenceSumValidator {
    fn name(&self) -> &'static str {
        "bond_valence_sum"
    }

    fn tier(&self) -> Tier {
        Tier::Two
    }

    fn independence(&self) -> Independence {
        Independence::SemiIndependent
    }

    fn applicability(&self, ctx: &ValidationContext) -> Applicability {
        Applicability::requires_assignment(ctx)
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError> {
        let assignment = ctx.checked_assignment()?;
        let tolerance = ctx.config.bvs_tolerance;

        let mut deviations = Vec::new();
        let mut sites = Vec::new();
        let mut n_missing_params = 0usize;
        let mut n_above_tolerance = 0usize;

        for i in 0..ctx.structure.sites.len() {
            let Some(state) = assignment.state(i).filter(|&s| s != 0) else {
                continue;
            };
            let is_cation = state > 0;
            let bvs = site_bvs(
                ctx.structure,
                ctx.geometry,
                &ctx.tables.bond_valence,
                i,
                is_cation,
                |j| if is_cation { assignment.is_anion(j) } else { assignment.is_cation(j) },
            );
            n_missing_params += bvs.missing_params;
            if bvs.bonds == 0 {
                continue;
            }

            let signed = if is_cation { bvs.sum } else { -bvs.sum };
            let deviation = signed - state as f64;
            let relative = deviation.abs() / state.unsigned_abs() as f64;
            if relative > tolerance {
                n_above_tolerance += 1;
            }
            deviations.push(deviation);
            sites.push((
                deviation.abs(),
                json!({
                    "site_index": i,
                    "element": ctx.element(i)?,
                    "oxi_state": state,
                    "bvs": round(signed, 3),
                    "deviation": round(deviation, 3),
                    "relative_deviation": round(relative, 3),
                    "bonds": bvs.bonds,
                }),
            ));
        }

        let mut evidence = ctx.base_evidence();
        evidence.insert("n_bonds_missing_params".into(), Value::from(n_missing_params));

        let Some(gii) = global_instability_index(&deviations) else {
            return Ok(self.skip(
                ctx,
                "could not compute BVS for any site (missing bond valence parameters)",
                evidence,
            ));
        };

        sites.sort_by(|a, b| b.0.total_cmp(&a.0));
        let worst: Vec<Value> = sites.into_iter().take(MAX_WORST).map(|(_, v)| v).collect();

        evidence.insert("global_instability_index".into(), Value::from(round(gii, 4)));
        evidence.insert("gii_reference".into(), Value::from(ctx.tables.gii_reference));
        evidence.insert("n_sites_analyzed".into(), Value::from(deviations.len()));
        evidence.insert("n_sites_total".into(), Value::from(ctx.structure.sites.len()));
        evidence.insert("n_sites_above_tolerance".into(), Value::from(n_above_tolerance));
        evidence.insert("bvs_tolerance".into(), Value::from(tolerance));
        evidence.insert("cutoff".into(), Value::from(ctx.geometry.cutoff()));
        evidence.insert("worst_sites".into(), Value::from(worst));

        ValidationResult::computed(ctx.id(), self.name(), self.tier(), gii, evidence)
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
    fn perovskite_gii_is_small() {
        let fx = Fixture::new(perovskite());
        let r = run(&BondValenceSumValidator, &fx.ctx());
        let gii = r.score().unwrap();
        assert!(gii < 0.2, "GII {}", gii);
        assert_eq!(r.evidence()["n_sites_analyzed"], 5);
        assert_eq!(r.evidence()["gii_reference"], 0.2);
    }

    #[test]
    fn rock_salt_is_overbonded() {
        // Na-Cl at 2.82 Å gives BVS ≈ 1.24 on every site
        let fx = Fixture::new(rock_salt());
        let gii = run(&BondValenceSumValidator, &fx.ctx()).score().unwrap();
        assert!(gii > 0.15 && gii < 0.35, "GII {}", gii);
    }

    #[test]
    fn strained_cell_raises_gii() {
        let relaxed = Fixture::new(perovskite());
        let mut rec = perovskite();
        rec.lattice = Some(LatticeParams::cubic(4.2));
        let strained = Fixture::new(rec).with_assignment(relaxed.assignment.clone());

        let a = run(&BondValenceSumValidator, &relaxed.ctx()).score().unwrap();
        let b = run(&BondValenceSumValidator, &strained.ctx()).score().unwrap();
        assert!(b > a);
    }
}
