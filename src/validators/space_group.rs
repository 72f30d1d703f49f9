// src/validators/space_group.rs

use serde_json::{json, Value};

use super::{round, Applicability, ValidationContext, Validator};
use crate::error::ValidatorError;
use crate::model::result::{Independence, Tier, ValidationResult};
use crate::model::symmetry;

const TOP_GROUPS: usize = 5;

/// How common the claimed space group is among experimental structures
/// of the same chemical system. Falls back to a global distribution only
/// when the loaded statistics carry one; otherwise not applicable.
pub struct SpaceGroupValidator;

impl Validator for SpaceGroupValidator {
    fn name(&self) -> &'static str {
        "space_group"
    }

    fn tier(&self) -> Tier {
        Tier::Two
    }

    fn independence(&self) -> Independence {
        Independence::SemiIndependent
    }

    fn applicability(&self, ctx: &ValidationContext) -> Applicability {
        if ctx.structure.space_group.is_none() {
            return Applicability::NotApplicable("no space group assigned".into());
        }
        let chemsys = ctx.structure.chemsys();
        if ctx.tables.space_groups.distribution(&chemsys).is_none() {
            return Applicability::NotApplicable(format!(
                "no experimental space-group data for {}",
                chemsys
            ));
        }
        Applicability::Applicable
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError> {
        let claimed = ctx
            .structure
            .space_group
            .as_ref()
            .ok_or_else(|| ValidatorError::Internal("space group vanished".into()))?;
        let chemsys = ctx.structure.chemsys();
        let (scope, counts) = ctx
            .tables
            .space_groups
            .distribution(&chemsys)
            .ok_or_else(|| ValidatorError::Internal("reference data vanished".into()))?;

        let total: u64 = counts.values().sum();
        let count = counts.get(&claimed.number).copied().unwrap_or(0);
        let fraction = count as f64 / total as f64;

        let mut ranked: Vec<(u16, u64)> = counts.iter().map(|(&n, &c)| (n, c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let top: Vec<Value> = ranked
            .into_iter()
            .take(TOP_GROUPS)
            .map(|(n, c)| {
                json!({
                    "number": n,
                    "symbol": symmetry::symbol(n),
                    "count": c,
                    "fraction": round(c as f64 / total as f64, 4),
                })
            })
            .collect();

        let mut evidence = ctx.base_evidence();
        evidence.insert("chemsys".into(), Value::from(chemsys));
        evidence.insert("reference_scope".into(), json!(scope));
        evidence.insert("space_group_number".into(), Value::from(claimed.number));
        evidence.insert(
            "space_group_symbol".into(),
            json!(claimed.symbol.as_deref().or(symmetry::symbol(claimed.number))),
        );
        evidence.insert("count_in_reference".into(), Value::from(count));
        evidence.insert("total_reference_entries".into(), Value::from(total));
        evidence.insert("novel".into(), Value::from(count == 0));
        evidence.insert(
            "min_fraction_reference".into(),
            Value::from(ctx.config.space_group_min_fraction),
        );
        evidence.insert("top_reference_space_groups".into(), Value::from(top));

        match symmetry::detect_space_group(ctx.structure, ctx.config.symprec) {
            Ok(detected) => {
                evidence.insert("matches_detected".into(), Value::from(detected.number == claimed.number));
                evidence.insert("detected_space_group".into(), json!(detected));
            }
            Err(e) => {
                log::debug!("{}: symmetry detection failed: {}", ctx.id(), e);
                evidence.insert("symmetry_detection_error".into(), Value::from(e));
            }
        }

        ValidationResult::computed(ctx.id(), self.name(), self.tier(), fraction, evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::structure::fixtures::{perovskite, rock_salt};
    use crate::model::structure::SpaceGroup;
    use crate::reference::SpaceGroupReference;
    use crate::validators::run;
    use crate::validators::testing::Fixture;

    #[test]
    fn fraction_of_chemsys_entries() {
        let mut fx = Fixture::new(perovskite());
        fx.tables.space_groups =
            SpaceGroupReference::default().with_chemsys("O-Sr-Ti", &[(221, 30), (140, 10)]);
        let r = run(&SpaceGroupValidator, &fx.ctx());
        assert_eq!(r.score(), Some(0.75));
        assert_eq!(r.evidence()["novel"], false);
        assert_eq!(r.evidence()["reference_scope"], "chemsys");
        assert_eq!(r.evidence()["matches_detected"], true);
    }

    #[test]
    fn unseen_group_is_novel_with_zero_score() {
        let mut fx = Fixture::new(perovskite());
        fx.tables.space_groups = SpaceGroupReference::default().with_chemsys("O-Sr-Ti", &[(62, 5)]);
        let r = run(&SpaceGroupValidator, &fx.ctx());
        assert_eq!(r.score(), Some(0.0));
        assert_eq!(r.evidence()["novel"], true);
    }

    #[test]
    fn missing_space_group_or_reference() {
        let mut rec = perovskite();
        rec.space_group = None;
        let fx = Fixture::new(rec);
        assert!(!run(&SpaceGroupValidator, &fx.ctx()).applicable());

        let mut fx = Fixture::new(perovskite());
        fx.tables.space_groups = SpaceGroupReference::default();
        let r = run(&SpaceGroupValidator, &fx.ctx());
        assert!(!r.applicable());
        assert_eq!(r.evidence()["skip_reason"], "no experimental space-group data for O-Sr-Ti");
    }

    #[test]
    fn unknown_chemsys_is_skipped_not_scored() {
        let mut rec = rock_salt();
        rec.space_group = Some(SpaceGroup { number: 3, symbol: None });
        let mut fx = Fixture::new(rec);
        fx.tables.space_groups = SpaceGroupReference::default().with_chemsys("O-Sr-Ti", &[(221, 30)]);

        let r = run(&SpaceGroupValidator, &fx.ctx());
        assert!(!r.applicable());
        assert_eq!(r.score(), None);
        assert!(!r.evidence().contains_key("novel"));
    }

    #[test]
    fn supplied_global_distribution_is_used() {
        let mut fx = Fixture::new(perovskite());
        fx.tables.space_groups = SpaceGroupReference::default().with_global(&[(221, 1), (62, 3)]);
        let r = run(&SpaceGroupValidator, &fx.ctx());
        assert_eq!(r.evidence()["reference_scope"], "global");
        assert_eq!(r.score(), Some(0.25));
    }
}
