// src/validators/goldschmidt.rs

use serde_json::{json, Value};
use std::collections::BTreeSet;

use super::{round, Applicability, ValidationContext, Validator};
use crate::error::ValidatorError;
use crate::model::result::{Independence, Tier, ValidationResult};
use crate::model::structure::OxideType;
use crate::physics::radii::ShannonTable;

/// Preferred coordination numbers per perovskite site
const A_SITE_CN: [u8; 3] = [12, 8, 6];
const B_SITE_CN: [u8; 2] = [6, 4];

/// O²⁻ in six-fold coordination when the table has no entry
const R_OXYGEN_DEFAULT: f64 = 1.40;

/// Goldschmidt tolerance factor for ABO3 compounds:
/// t = (r_A + r_O) / (√2 (r_B + r_O))
pub struct GoldschmidtValidator;

struct SiteChoice<'a> {
    element: &'a str,
    state: i32,
    radius: f64,
    cn: u8,
}

impl Validator for GoldschmidtValidator {
    fn name(&self) -> &'static str {
        "goldschmidt"
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
        let oxide_type = ctx.structure.oxide_type();
        if oxide_type != OxideType::ABO3 {
            return Applicability::NotApplicable(format!(
                "not an ABO3 composition (oxide_type={:?})",
                oxide_type
            ));
        }
        Applicability::requires_assignment(ctx)
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError> {
        let assignment = ctx.checked_assignment()?;
        let radii = &ctx.tables.radii;
        let mut evidence = ctx.base_evidence();

        // One unambiguous state per cation element
        let composition = ctx.structure.composition();
        let mut cations: Vec<(&str, i32)> = Vec::with_capacity(2);
        for element in composition.keys().filter(|el| el.as_str() != "O") {
            let states: BTreeSet<i32> = ctx
                .structure
                .sites
                .iter()
                .enumerate()
                .filter(|(_, s)| &s.element == element)
                .filter_map(|(i, _)| assignment.state(i))
                .collect();

            match states.iter().copied().collect::<Vec<_>>().as_slice() {
                [state] if *state > 0 => cations.push((element.as_str(), *state)),
                [] => {
                    let reason = format!("no oxidation state for {}", element);
                    return Ok(self.skip(ctx, &reason, evidence));
                }
                other => {
                    evidence.insert("states".into(), json!(other));
                    let reason = format!("{} is not a single cation state", element);
                    return Ok(self.skip(ctx, &reason, evidence));
                }
            }
        }
        let [first, second] = cations.as_slice() else {
            return Ok(self.skip(ctx, "expected exactly two cations", evidence));
        };

        let r_o = radii.exact("O", -2, 6).unwrap_or(R_OXYGEN_DEFAULT);

        let best = [(first, second), (second, first)]
            .into_iter()
            .filter_map(|(a, b)| Some((site(radii, *a, &A_SITE_CN)?, site(radii, *b, &B_SITE_CN)?)))
            .max_by(|x, y| x.0.radius.total_cmp(&y.0.radius));

        let Some((a, b)) = best else {
            evidence.insert("cations".into(), json!(cations));
            let reason = "Shannon radii not available for perovskite coordination";
            return Ok(self.skip(ctx, reason, evidence));
        };

        let t = (a.radius + r_o) / (2f64.sqrt() * (b.radius + r_o));
        let (lo, hi) = ctx.config.goldschmidt_range;

        evidence.insert("a_site".into(), site_json(&a));
        evidence.insert("b_site".into(), site_json(&b));
        evidence.insert("r_O".into(), Value::from(r_o));
        evidence.insert("tolerance_factor".into(), Value::from(round(t, 4)));
        evidence.insert("stable_range".into(), json!([lo, hi]));

        ValidationResult::computed(ctx.id(), self.name(), self.tier(), t, evidence)
    }
}

fn site<'a>(
    radii: &ShannonTable,
    (element, state): (&'a str, i32),
    preferred: &[u8],
) -> Option<SiteChoice<'a>> {
    radii
        .first_of(element, state, preferred)
        .map(|(cn, radius)| SiteChoice { element, state, radius, cn })
}

fn site_json(s: &SiteChoice) -> Value {
    json!({ "element": s.element, "oxi_state": s.state, "radius": s.radius, "cn": s.cn })
}
