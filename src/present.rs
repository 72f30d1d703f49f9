// src/present.rs
//
// Human-facing labels. Nothing upstream of this module reads them.

use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;

use crate::aggregate::ConfidenceReport;
use crate::config::AuditConfig;
use crate::model::result::ValidationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Typical,
    Borderline,
    Atypical,
}

impl ScoreBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Typical => "typical",
            ScoreBand::Borderline => "borderline",
            ScoreBand::Atypical => "atypical",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference values the bands are cut from
#[derive(Debug, Clone)]
pub struct BandReference {
    pub violation_reference: f64,
    pub gii_reference: f64,
    pub divergence_factor: f64,
    pub space_group_min_fraction: f64,
    pub goldschmidt_range: (f64, f64),
}

/// Slack around the Goldschmidt window still shown as borderline
const GOLDSCHMIDT_MARGIN: f64 = 0.05;

impl BandReference {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            violation_reference: config.aggregator.violation_reference,
            gii_reference: config.reference.gii_reference,
            divergence_factor: config.aggregator.divergence_factor,
            space_group_min_fraction: config.validators.space_group_min_fraction,
            goldschmidt_range: config.validators.goldschmidt_range,
        }
    }

    /// Band for one result; `None` when not applicable or unknown validator
    pub fn classify(&self, result: &ValidationResult) -> Option<ScoreBand> {
        let score = result.score()?;
        let band = match result.validator() {
            "charge_neutrality" => {
                if score.abs() < 1e-9 {
                    ScoreBand::Typical
                } else if score.abs() <= 1.0 {
                    ScoreBand::Borderline
                } else {
                    ScoreBand::Atypical
                }
            }
            "shannon_radii" | "pauling_rule2" => {
                banded_upper(score, self.violation_reference, 2.0 * self.violation_reference)
            }
            "bond_valence_sum" => banded_upper(
                score,
                self.gii_reference,
                self.divergence_factor * self.gii_reference,
            ),
            "space_group" => {
                if score >= self.space_group_min_fraction {
                    ScoreBand::Typical
                } else if score > 0.0 {
                    ScoreBand::Borderline
                } else {
                    ScoreBand::Atypical
                }
            }
            "goldschmidt" => {
                let (lo, hi) = self.goldschmidt_range;
                if (lo..=hi).contains(&score) {
                    ScoreBand::Typical
                } else if (lo - GOLDSCHMIDT_MARGIN..=hi + GOLDSCHMIDT_MARGIN).contains(&score) {
                    ScoreBand::Borderline
                } else {
                    ScoreBand::Atypical
                }
            }
            _ => return None,
        };
        Some(band)
    }
}

fn banded_upper(score: f64, typical: f64, borderline: f64) -> ScoreBand {
    if score <= typical {
        ScoreBand::Typical
    } else if score <= borderline {
        ScoreBand::Borderline
    } else {
        ScoreBand::Atypical
    }
}

/// Plain-text table of one report for the terminal
pub fn render_summary(report: &ConfidenceReport, bands: &BandReference) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  [{}]  oxidation: {}",
        report.structure_id(),
        report.compound_class(),
        report.oxidation_confidence()
    );

    for (name, result) in report.results() {
        let tier = u8::from(result.tier());
        let line = match result.score() {
            Some(score) => {
                let band = bands.classify(result).map(|b| b.as_str()).unwrap_or("-");
                format!("{:>10.4}  {}", score, band)
            }
            None => {
                let why = result
                    .evidence()
                    .get("error")
                    .or_else(|| result.evidence().get("skip_reason"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("not applicable");
                format!("{:>10}  {}", "n/a", why)
            }
        };
        let independence = result.independence().map(|i| i.as_str()).unwrap_or("-");
        let _ = writeln!(out, "  T{} {:<18} {:<26} {}", tier, name, independence, line);
    }

    let by_class = report.applicable_by_independence();
    if !by_class.is_empty() {
        let parts: Vec<String> = by_class
            .iter()
            .map(|(class, n)| format!("{} {}", n, class.as_str()))
            .collect();
        let _ = writeln!(out, "  applicable: {}", parts.join(", "));
    }

    if !report.annotations().is_empty() {
        let names: Vec<String> = report
            .annotations()
            .iter()
            .filter_map(|a| serde_json::to_value(a).ok())
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        let _ = writeln!(out, "  notes: {}", names.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::result::{Evidence, Tier};

    fn result(validator: &str, score: f64) -> ValidationResult {
        ValidationResult::computed("x", validator, Tier::Two, score, Evidence::new()).unwrap()
    }

    #[test]
    fn bands_follow_reference_values() {
        let bands = BandReference::from_config(&AuditConfig::default());
        assert_eq!(bands.classify(&result("bond_valence_sum", 0.1)), Some(ScoreBand::Typical));
        assert_eq!(bands.classify(&result("bond_valence_sum", 0.3)), Some(ScoreBand::Borderline));
        assert_eq!(bands.classify(&result("bond_valence_sum", 0.5)), Some(ScoreBand::Atypical));
        assert_eq!(bands.classify(&result("charge_neutrality", 0.0)), Some(ScoreBand::Typical));
        assert_eq!(bands.classify(&result("charge_neutrality", -4.0)), Some(ScoreBand::Atypical));
        assert_eq!(bands.classify(&result("space_group", 0.0)), Some(ScoreBand::Atypical));
        assert_eq!(bands.classify(&result("goldschmidt", 1.08)), Some(ScoreBand::Borderline));
        assert_eq!(bands.classify(&result("custom", 0.0)), None);
    }

    #[test]
    fn summary_shows_independence() {
        use crate::aggregate::ScoreAggregator;
        use crate::config::AggregatorConfig;
        use crate::model::oxidation::Method;
        use crate::model::result::Independence;
        use crate::model::structure::fixtures::rock_salt;
        use crate::model::structure::CompoundClass;
        use crate::oxidation::{combine, MethodRun};

        let rec = rock_salt();
        let states = [vec![Some(1); 4], vec![Some(-1); 4]].concat();
        let assignment = combine(&rec, &[MethodRun::from_states(Method::OxidationGuess, states, "")]);
        let report = ScoreAggregator::new(AggregatorConfig::default()).aggregate(
            "x",
            CompoundClass::Other,
            assignment,
            vec![result("bond_valence_sum", 0.1).with_independence(Independence::SemiIndependent)],
        );
        let text = render_summary(&report, &BandReference::from_config(&AuditConfig::default()));
        assert!(text.contains("semi_independent"), "{}", text);
        assert!(text.contains("applicable: 1 semi_independent"), "{}", text);
        assert!(text.contains("typical"), "{}", text);
    }

    #[test]
    fn not_applicable_has_no_band() {
        let bands = BandReference::from_config(&AuditConfig::default());
        let r = ValidationResult::not_applicable("x", "goldschmidt", Tier::One, "n/a", Evidence::new());
        assert_eq!(bands.classify(&r), None);
    }
}
