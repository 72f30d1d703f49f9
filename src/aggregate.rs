// src/aggregate.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::AggregatorConfig;
use crate::model::oxidation::{Confidence, OxidationAssignment};
use crate::model::result::{Independence, Tier, ValidationResult};
use crate::model::structure::CompoundClass;
use crate::reference::GII_REFERENCE_ICSD;

/// Cross-validator patterns. Derived for readers, never fed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// Composition-level checks look ideal while geometry-level ones do not
    Tier1ConsistentTier2Divergent,
    OxidationUnresolved,
    MixedAnionCaveat,
    NoApplicableChecks,
}

/// Everything known about one structure after a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    structure_id: String,
    compound_class: CompoundClass,
    oxidation_confidence: Confidence,
    oxidation: OxidationAssignment,
    results: BTreeMap<String, ValidationResult>,
    annotations: Vec<Annotation>,
}

impl ConfidenceReport {
    pub fn structure_id(&self) -> &str {
        &self.structure_id
    }

    pub fn compound_class(&self) -> CompoundClass {
        self.compound_class
    }

    pub fn oxidation_confidence(&self) -> Confidence {
        self.oxidation_confidence
    }

    pub fn oxidation(&self) -> &OxidationAssignment {
        &self.oxidation
    }

    pub fn results(&self) -> &BTreeMap<String, ValidationResult> {
        &self.results
    }

    pub fn result(&self, validator: &str) -> Option<&ValidationResult> {
        self.results.get(validator)
    }

    pub fn score(&self, validator: &str) -> Option<f64> {
        self.results.get(validator).and_then(|r| r.score())
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn has_annotation(&self, annotation: Annotation) -> bool {
        self.annotations.contains(&annotation)
    }

    pub fn applicable_count(&self) -> usize {
        self.results.values().filter(|r| r.applicable()).count()
    }

    /// Applicable results per independence class
    pub fn applicable_by_independence(&self) -> BTreeMap<Independence, usize> {
        let mut counts = BTreeMap::new();
        for r in self.results.values().filter(|r| r.applicable()) {
            if let Some(class) = r.independence() {
                *counts.entry(class).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Same report with one result added or replaced, re-aggregated
    pub fn with_result(self, aggregator: &ScoreAggregator, result: ValidationResult) -> Self {
        let mut results = self.results;
        results.insert(result.validator().to_string(), result);
        aggregator.aggregate(
            &self.structure_id,
            self.compound_class,
            self.oxidation,
            results.into_values().collect(),
        )
    }
}

/// Merges validator outputs into a `ConfidenceReport`. No score is recomputed.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    config: AggregatorConfig,
    gii_reference: f64,
}

impl ScoreAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            gii_reference: GII_REFERENCE_ICSD,
        }
    }

    pub fn with_gii_reference(mut self, gii_reference: f64) -> Self {
        self.gii_reference = gii_reference;
        self
    }

    pub fn aggregate(
        &self,
        structure_id: &str,
        compound_class: CompoundClass,
        assignment: OxidationAssignment,
        results: Vec<ValidationResult>,
    ) -> ConfidenceReport {
        let mut by_name = BTreeMap::new();
        for r in results {
            if r.structure_id() != structure_id {
                log::warn!(
                    "{}: dropping {} result computed for {}",
                    structure_id,
                    r.validator(),
                    r.structure_id()
                );
                continue;
            }
            by_name.insert(r.validator().to_string(), r);
        }

        let oxidation_confidence = assignment.confidence();
        let mut annotations = Vec::new();

        if self.tier1_consistent(&by_name) && self.tier2_divergent(&by_name) {
            annotations.push(Annotation::Tier1ConsistentTier2Divergent);
        }
        if matches!(
            oxidation_confidence,
            Confidence::MethodsDisagree | Confidence::NoAssignment
        ) {
            annotations.push(Annotation::OxidationUnresolved);
        }
        if compound_class != CompoundClass::PureOxide {
            annotations.push(Annotation::MixedAnionCaveat);
        }
        if !by_name.values().any(|r| r.applicable()) {
            annotations.push(Annotation::NoApplicableChecks);
        }

        ConfidenceReport {
            structure_id: structure_id.to_string(),
            compound_class,
            oxidation_confidence,
            oxidation: assignment,
            results: by_name,
            annotations,
        }
    }

    /// Every applicable tier-1 score sits at its ideal, and there is at least one
    fn tier1_consistent(&self, results: &BTreeMap<String, ValidationResult>) -> bool {
        let mut seen = false;
        for r in results.values().filter(|r| r.tier() == Tier::One) {
            let Some(score) = r.score() else { continue };
            seen = true;
            let ideal = match r.validator() {
                "charge_neutrality" => score.abs() < 1e-9,
                "shannon_radii" | "pauling_rule2" => score <= self.config.violation_reference,
                "goldschmidt" => stable_range(r).is_some_and(|(lo, hi)| (lo..=hi).contains(&score)),
                _ => true,
            };
            if !ideal {
                return false;
            }
        }
        seen
    }

    fn tier2_divergent(&self, results: &BTreeMap<String, ValidationResult>) -> bool {
        results
            .values()
            .filter(|r| r.tier() == Tier::Two)
            .any(|r| match (r.validator(), r.score()) {
                ("bond_valence_sum", Some(gii)) => {
                    gii > self.config.divergence_factor * self.gii_reference
                }
                ("space_group", Some(fraction)) => fraction == 0.0,
                _ => false,
            })
    }
}

/// Range the validator recorded as its reference band
fn stable_range(r: &ValidationResult) -> Option<(f64, f64)> {
    let range = r.evidence().get("stable_range")?.as_array()?;
    match range.as_slice() {
        [lo, hi] => Some((lo.as_f64()?, hi.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::oxidation::Method;
    use crate::model::result::Evidence;
    use crate::model::structure::fixtures::perovskite;
    use crate::oxidation::{combine, MethodRun};
    use serde_json::json;

    fn assignment(states: Vec<Option<i32>>) -> OxidationAssignment {
        let runs = [
            MethodRun::from_states(Method::BondValence, states.clone(), ""),
            MethodRun::from_states(Method::OxidationGuess, states, ""),
        ];
        combine(&perovskite(), &runs)
    }

    fn agreed() -> OxidationAssignment {
        assignment(vec![Some(2), Some(4), Some(-2), Some(-2), Some(-2)])
    }

    fn scored(validator: &str, tier: Tier, score: f64) -> ValidationResult {
        ValidationResult::computed("srtio3", validator, tier, score, Evidence::new()).unwrap()
    }

    #[test]
    fn flags_tier2_divergence_over_clean_tier1() {
        let agg = ScoreAggregator::new(AggregatorConfig::default());
        let report = agg.aggregate(
            "srtio3",
            CompoundClass::PureOxide,
            agreed(),
            vec![
                scored("charge_neutrality", Tier::One, 0.0),
                scored("pauling_rule2", Tier::One, 0.1),
                scored("bond_valence_sum", Tier::Two, 0.9),
            ],
        );
        assert_eq!(report.annotations(), &[Annotation::Tier1ConsistentTier2Divergent]);
        assert_eq!(report.applicable_count(), 3);
        // Scores pass through untouched
        assert_eq!(report.score("bond_valence_sum"), Some(0.9));
    }

    #[test]
    fn no_divergence_when_tier1_is_off() {
        let agg = ScoreAggregator::new(AggregatorConfig::default());
        let report = agg.aggregate(
            "srtio3",
            CompoundClass::PureOxide,
            agreed(),
            vec![
                scored("charge_neutrality", Tier::One, -1.0),
                scored("space_group", Tier::Two, 0.0),
            ],
        );
        assert!(!report.has_annotation(Annotation::Tier1ConsistentTier2Divergent));
    }

    #[test]
    fn goldschmidt_uses_recorded_range() {
        let mut ev = Evidence::new();
        ev.insert("stable_range".into(), json!([0.71, 1.05]));
        let outside = ValidationResult::computed("srtio3", "goldschmidt", Tier::One, 1.2, ev).unwrap();

        let agg = ScoreAggregator::new(AggregatorConfig::default());
        let report = agg.aggregate(
            "srtio3",
            CompoundClass::PureOxide,
            agreed(),
            vec![outside, scored("space_group", Tier::Two, 0.0)],
        );
        assert!(report.annotations().is_empty());
    }

    #[test]
    fn caveats_and_empty_reports() {
        let agg = ScoreAggregator::new(AggregatorConfig::default());
        let unresolved = assignment(vec![None; 5]);
        let skipped = ValidationResult::not_applicable("srtio3", "goldschmidt", Tier::One, "n/a", Evidence::new());
        let report = agg.aggregate("srtio3", CompoundClass::Oxynitride, unresolved, vec![skipped]);

        assert!(report.has_annotation(Annotation::OxidationUnresolved));
        assert!(report.has_annotation(Annotation::MixedAnionCaveat));
        assert!(report.has_annotation(Annotation::NoApplicableChecks));
        assert_eq!(report.oxidation_confidence(), Confidence::NoAssignment);
    }

    #[test]
    fn with_result_reaggregates() {
        let agg = ScoreAggregator::new(AggregatorConfig::default());
        let report = agg.aggregate("srtio3", CompoundClass::PureOxide, agreed(), vec![]);
        assert!(report.has_annotation(Annotation::NoApplicableChecks));

        let report = report.with_result(&agg, scored("charge_neutrality", Tier::One, 0.0));
        assert!(!report.has_annotation(Annotation::NoApplicableChecks));
        assert_eq!(report.results().len(), 1);
    }

    #[test]
    fn counts_applicable_checks_by_independence() {
        let agg = ScoreAggregator::new(AggregatorConfig::default());
        let skipped = ValidationResult::not_applicable("srtio3", "space_group", Tier::Two, "n/a", Evidence::new())
            .with_independence(Independence::SemiIndependent);
        let report = agg.aggregate(
            "srtio3",
            CompoundClass::PureOxide,
            agreed(),
            vec![
                scored("charge_neutrality", Tier::One, 0.0).with_independence(Independence::FullyIndependent),
                scored("pauling_rule2", Tier::One, 0.0).with_independence(Independence::FullyIndependent),
                scored("bond_valence_sum", Tier::Two, 0.1).with_independence(Independence::SemiIndependent),
                skipped,
            ],
        );
        let counts = report.applicable_by_independence();
        assert_eq!(counts.get(&Independence::FullyIndependent), Some(&2));
        assert_eq!(counts.get(&Independence::SemiIndependent), Some(&1));
        assert_eq!(counts.get(&Independence::ComputationalConsistency), None);
    }

    #[test]
    fn foreign_results_are_dropped() {
        let agg = ScoreAggregator::new(AggregatorConfig::default());
        let other = ValidationResult::computed("other", "charge_neutrality", Tier::One, 0.0, Evidence::new()).unwrap();
        let report = agg.aggregate("srtio3", CompoundClass::PureOxide, agreed(), vec![other]);
        assert!(report.results().is_empty());
    }
}
