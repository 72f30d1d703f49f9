// src/pipeline/coverage.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::ConfidenceReport;
use crate::error::StructureError;

/// Per-validator computed counts over everything a sweep has seen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub total: usize,
    pub structure_errors: usize,
    pub resumed: usize,
    pub computed: BTreeMap<String, usize>,
}

impl Coverage {
    /// Starts every named validator at zero so unused ones still show up
    pub fn new<'a>(validators: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            computed: validators.into_iter().map(|v| (v.to_string(), 0)).collect(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &ConfidenceReport, resumed: bool) {
        self.total += 1;
        if resumed {
            self.resumed += 1;
        }
        for (name, result) in report.results() {
            let slot = self.computed.entry(name.clone()).or_insert(0);
            if result.applicable() {
                *slot += 1;
            }
        }
    }

    /// Malformed records still count toward the denominator
    pub fn record_structure_error(&mut self) {
        self.total += 1;
        self.structure_errors += 1;
    }

    /// computed / total, 0 for an empty sweep
    pub fn fraction(&self, validator: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let computed = self.computed.get(validator).copied().unwrap_or(0);
        computed as f64 / self.total as f64
    }

    pub fn merge(&mut self, other: &Coverage) {
        self.total += other.total;
        self.structure_errors += other.structure_errors;
        self.resumed += other.resumed;
        for (name, n) in &other.computed {
            *self.computed.entry(name.clone()).or_insert(0) += n;
        }
    }
}

/// Final accounting of one sweep, printed by the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub coverage: Coverage,
    /// Ids that failed the shape check, with the reason
    pub structure_errors: Vec<(String, String)>,
}

impl SweepSummary {
    pub fn new<'a>(validators: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            coverage: Coverage::new(validators),
            structure_errors: Vec::new(),
        }
    }

    pub fn record(&mut self, report: &ConfidenceReport, resumed: bool) {
        self.coverage.record(report, resumed);
    }

    pub fn record_structure_error(&mut self, structure_id: &str, error: &StructureError) {
        self.coverage.record_structure_error();
        self.structure_errors
            .push((structure_id.to_string(), error.to_string()));
    }

    /// Combine partial summaries from parallel workers
    pub fn merge(mut self, other: SweepSummary) -> Self {
        self.coverage.merge(&other.coverage);
        self.structure_errors.extend(other.structure_errors);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        let c = &self.coverage;
        let mut out = vec![format!(
            "{} structures ({} resumed, {} malformed)",
            c.total, c.resumed, c.structure_errors
        )];
        for (name, n) in &c.computed {
            out.push(format!(
                "  {:<20} {:>6} / {:<6} ({:.1}%)",
                name,
                n,
                c.total,
                100.0 * c.fraction(name)
            ));
        }
        out
    }
}
