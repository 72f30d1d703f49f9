// src/model/oxidation.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Independent assignment methods run by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Geometry-aware bond valence analysis
    BondValence,
    /// Composition-only enumeration over known stable states
    OxidationGuess,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::BondValence, Method::OxidationGuess];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::BondValence => "bond_valence",
            Method::OxidationGuess => "oxidation_guess",
        }
    }
}

/// What produced a site's final value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodTag {
    BondValence,
    OxidationGuess,
    Consensus,
    Disagreement,
    None,
}

impl MethodTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodTag::BondValence => "bond_valence",
            MethodTag::OxidationGuess => "oxidation_guess",
            MethodTag::Consensus => "consensus",
            MethodTag::Disagreement => "disagreement",
            MethodTag::None => "none",
        }
    }
}

impl From<Method> for MethodTag {
    fn from(m: Method) -> Self {
        match m {
            Method::BondValence => MethodTag::BondValence,
            Method::OxidationGuess => MethodTag::OxidationGuess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    BothAgree,
    SingleMethod,
    MethodsDisagree,
    NoAssignment,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::BothAgree => "both_agree",
            Confidence::SingleMethod => "single_method",
            Confidence::MethodsDisagree => "methods_disagree",
            Confidence::NoAssignment => "no_assignment",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One method's answer for one site; `None` means the method gave no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResult {
    pub method: Method,
    pub state: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAssignment {
    pub state: Option<i32>,
    pub method: MethodTag,
    pub confidence: Confidence,
    /// Every method's answer, kept so disagreement stays visible
    pub candidates: Vec<MethodResult>,
}

/// How a method fared on a whole structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodOutcome {
    Complete,
    Partial { assigned: usize, total: usize },
    Failed { reason: String },
}

impl MethodOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, MethodOutcome::Complete)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedValence {
    pub element: String,
    pub states: Vec<i32>,
}

/// Consensus oxidation states of one structure.
///
/// Built once by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OxidationAssignment {
    sites: Vec<SiteAssignment>,
    confidence: Confidence,
    method_outcomes: BTreeMap<Method, MethodOutcome>,
    mixed_valence: Vec<MixedValence>,
}

impl OxidationAssignment {
    pub(crate) fn new(
        sites: Vec<SiteAssignment>,
        confidence: Confidence,
        method_outcomes: BTreeMap<Method, MethodOutcome>,
        mixed_valence: Vec<MixedValence>,
    ) -> Self {
        Self {
            sites,
            confidence,
            method_outcomes,
            mixed_valence,
        }
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn sites(&self) -> &[SiteAssignment] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn state(&self, site: usize) -> Option<i32> {
        self.sites.get(site).and_then(|s| s.state)
    }

    pub fn method_outcomes(&self) -> &BTreeMap<Method, MethodOutcome> {
        &self.method_outcomes
    }

    pub fn mixed_valence(&self) -> &[MixedValence] {
        &self.mixed_valence
    }

    /// At least one site carries a value
    pub fn exists(&self) -> bool {
        self.confidence != Confidence::NoAssignment && self.sites.iter().any(|s| s.state.is_some())
    }

    pub fn unassigned_sites(&self) -> Vec<usize> {
        self.sites
            .iter()
            .enumerate()
            .filter(|(_, s)| s.state.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_fully_assigned(&self) -> bool {
        !self.sites.is_empty() && self.sites.iter().all(|s| s.state.is_some())
    }

    pub fn is_cation(&self, site: usize) -> bool {
        self.state(site).is_some_and(|s| s > 0)
    }

    pub fn is_anion(&self, site: usize) -> bool {
        self.state(site).is_some_and(|s| s < 0)
    }

    /// Site count per final method tag
    pub fn method_tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.sites {
            *counts.entry(s.method.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }
}
