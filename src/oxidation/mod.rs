// src/oxidation/mod.rs

pub mod bond_valence;
pub mod consensus;
pub mod guesses;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::{GeometryConfig, ResolverConfig};
use crate::error::StructureError;
use crate::model::oxidation::{
    Method, MethodOutcome, MethodResult, MixedValence, OxidationAssignment, SiteAssignment,
};
use crate::model::structure::StructureRecord;
use crate::physics::neighbors::Geometry;
use crate::reference::ReferenceTables;

/// One method's tagged answer for a whole structure
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRun {
    pub method: Method,
    pub states: Vec<Option<i32>>,
    pub outcome: MethodOutcome,
}

impl MethodRun {
    pub fn failed(method: Method, sites: usize, reason: &str) -> Self {
        Self {
            method,
            states: vec![None; sites],
            outcome: MethodOutcome::Failed {
                reason: reason.to_string(),
            },
        }
    }

    /// Outcome follows from how many sites got a value
    pub fn from_states(method: Method, states: Vec<Option<i32>>, empty_reason: &str) -> Self {
        let assigned = states.iter().filter(|s| s.is_some()).count();
        let outcome = if assigned == 0 {
            MethodOutcome::Failed {
                reason: empty_reason.to_string(),
            }
        } else if assigned == states.len() {
            MethodOutcome::Complete
        } else {
            MethodOutcome::Partial {
                assigned,
                total: states.len(),
            }
        };
        Self {
            method,
            states,
            outcome,
        }
    }

    /// The full state vector, only when every site got a value
    fn complete_states(&self) -> Option<&[Option<i32>]> {
        self.outcome.is_complete().then_some(self.states.as_slice())
    }
}

/// Multi-method oxidation state assignment.
///
/// Pure: the same record and tables always give the same assignment.
pub struct OxidationStateResolver {
    tables: Arc<ReferenceTables>,
    config: ResolverConfig,
    cutoff: f64,
}

impl OxidationStateResolver {
    pub fn new(tables: Arc<ReferenceTables>, config: ResolverConfig) -> Self {
        Self {
            tables,
            config,
            cutoff: GeometryConfig::default().cutoff,
        }
    }

    /// Neighbor cutoff used when `resolve` builds its own geometry
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn resolve(&self, structure: &StructureRecord) -> Result<OxidationAssignment, StructureError> {
        let geometry = Geometry::compute(structure, self.cutoff)?;
        self.resolve_with_geometry(structure, &geometry)
    }

    /// Reuses a neighbor list built by `Geometry::compute`, which has
    /// already validated `structure`.
    pub fn resolve_with_geometry(
        &self,
        structure: &StructureRecord,
        geometry: &Geometry,
    ) -> Result<OxidationAssignment, StructureError> {
        debug_assert_eq!(geometry.site_count(), structure.sites.len());

        let runs = [
            bond_valence::assign(structure, geometry, &self.tables, &self.config),
            guesses::assign(structure, &self.config),
        ];
        Ok(combine(structure, &runs))
    }
}

/// Reduce per-method runs site by site, then once for the whole structure
pub fn combine(structure: &StructureRecord, runs: &[MethodRun]) -> OxidationAssignment {
    let sites: Vec<SiteAssignment> = (0..structure.sites.len())
        .map(|i| {
            let candidates: Vec<MethodResult> = runs
                .iter()
                .map(|r| MethodResult {
                    method: r.method,
                    state: r.states.get(i).copied().flatten(),
                })
                .collect();
            let tagged: Vec<(Method, Option<i32>)> =
                candidates.iter().map(|c| (c.method, c.state)).collect();
            let reduced = consensus::reduce(&tagged);
            SiteAssignment {
                state: reduced.value,
                method: reduced.tag,
                confidence: reduced.confidence,
                candidates,
            }
        })
        .collect();

    let whole: Vec<(Method, Option<&[Option<i32>]>)> =
        runs.iter().map(|r| (r.method, r.complete_states())).collect();
    let confidence = consensus::reduce(&whole).confidence;

    let method_outcomes: BTreeMap<Method, MethodOutcome> =
        runs.iter().map(|r| (r.method, r.outcome.clone())).collect();

    let mixed_valence = detect_mixed_valence(structure, &sites);
    if !mixed_valence.is_empty() {
        log::debug!(
            "{}: mixed valence on {}",
            structure.id,
            mixed_valence
                .iter()
                .map(|m| m.element.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    OxidationAssignment::new(sites, confidence, method_outcomes, mixed_valence)
}

fn detect_mixed_valence(structure: &StructureRecord, sites: &[SiteAssignment]) -> Vec<MixedValence> {
    let mut by_element: BTreeMap<&str, BTreeSet<i32>> = BTreeMap::new();
    for (site, assignment) in structure.sites.iter().zip(sites) {
        if let Some(state) = assignment.state {
            by_element.entry(site.element.as_str()).or_default().insert(state);
        }
    }
    by_element
        .into_iter()
        .filter(|(_, states)| states.len() > 1)
        .map(|(el, states)| MixedValence {
            element: el.to_string(),
            states: states.into_iter().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::oxidation::{Confidence, MethodTag};
    use crate::model::structure::fixtures::{perovskite, rock_salt};
    use crate::model::structure::LatticeParams;

    fn resolver() -> OxidationStateResolver {
        OxidationStateResolver::new(Arc::new(ReferenceTables::embedded()), ResolverConfig::default())
    }

    #[test]
    fn both_methods_agree_on_perovskite() {
        let a = resolver().resolve(&perovskite()).unwrap();
        assert_eq!(a.confidence(), Confidence::BothAgree);
        assert!(a.is_fully_assigned());
        assert_eq!(a.state(1), Some(4));
        assert!(a.sites().iter().all(|s| s.method == MethodTag::Consensus));
        assert!(a.mixed_valence().is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let r = resolver();
        let rec = rock_salt();
        let first = r.resolve(&rec).unwrap();
        let second = r.resolve(&rec).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn single_method_keeps_its_tag() {
        // Stretched cell: bond valence cannot snap, guesses still succeed
        let mut rec = perovskite();
        rec.lattice = Some(LatticeParams::cubic(5.5));
        let a = resolver().resolve(&rec).unwrap();
        assert_eq!(a.confidence(), Confidence::SingleMethod);
        assert!(a.sites().iter().any(|s| s.method == MethodTag::OxidationGuess));
        assert!(!a.method_outcomes()[&Method::BondValence].is_complete());
    }

    #[test]
    fn disagreement_leaves_site_unassigned() {
        let rec = perovskite();
        let runs = [
            MethodRun::from_states(Method::BondValence, vec![Some(2), Some(3), Some(-2), Some(-2), Some(-2)], ""),
            MethodRun::from_states(Method::OxidationGuess, vec![Some(2), Some(4), Some(-2), Some(-2), Some(-2)], ""),
        ];
        let a = combine(&rec, &runs);
        assert_eq!(a.confidence(), Confidence::MethodsDisagree);
        assert_eq!(a.state(1), None);
        assert_eq!(a.sites()[1].candidates.len(), 2);
        assert_eq!(a.sites()[0].confidence, Confidence::BothAgree);
        assert_eq!(a.unassigned_sites(), vec![1]);
    }

    #[test]
    fn mixed_valence_is_reported() {
        let rec = perovskite();
        let runs = [MethodRun::from_states(
            Method::BondValence,
            vec![Some(2), Some(4), Some(-2), Some(-2), Some(-1)],
            "",
        )];
        let a = combine(&rec, &runs);
        assert_eq!(a.mixed_valence().len(), 1);
        assert_eq!(a.mixed_valence()[0].states, vec![-2, -1]);
    }

    #[test]
    fn malformed_structure_fails_fast() {
        let mut rec = perovskite();
        rec.sites.clear();
        assert!(matches!(resolver().resolve(&rec), Err(StructureError::NoSites { .. })));
    }
}
