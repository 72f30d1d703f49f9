// tests/pipeline.rs

use std::sync::Arc;

use crystal_auditor::config::AuditConfig;
use crystal_auditor::error::{PipelineError, ValidatorError};
use crystal_auditor::model::result::{Independence, Tier, ValidationResult};
use crystal_auditor::model::structure::{CompoundClass, LatticeParams, Site, SpaceGroup, StructureRecord};
use crystal_auditor::pipeline::{CheckpointStore, Coverage, DirectoryStore, MemoryStore, Orchestrator};
use crystal_auditor::reference::ReferenceTables;
use crystal_auditor::validators::{
    Applicability, ChargeNeutralityValidator, ShannonRadiiValidator, ValidationContext, Validator,
};

fn rock_salt(id: &str, cation: &str, anion: &str, a: f64, class: CompoundClass) -> StructureRecord {
    let cations = [[0.0, 0.0, 0.0], [0.5, 0.5, 0.0], [0.5, 0.0, 0.5], [0.0, 0.5, 0.5]];
    let anions = [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5], [0.5, 0.5, 0.5]];
    let mut sites: Vec<Site> = cations.iter().map(|p| Site::new(cation, *p)).collect();
    sites.extend(anions.iter().map(|p| Site::new(anion, *p)));
    StructureRecord {
        id: id.to_string(),
        sites,
        lattice: Some(LatticeParams::cubic(a)),
        space_group: Some(SpaceGroup {
            number: 225,
            symbol: Some("Fm-3m".into()),
        }),
        compound_class: class,
    }
}

fn perovskite(id: &str, a_site: &str, class: CompoundClass) -> StructureRecord {
    StructureRecord {
        id: id.to_string(),
        sites: vec![
            Site::new(a_site, [0.0, 0.0, 0.0]),
            Site::new("Ti", [0.5, 0.5, 0.5]),
            Site::new("O", [0.5, 0.5, 0.0]),
            Site::new("O", [0.5, 0.0, 0.5]),
            Site::new("O", [0.0, 0.5, 0.5]),
        ],
        lattice: Some(LatticeParams::cubic(3.905)),
        space_group: Some(SpaceGroup {
            number: 221,
            symbol: None,
        }),
        compound_class: class,
    }
}

fn corpus() -> Vec<StructureRecord> {
    vec![
        rock_salt("nacl", "Na", "Cl", 5.64, CompoundClass::Other),
        perovskite("srtio3", "Sr", CompoundClass::PureOxide),
        rock_salt("mgo", "Mg", "O", 4.21, CompoundClass::PureOxide),
        perovskite("catio3", "Ca", CompoundClass::PureOxide),
        rock_salt("cao", "Ca", "O", 4.81, CompoundClass::PureOxide),
    ]
}

fn orchestrator(store: Arc<dyn CheckpointStore>) -> Orchestrator {
    Orchestrator::new(Arc::new(ReferenceTables::embedded()), AuditConfig::default(), store)
}

#[test]
fn resume_after_interruption_gives_the_same_reports() {
    let dir = tempfile::tempdir().unwrap();
    let full_store = Arc::new(DirectoryStore::open(dir.path().join("full")).unwrap());
    let resumed_store = Arc::new(DirectoryStore::open(dir.path().join("resumed")).unwrap());

    let full = orchestrator(full_store.clone()).sweep(corpus()).unwrap();
    assert_eq!(full.coverage.total, 5);
    assert_eq!(full.coverage.resumed, 0);

    // Interrupt after two records
    {
        let orch = orchestrator(resumed_store.clone());
        let first_two: Vec<_> = orch.run(corpus()).take(2).collect();
        assert!(first_two.iter().all(|r| r.is_ok()));
    }
    let summary = orchestrator(resumed_store.clone()).sweep(corpus()).unwrap();
    assert_eq!(summary.coverage.resumed, 2);
    assert_eq!(summary.coverage, Coverage { resumed: 2, ..full.coverage.clone() });

    for record in corpus() {
        let a = full_store.load(&record.id).unwrap().unwrap();
        let b = resumed_store.load(&record.id).unwrap().unwrap();
        assert_eq!(a, b, "{} differs after resume", record.id);
    }
}

/// Blows up on one structure, works on the rest
struct Flaky {
    panic_on: &'static str,
    error_on: &'static str,
}

impl Validator for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn tier(&self) -> Tier {
        Tier::Two
    }

    fn independence(&self) -> Independence {
        Independence::ComputationalConsistency
    }

    fn applicability(&self, _: &ValidationContext) -> Applicability {
        Applicability::Applicable
    }

    fn evaluate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidatorError> {
        if ctx.id() == self.panic_on {
            panic!("lattice exploded");
        }
        if ctx.id() == self.error_on {
            return Err(ValidatorError::SiteOutOfRange { site: 99 });
        }
        ValidationResult::computed(ctx.id(), self.name(), self.tier(), 1.0, ctx.base_evidence())
    }
}

#[test]
fn failing_validator_is_contained_to_its_structure() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(store.clone()).with_validators(vec![
        Box::new(Flaky {
            panic_on: "nacl",
            error_on: "mgo",
        }),
        Box::new(ChargeNeutralityValidator),
    ]);

    let reports: Vec<_> = orch.run(corpus()).collect::<Result<_, _>>().unwrap();
    assert_eq!(reports.len(), 5);
    assert_eq!(store.len(), 5);

    let nacl = &reports[0];
    let flaky = nacl.result("flaky").unwrap();
    assert!(!flaky.applicable());
    assert!(flaky.evidence()["error"].as_str().unwrap().contains("lattice exploded"));
    // The sibling validator on the same structure is unaffected
    assert_eq!(nacl.score("charge_neutrality"), Some(0.0));

    assert_eq!(reports[1].score("flaky"), Some(1.0));
    assert!(!reports[2].result("flaky").unwrap().applicable());
    assert_eq!(reports[3].score("flaky"), Some(1.0));
}

#[test]
fn coverage_counts_applicable_results_over_all_records() {
    let mut records = corpus();
    let mut broken = perovskite("broken", "Sr", CompoundClass::PureOxide);
    broken.sites[1].element = "Xx".into();
    records.insert(1, broken);

    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(store.clone());
    let mut run = orch.run(records);

    let mut applicable: std::collections::BTreeMap<String, usize> = Default::default();
    let mut errors = 0;
    for item in run.by_ref() {
        match item {
            Ok(report) => {
                for (name, r) in report.results() {
                    *applicable.entry(name.clone()).or_default() += usize::from(r.applicable());
                }
            }
            Err(PipelineError::Structure(_)) => errors += 1,
            Err(other) => panic!("unexpected {}", other),
        }
    }

    let coverage = run.coverage();
    assert_eq!(errors, 1);
    assert_eq!(coverage.total, 6);
    assert_eq!(coverage.structure_errors, 1);
    for name in orch.validator_names() {
        let f = coverage.fraction(name);
        assert!((0.0..=1.0).contains(&f), "{} = {}", name, f);
        let expected = applicable.get(name).copied().unwrap_or(0) as f64 / 6.0;
        assert!((f - expected).abs() < 1e-12);
    }
    // Charge neutrality applies wherever every site got a state
    assert!(coverage.fraction("charge_neutrality") > 0.5);
    assert!(!store.contains("broken").unwrap());
}

#[test]
fn compound_class_warning_leaves_scores_alone() {
    let orch = orchestrator(Arc::new(MemoryStore::new()))
        .with_validators(vec![Box::new(ShannonRadiiValidator)]);

    let oxide = orch.process(&perovskite("a", "Sr", CompoundClass::PureOxide)).unwrap();
    let tagged = orch.process(&perovskite("a", "Sr", CompoundClass::Oxyhalide)).unwrap();

    let plain = oxide.result("shannon_radii").unwrap();
    let warned = tagged.result("shannon_radii").unwrap();
    assert_eq!(plain.score(), warned.score());
    assert!(plain.evidence().get("compound_class_warning").is_none());
    assert!(warned.evidence()["compound_class_warning"].as_str().unwrap().contains("oxyhalide"));
}

#[test]
fn parallel_sweep_resumes_from_the_same_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::open(dir.path()).unwrap());

    let mut config = AuditConfig::default();
    config.pipeline.workers = 3;
    let orch = Orchestrator::new(Arc::new(ReferenceTables::embedded()), config, store.clone());

    let first = orch.sweep_parallel(&corpus()).unwrap();
    let second = orch.sweep_parallel(&corpus()).unwrap();
    assert_eq!(first.coverage.resumed, 0);
    assert_eq!(second.coverage.resumed, 5);
    assert_eq!(first.coverage.computed, second.coverage.computed);
}

#[test]
fn long_unicode_id_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::open(dir.path()).unwrap());
    let orch = orchestrator(store.clone());

    let long_id = "水".repeat(90);
    let records = vec![
        rock_salt(&long_id, "Na", "Cl", 5.64, CompoundClass::Other),
        rock_salt("next", "Mg", "O", 4.21, CompoundClass::PureOxide),
    ];
    let items: Vec<_> = orch.run(records.clone()).collect();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|r| r.is_ok()));

    assert_eq!(store.load(&long_id).unwrap().unwrap().structure_id(), long_id);
    let again = orch.sweep(records).unwrap();
    assert_eq!(again.coverage.resumed, 2);
}
