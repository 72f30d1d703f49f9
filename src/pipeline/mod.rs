// src/pipeline/mod.rs

pub mod checkpoint;
pub mod coverage;

use rayon::prelude::*;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::aggregate::{ConfidenceReport, ScoreAggregator};
use crate::config::AuditConfig;
use crate::error::{PipelineError, StructureError};
use crate::model::structure::StructureRecord;
use crate::oxidation::OxidationStateResolver;
use crate::physics::neighbors::Geometry;
use crate::reference::ReferenceTables;
use crate::validators::{self, default_validators, ValidationContext, Validator};

pub use checkpoint::{CheckpointStore, DirectoryStore, MemoryStore};
pub use coverage::{Coverage, SweepSummary};

/// Drives resolution, validation and aggregation over a corpus.
///
/// Every structure is independent; the only shared mutable state is the
/// checkpoint store, written once per structure.
pub struct Orchestrator {
    tables: Arc<ReferenceTables>,
    config: AuditConfig,
    store: Arc<dyn CheckpointStore>,
    validators: Vec<Box<dyn Validator>>,
    resolver: OxidationStateResolver,
    aggregator: ScoreAggregator,
    force: bool,
}

impl Orchestrator {
    pub fn new(tables: Arc<ReferenceTables>, config: AuditConfig, store: Arc<dyn CheckpointStore>) -> Self {
        let resolver = OxidationStateResolver::new(tables.clone(), config.resolver.clone())
            .with_cutoff(config.geometry.cutoff);
        let aggregator =
            ScoreAggregator::new(config.aggregator.clone()).with_gii_reference(tables.gii_reference);

        let orchestrator = Self {
            tables,
            config,
            store,
            validators: Vec::new(),
            resolver,
            aggregator,
            force: false,
        };
        orchestrator.with_validators(default_validators())
    }

    /// Replace the validator set; `validators.disabled` still applies
    pub fn with_validators(mut self, validators: Vec<Box<dyn Validator>>) -> Self {
        for name in &self.config.validators.disabled {
            if !validators.iter().any(|v| v.name() == name) {
                log::warn!("disabled validator '{}' is not registered", name);
            }
        }
        let disabled = &self.config.validators.disabled;
        self.validators = validators
            .into_iter()
            .filter(|v| !disabled.iter().any(|d| d == v.name()))
            .collect();
        self
    }

    /// Recompute every record and overwrite its checkpoint
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    pub fn store(&self) -> &dyn CheckpointStore {
        self.store.as_ref()
    }

    /// One structure, start to finish. Never touches the store.
    pub fn process(&self, record: &StructureRecord) -> Result<ConfidenceReport, StructureError> {
        let geometry = Geometry::compute(record, self.config.geometry.cutoff)?;
        let assignment = self.resolver.resolve_with_geometry(record, &geometry)?;

        let ctx = ValidationContext {
            structure: record,
            assignment: &assignment,
            geometry: &geometry,
            tables: &self.tables,
            config: &self.config.validators,
            shell_tolerance: self.config.geometry.shell_tolerance,
        };
        let results = self
            .validators
            .iter()
            .map(|v| validators::run(v.as_ref(), &ctx))
            .collect();

        Ok(self
            .aggregator
            .aggregate(&record.id, record.compound_class, assignment, results))
    }

    /// Resume from the store or compute and checkpoint. `true` when resumed.
    fn step(&self, record: &StructureRecord) -> Result<(ConfidenceReport, bool), PipelineError> {
        if !self.force {
            if let Some(report) = self.store.load(&record.id)? {
                log::info!("{}: resumed from checkpoint", record.id);
                return Ok((report, true));
            }
        }

        log::debug!("{}: processing {} sites", record.id, record.sites.len());
        let report = self.process(record)?;
        self.store.upsert(&report).inspect_err(|e| {
            log::error!("{}: checkpoint failed: {}", record.id, e);
        })?;
        Ok((report, false))
    }

    /// Lazy, restartable sweep over `corpus`
    pub fn run<I>(&self, corpus: I) -> Run<'_, I::IntoIter>
    where
        I: IntoIterator<Item = StructureRecord>,
    {
        Run {
            orchestrator: self,
            records: corpus.into_iter(),
            summary: SweepSummary::new(self.validator_names()),
            halted: false,
        }
    }

    /// Drive `run` to completion. Only checkpoint failures escalate.
    pub fn sweep<I>(&self, corpus: I) -> Result<SweepSummary, PipelineError>
    where
        I: IntoIterator<Item = StructureRecord>,
    {
        let mut run = self.run(corpus);
        for item in run.by_ref() {
            if let Err(e) = item {
                if e.is_fatal() {
                    return Err(e);
                }
            }
        }
        Ok(run.into_summary())
    }

    /// Same semantics as `sweep`, one structure per rayon task
    pub fn sweep_parallel(&self, corpus: &[StructureRecord]) -> Result<SweepSummary, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pipeline.workers)
            .build()
            .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;
        let names = self.validator_names();
        log::info!(
            "Sweeping {} structures on {} workers",
            corpus.len(),
            pool.current_num_threads()
        );

        pool.install(|| {
            corpus
                .par_iter()
                .try_fold(
                    || SweepSummary::new(names.iter().copied()),
                    |mut summary, record| {
                        match self.step(record) {
                            Ok((report, resumed)) => summary.record(&report, resumed),
                            Err(PipelineError::Structure(e)) => {
                                log::info!("skipping malformed structure: {}", e);
                                summary.record_structure_error(&record.id, &e);
                            }
                            Err(fatal) => return Err(fatal),
                        }
                        Ok(summary)
                    },
                )
                .try_reduce(
                    || SweepSummary::new(names.iter().copied()),
                    |a, b| Ok(a.merge(b)),
                )
        })
    }
}

/// Iterator returned by `Orchestrator::run`.
///
/// Yields one item per record. Halts for good after a checkpoint failure.
pub struct Run<'a, I> {
    orchestrator: &'a Orchestrator,
    records: I,
    summary: SweepSummary,
    halted: bool,
}

impl<I> Run<'_, I> {
    pub fn coverage(&self) -> &Coverage {
        &self.summary.coverage
    }

    pub fn summary(&self) -> &SweepSummary {
        &self.summary
    }

    pub fn into_summary(self) -> SweepSummary {
        self.summary
    }
}

impl<I> Iterator for Run<'_, I>
where
    I: Iterator<Item = StructureRecord>,
{
    type Item = Result<ConfidenceReport, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let record = self.records.next()?;

        match self.orchestrator.step(&record) {
            Ok((report, resumed)) => {
                self.summary.record(&report, resumed);
                Some(Ok(report))
            }
            Err(PipelineError::Structure(e)) => {
                log::info!("skipping malformed structure: {}", e);
                self.summary.record_structure_error(&record.id, &e);
                Some(Err(PipelineError::Structure(e)))
            }
            Err(fatal) => {
                self.halted = true;
                Some(Err(fatal))
            }
        }
    }
}

impl<I> FusedIterator for Run<'_, I> where I: Iterator<Item = StructureRecord> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckpointError;
    use crate::aggregate::Annotation;
    use crate::model::structure::fixtures::{perovskite, rock_salt};
    use crate::model::structure::{CompoundClass, LatticeParams, SpaceGroup};
    use std::path::PathBuf;

    fn orchestrator(config: AuditConfig) -> (Orchestrator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let tables = Arc::new(ReferenceTables::embedded());
        (Orchestrator::new(tables, config, store.clone()), store)
    }

    struct BrokenStore;

    impl CheckpointStore for BrokenStore {
        fn contains(&self, _: &str) -> Result<bool, CheckpointError> {
            Ok(false)
        }
        fn load(&self, _: &str) -> Result<Option<ConfidenceReport>, CheckpointError> {
            Ok(None)
        }
        fn upsert(&self, _: &ConfidenceReport) -> Result<(), CheckpointError> {
            Err(CheckpointError::Io {
                path: PathBuf::from("/dev/full"),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    #[test]
    fn process_runs_every_validator() {
        let (orch, store) = orchestrator(AuditConfig::default());
        let report = orch.process(&perovskite()).unwrap();
        assert_eq!(report.results().len(), 6);
        assert_eq!(report.score("charge_neutrality"), Some(0.0));
        // process is store-free
        assert!(store.is_empty());
    }

    #[test]
    fn disabled_validators_are_skipped() {
        let mut config = AuditConfig::default();
        config.validators.disabled = vec!["space_group".into(), "goldschmidt".into()];
        let (orch, _) = orchestrator(config);
        assert_eq!(orch.validator_names().len(), 4);

        let report = orch.process(&rock_salt()).unwrap();
        assert!(report.result("space_group").is_none());
    }

    #[test]
    fn malformed_records_do_not_stop_the_run() {
        let (orch, store) = orchestrator(AuditConfig::default());
        let mut broken = rock_salt();
        broken.id = "broken".into();
        broken.lattice = None;

        let items: Vec<_> = orch.run(vec![broken, perovskite()]).collect();
        assert!(matches!(items[0], Err(PipelineError::Structure(_))));
        assert!(items[1].is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn checkpoint_failure_fuses_the_run() {
        let tables = Arc::new(ReferenceTables::embedded());
        let orch = Orchestrator::new(tables, AuditConfig::default(), Arc::new(BrokenStore));

        let mut run = orch.run(vec![rock_salt(), perovskite()]);
        assert!(matches!(run.next(), Some(Err(PipelineError::Checkpoint(_)))));
        assert!(run.next().is_none());
        assert!(run.next().is_none());
        assert_eq!(run.coverage().total, 0);

        assert!(orch.sweep(vec![rock_salt()]).is_err());
        assert!(orch.sweep_parallel(&[rock_salt(), perovskite()]).is_err());
    }

    #[test]
    fn force_recomputes_and_overwrites() {
        let (orch, store) = orchestrator(AuditConfig::default());
        let stale = orch.aggregator().aggregate(
            "srtio3",
            CompoundClass::PureOxide,
            orch.process(&perovskite()).unwrap().oxidation().clone(),
            vec![],
        );
        store.upsert(&stale).unwrap();

        let resumed = orch.sweep(vec![perovskite()]).unwrap();
        assert_eq!(resumed.coverage.resumed, 1);
        assert!(store.load("srtio3").unwrap().unwrap().results().is_empty());

        let orch = orch.with_force(true);
        let forced = orch.sweep(vec![perovskite()]).unwrap();
        assert_eq!(forced.coverage.resumed, 0);
        assert_eq!(store.load("srtio3").unwrap().unwrap().results().len(), 6);
    }

    #[test]
    fn unknown_chemsys_space_group_does_not_flag_divergence() {
        let (orch, _) = orchestrator(AuditConfig::default());
        let mut rec = rock_salt();
        rec.space_group = Some(SpaceGroup { number: 3, symbol: None });

        let report = orch.process(&rec).unwrap();
        let sg = report.result("space_group").unwrap();
        assert!(!sg.applicable());
        assert!(!report.has_annotation(Annotation::Tier1ConsistentTier2Divergent));
    }

    #[test]
    fn collapsed_cell_is_a_structure_error() {
        let (orch, store) = orchestrator(AuditConfig::default());
        let mut tiny = rock_salt();
        tiny.id = "tiny".into();
        tiny.sites.truncate(2);
        tiny.lattice = Some(LatticeParams::cubic(0.05));

        let items: Vec<_> = orch.run(vec![tiny, perovskite()]).collect();
        assert!(matches!(
            items[0],
            Err(PipelineError::Structure(StructureError::ImplausibleCell { .. }))
        ));
        assert!(items[1].is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn parallel_matches_sequential() {
        let corpus = vec![rock_salt(), perovskite()];

        let (seq, _) = orchestrator(AuditConfig::default());
        let a = seq.sweep(corpus.clone()).unwrap();

        let mut config = AuditConfig::default();
        config.pipeline.workers = 2;
        let (par, store) = orchestrator(config);
        let b = par.sweep_parallel(&corpus).unwrap();

        assert_eq!(a.coverage, b.coverage);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.load("srtio3").unwrap().unwrap(),
            seq.process(&perovskite()).unwrap()
        );
    }
}
