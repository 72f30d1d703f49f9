// src/reference.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;

use crate::config::ReferenceConfig;
use crate::error::ConfigError;
use crate::physics::bond_valence::BondValenceTable;
use crate::physics::radii::ShannonTable;

/// Typical GII of well-refined experimental structures (v.u.)
pub const GII_REFERENCE_ICSD: f64 = 0.2;

/// Which distribution a space-group score was measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceScope {
    Chemsys,
    Global,
}

/// Space-group counts of experimentally observed structures.
///
/// Nothing is embedded: without a statistics file every structure is
/// skipped. A `global` distribution is only used when the file has one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpaceGroupReference {
    #[serde(default)]
    chemsys: HashMap<String, BTreeMap<u16, u64>>,
    #[serde(default)]
    global: BTreeMap<u16, u64>,
}

impl SpaceGroupReference {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn with_chemsys(mut self, chemsys: &str, counts: &[(u16, u64)]) -> Self {
        self.chemsys
            .insert(chemsys.to_string(), counts.iter().copied().collect());
        self
    }

    pub fn with_global(mut self, counts: &[(u16, u64)]) -> Self {
        self.global = counts.iter().copied().collect();
        self
    }

    /// Chemical-system counts when known, else the supplied global distribution
    pub fn distribution(&self, chemsys: &str) -> Option<(ReferenceScope, &BTreeMap<u16, u64>)> {
        match self.chemsys.get(chemsys) {
            Some(counts) if counts.values().any(|&n| n > 0) => Some((ReferenceScope::Chemsys, counts)),
            _ if self.global.values().any(|&n| n > 0) => Some((ReferenceScope::Global, &self.global)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.chemsys.is_empty()
    }

    pub fn chemsys_count(&self) -> usize {
        self.chemsys.len()
    }
}

/// Immutable reference data shared by the resolver and every validator.
///
/// Loaded once per process and handed around as `Arc<ReferenceTables>`.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub bond_valence: BondValenceTable,
    pub radii: ShannonTable,
    pub space_groups: SpaceGroupReference,
    pub gii_reference: f64,
}

impl ReferenceTables {
    pub fn embedded() -> Self {
        Self {
            bond_valence: BondValenceTable::embedded(),
            radii: ShannonTable::embedded(),
            space_groups: SpaceGroupReference::default(),
            gii_reference: GII_REFERENCE_ICSD,
        }
    }

    /// Embedded tables plus whatever the config points at
    pub fn load(config: &ReferenceConfig) -> Result<Self, ConfigError> {
        let mut tables = Self::embedded();
        tables.gii_reference = config.gii_reference;

        if let Some(path) = &config.space_group_stats {
            let file = File::open(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let parsed: SpaceGroupReference = serde_json::from_reader(BufReader::new(file))
                .map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?;
            log::info!(
                "Loaded space-group statistics for {} chemical systems from {:?}",
                parsed.chemsys_count(),
                path
            );
            tables.space_groups = parsed;
        }

        Ok(tables)
    }
}
