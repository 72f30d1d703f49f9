// src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

// --- Sections ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
  /// Neighbor search radius (Å)
  pub cutoff: f64,
  /// First shell = nearest distance × (1 + shell_tolerance)
  pub shell_tolerance: f64,
}

impl Default for GeometryConfig {
  fn default() -> Self {
    Self {
      cutoff: 4.0,
      shell_tolerance: 0.2,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
  /// Max |BVS - state| (v.u.) for a bond-valence snap
  pub bv_snap_tolerance: f64,
  /// Electronegativity window below the most electronegative element
  /// inside which an element with a negative state counts as an anion
  pub anion_electronegativity_window: f64,
  /// Upper bound on oxidation-state combinations the guess method enumerates
  pub max_guess_combinations: usize,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self {
      bv_snap_tolerance: 0.5,
      anion_electronegativity_window: 0.5,
      max_guess_combinations: 200_000,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
  pub shannon_tolerance: f64,
  pub bvs_tolerance: f64,
  pub pauling_tolerance: f64,
  pub goldschmidt_range: (f64, f64),
  pub space_group_min_fraction: f64,
  /// Symmetry precision handed to moyo (Å)
  pub symprec: f64,
  /// Names of validators to skip entirely
  pub disabled: Vec<String>,
}

impl Default for ValidatorConfig {
  fn default() -> Self {
    Self {
      shannon_tolerance: 0.25,
      bvs_tolerance: 0.35,
      pauling_tolerance: 0.25,
      goldschmidt_range: (0.71, 1.05),
      space_group_min_fraction: 0.01,
      symprec: 1e-3,
      disabled: Vec::new(),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
  /// Tier-2 GII counts as divergent above this multiple of the reference
  pub divergence_factor: f64,
  /// Tier-1 violation fractions at or below this count as consistent
  pub violation_reference: f64,
}

impl Default for AggregatorConfig {
  fn default() -> Self {
    Self {
      divergence_factor: 2.0,
      violation_reference: 0.2,
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Rayon worker threads; 0 lets rayon decide
  pub workers: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
  /// JSON file of experimental space-group counts per chemical system
  pub space_group_stats: Option<PathBuf>,
  /// GII of well-refined ICSD structures (v.u.)
  pub gii_reference: f64,
}

impl Default for ReferenceConfig {
  fn default() -> Self {
    Self {
      space_group_stats: None,
      gii_reference: crate::reference::GII_REFERENCE_ICSD,
    }
  }
}

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AuditConfig {
  #[serde(default)]
  pub geometry: GeometryConfig,

  #[serde(default)]
  pub resolver: ResolverConfig,

  #[serde(default)]
  pub validators: ValidatorConfig,

  #[serde(default)]
  pub aggregator: AggregatorConfig,

  #[serde(default)]
  pub pipeline: PipelineConfig,

  #[serde(default)]
  pub reference: ReferenceConfig,
}

impl AuditConfig {
  /// Loads config from standard OS location (e.g., ~/.config/crystal-auditor/settings.json)
  pub fn load() -> (Self, String) {
    let path = Self::get_path();
    if path.exists() {
      match Self::load_from(&path) {
        Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
        Err(e) => (Self::default(), format!("{}; using defaults", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  /// Strict load of an explicit file
  pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> String {
    let path = Self::get_path();
    if let Some(parent) = path.parent() {
      let _ = fs::create_dir_all(parent);
    }

    match File::create(&path) {
      Ok(file) => {
        let writer = BufWriter::new(file);
        match serde_json::to_writer_pretty(writer, self) {
          Ok(_) => format!("Config saved to {:?}", path),
          Err(e) => format!("Failed to save config: {}", e),
        }
      }
      Err(e) => format!("Could not create config file: {}", e),
    }
  }

  pub fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "crystal-auditor", "crystal-auditor") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}
