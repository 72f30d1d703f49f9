// src/physics/bond_valence/mod.rs

pub mod calculator;
pub mod database;

// Re-export commonly used items
pub use calculator::{global_instability_index, site_bvs, SiteBvs};
pub use database::{BVParam, BondValenceTable, STANDARD_B};
