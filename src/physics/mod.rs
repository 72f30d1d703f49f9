// src/physics/mod.rs
pub mod bond_valence;
pub mod neighbors;
pub mod radii;
