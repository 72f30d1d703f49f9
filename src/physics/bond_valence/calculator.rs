// src/physics/bond_valence/calculator.rs

use super::database::BondValenceTable;
use crate::model::structure::StructureRecord;
use crate::physics::neighbors::Geometry;

/// Bond valence sum of one site over its heteropolar neighbors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteBvs {
    /// Unsigned sum Σ exp((R₀ - R) / B)
    pub sum: f64,
    pub bonds: usize,
    pub missing_params: usize,
}

/// Bond Valence Sum for a single site
///
/// **Formula**: BVS = Σ exp((R₀ - R) / B)
///
/// Only neighbors accepted by `is_counter_ion` contribute, so cation-cation
/// and anion-anion contacts never count. `site_is_cation` orients the
/// (cation, anion) parameter lookup.
///
/// **Reference**: Brown & Altermatt (1985) Acta Cryst. B41, 244-247
pub fn site_bvs<F>(
    structure: &StructureRecord,
    geometry: &Geometry,
    table: &BondValenceTable,
    site: usize,
    site_is_cation: bool,
    is_counter_ion: F,
) -> SiteBvs
where
    F: Fn(usize) -> bool,
{
    let element = &structure.sites[site].element;
    let mut out = SiteBvs {
        sum: 0.0,
        bonds: 0,
        missing_params: 0,
    };

    for n in geometry.filtered(site, is_counter_ion) {
        let other = &structure.sites[n.site].element;
        let param = if site_is_cation {
            table.get(element, other)
        } else {
            table.get(other, element)
        };

        match param {
            // Only chemically reasonable parameters (R₀ > 0.5 Å)
            Some(p) if p.r0 > 0.5 => {
                out.sum += p.valence(n.distance);
                out.bonds += 1;
            }
            _ => out.missing_params += 1,
        }
    }

    out
}

/// Global instability index: RMS of (BVS - formal valence) over sites
pub fn global_instability_index(deviations: &[f64]) -> Option<f64> {
    if deviations.is_empty() {
        return None;
    }
    let sum_sq: f64 = deviations.iter().map(|d| d * d).sum();
    Some((sum_sq / deviations.len() as f64).sqrt())
}
