// src/oxidation/bond_valence.rs
//
// Geometry-aware assignment: snap each site's bond valence sum to the
// nearest known oxidation state of the right sign.

use super::MethodRun;
use crate::config::ResolverConfig;
use crate::model::elements;
use crate::model::oxidation::Method;
use crate::model::structure::StructureRecord;
use crate::physics::bond_valence::site_bvs;
use crate::physics::neighbors::Geometry;
use crate::reference::ReferenceTables;

/// Anion flag per site.
///
/// An element is an anion when it has a negative known state and its
/// electronegativity is within `window` of the most electronegative
/// element present.
pub fn classify_roles(structure: &StructureRecord, window: f64) -> Option<Vec<bool>> {
    let max_chi = structure
        .composition()
        .keys()
        .filter_map(|el| elements::electronegativity(el))
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_chi.is_finite() {
        return None;
    }

    let is_anion = |el: &str| {
        elements::can_be_anion(el)
            && elements::electronegativity(el).is_some_and(|chi| chi >= max_chi - window)
    };

    Some(structure.sites.iter().map(|s| is_anion(&s.element)).collect())
}

pub fn assign(
    structure: &StructureRecord,
    geometry: &Geometry,
    tables: &ReferenceTables,
    config: &ResolverConfig,
) -> MethodRun {
    let n = structure.sites.len();

    let anion = match classify_roles(structure, config.anion_electronegativity_window) {
        Some(roles) => roles,
        None => return MethodRun::failed(Method::BondValence, n, "no electronegativity data"),
    };
    if anion.iter().all(|&a| a) || anion.iter().all(|&a| !a) {
        return MethodRun::failed(Method::BondValence, n, "no cation/anion split");
    }

    let states: Vec<Option<i32>> = (0..n)
        .map(|i| {
            let site_is_anion = anion[i];
            let bvs = site_bvs(
                structure,
                geometry,
                &tables.bond_valence,
                i,
                !site_is_anion,
                |j| anion[j] != site_is_anion,
            );
            if bvs.bonds == 0 {
                return None;
            }
            let signed = if site_is_anion { -bvs.sum } else { bvs.sum };
            snap(&structure.sites[i].element, signed, config.bv_snap_tolerance)
        })
        .collect();

    if states.iter().all(Option::is_some) {
        let net: i32 = states.iter().flatten().sum();
        if net != 0 {
            log::debug!("{}: bond valence states not neutral (net {:+})", structure.id, net);
            return MethodRun::failed(
                Method::BondValence,
                n,
                &format!("snapped states not charge balanced (net {:+})", net),
            );
        }
    }

    MethodRun::from_states(Method::BondValence, states, "no site within snap tolerance")
}

/// Nearest known state with the sign of `signed_bvs`, if close enough
fn snap(element: &str, signed_bvs: f64, tolerance: f64) -> Option<i32> {
    elements::known_oxidation_states(element)
        .iter()
        .copied()
        .filter(|&s| s != 0 && (s < 0) == (signed_bvs < 0.0))
        .map(|s| (s, (s as f64 - signed_bvs).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .filter(|(_, d)| *d <= tolerance)
        .map(|(s, _)| s)
}
