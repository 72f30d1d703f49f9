// src/model/symmetry.rs

use moyo::base::{AngleTolerance, Cell, Lattice};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

use crate::model::elements::get_atomic_number;
use crate::model::structure::StructureRecord;

/// Symmetry found from the atomic coordinates themselves
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedSymmetry {
    pub number: u16,
    pub symbol: String,
    pub crystal_system: String,
}

/// Run moyo on the record's cell.
///
/// Independent of the space group the record was labelled with, so the
/// two can be compared.
pub fn detect_space_group(structure: &StructureRecord, symprec: f64) -> Result<DetectedSymmetry, String> {
    let l = structure.lattice_matrix().map_err(|e| e.to_string())?;

    let lattice_mat = Matrix3::new(
        l[0][0], l[0][1], l[0][2],
        l[1][0], l[1][1], l[1][2],
        l[2][0], l[2][1], l[2][2],
    );

    let mut positions = Vec::with_capacity(structure.sites.len());
    let mut numbers = Vec::with_capacity(structure.sites.len());
    for site in &structure.sites {
        positions.push(Vector3::from(site.frac_coords));
        let z = get_atomic_number(&site.element).ok_or_else(|| format!("unknown element {}", site.element))?;
        numbers.push(z as i32);
    }

    let cell = Cell::new(Lattice::new(lattice_mat), positions, numbers);
    let dataset = MoyoDataset::new(&cell, symprec, AngleTolerance::Default, Setting::Spglib, true)
        .map_err(|e| format!("Symmetry search failed: {:?}", e))?;

    let number = u16::try_from(dataset.number).map_err(|_| format!("bad space group {}", dataset.number))?;

    Ok(DetectedSymmetry {
        number,
        symbol: symbol(number).unwrap_or("Unknown").to_string(),
        crystal_system: crystal_system(number).to_string(),
    })
}

/// Hermann-Mauguin symbol in the standard setting
pub fn symbol(number: u16) -> Option<&'static str> {
    match number {
        1..=230 => Some(SG_SYMBOLS[number as usize]),
        _ => None,
    }
}

pub fn crystal_system(number: u16) -> &'static str {
    match number {
        1..=2 => "Triclinic",
        3..=15 => "Monoclinic",
        16..=74 => "Orthorhombic",
        75..=142 => "Tetragonal",
        143..=167 => "Trigonal",
        168..=194 => "Hexagonal",
        195..=230 => "Cubic",
        _ => "Unknown",
    }
}

#[rustfmt::skip]
const SG_SYMBOLS: [&str; 231] = [
    "", "P1", "P-1", "P121", "P12_11", "C121", "P1m1", "P1c1", "C1m1", "C1c1",
    "P12/m1", "P12_1/m1", "C12/m1", "P12/c1", "P12_1/c1", "C12/c1", "P222", "P222_1", "P2_12_12", "P2_12_12_1",
    "C222_1", "C222", "F222", "I222", "I2_12_12_1", "Pmm2", "Pmc2_1", "Pcc2", "Pma2", "Pca2_1",
    "Pnc2", "Pmn2_1", "Pba2", "Pna2_1", "Pnn2", "Cmm2", "Cmc2_1", "Ccc2", "Amm2", "Aem2",
    "Ama2", "Aea2", "Fmm2", "Fdd2", "Imm2", "Iba2", "Ima2", "Pmmm", "Pnnn", "Pccm",
    "Pban", "Pmma", "Pnna", "Pmna", "Pcca", "Pbam", "Pccn", "Pbcm", "Pnnm", "Pmmn",
    "Pbcn", "Pbca", "Pnma", "Cmcm", "Cmce", "Cmmm", "Cccm", "Cmme", "Ccce", "Fmmm",
    "Fddd", "Immm", "Ibam", "Ibca", "Imma", "P4", "P4_1", "P4_2", "P4_3", "I4",
    "I4_1", "P-4", "I-4", "P4/m", "P4_2/m", "P4/n", "P4_2/n", "I4/m", "I4_1/a", "P422",
    "P42_12", "P4_122", "P4_12_12", "P4_222", "P4_22_12", "P4_322", "P4_32_12", "I422", "I4_122", "P4mm",
    "P4bm", "P4_2cm", "P4_2nm", "P4cc", "P4nc", "P4_2mc", "P4_2bc", "I4mm", "I4cm", "I4_1md",
    "I4_1cd", "P-42m", "P42c", "P-42_1m", "P-42_1c", "P-4m2", "P-4c2", "P-4b2", "P-4n2", "I-4m2",
    "I-4c2", "I-42m", "I-42d", "P4/mmm", "P4/mcc", "P4/nbm", "P4/nnc", "P4/mbm", "P4/mnc", "P4/nmm",
    "P4/ncc", "P4_2/mmc", "P4_2/mcm", "P4_2/nbc", "P4_2/nnm", "P4_2/mbc", "P4_2/mnm", "P4_2/nmc", "P4_2/ncm", "I4/mmm",
    "I4/mcm", "I4_1/amd", "I4_1/acd", "P3", "P3_1", "P3_2", "R3", "P-3", "R-3", "P312",
    "P321", "P3_112", "P3_121", "P3_212", "P3_221", "R32", "P3m1", "P31m", "P3c1", "P31c",
    "R3m", "R3c", "P-31m", "P-31c", "P-3m1", "P-3c1", "R-3m", "R-3c", "P6", "P6_1",
    "P6_5", "P6_2", "P6_4", "P6_3", "P-6", "P6/m", "P6_3/m", "P622", "P6_122", "P6_522",
    "P6_222", "P6_422", "P6_322", "P6mm", "P6cc", "P6_3cm", "P6_3mc", "P-6m2", "P-6c2", "P-62m",
    "P-62c", "P6/mmm", "P6/mcc", "P6_3/mcm", "P6_3/mmc", "P23", "F23", "I23", "P2_13", "I2_13",
    "Pm-3", "Pn-3", "Fm-3", "Fd-3", "Im-3", "Pa-3", "Ia-3", "P432", "P4_232", "F432",
    "F4_132", "I432", "P4_332", "P4_132", "I4_132", "P-43m", "F-43m", "I-43m", "P-43n", "F-43c",
    "I-43d", "Pm-3m", "Pn-3n", "Pm-3n", "Pn-3m", "Fm-3m", "Fm-3c", "Fd-3m", "Fd-3c", "Im-3m",
    "Ia-3d",
];
