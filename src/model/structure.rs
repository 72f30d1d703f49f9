// src/model/structure.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::StructureError;
use crate::model::elements;
use crate::utils::linalg;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub element: String,
    pub frac_coords: [f64; 3],
    // Wyckoff label from the symmetrized source, when the ingester kept it
    #[serde(default)]
    pub wyckoff: Option<String>,
}

impl Site {
    pub fn new(element: &str, frac_coords: [f64; 3]) -> Self {
        Self {
            element: element.to_string(),
            frac_coords,
            wyckoff: None,
        }
    }
}

/// Cell parameters: lengths in Angstrom, angles in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl LatticeParams {
    pub fn cubic(a: f64) -> Self {
        Self {
            a,
            b: a,
            c: a,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
        }
    }

    /// Lattice vectors as rows: a along x, b in the xy-plane.
    ///
    /// Returns an error string for degenerate parameters.
    pub fn matrix(&self) -> Result<[[f64; 3]; 3], String> {
        for (name, v) in [("a", self.a), ("b", self.b), ("c", self.c)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(format!("length {} = {}", name, v));
            }
        }
        for (name, v) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !v.is_finite() || v <= 0.0 || v >= 180.0 {
                return Err(format!("angle {} = {}", name, v));
            }
        }

        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        let sg = self.gamma.to_radians().sin();

        let cy = (ca - cb * cg) / sg;
        let cz2 = 1.0 - cb * cb - cy * cy;
        if cz2 <= 1e-10 {
            return Err("angles do not span a volume".to_string());
        }

        Ok([
            [self.a, 0.0, 0.0],
            [self.b * cg, self.b * sg, 0.0],
            [self.c * cb, self.c * cy, self.c * cz2.sqrt()],
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpaceGroup {
    pub number: u16,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Chemical family tag assigned by the ingestion collaborator.
///
/// An untagged record is `Other`, so oxide-only reference values are
/// never applied to it without a caveat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundClass {
    PureOxide,
    Oxyhalide,
    Oxychalcogenide,
    Oxynitride,
    Oxyhydride,
    #[default]
    Other,
}

impl CompoundClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundClass::PureOxide => "pure_oxide",
            CompoundClass::Oxyhalide => "oxyhalide",
            CompoundClass::Oxychalcogenide => "oxychalcogenide",
            CompoundClass::Oxynitride => "oxynitride",
            CompoundClass::Oxyhydride => "oxyhydride",
            CompoundClass::Other => "other",
        }
    }
}

impl fmt::Display for CompoundClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ratio patterns of ternary oxides (cation counts ascending, then O)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OxideType {
    ABO3,
    AB2O4,
    A2BO4,
    ABO2,
    A2B2O7,
    AB2O6,
    A2BO3,
    Other,
}

const OXIDE_TYPE_RATIOS: [((u64, u64, u64), OxideType); 7] = [
    ((1, 1, 3), OxideType::ABO3),
    ((1, 2, 4), OxideType::AB2O4),
    ((2, 1, 4), OxideType::A2BO4),
    ((1, 1, 2), OxideType::ABO2),
    ((2, 2, 7), OxideType::A2B2O7),
    ((1, 2, 6), OxideType::AB2O6),
    ((2, 1, 3), OxideType::A2BO3),
];

/// Smallest cell volume per site accepted as a physical structure (Å³)
pub const MIN_VOLUME_PER_SITE: f64 = 2.0;

/// Smallest spacing between lattice planes accepted (Å)
pub const MIN_PLANE_SPACING: f64 = 0.5;

/// One predicted crystal structure. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub id: String,
    pub sites: Vec<Site>,
    #[serde(default)]
    pub lattice: Option<LatticeParams>,
    #[serde(default)]
    pub space_group: Option<SpaceGroup>,
    #[serde(default)]
    pub compound_class: CompoundClass,
}

impl StructureRecord {
    /// Shape check run before any resolution or validation
    pub fn validate(&self) -> Result<(), StructureError> {
        let lattice = self.lattice.as_ref().ok_or_else(|| StructureError::MissingLattice {
            id: self.id.clone(),
        })?;
        let matrix = lattice
            .matrix()
            .map_err(|reason| StructureError::DegenerateLattice {
                id: self.id.clone(),
                reason,
            })?;

        if self.sites.is_empty() {
            return Err(StructureError::NoSites { id: self.id.clone() });
        }
        self.check_cell_size(matrix)?;

        for (i, site) in self.sites.iter().enumerate() {
            if !elements::is_known_element(&site.element) {
                return Err(StructureError::UnknownElement {
                    id: self.id.clone(),
                    site: i,
                    element: site.element.clone(),
                });
            }
            if site.frac_coords.iter().any(|c| !c.is_finite()) {
                return Err(StructureError::InvalidCoordinates {
                    id: self.id.clone(),
                    site: i,
                });
            }
        }

        if let Some(sg) = &self.space_group {
            if !(1..=230).contains(&sg.number) {
                return Err(StructureError::InvalidSpaceGroup {
                    id: self.id.clone(),
                    number: sg.number,
                });
            }
        }

        Ok(())
    }

    /// Rejects cells too small for the sites they hold. A neighbor list over
    /// such a cell grows with (cutoff / a)³ and never finishes.
    fn check_cell_size(&self, matrix: [[f64; 3]; 3]) -> Result<(), StructureError> {
        let implausible = |reason: String| StructureError::ImplausibleCell {
            id: self.id.clone(),
            reason,
        };

        let per_site = linalg::cell_volume(matrix) / self.sites.len() as f64;
        if per_site < MIN_VOLUME_PER_SITE {
            return Err(implausible(format!(
                "{:.3} Å³ per site, minimum {}",
                per_site, MIN_VOLUME_PER_SITE
            )));
        }

        let spacings = linalg::plane_spacings(matrix)
            .ok_or_else(|| implausible("singular lattice matrix".to_string()))?;
        if let Some(d) = spacings.into_iter().find(|&d| d < MIN_PLANE_SPACING) {
            return Err(implausible(format!(
                "lattice plane spacing {:.3} Å, minimum {}",
                d, MIN_PLANE_SPACING
            )));
        }
        Ok(())
    }

    /// Lattice rows, or the error `validate` would have raised
    pub fn lattice_matrix(&self) -> Result<[[f64; 3]; 3], StructureError> {
        let lattice = self.lattice.as_ref().ok_or_else(|| StructureError::MissingLattice {
            id: self.id.clone(),
        })?;
        lattice
            .matrix()
            .map_err(|reason| StructureError::DegenerateLattice {
                id: self.id.clone(),
                reason,
            })
    }

    pub fn cartesian_positions(&self) -> Result<Vec<[f64; 3]>, StructureError> {
        let lattice = self.lattice_matrix()?;
        Ok(self
            .sites
            .iter()
            .map(|s| linalg::frac_to_cart(s.frac_coords, lattice))
            .collect())
    }

    /// Site count per element
    pub fn composition(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for site in &self.sites {
            *counts.entry(site.element.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Composition divided by the GCD of its counts
    pub fn reduced_composition(&self) -> BTreeMap<String, u64> {
        let counts = self.composition();
        let divisor = counts.values().copied().fold(0, gcd);
        if divisor <= 1 {
            return counts;
        }
        counts.into_iter().map(|(el, n)| (el, n / divisor)).collect()
    }

    /// Sorted elements joined with '-', e.g. "Ca-O-Ti"
    pub fn chemsys(&self) -> String {
        self.composition().keys().cloned().collect::<Vec<_>>().join("-")
    }

    pub fn reduced_formula(&self) -> String {
        self.reduced_composition()
            .iter()
            .map(|(el, n)| if *n == 1 { el.clone() } else { format!("{}{}", el, n) })
            .collect()
    }

    /// Ternary-oxide stoichiometry class
    pub fn oxide_type(&self) -> OxideType {
        let counts = self.reduced_composition();
        let o_count = match counts.get("O") {
            Some(&n) if n > 0 => n,
            _ => return OxideType::Other,
        };

        let mut cations: Vec<u64> = counts
            .iter()
            .filter(|(el, _)| el.as_str() != "O")
            .map(|(_, &n)| n)
            .collect();
        if cations.len() != 2 {
            return OxideType::Other;
        }
        cations.sort_unstable();

        let divisor = gcd(gcd(cations[0], cations[1]), o_count);
        let key = (cations[0] / divisor, cations[1] / divisor, o_count / divisor);

        OXIDE_TYPE_RATIOS
            .iter()
            .find(|(ratio, _)| *ratio == key)
            .map(|(_, t)| *t)
            .unwrap_or(OxideType::Other)
    }

    pub fn has_element(&self, element: &str) -> bool {
        self.sites.iter().any(|s| s.element == element)
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Rock-salt NaCl, conventional cell (4 formula units)
    pub fn rock_salt() -> StructureRecord {
        let na = [[0.0, 0.0, 0.0], [0.5, 0.5, 0.0], [0.5, 0.0, 0.5], [0.0, 0.5, 0.5]];
        let cl = [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5], [0.5, 0.5, 0.5]];
        let mut sites: Vec<Site> = na.iter().map(|p| Site::new("Na", *p)).collect();
        sites.extend(cl.iter().map(|p| Site::new("Cl", *p)));
        StructureRecord {
            id: "nacl".into(),
            sites,
            lattice: Some(LatticeParams::cubic(5.64)),
            space_group: Some(SpaceGroup {
                number: 225,
                symbol: Some("Fm-3m".into()),
            }),
            compound_class: CompoundClass::Other,
        }
    }

    /// Cubic SrTiO3 perovskite
    pub fn perovskite() -> StructureRecord {
        StructureRecord {
            id: "srtio3".into(),
            sites: vec![
                Site::new("Sr", [0.0, 0.0, 0.0]),
                Site::new("Ti", [0.5, 0.5, 0.5]),
                Site::new("O", [0.5, 0.5, 0.0]),
                Site::new("O", [0.5, 0.0, 0.5]),
                Site::new("O", [0.0, 0.5, 0.5]),
            ],
            lattice: Some(LatticeParams::cubic(3.905)),
            space_group: Some(SpaceGroup {
                number: 221,
                symbol: Some("Pm-3m".into()),
            }),
            compound_class: CompoundClass::PureOxide,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn validate_rejects_malformed_records() {
        let mut rec = perovskite();
        rec.lattice = None;
        assert!(matches!(rec.validate(), Err(StructureError::MissingLattice { .. })));

        let mut rec = perovskite();
        rec.sites.clear();
        assert!(matches!(rec.validate(), Err(StructureError::NoSites { .. })));

        let mut rec = perovskite();
        rec.sites[0].element = "Xx".into();
        assert!(matches!(
            rec.validate(),
            Err(StructureError::UnknownElement { site: 0, .. })
        ));

        let mut rec = perovskite();
        rec.space_group = Some(SpaceGroup { number: 231, symbol: None });
        assert!(matches!(rec.validate(), Err(StructureError::InvalidSpaceGroup { .. })));

        let mut rec = perovskite();
        rec.lattice = Some(LatticeParams { alpha: 180.0, ..LatticeParams::cubic(4.0) });
        assert!(matches!(rec.validate(), Err(StructureError::DegenerateLattice { .. })));
    }

    #[test]
    fn validate_rejects_collapsed_cells() {
        // Two sites in a 0.2 Å cube
        let mut rec = perovskite();
        rec.sites.truncate(2);
        rec.lattice = Some(LatticeParams::cubic(0.2));
        assert!(matches!(rec.validate(), Err(StructureError::ImplausibleCell { .. })));

        // Enough volume, but one axis squashed flat
        let mut rec = perovskite();
        rec.lattice = Some(LatticeParams {
            c: 0.3,
            ..LatticeParams::cubic(20.0)
        });
        let err = rec.validate().unwrap_err();
        assert!(err.to_string().contains("plane spacing"), "{}", err);

        let mut rec = perovskite();
        rec.lattice = Some(LatticeParams::cubic(2.8));
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn untagged_record_is_not_assumed_oxide() {
        let json = r#"{"id":"nacl","sites":[{"element":"Na","frac_coords":[0,0,0]},{"element":"Cl","frac_coords":[0.5,0.5,0.5]}],"lattice":{"a":5.64,"b":5.64,"c":5.64,"alpha":90,"beta":90,"gamma":90}}"#;
        let rec: StructureRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.compound_class, CompoundClass::Other);

        let tagged = json.replace(r#""id":"nacl""#, r#""id":"nacl","compound_class":"pure_oxide""#);
        let rec: StructureRecord = serde_json::from_str(&tagged).unwrap();
        assert_eq!(rec.compound_class, CompoundClass::PureOxide);
    }

    #[test]
    fn unassigned_space_group_is_valid() {
        let mut rec = perovskite();
        rec.space_group = None;
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn composition_views() {
        let rec = perovskite();
        assert_eq!(rec.chemsys(), "O-Sr-Ti");
        assert_eq!(rec.reduced_formula(), "O3SrTi");
        assert_eq!(rec.oxide_type(), OxideType::ABO3);
        assert_eq!(rock_salt().oxide_type(), OxideType::Other);
        assert_eq!(rock_salt().reduced_composition().get("Na"), Some(&1));
    }

    #[test]
    fn hexagonal_matrix() {
        let lat = LatticeParams {
            a: 3.0,
            b: 3.0,
            c: 5.0,
            alpha: 90.0,
            beta: 90.0,
            gamma: 120.0,
        };
        let m = lat.matrix().unwrap();
        assert!((m[1][0] + 1.5).abs() < 1e-10);
        assert!((m[2][2] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn compound_class_serializes_snake_case() {
        let json = serde_json::to_string(&CompoundClass::PureOxide).unwrap();
        assert_eq!(json, "\"pure_oxide\"");
    }
}
