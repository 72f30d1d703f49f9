// src/physics/radii.rs

use serde::Serialize;
use std::collections::HashMap;

/// Where a radius came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusSource {
    /// Tabulated for the requested coordination number
    Exact,
    /// Tabulated for the same ion at the closest coordination number
    NearestCn,
    /// Per-ion value independent of coordination
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusLookup {
    pub radius: f64,
    pub source: RadiusSource,
}

/// Shannon (1976) effective ionic radii, Acta Cryst. A32, 751-767.
///
/// Keyed by (element, oxidation state); each ion holds its tabulated
/// coordination numbers in ascending order.
#[derive(Debug, Clone)]
pub struct ShannonTable {
    by_ion: HashMap<(String, i32), Vec<(u8, f64)>>,
    fallback: HashMap<(String, i32), f64>,
}

impl ShannonTable {
    pub fn embedded() -> Self {
        let mut by_ion: HashMap<(String, i32), Vec<(u8, f64)>> = HashMap::new();
        load_shannon_radii(&mut by_ion);
        for entries in by_ion.values_mut() {
            entries.sort_by_key(|(cn, _)| *cn);
        }

        let mut fallback = HashMap::new();
        load_fallback_radii(&mut fallback);

        Self { by_ion, fallback }
    }

    /// Radius at exactly this coordination number
    pub fn exact(&self, element: &str, state: i32, cn: u8) -> Option<f64> {
        self.by_ion
            .get(&(element.to_string(), state))?
            .iter()
            .find(|(c, _)| *c == cn)
            .map(|(_, r)| *r)
    }

    /// Exact CN, else the nearest tabulated CN (lower wins a tie),
    /// else the coordination-independent fallback.
    pub fn lookup(&self, element: &str, state: i32, cn: usize) -> Option<RadiusLookup> {
        let key = (element.to_string(), state);

        if let Some(entries) = self.by_ion.get(&key) {
            let nearest = entries
                .iter()
                .min_by_key(|(c, _)| (*c as i64 - cn as i64).abs());
            if let Some(&(c, radius)) = nearest {
                let source = if c as usize == cn {
                    RadiusSource::Exact
                } else {
                    RadiusSource::NearestCn
                };
                return Some(RadiusLookup { radius, source });
            }
        }

        self.fallback.get(&key).map(|&radius| RadiusLookup {
            radius,
            source: RadiusSource::Fallback,
        })
    }

    /// First tabulated radius among `preferred` coordination numbers
    pub fn first_of(&self, element: &str, state: i32, preferred: &[u8]) -> Option<(u8, f64)> {
        preferred
            .iter()
            .find_map(|&cn| self.exact(element, state, cn).map(|r| (cn, r)))
    }

    pub fn ion_count(&self) -> usize {
        self.by_ion.len()
    }
}

fn load_shannon_radii(db: &mut HashMap<(String, i32), Vec<(u8, f64)>>) {
    macro_rules! add {
        ($el:expr, $ox:expr, $cn:expr, $r:expr) => {
            db.entry(($el.into(), $ox)).or_default().push(($cn, $r));
        };
    }

    // Alkali metals
    add!("Li", 1, 4, 0.59);
    add!("Li", 1, 6, 0.76);
    add!("Li", 1, 8, 0.92);
    add!("Na", 1, 4, 0.99);
    add!("Na", 1, 6, 1.02);
    add!("Na", 1, 8, 1.18);
    add!("Na", 1, 12, 1.39);
    add!("K", 1, 6, 1.38);
    add!("K", 1, 8, 1.51);
    add!("K", 1, 12, 1.64);
    add!("Rb", 1, 6, 1.52);
    add!("Rb", 1, 8, 1.61);
    add!("Rb", 1, 12, 1.72);
    add!("Cs", 1, 6, 1.67);
    add!("Cs", 1, 8, 1.74);
    add!("Cs", 1, 12, 1.88);

    // Alkaline earth
    add!("Be", 2, 4, 0.27);
    add!("Be", 2, 6, 0.45);
    add!("Mg", 2, 4, 0.57);
    add!("Mg", 2, 6, 0.72);
    add!("Mg", 2, 8, 0.89);
    add!("Ca", 2, 6, 1.00);
    add!("Ca", 2, 8, 1.12);
    add!("Ca", 2, 12, 1.34);
    add!("Sr", 2, 6, 1.18);
    add!("Sr", 2, 8, 1.26);
    add!("Sr", 2, 12, 1.44);
    add!("Ba", 2, 6, 1.35);
    add!("Ba", 2, 8, 1.42);
    add!("Ba", 2, 12, 1.61);

    // 3d transition metals
    add!("Ti", 3, 6, 0.67);
    add!("Ti", 4, 4, 0.42);
    add!("Ti", 4, 6, 0.605);
    add!("V", 3, 6, 0.64);
    add!("V", 4, 6, 0.58);
    add!("V", 5, 4, 0.355);
    add!("V", 5, 6, 0.54);
    add!("Cr", 3, 6, 0.615);
    add!("Cr", 6, 4, 0.26);
    add!("Cr", 6, 6, 0.44);
    add!("Mn", 2, 6, 0.83);
    add!("Mn", 3, 6, 0.645);
    add!("Mn", 4, 6, 0.53);
    add!("Fe", 2, 4, 0.63);
    add!("Fe", 2, 6, 0.78);
    add!("Fe", 3, 4, 0.49);
    add!("Fe", 3, 6, 0.645);
    add!("Co", 2, 6, 0.745);
    add!("Co", 3, 6, 0.61);
    add!("Co", 4, 6, 0.53);
    add!("Ni", 2, 4, 0.55);
    add!("Ni", 2, 6, 0.69);
    add!("Ni", 3, 6, 0.56);
    add!("Cu", 1, 4, 0.60);
    add!("Cu", 2, 4, 0.57);
    add!("Cu", 2, 6, 0.73);
    add!("Zn", 2, 4, 0.60);
    add!("Zn", 2, 6, 0.74);

    // 4d transition metals
    add!("Zr", 4, 6, 0.72);
    add!("Zr", 4, 8, 0.84);
    add!("Nb", 5, 6, 0.64);
    add!("Nb", 4, 6, 0.68);
    add!("Mo", 4, 6, 0.65);
    add!("Mo", 6, 4, 0.41);
    add!("Mo", 6, 6, 0.59);
    add!("Ru", 4, 6, 0.62);
    add!("Ru", 3, 6, 0.68);
    add!("Ru", 5, 6, 0.565);
    add!("Rh", 3, 6, 0.665);
    add!("Rh", 4, 6, 0.60);
    add!("Pd", 2, 4, 0.64);
    add!("Pd", 4, 6, 0.615);
    add!("Ag", 1, 4, 1.00);
    add!("Ag", 1, 6, 1.15);
    add!("Cd", 2, 6, 0.95);
    add!("Cd", 2, 8, 1.10);

    // 5d transition metals
    add!("Hf", 4, 6, 0.71);
    add!("Hf", 4, 8, 0.83);
    add!("Ta", 5, 6, 0.64);
    add!("Ta", 4, 6, 0.68);
    add!("W", 4, 6, 0.66);
    add!("W", 6, 4, 0.42);
    add!("W", 6, 6, 0.60);
    add!("Re", 4, 6, 0.63);
    add!("Re", 7, 6, 0.53);
    add!("Os", 4, 6, 0.63);
    add!("Os", 6, 6, 0.545);
    add!("Ir", 3, 6, 0.68);
    add!("Ir", 4, 6, 0.625);
    add!("Ir", 5, 6, 0.57);
    add!("Pt", 2, 4, 0.60);
    add!("Pt", 4, 6, 0.625);
    add!("Au", 1, 6, 1.37);
    add!("Au", 3, 4, 0.68);
    add!("Au", 3, 6, 0.85);

    // Post-transition metals
    add!("Al", 3, 4, 0.39);
    add!("Al", 3, 6, 0.535);
    add!("Ga", 3, 4, 0.47);
    add!("Ga", 3, 6, 0.62);
    add!("In", 3, 6, 0.80);
    add!("In", 3, 8, 0.92);
    add!("Sn", 2, 6, 0.93);
    add!("Sn", 4, 6, 0.69);
    add!("Tl", 1, 6, 1.50);
    add!("Tl", 3, 6, 0.885);
    add!("Pb", 2, 6, 1.19);
    add!("Pb", 2, 8, 1.29);
    add!("Pb", 4, 6, 0.775);
    add!("Bi", 3, 6, 1.03);
    add!("Bi", 5, 6, 0.76);
    add!("Sb", 3, 6, 0.76);
    add!("Sb", 5, 6, 0.60);

    // Rare earths
    add!("Sc", 3, 6, 0.745);
    add!("Sc", 3, 8, 0.87);
    add!("Y", 3, 6, 0.90);
    add!("Y", 3, 8, 1.019);
    add!("La", 3, 6, 1.032);
    add!("La", 3, 8, 1.16);
    add!("La", 3, 12, 1.36);
    add!("Ce", 3, 6, 1.01);
    add!("Ce", 4, 6, 0.87);
    add!("Ce", 4, 8, 0.97);
    add!("Pr", 3, 6, 0.99);
    add!("Pr", 4, 6, 0.85);
    add!("Nd", 3, 6, 0.983);
    add!("Nd", 3, 8, 1.109);
    add!("Sm", 3, 6, 0.958);
    add!("Sm", 3, 8, 1.079);
    add!("Eu", 2, 6, 1.17);
    add!("Eu", 3, 6, 0.947);
    add!("Gd", 3, 6, 0.938);
    add!("Gd", 3, 8, 1.053);
    add!("Tb", 3, 6, 0.923);
    add!("Tb", 4, 6, 0.76);
    add!("Dy", 3, 6, 0.912);
    add!("Dy", 3, 8, 1.027);
    add!("Ho", 3, 6, 0.901);
    add!("Ho", 3, 8, 1.015);
    add!("Er", 3, 6, 0.89);
    add!("Er", 3, 8, 1.004);
    add!("Tm", 3, 6, 0.88);
    add!("Tm", 3, 8, 0.994);
    add!("Yb", 2, 6, 1.02);
    add!("Yb", 3, 6, 0.868);
    add!("Lu", 3, 6, 0.861);
    add!("Lu", 3, 8, 0.977);

    // Actinides
    add!("Th", 4, 6, 0.94);
    add!("Th", 4, 8, 1.05);
    add!("U", 4, 6, 0.89);
    add!("U", 6, 6, 0.73);
    add!("Ac", 3, 6, 1.12);

    // Anions
    add!("O", -2, 2, 1.35);
    add!("O", -2, 3, 1.36);
    add!("O", -2, 4, 1.38);
    add!("O", -2, 6, 1.40);

    // Halogens
    add!("F", -1, 4, 1.31);
    add!("F", -1, 6, 1.33);
    add!("Cl", -1, 6, 1.81);
    add!("Cl", 7, 4, 0.08);
    add!("Br", -1, 6, 1.96);
    add!("Br", 5, 6, 0.31);
    add!("I", -1, 6, 2.20);
    add!("I", 5, 6, 0.95);
    add!("I", 7, 6, 0.53);

    // Chalcogenides
    add!("S", -2, 6, 1.84);
    add!("S", 6, 4, 0.12);
    add!("S", 6, 6, 0.29);
    add!("Se", -2, 6, 1.98);
    add!("Se", 4, 6, 0.50);
    add!("Se", 6, 6, 0.42);
    add!("Te", -2, 6, 2.21);
    add!("Te", 4, 6, 0.97);
    add!("Te", 6, 6, 0.56);

    // Metalloids
    add!("Si", 4, 4, 0.26);
    add!("Si", 4, 6, 0.40);
    add!("Ge", 4, 4, 0.39);
    add!("Ge", 4, 6, 0.53);
    add!("As", 3, 6, 0.58);
    add!("As", 5, 4, 0.335);
    add!("As", 5, 6, 0.46);
    add!("P", 3, 6, 0.44);
    add!("P", 5, 4, 0.17);
    add!("P", 5, 6, 0.38);
    add!("B", 3, 4, 0.11);
    add!("B", 3, 6, 0.27);
    add!("N", -3, 4, 1.46);
    add!("N", 3, 6, 0.16);
    add!("N", 5, 6, 0.13);
    add!("C", 4, 6, 0.16);
}

/// Six-coordinate values for ions missing from the main table
fn load_fallback_radii(db: &mut HashMap<(String, i32), f64>) {
    macro_rules! add {
        ($el:expr, $ox:expr, $r:expr) => {
            db.insert(($el.into(), $ox), $r);
        };
    }

    add!("Ti", 2, 0.86);
    add!("V", 2, 0.79);
    add!("Cr", 2, 0.80);
    add!("Cr", 4, 0.55);
    add!("Cr", 5, 0.49);
    add!("Mn", 7, 0.46);
    add!("Fe", 4, 0.585);
    add!("Ni", 4, 0.48);
    add!("Cu", 1, 0.77);
    add!("Cu", 3, 0.54);
    add!("Nb", 3, 0.72);
    add!("Mo", 3, 0.69);
    add!("Mo", 5, 0.61);
    add!("Tc", 4, 0.645);
    add!("Rh", 5, 0.55);
    add!("Pd", 3, 0.76);
    add!("Ag", 2, 0.94);
    add!("Ag", 3, 0.75);
    add!("Ta", 3, 0.72);
    add!("W", 5, 0.62);
    add!("Re", 5, 0.58);
    add!("Re", 6, 0.55);
    add!("Os", 5, 0.575);
    add!("Pt", 5, 0.57);
    add!("Hg", 1, 1.19);
    add!("Hg", 2, 1.02);
    add!("Ga", 1, 1.13);
    add!("Ge", 2, 0.73);
    add!("In", 1, 1.40);
    add!("Sm", 2, 1.22);
    add!("Tm", 2, 1.03);
    add!("Pa", 5, 0.78);
    add!("U", 3, 1.025);
    add!("U", 5, 0.76);
    add!("Np", 4, 0.87);
    add!("Np", 5, 0.75);
    add!("Pu", 3, 1.00);
    add!("Pu", 4, 0.86);
    add!("Am", 3, 0.975);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_then_nearest_then_fallback() {
        let table = ShannonTable::embedded();

        let ti = table.lookup("Ti", 4, 6).unwrap();
        assert_eq!(ti.source, RadiusSource::Exact);
        assert!((ti.radius - 0.605).abs() < 1e-12);

        // Sr2+ is tabulated at 6, 8 and 12; CN 11 snaps to 12
        let sr = table.lookup("Sr", 2, 11).unwrap();
        assert_eq!(sr.source, RadiusSource::NearestCn);
        assert!((sr.radius - 1.44).abs() < 1e-12);

        let hg = table.lookup("Hg", 2, 4).unwrap();
        assert_eq!(hg.source, RadiusSource::Fallback);

        assert!(table.lookup("Xe", 8, 6).is_none());
    }

    #[test]
    fn nearest_cn_prefers_lower_on_tie() {
        let table = ShannonTable::embedded();
        // Mg2+ at 4, 6, 8: CN 7 is equidistant from 6 and 8
        let mg = table.lookup("Mg", 2, 7).unwrap();
        assert!((mg.radius - 0.72).abs() < 1e-12);
    }

    #[test]
    fn preferred_coordination_order() {
        let table = ShannonTable::embedded();
        assert_eq!(table.first_of("Sr", 2, &[12, 8, 6]), Some((12, 1.44)));
        assert_eq!(table.first_of("Ti", 4, &[12, 8, 6]), Some((6, 0.605)));
        assert_eq!(table.first_of("Ti", 4, &[]), None);
    }
}
