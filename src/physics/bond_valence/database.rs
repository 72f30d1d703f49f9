// src/physics/bond_valence/database.rs

use std::collections::HashMap;

/// Softness parameter used for every tabulated pair
pub const STANDARD_B: f64 = 0.37;

/// Bond Valence Parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BVParam {
    pub r0: f64, // Reference bond length (Å)
    pub b: f64,  // Softness parameter
}

impl BVParam {
    /// Brown-Altermatt bond valence: s = exp((R₀ - R) / B)
    pub fn valence(&self, distance: f64) -> f64 {
        ((self.r0 - distance) / self.b).exp()
    }
}

/// Cation-anion bond valence parameters.
///
/// Built once at start-up and shared read-only; keyed by
/// (cation element, anion element).
#[derive(Debug, Clone)]
pub struct BondValenceTable {
    params: HashMap<(String, String), BVParam>,
}

impl BondValenceTable {
    /// Embedded parameters for the most common pairs.
    /// Source: Brown & Altermatt (1985), Brese & O'Keeffe (1991)
    pub fn embedded() -> Self {
        let mut params = HashMap::new();
        load_embedded_params(&mut params);
        Self { params }
    }

    pub fn get(&self, cation: &str, anion: &str) -> Option<BVParam> {
        self.params.get(&(cation.to_string(), anion.to_string())).copied()
    }

    pub fn contains(&self, cation: &str, anion: &str) -> bool {
        self.get(cation, anion).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn load_embedded_params(db: &mut HashMap<(String, String), BVParam>) {
    macro_rules! add {
        ($cat:expr, $an:expr, $r0:expr) => {
            db.insert(($cat.into(), $an.into()), BVParam { r0: $r0, b: STANDARD_B });
        };
    }

    // === OXIDES (Most common in crystallography) ===

    // Group 1 (Alkali metals) with O
    add!("H", "O", 0.989);
    add!("Li", "O", 1.466);
    add!("Na", "O", 1.803);
    add!("K", "O", 2.132);
    add!("Rb", "O", 2.263);
    add!("Cs", "O", 2.417);

    // Group 2 (Alkaline earth) with O
    add!("Be", "O", 1.381);
    add!("Mg", "O", 1.693);
    add!("Ca", "O", 1.967);
    add!("Sr", "O", 2.118);
    add!("Ba", "O", 2.285);
    add!("Ra", "O", 2.420);

    // 3d Transition metals with O (critical for batteries, catalysts)
    add!("Sc", "O", 1.849);
    add!("Ti", "O", 1.815);
    add!("V", "O", 1.743);
    add!("Cr", "O", 1.724);
    add!("Mn", "O", 1.790);
    add!("Fe", "O", 1.759);
    add!("Co", "O", 1.692);
    add!("Ni", "O", 1.654);
    add!("Cu", "O", 1.679);
    add!("Zn", "O", 1.704);

    // 4d Transition metals with O
    add!("Y", "O", 2.019);
    add!("Zr", "O", 1.937);
    add!("Nb", "O", 1.911);
    add!("Mo", "O", 1.907);
    add!("Tc", "O", 1.859);
    add!("Ru", "O", 1.834);
    add!("Rh", "O", 1.812);
    add!("Pd", "O", 1.792);
    add!("Ag", "O", 1.842);
    add!("Cd", "O", 1.904);

    // 5d Transition metals with O
    add!("La", "O", 2.172);
    add!("Hf", "O", 1.923);
    add!("Ta", "O", 1.920);
    add!("W", "O", 1.921);
    add!("Re", "O", 1.891);
    add!("Os", "O", 1.856);
    add!("Ir", "O", 1.847);
    add!("Pt", "O", 1.837);
    add!("Au", "O", 1.833);
    add!("Hg", "O", 1.967);

    // p-block elements with O
    add!("B", "O", 1.371);
    add!("Al", "O", 1.651);
    add!("Ga", "O", 1.730);
    add!("In", "O", 1.902);
    add!("Tl", "O", 2.042);

    add!("C", "O", 1.394);
    add!("Si", "O", 1.624);
    add!("Ge", "O", 1.748);
    add!("Sn", "O", 1.905);
    add!("Pb", "O", 2.042);

    add!("N", "O", 1.432);
    add!("P", "O", 1.617);
    add!("As", "O", 1.767);
    add!("Sb", "O", 1.973);
    add!("Bi", "O", 2.094);

    add!("S", "O", 1.644);
    add!("Se", "O", 1.811);
    add!("Te", "O", 1.977);

    add!("Cl", "O", 1.674);
    add!("Br", "O", 1.849);
    add!("I", "O", 2.019);

    // === HALIDES (Important for ionic conductors) ===

    // With Fluorine
    add!("Li", "F", 1.360);
    add!("Na", "F", 1.677);
    add!("K", "F", 1.992);
    add!("Rb", "F", 2.150);
    add!("Cs", "F", 2.304);
    add!("Be", "F", 1.281);
    add!("Mg", "F", 1.578);
    add!("Ca", "F", 1.842);
    add!("Sr", "F", 1.993);
    add!("Ba", "F", 2.170);
    add!("Al", "F", 1.545);
    add!("Si", "F", 1.549);

    // With Chlorine
    add!("Li", "Cl", 1.949);
    add!("Na", "Cl", 2.237);
    add!("K", "Cl", 2.567);
    add!("Rb", "Cl", 2.715);
    add!("Cs", "Cl", 2.871);
    add!("Mg", "Cl", 2.107);
    add!("Ca", "Cl", 2.372);
    add!("Sr", "Cl", 2.527);
    add!("Ba", "Cl", 2.704);

    // With Bromine
    add!("Li", "Br", 2.117);
    add!("Na", "Br", 2.405);
    add!("K", "Br", 2.735);
    add!("Rb", "Br", 2.883);
    add!("Cs", "Br", 3.039);

    // With Iodine
    add!("Li", "I", 2.340);
    add!("Na", "I", 2.628);
    add!("K", "I", 2.958);
    add!("Rb", "I", 3.106);
    add!("Cs", "I", 3.262);

    // === RARE EARTH ELEMENTS (Phosphors, magnets) ===
    add!("La", "O", 2.172);
    add!("Ce", "O", 2.151);
    add!("Pr", "O", 2.134);
    add!("Nd", "O", 2.105);
    add!("Pm", "O", 2.086);
    add!("Sm", "O", 2.067);
    add!("Eu", "O", 2.074);
    add!("Gd", "O", 2.063);
    add!("Tb", "O", 2.038);
    add!("Dy", "O", 2.027);
    add!("Ho", "O", 2.010);
    add!("Er", "O", 1.997);
    add!("Tm", "O", 1.981);
    add!("Yb", "O", 1.985);
    add!("Lu", "O", 1.971);

    // === SULFIDES (Semiconductors, batteries) ===
    add!("Li", "S", 2.126);
    add!("Na", "S", 2.398);
    add!("K", "S", 2.778);
    add!("Mg", "S", 2.321);
    add!("Ca", "S", 2.597);
    add!("Fe", "S", 2.321);
    add!("Co", "S", 2.260);
    add!("Ni", "S", 2.222);
    add!("Cu", "S", 2.205);
    add!("Zn", "S", 2.272);

    // === NITRIDES (Hard materials, LEDs) ===
    add!("Li", "N", 1.756);
    add!("Mg", "N", 1.988);
    add!("Al", "N", 1.869);
    add!("Si", "N", 1.879);
    add!("Ti", "N", 2.041);
    add!("Ga", "N", 1.976);

    // === PHOSPHIDES (Semiconductors) ===
    add!("Li", "P", 2.362);
    add!("Na", "P", 2.649);
    add!("Ca", "P", 2.826);
    add!("Ga", "P", 2.265);
    add!("In", "P", 2.541);

    // === ACTINIDES (Nuclear materials) ===
    add!("Th", "O", 2.167);
    add!("U", "O", 2.051);
    add!("Np", "O", 2.035);
    add!("Pu", "O", 2.019);

    // === OXYHYDRIDE / NITRIDE EXTRAS ===
    add!("Ca", "N", 2.140);
    add!("Sr", "N", 2.270);
    add!("Ba", "N", 2.470);
    add!("Zr", "N", 2.110);
    add!("Ta", "N", 2.010);
    add!("Nb", "N", 2.060);
    add!("La", "N", 2.340);
    add!("Ca", "H", 1.450);
    add!("Sr", "H", 1.620);
    add!("Ba", "H", 1.880);
    add!("La", "F", 2.020);
    add!("Bi", "Cl", 2.480);
    add!("Bi", "F", 1.990);
    add!("Pb", "Cl", 2.447);
    add!("Sr", "Br", 2.680);
    add!("Ba", "Br", 2.880);
    add!("Ba", "S", 2.769);
    add!("Sr", "S", 2.590);
    add!("La", "S", 2.643);
    add!("Ti", "S", 2.240);
    add!("Mn", "S", 2.220);
    add!("Cu", "Se", 2.020);
}
