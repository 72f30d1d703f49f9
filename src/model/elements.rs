// src/model/elements.rs

/// One row of the periodic table as used by the auditor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub symbol: &'static str,
    pub z: u8,
    /// Pauling electronegativity, `None` for noble gases and superheavies
    pub electronegativity: Option<f64>,
    /// Known oxidation states, most common first
    pub oxidation_states: &'static [i32],
}

macro_rules! el {
    ($sym:expr, $z:expr, none, [$($ox:expr),*]) => {
        ElementData { symbol: $sym, z: $z, electronegativity: None, oxidation_states: &[$($ox),*] }
    };
    ($sym:expr, $z:expr, $chi:expr, [$($ox:expr),*]) => {
        ElementData { symbol: $sym, z: $z, electronegativity: Some($chi), oxidation_states: &[$($ox),*] }
    };
}

/// Fixed lookup table, ordered by atomic number
pub const PERIODIC_TABLE: [ElementData; 118] = [
    // --- Period 1 ---
    el!("H", 1, 2.20, [1, -1]),
    el!("He", 2, none, []),
    // --- Period 2 ---
    el!("Li", 3, 0.98, [1]),
    el!("Be", 4, 1.57, [2]),
    el!("B", 5, 2.04, [3]),
    el!("C", 6, 2.55, [4, -4, 2]),
    el!("N", 7, 3.04, [-3, 3, 5]),
    el!("O", 8, 3.44, [-2]),
    el!("F", 9, 3.98, [-1]),
    el!("Ne", 10, none, []),
    // --- Period 3 ---
    el!("Na", 11, 0.93, [1]),
    el!("Mg", 12, 1.31, [2]),
    el!("Al", 13, 1.61, [3]),
    el!("Si", 14, 1.90, [4, -4]),
    el!("P", 15, 2.19, [5, 3, -3]),
    el!("S", 16, 2.58, [-2, 6, 4]),
    el!("Cl", 17, 3.16, [-1, 7, 5, 3, 1]),
    el!("Ar", 18, none, []),
    // --- Period 4 ---
    el!("K", 19, 0.82, [1]),
    el!("Ca", 20, 1.00, [2]),
    el!("Sc", 21, 1.36, [3]),
    el!("Ti", 22, 1.54, [4, 3, 2]),
    el!("V", 23, 1.63, [5, 4, 3, 2]),
    el!("Cr", 24, 1.66, [3, 6, 2, 4]),
    el!("Mn", 25, 1.55, [2, 3, 4, 7, 6]),
    el!("Fe", 26, 1.83, [3, 2]),
    el!("Co", 27, 1.88, [2, 3, 4]),
    el!("Ni", 28, 1.91, [2, 3, 4]),
    el!("Cu", 29, 1.90, [2, 1, 3]),
    el!("Zn", 30, 1.65, [2]),
    el!("Ga", 31, 1.81, [3]),
    el!("Ge", 32, 2.01, [4, 2, -4]),
    el!("As", 33, 2.18, [5, 3, -3]),
    el!("Se", 34, 2.55, [-2, 4, 6]),
    el!("Br", 35, 2.96, [-1, 5, 7, 1, 3]),
    el!("Kr", 36, 3.00, [2]),
    // --- Period 5 ---
    el!("Rb", 37, 0.82, [1]),
    el!("Sr", 38, 0.95, [2]),
    el!("Y", 39, 1.22, [3]),
    el!("Zr", 40, 1.33, [4]),
    el!("Nb", 41, 1.60, [5, 4, 3]),
    el!("Mo", 42, 2.16, [6, 4, 5, 3]),
    el!("Tc", 43, 1.90, [7, 4]),
    el!("Ru", 44, 2.20, [4, 3, 5, 6, 8]),
    el!("Rh", 45, 2.28, [3, 4]),
    el!("Pd", 46, 2.20, [2, 4]),
    el!("Ag", 47, 1.93, [1, 2]),
    el!("Cd", 48, 1.69, [2]),
    el!("In", 49, 1.78, [3, 1]),
    el!("Sn", 50, 1.96, [4, 2]),
    el!("Sb", 51, 2.05, [5, 3, -3]),
    el!("Te", 52, 2.10, [-2, 4, 6]),
    el!("I", 53, 2.66, [-1, 5, 7, 1]),
    el!("Xe", 54, 2.60, [2, 4, 6]),
    // --- Period 6 ---
    el!("Cs", 55, 0.79, [1]),
    el!("Ba", 56, 0.89, [2]),
    el!("La", 57, 1.10, [3]),
    el!("Ce", 58, 1.12, [3, 4]),
    el!("Pr", 59, 1.13, [3, 4]),
    el!("Nd", 60, 1.14, [3]),
    el!("Pm", 61, 1.13, [3]),
    el!("Sm", 62, 1.17, [3, 2]),
    el!("Eu", 63, 1.20, [3, 2]),
    el!("Gd", 64, 1.20, [3]),
    el!("Tb", 65, 1.10, [3, 4]),
    el!("Dy", 66, 1.22, [3]),
    el!("Ho", 67, 1.23, [3]),
    el!("Er", 68, 1.24, [3]),
    el!("Tm", 69, 1.25, [3, 2]),
    el!("Yb", 70, 1.10, [3, 2]),
    el!("Lu", 71, 1.27, [3]),
    el!("Hf", 72, 1.30, [4]),
    el!("Ta", 73, 1.50, [5, 4]),
    el!("W", 74, 2.36, [6, 4, 5]),
    el!("Re", 75, 1.90, [7, 4, 6, 5]),
    el!("Os", 76, 2.20, [4, 6, 8]),
    el!("Ir", 77, 2.20, [4, 3, 5]),
    el!("Pt", 78, 2.28, [4, 2]),
    el!("Au", 79, 2.54, [3, 1]),
    el!("Hg", 80, 2.00, [2, 1]),
    el!("Tl", 81, 1.62, [1, 3]),
    el!("Pb", 82, 2.33, [2, 4]),
    el!("Bi", 83, 2.02, [3, 5]),
    el!("Po", 84, 2.00, [4, 2]),
    el!("At", 85, 2.20, [-1, 1]),
    el!("Rn", 86, none, []),
    // --- Period 7 ---
    el!("Fr", 87, 0.70, [1]),
    el!("Ra", 88, 0.90, [2]),
    el!("Ac", 89, 1.10, [3]),
    el!("Th", 90, 1.30, [4]),
    el!("Pa", 91, 1.50, [5, 4]),
    el!("U", 92, 1.38, [6, 4, 5, 3]),
    el!("Np", 93, 1.36, [5, 4, 6, 3]),
    el!("Pu", 94, 1.28, [4, 3, 5, 6]),
    el!("Am", 95, 1.30, [3, 4]),
    el!("Cm", 96, 1.30, [3]),
    el!("Bk", 97, 1.30, [3, 4]),
    el!("Cf", 98, 1.30, [3]),
    el!("Es", 99, 1.30, [3]),
    el!("Fm", 100, 1.30, [3]),
    el!("Md", 101, 1.30, [3, 2]),
    el!("No", 102, 1.30, [2, 3]),
    el!("Lr", 103, 1.30, [3]),
    el!("Rf", 104, none, []),
    el!("Db", 105, none, []),
    el!("Sg", 106, none, []),
    el!("Bh", 107, none, []),
    el!("Hs", 108, none, []),
    el!("Mt", 109, none, []),
    el!("Ds", 110, none, []),
    el!("Rg", 111, none, []),
    el!("Cn", 112, none, []),
    el!("Nh", 113, none, []),
    el!("Fl", 114, none, []),
    el!("Mc", 115, none, []),
    el!("Lv", 116, none, []),
    el!("Ts", 117, none, []),
    el!("Og", 118, none, []),
];

/// Looks up an element by symbol (case-sensitive, e.g. "Fe")
pub fn lookup(symbol: &str) -> Option<&'static ElementData> {
    PERIODIC_TABLE.iter().find(|e| e.symbol == symbol)
}

pub fn is_known_element(symbol: &str) -> bool {
    lookup(symbol).is_some()
}

/// Returns the atomic number for an element symbol
pub fn get_atomic_number(element: &str) -> Option<u8> {
    lookup(element).map(|e| e.z)
}

pub fn electronegativity(element: &str) -> Option<f64> {
    lookup(element).and_then(|e| e.electronegativity)
}

/// Known oxidation states, most common first; empty for unknown symbols
pub fn known_oxidation_states(element: &str) -> &'static [i32] {
    lookup(element).map(|e| e.oxidation_states).unwrap_or(&[])
}

/// True if the element has at least one negative known state
pub fn can_be_anion(element: &str) -> bool {
    known_oxidation_states(element).iter().any(|&s| s < 0)
}
