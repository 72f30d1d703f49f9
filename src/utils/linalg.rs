// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

/// Lattice rows [[ax, ay, az], [bx, by, bz], [cx, cy, cz]] as a nalgebra matrix
pub fn lattice_matrix(lattice: [[f64; 3]; 3]) -> Matrix3<f64> {
  Matrix3::from_fn(|i, j| lattice[i][j])
}

/// Fractional to Cartesian (Å)
///
/// # Formula
/// ```text
/// Cartesian = Lattice^T × Fractional
/// ```
pub fn frac_to_cart(frac: [f64; 3], lattice: [[f64; 3]; 3]) -> [f64; 3] {
  let cart_vec = lattice_matrix(lattice).transpose() * Vector3::from(frac);
  [cart_vec.x, cart_vec.y, cart_vec.z]
}

/// Cell volume (Å³), |det L|
pub fn cell_volume(lattice: [[f64; 3]; 3]) -> f64 {
  lattice_matrix(lattice).determinant().abs()
}

/// Spacing of the (100), (010) and (001) lattice planes, or None if the
/// lattice is singular.
///
/// The norm of row k of (Lattice^T)^-1 is the inverse interplanar spacing
/// of the (k) lattice planes.
pub fn plane_spacings(lattice: [[f64; 3]; 3]) -> Option<[f64; 3]> {
  let inv = lattice_matrix(lattice).transpose().try_inverse()?;
  let mut spacings = [0.0; 3];
  for (k, d) in spacings.iter_mut().enumerate() {
    *d = 1.0 / inv.row(k).norm();
  }
  Some(spacings)
}

/// Number of periodic images needed along each axis to cover `cutoff`,
/// or None if the lattice is singular.
pub fn image_range(lattice: [[f64; 3]; 3], cutoff: f64) -> Option<[i32; 3]> {
  let spacings = plane_spacings(lattice)?;
  Some(spacings.map(|d| (cutoff / d).ceil().min(i32::MAX as f64) as i32))
}
