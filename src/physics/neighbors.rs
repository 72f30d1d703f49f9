// src/physics/neighbors.rs

use nalgebra::Vector3;
use serde::Serialize;

use crate::error::StructureError;
use crate::model::structure::StructureRecord;
use crate::utils::linalg;

/// Anything closer than this is treated as a duplicate site, not a bond
pub const MIN_DISTANCE: f64 = 0.2; // Å

/// Most periodic images walked along one axis
pub const MAX_IMAGE_RANGE: i32 = 32;

/// Most neighbors kept for one site before the structure is rejected
pub const MAX_NEIGHBORS_PER_SITE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub site: usize,
    pub distance: f64,
    pub image: [i32; 3],
}

/// Periodic neighbor list of one structure.
///
/// Built once per structure and shared read-only by the resolver and
/// every geometry-based validator. Coordination shells are cheap filters
/// over the cached list.
#[derive(Debug, Clone)]
pub struct Geometry {
    cutoff: f64,
    neighbors: Vec<Vec<Neighbor>>,
}

impl Geometry {
    /// All neighbors of every site within `cutoff` (Å), sorted by distance.
    ///
    /// Validates the record first; this is the single shape check on the
    /// pipeline path.
    pub fn compute(structure: &StructureRecord, cutoff: f64) -> Result<Self, StructureError> {
        structure.validate()?;
        let lattice = structure.lattice_matrix()?;
        let range = linalg::image_range(lattice, cutoff).ok_or_else(|| {
            StructureError::DegenerateLattice {
                id: structure.id.clone(),
                reason: "singular lattice matrix".to_string(),
            }
        })?;
        if let Some(r) = range.iter().copied().find(|&r| r > MAX_IMAGE_RANGE) {
            return Err(StructureError::NeighborLimit {
                id: structure.id.clone(),
                reason: format!("{} images per axis for cutoff {} Å, limit {}", r, cutoff, MAX_IMAGE_RANGE),
            });
        }
        let basis_t = linalg::lattice_matrix(lattice).transpose();

        let n = structure.sites.len();
        let mut neighbors = vec![Vec::new(); n];

        for (i, site_i) in structure.sites.iter().enumerate() {
            let fi = Vector3::from(site_i.frac_coords);
            for (j, site_j) in structure.sites.iter().enumerate() {
                let fj = Vector3::from(site_j.frac_coords);
                // Minimum-image offset, then walk the surrounding images
                let mut df = fj - fi;
                let shift = df.map(|x| x.round());
                df -= shift;

                for dx in -range[0]..=range[0] {
                    for dy in -range[1]..=range[1] {
                        for dz in -range[2]..=range[2] {
                            if i == j && dx == 0 && dy == 0 && dz == 0 {
                                continue;
                            }
                            let image = Vector3::new(dx as f64, dy as f64, dz as f64);
                            let dist = (basis_t * (df + image)).norm();
                            if dist < MIN_DISTANCE || dist > cutoff {
                                continue;
                            }
                            if neighbors[i].len() == MAX_NEIGHBORS_PER_SITE {
                                return Err(StructureError::NeighborLimit {
                                    id: structure.id.clone(),
                                    reason: format!(
                                        "site {} has more than {} neighbors within {} Å",
                                        i, MAX_NEIGHBORS_PER_SITE, cutoff
                                    ),
                                });
                            }
                            neighbors[i].push(Neighbor {
                                site: j,
                                distance: dist,
                                image: [
                                    dx - shift.x as i32,
                                    dy - shift.y as i32,
                                    dz - shift.z as i32,
                                ],
                            });
                        }
                    }
                }
            }
            neighbors[i].sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.site.cmp(&b.site))
                    .then(a.image.cmp(&b.image))
            });
        }

        log::trace!(
            "{}: neighbor list built ({} sites, cutoff {:.2} Å)",
            structure.id,
            n,
            cutoff
        );

        Ok(Self { cutoff, neighbors })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn site_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Every neighbor of `site` within the cutoff
    pub fn neighbors(&self, site: usize) -> &[Neighbor] {
        self.neighbors.get(site).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Neighbors passing `filter`, nearest first
    pub fn filtered<'a, F>(&'a self, site: usize, filter: F) -> impl Iterator<Item = &'a Neighbor>
    where
        F: Fn(usize) -> bool + 'a,
    {
        self.neighbors(site).iter().filter(move |n| filter(n.site))
    }

    /// First coordination shell among neighbors passing `filter`:
    /// everything within (1 + tolerance) × the nearest accepted distance.
    pub fn first_shell<F>(&self, site: usize, filter: F, tolerance: f64) -> Vec<&Neighbor>
    where
        F: Fn(usize) -> bool,
    {
        let mut shell = Vec::new();
        let mut limit = f64::INFINITY;
        for n in self.neighbors(site).iter().filter(|n| filter(n.site)) {
            if shell.is_empty() {
                limit = n.distance * (1.0 + tolerance);
            }
            if n.distance > limit {
                break;
            }
            shell.push(n);
        }
        shell
    }

    pub fn coordination_number<F>(&self, site: usize, filter: F, tolerance: f64) -> usize
    where
        F: Fn(usize) -> bool,
    {
        self.first_shell(site, filter, tolerance).len()
    }
}
