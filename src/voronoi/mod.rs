//! Voronoi partitioning of the grid into site cells.
//!
//! Sites are triangulated with Bowyer–Watson, the Voronoi diagram is read off
//! as the Delaunay dual, and Lloyd relaxation optionally evens out cell sizes.
//! Only [`random_sites`] touches the random stream; building a diagram from a
//! fixed point set is fully deterministic.

mod delaunay;
mod diagram;
mod lloyd;

pub use diagram::{Edge, VoronoiDiagram};
pub use lloyd::{polygon_area, polygon_centroid};

use serde::{Deserialize, Serialize};

use crate::grid::Cell;
use crate::random::RandomSource;

/// A Voronoi cell center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub x: f64,
    pub z: f64,
}

impl Site {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Grid cell containing this point.
    pub fn cell(&self) -> Cell {
        Cell::from_position(self.x, self.z)
    }

    pub fn distance_sq(&self, other: &Site) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }
}

/// Axis-aligned bounding rectangle for clipping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub z: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, z: f64, width: f64, height: f64) -> Self {
        Self { x, z, width, height }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_z(&self) -> f64 {
        self.z + self.height
    }

    /// Corners in counter-clockwise order (for a z-up plane).
    pub fn corners(&self) -> Vec<Site> {
        vec![
            Site::new(self.x, self.z),
            Site::new(self.max_x(), self.z),
            Site::new(self.max_x(), self.max_z()),
            Site::new(self.x, self.max_z()),
        ]
    }
}

/// `count` points drawn uniformly in `[0, width) x [0, height)`, x before z.
pub fn random_sites(rng: &mut RandomSource, count: usize, width: usize, height: usize) -> Vec<Site> {
    (0..count)
        .map(|_| {
            let x = rng.range_f64(0.0, width as f64);
            let z = rng.range_f64(0.0, height as f64);
            Site::new(x, z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_sites_stay_in_bounds() {
        let mut rng = RandomSource::new(5);
        let sites = random_sites(&mut rng, 200, 64, 32);
        assert_eq!(sites.len(), 200);
        assert!(sites.iter().all(|s| s.x >= 0.0 && s.x < 64.0 && s.z >= 0.0 && s.z < 32.0));
    }

    #[test]
    fn test_site_cell_truncates() {
        assert_eq!(Site::new(3.9, 0.2).cell(), Cell::new(3, 0));
    }
}
