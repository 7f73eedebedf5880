//! Voronoi diagram as the dual of the Delaunay triangulation.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid, Result, SynthError};

use super::delaunay::{triangulate, Triangle};
use super::lloyd::{clip_to_bisector, relax_once};
use super::{Rect, Site};

/// A Voronoi edge between two neighbouring sites.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Indices of the two sites this edge separates (lower index first).
    pub sites: (usize, usize),
    /// Endpoints after clipping to the bounds, or `None` when the edge lies
    /// entirely outside them. Consumers skip `None` edges.
    pub clipped: Option<(Site, Site)>,
}

/// Sites, clipped edges and clipped cell polygons.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoronoiDiagram {
    pub bounds: Rect,
    pub sites: Vec<Site>,
    pub edges: Vec<Edge>,
    /// Cell polygon per site (same order as `sites`), clipped to `bounds`.
    pub cells: Vec<Vec<Site>>,
    /// Delaunay neighbours per site, ascending.
    pub neighbors: Vec<Vec<usize>>,
}

/// Drop exact duplicates, keeping the first occurrence.
fn dedupe(points: &[Site]) -> Vec<Site> {
    let mut seen = HashSet::new();
    points
        .iter()
        .filter(|p| seen.insert(((p.x + 0.0).to_bits(), (p.z + 0.0).to_bits())))
        .copied()
        .collect()
}

/// Triangulation plus the edge → triangle adjacency derived from it.
struct DelaunayGraph {
    triangles: Vec<Triangle>,
    edge_triangles: BTreeMap<(usize, usize), Vec<usize>>,
    neighbors: Vec<Vec<usize>>,
}

impl DelaunayGraph {
    fn new(sites: &[Site]) -> Result<Self> {
        let triangles = triangulate(sites)?;
        let mut edge_triangles: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        for (ti, t) in triangles.iter().enumerate() {
            let [a, b, c] = t.vertices;
            for (u, v) in [(a, b), (b, c), (c, a)] {
                let key = if u < v { (u, v) } else { (v, u) };
                edge_triangles.entry(key).or_default().push(ti);
            }
        }

        let mut neighbors = vec![Vec::new(); sites.len()];
        for &(u, v) in edge_triangles.keys() {
            neighbors[u].push(v);
            neighbors[v].push(u);
        }

        Ok(Self {
            triangles,
            edge_triangles,
            neighbors,
        })
    }

    fn voronoi_edges(&self, sites: &[Site], bounds: &Rect) -> Vec<Edge> {
        self.edge_triangles
            .iter()
            .filter_map(|(&(u, v), tris)| {
                let clipped = match tris.as_slice() {
                    [t0, t1] => {
                        let a = self.triangles[*t0].center;
                        let b = self.triangles[*t1].center;
                        clip(a, (b.x - a.x, b.z - a.z), 1.0, bounds)
                    }
                    [t0] => {
                        let tri = &self.triangles[*t0];
                        let third = tri
                            .vertices
                            .iter()
                            .copied()
                            .find(|&w| w != u && w != v)?;
                        let dir = outward_normal(sites[u], sites[v], sites[third]);
                        clip(tri.center, dir, f64::INFINITY, bounds)
                    }
                    _ => return None,
                };
                Some(Edge {
                    sites: (u, v),
                    clipped,
                })
            })
            .collect()
    }
}

/// Cell polygon of every site: `bounds` cut by the bisector against every
/// other site, not only the Delaunay neighbours.
fn clipped_cells(sites: &[Site], bounds: &Rect) -> Vec<Vec<Site>> {
    sites
        .iter()
        .enumerate()
        .map(|(i, site)| {
            let mut poly = bounds.corners();
            for (j, other) in sites.iter().enumerate() {
                if j == i || poly.is_empty() {
                    continue;
                }
                poly = clip_to_bisector(&poly, *site, *other);
            }
            poly
        })
        .collect()
}

/// Normal of edge `a-b` pointing away from `opposite`.
fn outward_normal(a: Site, b: Site, opposite: Site) -> (f64, f64) {
    let (ex, ez) = (b.x - a.x, b.z - a.z);
    let (mut nx, mut nz) = (ez, -ex);
    let mid = Site::new((a.x + b.x) / 2.0, (a.z + b.z) / 2.0);
    if (opposite.x - mid.x) * nx + (opposite.z - mid.z) * nz > 0.0 {
        nx = -nx;
        nz = -nz;
    }
    (nx, nz)
}

/// Liang–Barsky clip of `p + t*d`, `t in [0, t_max]`, against `bounds`.
fn clip(p: Site, d: (f64, f64), t_max: f64, bounds: &Rect) -> Option<(Site, Site)> {
    let (dx, dz) = d;
    let mut t0 = 0.0f64;
    let mut t1 = t_max;
    let checks = [
        (-dx, p.x - bounds.x),
        (dx, bounds.max_x() - p.x),
        (-dz, p.z - bounds.z),
        (dz, bounds.max_z() - p.z),
    ];

    for (pk, qk) in checks {
        if pk == 0.0 {
            if qk < 0.0 {
                return None;
            }
            continue;
        }
        let r = qk / pk;
        if pk < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    if !t1.is_finite() {
        return None;
    }
    Some((
        Site::new(p.x + t0 * dx, p.z + t0 * dz),
        Site::new(p.x + t1 * dx, p.z + t1 * dz),
    ))
}

impl VoronoiDiagram {
    /// Build the diagram of `points` inside `bounds`, running `relaxation`
    /// Lloyd iterations first. Coincident points collapse to one site.
    pub fn build(points: &[Site], bounds: Rect, relaxation: usize) -> Result<Self> {
        if !(bounds.width > 0.0 && bounds.height > 0.0) {
            return Err(invalid("bounds", "width and height must be positive"));
        }
        let mut sites = dedupe(points);
        if sites.len() < 3 {
            return Err(SynthError::DegenerateInput(format!(
                "voronoi partition needs at least 3 distinct sites, got {}",
                sites.len()
            )));
        }

        for round in 0..relaxation {
            let cells = clipped_cells(&sites, &bounds);
            sites = dedupe(&relax_once(&sites, &cells));
            debug!(round, sites = sites.len(), "lloyd relaxation step");
        }

        let graph = DelaunayGraph::new(&sites)?;
        let edges = graph.voronoi_edges(&sites, &bounds);
        let cells = clipped_cells(&sites, &bounds);
        let neighbors = graph.neighbors.clone();

        Ok(Self {
            bounds,
            sites,
            edges,
            cells,
            neighbors,
        })
    }

    /// Edges that survived clipping, as endpoint pairs.
    pub fn clipped_edges(&self) -> impl Iterator<Item = (Site, Site)> + '_ {
        self.edges.iter().filter_map(|e| e.clipped)
    }
}
