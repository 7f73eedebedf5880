//! Bowyer–Watson Delaunay triangulation.

use std::collections::BTreeSet;

use crate::error::{Result, SynthError};

use super::Site;

/// How far the enclosing super triangle extends, in multiples of the point span.
const SUPER_TRIANGLE_SCALE: f64 = 256.0;

/// A triangle over point indices with its cached circumcircle.
#[derive(Clone, Debug)]
pub(crate) struct Triangle {
    pub vertices: [usize; 3],
    pub center: Site,
    radius_sq: f64,
}

impl Triangle {
    fn new(vertices: [usize; 3], points: &[Site]) -> Self {
        let (center, radius_sq) = circumcircle(
            points[vertices[0]],
            points[vertices[1]],
            points[vertices[2]],
        );
        Self {
            vertices,
            center,
            radius_sq,
        }
    }

    fn circumcircle_contains(&self, p: Site) -> bool {
        self.center.distance_sq(&p) < self.radius_sq
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }

    fn touches_any(&self, first: usize) -> bool {
        self.vertices.iter().any(|&v| v >= first)
    }
}

/// Circumcenter and squared radius. Degenerate (collinear) triangles get an
/// infinite circle so the next insertion always removes them.
fn circumcircle(a: Site, b: Site, c: Site) -> (Site, f64) {
    let d = 2.0 * (a.x * (b.z - c.z) + b.x * (c.z - a.z) + c.x * (a.z - b.z));
    if d.abs() < 1e-12 {
        let centroid = Site::new((a.x + b.x + c.x) / 3.0, (a.z + b.z + c.z) / 3.0);
        return (centroid, f64::INFINITY);
    }
    let a2 = a.x * a.x + a.z * a.z;
    let b2 = b.x * b.x + b.z * b.z;
    let c2 = c.x * c.x + c.z * c.z;
    let ux = (a2 * (b.z - c.z) + b2 * (c.z - a.z) + c2 * (a.z - b.z)) / d;
    let uz = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Site::new(ux, uz);
    let radius_sq = center.distance_sq(&a);
    (center, radius_sq)
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Triangulate `sites` (assumed free of duplicates). Returned triangles index
/// into `sites`. Fails when every site is collinear.
pub(crate) fn triangulate(sites: &[Site]) -> Result<Vec<Triangle>> {
    let n = sites.len();
    if n < 3 {
        return Err(SynthError::DegenerateInput(format!(
            "triangulation needs at least 3 sites, got {}",
            n
        )));
    }

    let (mut min_x, mut min_z) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_z) = (f64::MIN, f64::MIN);
    for s in sites {
        min_x = min_x.min(s.x);
        min_z = min_z.min(s.z);
        max_x = max_x.max(s.x);
        max_z = max_z.max(s.z);
    }
    let span = (max_x - min_x).max(max_z - min_z).max(1.0) * SUPER_TRIANGLE_SCALE;
    let mid_x = (min_x + max_x) / 2.0;
    let mid_z = (min_z + max_z) / 2.0;

    let mut points = sites.to_vec();
    points.push(Site::new(mid_x - span, mid_z - span));
    points.push(Site::new(mid_x, mid_z + span));
    points.push(Site::new(mid_x + span, mid_z - span));

    let mut triangles = vec![Triangle::new([n, n + 1, n + 2], &points)];

    for i in 0..n {
        let p = points[i];
        let (bad, good): (Vec<Triangle>, Vec<Triangle>) = triangles
            .into_iter()
            .partition(|t| t.circumcircle_contains(p));
        triangles = good;

        // Cavity boundary: edges owned by exactly one bad triangle.
        let mut seen = BTreeSet::new();
        let mut shared = BTreeSet::new();
        for t in &bad {
            for (a, b) in t.edges() {
                if !seen.insert(edge_key(a, b)) {
                    shared.insert(edge_key(a, b));
                }
            }
        }
        for t in &bad {
            for (a, b) in t.edges() {
                if !shared.contains(&edge_key(a, b)) {
                    triangles.push(Triangle::new([a, b, i], &points));
                }
            }
        }
    }

    triangles.retain(|t| !t.touches_any(n) && t.radius_sq.is_finite());
    if triangles.is_empty() {
        return Err(SynthError::DegenerateInput(
            "all sites are collinear".to_string(),
        ));
    }
    Ok(triangles)
}
