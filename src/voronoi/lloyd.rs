//! Cell polygons and Lloyd relaxation.

use super::Site;

/// Keep the part of `polygon` on the near side of the perpendicular bisector
/// between `site` and `other` (Sutherland–Hodgman against one half-plane).
pub(crate) fn clip_to_bisector(polygon: &[Site], site: Site, other: Site) -> Vec<Site> {
    let mid = Site::new((site.x + other.x) / 2.0, (site.z + other.z) / 2.0);
    let nx = other.x - site.x;
    let nz = other.z - site.z;
    // Signed distance along the normal; <= 0 is the kept side.
    let side = |p: &Site| (p.x - mid.x) * nx + (p.z - mid.z) * nz;

    let mut out = Vec::with_capacity(polygon.len() + 1);
    for i in 0..polygon.len() {
        let cur = polygon[i];
        let next = polygon[(i + 1) % polygon.len()];
        let d_cur = side(&cur);
        let d_next = side(&next);

        if d_cur <= 0.0 {
            out.push(cur);
        }
        if (d_cur <= 0.0) != (d_next <= 0.0) {
            let t = d_cur / (d_cur - d_next);
            out.push(Site::new(
                cur.x + (next.x - cur.x) * t,
                cur.z + (next.z - cur.z) * t,
            ));
        }
    }
    out
}

/// Signed shoelace area.
pub fn polygon_area(polygon: &[Site]) -> f64 {
    let mut area = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        area += a.x * b.z - b.x * a.z;
    }
    area / 2.0
}

/// Area centroid of a simple polygon, or `None` when it has no area.
pub fn polygon_centroid(polygon: &[Site]) -> Option<Site> {
    let area = polygon_area(polygon);
    if area.abs() < 1e-9 {
        return None;
    }
    let mut cx = 0.0;
    let mut cz = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let cross = a.x * b.z - b.x * a.z;
        cx += (a.x + b.x) * cross;
        cz += (a.z + b.z) * cross;
    }
    Some(Site::new(cx / (6.0 * area), cz / (6.0 * area)))
}

/// One Lloyd step: every site moves to the centroid of its cell. Sites whose
/// cell collapsed keep their position.
pub(crate) fn relax_once(sites: &[Site], cells: &[Vec<Site>]) -> Vec<Site> {
    sites
        .iter()
        .zip(cells)
        .map(|(site, cell)| polygon_centroid(cell).unwrap_or(*site))
        .collect()
}
