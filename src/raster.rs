//! Height-interpolated line rasterization.
//!
//! Lines are walked with Bresenham's integer error accumulation. At every step
//! a `width x width` square is stamped at the interpolated height, so wide
//! lines overlap from one step to the next.

use crate::grid::{Cell, Grid};

/// Cells on the Bresenham line from `p0` to `p1`, both endpoints included.
pub fn line_cells(p0: Cell, p1: Cell) -> Vec<Cell> {
    let dx = (p1.x - p0.x).abs();
    let dz = -(p1.z - p0.z).abs();
    let sx = if p0.x < p1.x { 1 } else { -1 };
    let sz = if p0.z < p1.z { 1 } else { -1 };
    let mut err = dx + dz;

    let mut x = p0.x;
    let mut z = p0.z;
    let mut path = Vec::with_capacity((dx - dz) as usize + 1);

    loop {
        path.push(Cell::new(x, z));
        if x == p1.x && z == p1.z {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dz {
            err += dz;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            z += sz;
        }
    }

    path
}

/// Height at step `step` of a line whose endpoints are `length` apart.
///
/// The absolute value means a ramp that crosses zero folds back upward.
pub fn interpolated_height(step: usize, length: f32, start_height: f32, end_height: f32) -> f32 {
    let t = if length > 0.0 { step as f32 / length } else { 0.0 };
    (t * (end_height - start_height) + start_height).abs()
}

/// Draw a line from `p0` to `p1`, interpolating from `start_height` to
/// `end_height` over the euclidean length and stamping `width x width`
/// squares shifted by `offset` on both axes. Cells off the grid are clipped.
///
/// Returns the line cells in walk order (before `offset` is applied).
pub fn draw_line(
    grid: &mut Grid,
    p0: Cell,
    p1: Cell,
    start_height: f32,
    end_height: f32,
    width: usize,
    offset: i32,
) -> Vec<Cell> {
    let path = line_cells(p0, p1);
    let ddx = (p1.x - p0.x) as f32;
    let ddz = (p1.z - p0.z) as f32;
    let length = (ddx * ddx + ddz * ddz).sqrt();

    for (step, cell) in path.iter().enumerate() {
        let h = interpolated_height(step, length, start_height, end_height);
        grid.region_set(cell.x + offset, cell.z + offset, width, h);
    }

    path
}
