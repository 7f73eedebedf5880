//! Island segmentation.
//!
//! After the river network is carved, every Voronoi site sits in a basin of
//! untouched base elevation bounded by rivers. Each basin is flood filled and
//! raised to its own random height, turning the partition into islands.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::grid::{Cell, Grid};
use crate::random::RandomSource;
use crate::tilemap::Tilemap;
use crate::voronoi::Site;

/// 4-connected flood-fill steps.
const FILL_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Cells raised by one flood fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Island {
    /// Index of the seeding site
    pub site: usize,
    pub target_height: f32,
    pub cells: Vec<Cell>,
}

impl Island {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }
}

/// Flood fill from every site and raise its basin.
///
/// Per site a target is drawn uniformly in `[height_min, height_min +
/// height_range)`; cells joining the fill must have elevation exactly equal
/// to `source_elevation`. Returns one [`Island`] per site, in site order.
/// A site whose cell was already claimed (or lies off the grid) yields an
/// empty island.
pub fn segment(
    grid: &mut Grid,
    rng: &mut RandomSource,
    sites: &[Site],
    source_elevation: f32,
    height_min: f32,
    height_range: f32,
) -> Result<Vec<Island>> {
    let mut islands = Vec::with_capacity(sites.len());

    for (index, site) in sites.iter().enumerate() {
        let target = rng.range_f32(height_min, height_min + height_range);
        let start = site.cell();
        let cells = if target == source_elevation {
            collect_basin(grid, start, source_elevation)
        } else {
            fill_basin(grid, start, source_elevation, target)?
        };
        debug!(site = index, target, cells = cells.len(), "island filled");
        islands.push(Island {
            site: index,
            target_height: target,
            cells,
        });
    }

    Ok(islands)
}

/// Explicit-stack fill that overwrites matching cells with `target`.
/// The write itself marks a cell as visited.
fn fill_basin(grid: &mut Grid, start: Cell, source: f32, target: f32) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    let mut stack = vec![start];

    while let Some(cell) = stack.pop() {
        if !grid.contains_cell(cell) || grid.get_cell(cell)? != source {
            continue;
        }
        grid.set_cell(cell, target)?;
        cells.push(cell);
        for (dx, dz) in FILL_OFFSETS {
            stack.push(cell.offset(dx, dz));
        }
    }

    Ok(cells)
}

/// Read-only traversal for when the target equals the source, which would
/// otherwise never terminate.
fn collect_basin(grid: &Grid, start: Cell, source: f32) -> Vec<Cell> {
    let mut cells = Vec::new();
    if !grid.contains_cell(start) {
        return cells;
    }
    let heights = grid.heights();
    let mut visited = Tilemap::new_with(grid.width(), grid.height(), false);
    let mut stack = vec![(start.x as usize, start.z as usize)];

    while let Some((x, z)) = stack.pop() {
        if *visited.get(x, z) || *heights.get(x, z) != source {
            continue;
        }
        visited.set(x, z, true);
        cells.push(Cell::new(x as i32, z as i32));
        stack.extend(heights.neighbors(x, z));
    }

    cells
}
