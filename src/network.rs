//! River network carving and bridge growth.
//!
//! Rivers follow the Voronoi edges at sea level. Bridges are then grown from
//! every site: a walker heads off in a random direction, crosses water, and
//! the first dry cell beyond that water becomes the landfall. A ramp is drawn
//! from the site to the landfall using both cells' current elevations, so
//! later rounds build on the heights earlier bridges left behind.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid, Result, SynthError};
use crate::grid::{Cell, Grid};
use crate::random::RandomSource;
use crate::raster::draw_line;
use crate::voronoi::{Site, VoronoiDiagram};

/// Walkers restart once they come this close to the grid border.
const BORDER_MARGIN: i32 = 2;

/// Parameters for bridge growth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeParams {
    /// Stamp width of each bridge line (cells)
    pub width: usize,
    /// Number of rounds; every site grows one bridge per round
    pub iterations: usize,
    /// Total walker steps allowed per bridge, restarts included
    pub search_cap: usize,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            width: 3,
            iterations: 1,
            search_cap: 100_000,
        }
    }
}

impl BridgeParams {
    pub fn validate(&self) -> Result<()> {
        if self.search_cap == 0 {
            return Err(invalid("bridges.search_cap", "must be at least 1"));
        }
        Ok(())
    }
}

/// One connection drawn by [`grow_connections`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    /// Index of the site the bridge starts from
    pub site: usize,
    pub from: Cell,
    pub to: Cell,
    pub start_height: f32,
    pub end_height: f32,
}

/// Draw every clipped Voronoi edge at height 0 with `river_width`.
/// Returns the number of edges drawn; unclipped edges are skipped.
pub fn carve_network(grid: &mut Grid, diagram: &VoronoiDiagram, river_width: usize) -> usize {
    let mut drawn = 0;
    for (a, b) in diagram.clipped_edges() {
        draw_line(grid, a.cell(), b.cell(), 0.0, 0.0, river_width, 0);
        drawn += 1;
    }
    debug!(drawn, skipped = diagram.edges.len() - drawn, "carved river network");
    drawn
}

fn near_border(grid: &Grid, cell: Cell) -> bool {
    cell.x < BORDER_MARGIN
        || cell.z < BORDER_MARGIN
        || cell.x >= grid.width() as i32 - BORDER_MARGIN
        || cell.z >= grid.height() as i32 - BORDER_MARGIN
}

/// Where walks from `origin` start. An origin inside the border margin is
/// pulled onto the nearest cell center outside it; `None` when the grid has
/// no cells outside the margin.
fn walk_start(grid: &Grid, origin: Site) -> Option<(f64, f64)> {
    let margin = f64::from(BORDER_MARGIN);
    let (width, height) = (grid.width() as f64, grid.height() as f64);
    if width < 2.0 * margin + 1.0 || height < 2.0 * margin + 1.0 {
        return None;
    }
    if !near_border(grid, origin.cell()) {
        return Some((origin.x, origin.z));
    }
    let x = origin.x.clamp(margin + 0.5, width - margin - 0.5);
    let z = origin.z.clamp(margin + 0.5, height - margin - 0.5);
    Some((x, z))
}

/// Walk from `origin` until land is found on the far side of water.
///
/// Each (re)start draws a fresh direction from `rng`. Hitting the border
/// margin restarts the walk from the origin, moved out of the margin first.
/// Fails with [`SynthError::UnboundedSearch`] after `cap` total steps, or at
/// once when no cell lies outside the margin.
pub fn find_landfall(grid: &Grid, rng: &mut RandomSource, origin: Site, cap: usize) -> Result<Cell> {
    let unbounded = SynthError::UnboundedSearch {
        search: "bridge landfall search",
        cap,
    };
    let Some(start) = walk_start(grid, origin) else {
        return Err(unbounded);
    };

    let mut steps = 0usize;
    'restart: loop {
        let (dx, dz) = rng.direction();
        let (mut x, mut z) = start;
        let mut seen_water = false;

        loop {
            if steps >= cap {
                return Err(unbounded);
            }
            steps += 1;

            x += dx as f64;
            z += dz as f64;
            let cell = Cell::from_position(x, z);
            if near_border(grid, cell) {
                continue 'restart;
            }

            let h = grid.get_cell(cell)?;
            if h == 0.0 {
                seen_water = true;
            } else if seen_water {
                return Ok(cell);
            }
        }
    }
}

/// Grow `params.iterations` rounds of bridges, one per site per round.
pub fn grow_connections(
    grid: &mut Grid,
    rng: &mut RandomSource,
    sites: &[Site],
    params: &BridgeParams,
) -> Result<Vec<Bridge>> {
    params.validate()?;
    let mut bridges = Vec::with_capacity(sites.len() * params.iterations);

    for round in 0..params.iterations {
        for (index, site) in sites.iter().enumerate() {
            let landfall = find_landfall(grid, rng, *site, params.search_cap)?;
            let from = grid.clamp_cell(site.cell());
            let start_height = grid.get_cell(from)?;
            let end_height = grid.get_cell(landfall)?;

            draw_line(grid, from, landfall, start_height, end_height, params.width, 0);
            bridges.push(Bridge {
                site: index,
                from,
                to: landfall,
                start_height,
                end_height,
            });
        }
        debug!(round, bridges = bridges.len(), "bridge round complete");
    }

    Ok(bridges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::line_cells;
    use crate::voronoi::Rect;

    /// 30x20 land at 0.5 with a 3-wide water channel at x = 10..=12.
    fn channel_grid() -> Grid {
        let mut grid = Grid::new(30, 20, 0.5).unwrap();
        for z in 0..20 {
            for x in 10..=12 {
                grid.set(x, z, 0.0).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_carve_network_draws_only_clipped_edges() {
        let mut grid = Grid::new(40, 40, 0.5).unwrap();
        let points = vec![
            Site::new(8.0, 8.0),
            Site::new(30.0, 10.0),
            Site::new(20.0, 32.0),
            Site::new(33.0, 30.0),
        ];
        let diagram = VoronoiDiagram::build(&points, Rect::new(0.0, 0.0, 40.0, 40.0), 0).unwrap();
        let drawn = carve_network(&mut grid, &diagram, 1);
        assert_eq!(drawn, diagram.clipped_edges().count());
        assert!(drawn > 0);

        for (a, b) in diagram.clipped_edges() {
            for cell in line_cells(a.cell(), b.cell()) {
                if grid.contains_cell(cell) {
                    assert_eq!(grid.get_cell(cell).unwrap(), 0.0);
                }
            }
        }
        // Sites sit inside their cells, away from every river.
        for site in &diagram.sites {
            assert_eq!(grid.get_cell(site.cell()).unwrap(), 0.5);
        }
    }

    #[test]
    fn test_landfall_lies_beyond_the_channel() {
        let grid = channel_grid();
        let mut rng = RandomSource::new(21);
        let landfall = find_landfall(&grid, &mut rng, Site::new(5.5, 10.5), 10_000).unwrap();
        assert!(landfall.x >= 13);
        assert_eq!(grid.get_cell(landfall).unwrap(), 0.5);
    }

    #[test]
    fn test_landfall_from_site_inside_border_margin() {
        let grid = channel_grid();
        let mut rng = RandomSource::new(22);
        let landfall = find_landfall(&grid, &mut rng, Site::new(5.5, 0.81), 10_000).unwrap();
        assert!(landfall.x >= 13);
        assert!(!near_border(&grid, landfall));

        let mut rng = RandomSource::new(23);
        let landfall = find_landfall(&grid, &mut rng, Site::new(0.12, 10.4), 10_000).unwrap();
        assert!(landfall.x >= 13);
    }

    #[test]
    fn test_walk_start_leaves_interior_origins_alone() {
        let grid = channel_grid();
        assert_eq!(walk_start(&grid, Site::new(5.5, 10.5)), Some((5.5, 10.5)));
        assert_eq!(walk_start(&grid, Site::new(29.9, 0.2)), Some((27.5, 2.5)));
        assert_eq!(walk_start(&Grid::new(4, 30, 0.5).unwrap(), Site::new(2.0, 9.0)), None);
    }

    #[test]
    fn test_grid_without_interior_fails_at_once() {
        let grid = Grid::new(4, 4, 0.0).unwrap();
        let mut rng = RandomSource::new(24);
        assert!(matches!(
            find_landfall(&grid, &mut rng, Site::new(1.5, 1.5), 10),
            Err(SynthError::UnboundedSearch { cap: 10, .. })
        ));
    }

    #[test]
    fn test_bridge_spans_the_water() {
        let mut grid = channel_grid();
        let mut rng = RandomSource::new(4);
        let params = BridgeParams {
            width: 1,
            iterations: 1,
            search_cap: 10_000,
        };
        let bridges = grow_connections(&mut grid, &mut rng, &[Site::new(5.5, 10.5)], &params).unwrap();
        assert_eq!(bridges.len(), 1);

        let bridge = &bridges[0];
        assert_eq!(bridge.start_height, 0.5);
        assert_eq!(bridge.end_height, 0.5);
        for cell in line_cells(bridge.from, bridge.to) {
            assert_eq!(grid.get_cell(cell).unwrap(), 0.5);
        }
    }

    #[test]
    fn test_dry_grid_surfaces_unbounded_search() {
        let grid = Grid::new(20, 20, 0.5).unwrap();
        let mut rng = RandomSource::new(8);
        let result = find_landfall(&grid, &mut rng, Site::new(10.0, 10.0), 500);
        assert!(matches!(
            result,
            Err(SynthError::UnboundedSearch { cap: 500, .. })
        ));
    }

    #[test]
    fn test_bridges_are_reproducible() {
        let params = BridgeParams {
            width: 2,
            iterations: 2,
            search_cap: 10_000,
        };
        let sites = [Site::new(5.5, 5.5), Site::new(20.5, 14.5)];
        let run = |seed| {
            let mut grid = channel_grid();
            let mut rng = RandomSource::new(seed);
            let bridges = grow_connections(&mut grid, &mut rng, &sites, &params).unwrap();
            (bridges, grid.to_row_major())
        };
        assert_eq!(run(17), run(17));
    }
}
