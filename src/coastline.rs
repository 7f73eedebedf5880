//! Agent-based coastline growth.
//!
//! One root agent carries the whole token budget. Agents at or above the
//! split threshold hand half of their budget (rounded down) to each of two
//! children near their own position; agents below it are leaves and raise
//! one sea cell per token, so the landmass grows outward from wherever the
//! leaves end up.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid, Result, SynthError};
use crate::grid::{Cell, Grid};
use crate::random::{RandomSource, NEIGHBOR_OFFSETS};

// =============================================================================
// PARAMETERS
// =============================================================================

/// Where a split places its two children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildPlacement {
    /// A uniformly random 8-neighbour of the parent
    #[default]
    RandomAdjacent,
    /// One step along the parent's direction, one step against it
    AlongParent,
}

/// How a leaf agent picks the cell it raises.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStrategy {
    /// Attractor/repulsor scoring of the agent's open neighbours
    #[default]
    ForceField,
    /// Global score map; the best-scoring cell anywhere is raised
    ScoreAccumulation,
}

/// Parameters for coastline growth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoastlineParams {
    /// Token budget of the root agent (cells to raise in total)
    pub total_tokens: u32,
    /// Agents holding at least this many tokens split
    pub split_threshold: u32,
    /// Upper bound for the attractor/repulsor offset (cells, at least 1)
    pub agent_range: f32,
    /// Normalized elevation given to raised cells. Set by the pipeline from
    /// the configured world-unit land elevation.
    #[serde(skip)]
    pub land_height: f32,
    pub child_placement: ChildPlacement,
    pub strategy: GrowthStrategy,
    /// Steps allowed when walking out of already-grown land, per token
    pub walk_cap: usize,
}

impl Default for CoastlineParams {
    fn default() -> Self {
        Self {
            total_tokens: 4096,
            split_threshold: 64,
            agent_range: 8.0,
            land_height: 0.1,
            child_placement: ChildPlacement::RandomAdjacent,
            strategy: GrowthStrategy::ForceField,
            walk_cap: 100_000,
        }
    }
}

impl CoastlineParams {
    pub fn validate(&self) -> Result<()> {
        if self.split_threshold == 0 {
            return Err(invalid("coastline.split_threshold", "must be at least 1"));
        }
        if !(self.agent_range >= 1.0) {
            return Err(invalid("coastline.agent_range", "must be at least 1"));
        }
        if !(self.land_height > 0.0) {
            return Err(invalid("coastline.land_height", "must be above sea level"));
        }
        if self.walk_cap == 0 {
            return Err(invalid("coastline.walk_cap", "must be at least 1"));
        }
        Ok(())
    }
}

// =============================================================================
// AGENTS AND REPORTING
// =============================================================================

/// A growing agent. Only lives for the duration of one [`grow`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Agent {
    pub position: Cell,
    pub tokens: u32,
    /// Compass step, each component in {-1, 0, 1}
    pub direction: (i32, i32),
}

/// A leaf agent as it started growing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafRecord {
    pub tokens: u32,
    /// Number of splits above this leaf (the root is depth 0)
    pub depth: usize,
    pub start: Cell,
}

/// What a [`grow`] call did.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthReport {
    pub leaves: Vec<LeafRecord>,
    /// Sea cells turned into land
    pub cells_raised: usize,
    pub max_depth: usize,
}

// =============================================================================
// GROWTH
// =============================================================================

/// Grow a landmass from `start` (clamped onto the grid).
pub fn grow(
    grid: &mut Grid,
    rng: &mut RandomSource,
    start: Cell,
    params: &CoastlineParams,
) -> Result<GrowthReport> {
    params.validate()?;
    if params.strategy == GrowthStrategy::ScoreAccumulation {
        grid.clear_scores();
    }

    let root = Agent {
        position: grid.clamp_cell(start),
        tokens: params.total_tokens,
        direction: rng.step_direction(),
    };

    let mut grower = Grower {
        grid,
        rng,
        params,
        report: GrowthReport::default(),
    };
    grower.run(root, 0)?;

    let report = grower.report;
    debug!(
        leaves = report.leaves.len(),
        cells_raised = report.cells_raised,
        max_depth = report.max_depth,
        "coastline growth complete"
    );
    Ok(report)
}

struct Grower<'a> {
    grid: &'a mut Grid,
    rng: &'a mut RandomSource,
    params: &'a CoastlineParams,
    report: GrowthReport,
}

impl Grower<'_> {
    fn run(&mut self, agent: Agent, depth: usize) -> Result<()> {
        self.report.max_depth = self.report.max_depth.max(depth);

        if agent.tokens >= self.params.split_threshold {
            for child in 0..2 {
                let position = match self.params.child_placement {
                    ChildPlacement::RandomAdjacent => self.rng.adjacent_cell(agent.position),
                    ChildPlacement::AlongParent => {
                        let (dx, dz) = agent.direction;
                        if child == 0 {
                            agent.position.offset(dx, dz)
                        } else {
                            agent.position.offset(-dx, -dz)
                        }
                    }
                };
                let direction = self.rng.step_direction();
                let child = Agent {
                    position: self.grid.clamp_cell(position),
                    tokens: agent.tokens / 2,
                    direction,
                };
                self.run(child, depth + 1)?;
            }
            return Ok(());
        }

        self.report.leaves.push(LeafRecord {
            tokens: agent.tokens,
            depth,
            start: agent.position,
        });
        match self.params.strategy {
            GrowthStrategy::ForceField => self.force_field(agent),
            GrowthStrategy::ScoreAccumulation => self.accumulate(agent),
        }
    }

    fn raise(&mut self, cell: Cell) -> Result<()> {
        if !self.grid.is_land(cell)? {
            self.report.cells_raised += 1;
        }
        self.grid.set_cell(cell, self.params.land_height)
    }

    /// Step along the agent's direction until its cell borders open sea.
    fn walk_to_shore(&mut self, agent: &mut Agent) -> Result<()> {
        let mut steps = 0usize;
        while self.grid.is_landlocked(agent.position) {
            if steps >= self.params.walk_cap {
                return Err(SynthError::UnboundedSearch {
                    search: "coastline shore walk",
                    cap: self.params.walk_cap,
                });
            }
            steps += 1;

            let (dx, dz) = agent.direction;
            let next = agent.position.offset(dx, dz);
            if self.grid.contains_cell(next) {
                agent.position = next;
            } else {
                agent.direction = self.rng.step_direction();
            }
        }
        Ok(())
    }

    fn force_field(&mut self, mut agent: Agent) -> Result<()> {
        for _ in 0..agent.tokens {
            self.walk_to_shore(&mut agent)?;

            let (ax, az) = self.rng.direction();
            let magnitude = self.rng.range_f32(1.0, self.params.agent_range);
            let (px, pz) = (agent.position.x as f32, agent.position.z as f32);
            let attractor = (px + ax * magnitude, pz + az * magnitude);
            let repulsor = (px - ax * magnitude, pz - az * magnitude);

            // walk_to_shore guarantees at least one open neighbour
            if let Some(cell) = best_neighbor(self.grid, agent.position, attractor, repulsor) {
                self.raise(cell)?;
                agent.position = cell;
            }
        }
        Ok(())
    }

    fn accumulate(&mut self, agent: Agent) -> Result<()> {
        for spent in 0..agent.tokens {
            let around = self.rng.adjacent_cell(agent.position);
            for (dx, dz) in NEIGHBOR_OFFSETS {
                self.grid.add_score(around.x + dx, around.z + dz, 1.0);
            }

            let Some(best) = self.grid.max_score_cell() else {
                debug!(
                    unspent = agent.tokens - spent,
                    "every cell already raised, leaf stops early"
                );
                break;
            };
            self.raise(best)?;
            self.grid.set_score(best.x, best.z, f32::NEG_INFINITY)?;
        }
        Ok(())
    }
}

/// Open neighbour of `cell` scoring highest on `d²(repulsor) - d²(attractor)`.
/// Neighbours are scanned in row-major 3x3 order and ties keep the first.
pub fn best_neighbor(
    grid: &Grid,
    cell: Cell,
    attractor: (f32, f32),
    repulsor: (f32, f32),
) -> Option<Cell> {
    let mut best: Option<(Cell, f32)> = None;
    for candidate in grid.open_neighbors(cell) {
        let score = distance_sq(candidate, repulsor) - distance_sq(candidate, attractor);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

fn distance_sq(cell: Cell, point: (f32, f32)) -> f32 {
    let dx = cell.x as f32 - point.0;
    let dz = cell.z as f32 - point.1;
    dx * dx + dz * dz
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(total_tokens: u32, split_threshold: u32) -> CoastlineParams {
        CoastlineParams {
            total_tokens,
            split_threshold,
            ..CoastlineParams::default()
        }
    }

    fn land_cells(grid: &Grid) -> usize {
        grid.heights().iter().filter(|(_, _, &h)| h > 0.0).count()
    }

    #[test]
    fn test_four_tokens_split_into_two_leaves() {
        let mut grid = Grid::new(32, 32, 0.0).unwrap();
        let mut rng = RandomSource::new(1);
        let report = grow(&mut grid, &mut rng, Cell::new(16, 16), &params(4, 4)).unwrap();

        assert_eq!(report.leaves.len(), 2);
        assert!(report.leaves.iter().all(|l| l.tokens == 2 && l.depth == 1));
        assert_eq!(report.max_depth, 1);
        assert_eq!(report.cells_raised, 4);
    }

    #[test]
    fn test_split_rounds_down() {
        let mut grid = Grid::new(32, 32, 0.0).unwrap();
        let mut rng = RandomSource::new(2);
        let report = grow(&mut grid, &mut rng, Cell::new(16, 16), &params(9, 4)).unwrap();
        // 9 -> 4 + 4 -> (2 + 2) + (2 + 2)
        assert_eq!(report.leaves.len(), 4);
        assert!(report.leaves.iter().all(|l| l.tokens == 2 && l.depth == 2));
        assert_eq!(report.cells_raised, 8);
    }

    #[test]
    fn test_below_threshold_is_single_leaf() {
        let mut grid = Grid::new(32, 32, 0.0).unwrap();
        let mut rng = RandomSource::new(3);
        let center = grid.center();
        let report = grow(&mut grid, &mut rng, center, &params(50, 100)).unwrap();

        assert_eq!(report.leaves, vec![LeafRecord { tokens: 50, depth: 0, start: center }]);
        assert_eq!(report.cells_raised, 50);
        assert_eq!(land_cells(&grid), 50);
        assert!(grid
            .heights()
            .iter()
            .all(|(_, _, &h)| h == 0.0 || h == 0.1));
    }

    #[test]
    fn test_along_parent_children_mirror_each_other() {
        let mut grid = Grid::new(32, 32, 0.0).unwrap();
        let mut rng = RandomSource::new(4);
        let p = CoastlineParams {
            child_placement: ChildPlacement::AlongParent,
            ..params(2, 2)
        };
        let center = grid.center();
        let report = grow(&mut grid, &mut rng, center, &p).unwrap();

        let (a, b) = (report.leaves[0].start, report.leaves[1].start);
        assert_eq!(a.x + b.x, 2 * center.x);
        assert_eq!(a.z + b.z, 2 * center.z);
        assert_ne!(a, b);
    }

    #[test]
    fn test_landlocked_agent_walks_to_the_shore() {
        // Land everywhere except the right-hand columns.
        let mut grid = Grid::new(20, 20, 0.1).unwrap();
        for z in 0..20 {
            for x in 17..20 {
                grid.set(x, z, 0.0).unwrap();
            }
        }
        let mut rng = RandomSource::new(5);
        let report = grow(&mut grid, &mut rng, Cell::new(3, 3), &params(5, 100)).unwrap();
        assert_eq!(report.cells_raised, 5);
    }

    #[test]
    fn test_all_land_surfaces_unbounded_search() {
        let mut grid = Grid::new(10, 10, 0.1).unwrap();
        let mut rng = RandomSource::new(6);
        let p = CoastlineParams {
            walk_cap: 200,
            ..params(3, 100)
        };
        let result = grow(&mut grid, &mut rng, Cell::new(5, 5), &p);
        assert!(matches!(
            result,
            Err(SynthError::UnboundedSearch { cap: 200, .. })
        ));
    }

    #[test]
    fn test_score_accumulation_raises_distinct_cells() {
        let mut grid = Grid::new(16, 16, 0.0).unwrap();
        let mut rng = RandomSource::new(7);
        let p = CoastlineParams {
            strategy: GrowthStrategy::ScoreAccumulation,
            ..params(10, 100)
        };
        let report = grow(&mut grid, &mut rng, Cell::new(8, 8), &p).unwrap();
        assert_eq!(report.cells_raised, 10);
        assert_eq!(land_cells(&grid), 10);
    }

    #[test]
    fn test_score_accumulation_stops_when_grid_is_full() {
        let mut grid = Grid::new(3, 3, 0.0).unwrap();
        let mut rng = RandomSource::new(9);
        let p = CoastlineParams {
            strategy: GrowthStrategy::ScoreAccumulation,
            ..params(20, 100)
        };
        let report = grow(&mut grid, &mut rng, Cell::new(1, 1), &p).unwrap();
        assert_eq!(report.cells_raised, 9);
        assert_eq!(land_cells(&grid), 9);
        assert_eq!(grid.max_score_cell(), None);
    }

    #[test]
    fn test_best_neighbor_ties_keep_row_major_first() {
        let grid = Grid::new(10, 10, 0.0).unwrap();
        // Field along +x: the whole right-hand column scores 12.
        let best = best_neighbor(&grid, Cell::new(5, 5), (8.0, 5.0), (2.0, 5.0));
        assert_eq!(best, Some(Cell::new(6, 4)));
    }

    #[test]
    fn test_best_neighbor_skips_land_and_landlocked() {
        let mut grid = Grid::new(10, 10, 0.0).unwrap();
        grid.set(6, 4, 0.1).unwrap();
        let best = best_neighbor(&grid, Cell::new(5, 5), (8.0, 5.0), (2.0, 5.0));
        assert_eq!(best, Some(Cell::new(6, 5)));

        grid.region_set(5, 5, 3, 0.1);
        assert_eq!(best_neighbor(&grid, Cell::new(5, 5), (8.0, 5.0), (2.0, 5.0)), None);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut grid = Grid::new(8, 8, 0.0).unwrap();
        let mut rng = RandomSource::new(8);
        assert!(matches!(
            grow(&mut grid, &mut rng, Cell::new(4, 4), &params(4, 0)),
            Err(SynthError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_growth_is_reproducible() {
        let run = |seed| {
            let mut grid = Grid::new(48, 48, 0.0).unwrap();
            let mut rng = RandomSource::new(seed);
            let report = grow(&mut grid, &mut rng, Cell::new(24, 24), &params(256, 32)).unwrap();
            (report, grid.to_row_major())
        };
        assert_eq!(run(11), run(11));
        assert_ne!(run(11).1, run(12).1);
    }
}
