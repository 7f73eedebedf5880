//! End-to-end synthesis: seed the random stream, build the grid, run the
//! selected generator, refine and clamp.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::coastline::{grow, CoastlineParams, GrowthReport};
use crate::config::{GeneratorKind, SynthConfig};
use crate::error::Result;
use crate::grid::{Grid, GridStats};
use crate::islands::{segment, Island};
use crate::network::{carve_network, grow_connections, Bridge};
use crate::random::RandomSource;
use crate::refine::{apply_noise, fill_noise, smooth};
use crate::voronoi::{random_sites, Edge, Rect, Site, VoronoiDiagram};

/// Everything a run produced. Heights are row-major (`z * width + x`) and
/// lie in `[0, 1]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthOutput {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub generator: GeneratorKind,
    pub heights: Vec<f32>,
    pub sites: Vec<Site>,
    pub edges: Vec<Edge>,
    pub islands: Vec<Island>,
    pub bridges: Vec<Bridge>,
    pub growth: Option<GrowthReport>,
    pub stats: GridStats,
    /// Cells pulled back into `[0, 1]` by the final clamp
    pub clamped_cells: usize,
}

impl SynthOutput {
    /// Height at `(x, z)`, or `None` outside the grid.
    pub fn height_at(&self, x: usize, z: usize) -> Option<f32> {
        if x < self.width && z < self.height {
            self.heights.get(z * self.width + x).copied()
        } else {
            None
        }
    }
}

/// Intermediate products of a generator stage.
#[derive(Default)]
struct Features {
    sites: Vec<Site>,
    edges: Vec<Edge>,
    islands: Vec<Island>,
    bridges: Vec<Bridge>,
    growth: Option<GrowthReport>,
}

/// Run a full synthesis from `config`.
pub fn generate(config: &SynthConfig) -> Result<SynthOutput> {
    config.validate()?;
    let mut rng = RandomSource::new(config.seed);

    info!(
        seed = config.seed,
        width = config.width,
        height = config.height,
        generator = config.generator.name(),
        "starting synthesis"
    );

    let (mut grid, features) = match config.generator {
        GeneratorKind::Archipelago => archipelago(config, &mut rng)?,
        GeneratorKind::Coastline => coastline(config, &mut rng)?,
        GeneratorKind::Noise => {
            let mut grid = Grid::new(config.width, config.height, 0.0)?;
            info!(divisor = config.noise_divisor, "filling with perlin noise");
            fill_noise(&mut grid, &mut rng, config.noise_divisor)?;
            (grid, Features::default())
        }
    };

    refine(config, &mut grid, &mut rng)?;

    let clamped_cells = grid.clamp_values(0.0, 1.0);
    if clamped_cells > 0 {
        warn!(clamped_cells, "clamped out-of-range elevations into [0, 1]");
    }

    let stats = grid.stats();
    info!(
        min = stats.min,
        max = stats.max,
        mean = stats.mean,
        land_fraction = stats.land_fraction,
        "synthesis complete"
    );

    Ok(SynthOutput {
        width: grid.width(),
        height: grid.height(),
        seed: config.seed,
        generator: config.generator,
        heights: grid.to_row_major(),
        sites: features.sites,
        edges: features.edges,
        islands: features.islands,
        bridges: features.bridges,
        growth: features.growth,
        stats,
        clamped_cells,
    })
}

fn archipelago(config: &SynthConfig, rng: &mut RandomSource) -> Result<(Grid, Features)> {
    let params = &config.archipelago;
    let scale = config.vertical_scale;
    let base = scale.normalize(params.base_elevation);
    let mut grid = Grid::new(config.width, config.height, base)?;

    let count = rng.range_usize(params.min_sites, params.max_sites);
    let points = random_sites(rng, count, config.width, config.height);
    info!(drawn = count, relaxation = params.relaxation, "partitioning into voronoi cells");
    let bounds = Rect::new(0.0, 0.0, config.width as f64, config.height as f64);
    let diagram = VoronoiDiagram::build(&points, bounds, params.relaxation)?;

    info!(
        sites = diagram.sites.len(),
        edges = diagram.edges.len(),
        "carving river network"
    );
    carve_network(&mut grid, &diagram, params.river_width);

    info!(rounds = params.bridges.iterations, "growing bridges");
    let bridges = grow_connections(&mut grid, rng, &diagram.sites, &params.bridges)?;

    info!("raising islands");
    let islands = segment(
        &mut grid,
        rng,
        &diagram.sites,
        base,
        scale.normalize(params.island_height_min),
        scale.normalize(params.island_height_range),
    )?;
    let raised = islands.iter().filter(|i| !i.is_empty()).count();
    info!(islands = raised, "islands raised");

    let VoronoiDiagram { sites, edges, .. } = diagram;
    Ok((
        grid,
        Features {
            sites,
            edges,
            islands,
            bridges,
            growth: None,
        },
    ))
}

fn coastline(config: &SynthConfig, rng: &mut RandomSource) -> Result<(Grid, Features)> {
    let mut grid = Grid::new(config.width, config.height, 0.0)?;
    let params = CoastlineParams {
        land_height: config.vertical_scale.normalize(config.coastline_elevation),
        ..config.coastline.clone()
    };

    info!(tokens = params.total_tokens, threshold = params.split_threshold, "growing coastline");
    let start = grid.center();
    let report = grow(&mut grid, rng, start, &params)?;
    info!(
        leaves = report.leaves.len(),
        cells = report.cells_raised,
        "coastline grown"
    );

    Ok((
        grid,
        Features {
            growth: Some(report),
            ..Features::default()
        },
    ))
}

fn refine(config: &SynthConfig, grid: &mut Grid, rng: &mut RandomSource) -> Result<()> {
    let params = &config.refine;
    info!("refining terrain");
    let amplitude = config.vertical_scale.normalize(params.noise_amplitude);
    apply_noise(grid, rng, amplitude, params.noise_period)?;
    smooth(
        grid,
        rng,
        params.walkers,
        params.tokens_per_walker,
        params.return_chance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchipelagoParams;
    use crate::network::BridgeParams;
    use crate::refine::RefineParams;

    fn small(generator: GeneratorKind, seed: u64) -> SynthConfig {
        SynthConfig {
            width: 96,
            height: 96,
            seed,
            generator,
            archipelago: ArchipelagoParams {
                min_sites: 6,
                max_sites: 10,
                relaxation: 2,
                bridges: BridgeParams {
                    width: 2,
                    ..BridgeParams::default()
                },
                ..ArchipelagoParams::default()
            },
            coastline: CoastlineParams {
                total_tokens: 400,
                split_threshold: 50,
                ..CoastlineParams::default()
            },
            refine: RefineParams {
                walkers: 10,
                tokens_per_walker: 200,
                ..RefineParams::default()
            },
            ..SynthConfig::default()
        }
    }

    #[test]
    fn test_archipelago_produces_features() {
        let output = generate(&small(GeneratorKind::Archipelago, 3)).unwrap();
        assert_eq!(output.heights.len(), 96 * 96);
        assert!(output.sites.len() >= 6 && output.sites.len() < 10);
        assert_eq!(output.islands.len(), output.sites.len());
        assert_eq!(output.bridges.len(), output.sites.len());
        assert!(output.growth.is_none());
        assert!(output.stats.land_fraction > 0.0);
    }

    #[test]
    fn test_unrelaxed_archipelago_bridges_every_site() {
        // Unrelaxed sites regularly land within a cell of the border.
        for seed in 0..6 {
            let mut config = small(GeneratorKind::Archipelago, seed);
            config.archipelago.relaxation = 0;
            let output = generate(&config).unwrap();
            assert_eq!(output.bridges.len(), output.sites.len());
        }
    }

    #[test]
    fn test_coastline_reports_growth() {
        let output = generate(&small(GeneratorKind::Coastline, 4)).unwrap();
        let growth = output.growth.unwrap();
        // 400 -> 200 -> 100 -> 50 -> 25: sixteen leaves of 25 tokens
        assert_eq!(growth.leaves.len(), 16);
        assert_eq!(growth.cells_raised, 400);
        assert!(output.sites.is_empty());
        assert!(output.stats.land_fraction > 0.0);
    }

    #[test]
    fn test_height_at_bounds() {
        let output = generate(&small(GeneratorKind::Noise, 5)).unwrap();
        assert_eq!(output.height_at(0, 0), Some(output.heights[0]));
        assert_eq!(output.height_at(95, 95), Some(output.heights[96 * 96 - 1]));
        assert_eq!(output.height_at(96, 0), None);
    }

    #[test]
    fn test_invalid_config_fails_before_generating() {
        let config = SynthConfig {
            height: 0,
            ..small(GeneratorKind::Noise, 1)
        };
        assert!(generate(&config).is_err());
    }
}
