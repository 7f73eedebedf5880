//! Terrain refinement passes: land-only Perlin detail, random-walk smoothing,
//! and the plain Perlin fill used by the noise generator.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid, Result};
use crate::grid::Grid;
use crate::random::RandomSource;
use crate::scale::{feature_scale, FEATURE_DIVISOR};

/// Permutation seed for every Perlin lookup. Variation between runs comes
/// from the sampling origins drawn off the random stream.
const PERLIN_SEED: u32 = 0;

/// Origins for the land detail pass are drawn in `[0, ORIGIN_SPAN)`.
const ORIGIN_SPAN: f64 = 256.0;

/// Origins for the Perlin fill are drawn in `[0, FILL_ORIGIN_SPAN)`.
const FILL_ORIGIN_SPAN: f64 = 0.1;

/// Parameters for the refinement passes that close every pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineParams {
    /// Noise amplitude in world units (normalized by the vertical scale)
    pub noise_amplitude: f32,
    /// Divides the noise contribution; must be positive
    pub noise_period: f32,
    pub walkers: usize,
    pub tokens_per_walker: usize,
    /// A walker returns to the center with probability `1 / return_chance`
    pub return_chance: u32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            noise_amplitude: 30.0,
            noise_period: 1.0,
            walkers: 200,
            tokens_per_walker: 2000,
            return_chance: 50,
        }
    }
}

impl RefineParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.noise_period > 0.0) {
            return Err(invalid("refine.noise_period", "must be positive"));
        }
        if !self.noise_amplitude.is_finite() {
            return Err(invalid("refine.noise_amplitude", "must be finite"));
        }
        Ok(())
    }
}

/// Perlin noise remapped from `[-1, 1]` to `[0, 1]`.
pub fn perlin01(perlin: &Perlin, x: f64, z: f64) -> f32 {
    ((perlin.get([x, z]) + 1.0) * 0.5).clamp(0.0, 1.0) as f32
}

/// Add Perlin detail to every land cell. Sea cells are left alone.
///
/// Draws the x origin then the z origin from `rng`. Returns the number of
/// cells changed.
pub fn apply_noise(grid: &mut Grid, rng: &mut RandomSource, amplitude: f32, period: f32) -> Result<usize> {
    if !(period > 0.0) {
        return Err(invalid("period", "must be positive"));
    }
    let perlin = Perlin::new(PERLIN_SEED);
    let ox = rng.range_f64(0.0, ORIGIN_SPAN);
    let oz = rng.range_f64(0.0, ORIGIN_SPAN);
    let scale_x = feature_scale(grid.width(), FEATURE_DIVISOR);
    let scale_z = feature_scale(grid.height(), FEATURE_DIVISOR);

    let mut touched = 0;
    for z in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let h = grid.get(x, z)?;
            if h <= 0.0 {
                continue;
            }
            let n = perlin01(&perlin, x as f64 / scale_x + ox, z as f64 / scale_z + oz);
            grid.set(x, z, h + amplitude * n / period)?;
            touched += 1;
        }
    }

    debug!(touched, ox, oz, "applied land noise");
    Ok(touched)
}

/// Random-walk smoothing from the grid center.
///
/// Each walker visits `tokens_per_walker` cells, replacing each with its
/// weighted neighbourhood average. After every visit it returns to the
/// center with probability `1 / return_chance`, otherwise it steps to a
/// random neighbour; stepping off the grid also sends it back.
pub fn smooth(
    grid: &mut Grid,
    rng: &mut RandomSource,
    walkers: usize,
    tokens_per_walker: usize,
    return_chance: u32,
) -> Result<()> {
    let start = grid.center();

    for _ in 0..walkers {
        let mut position = start;
        for _ in 0..tokens_per_walker {
            let average = grid.weighted_neighborhood_average(position.x, position.z)?;
            grid.set_cell(position, average)?;

            if rng.one_in(return_chance) {
                position = start;
            } else {
                let next = rng.adjacent_cell(position);
                position = if grid.contains_cell(next) { next } else { start };
            }
        }
    }

    debug!(walkers, tokens_per_walker, "smoothing complete");
    Ok(())
}

/// Overwrite every cell with `perlin01` sampled at `extent / divisor`
/// spacing. Origins are drawn in `[0, 0.1)`, x first.
pub fn fill_noise(grid: &mut Grid, rng: &mut RandomSource, divisor: f64) -> Result<()> {
    if !(divisor > 0.0) {
        return Err(invalid("divisor", "must be positive"));
    }
    let perlin = Perlin::new(PERLIN_SEED);
    let ox = rng.range_f64(0.0, FILL_ORIGIN_SPAN);
    let oz = rng.range_f64(0.0, FILL_ORIGIN_SPAN);
    let scale_x = feature_scale(grid.width(), divisor);
    let scale_z = feature_scale(grid.height(), divisor);

    for z in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let n = perlin01(&perlin, ox + x as f64 / scale_x, oz + z as f64 / scale_z);
            grid.set(x, z, n)?;
        }
    }
    Ok(())
}
