//! The elevation grid every generator writes into.
//!
//! Access policy: `get`/`set` reject coordinates outside `[0,W) x [0,H)` with
//! [`SynthError::OutOfRange`]. Stamping (`region_set`) and the neighbourhood
//! average clip silently, since both are defined over partially covered areas.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::random::NEIGHBOR_OFFSETS;
use crate::tilemap::Tilemap;

/// Integer grid coordinate. May be negative while a walker is between steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Cell containing a continuous position (floor).
    pub fn from_position(x: f64, z: f64) -> Self {
        Self::new(x.floor() as i32, z.floor() as i32)
    }
}

/// Summary statistics over the whole grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Fraction of cells strictly above sea level.
    pub land_fraction: f32,
}

/// W x H elevation array plus a same-shaped scratch score array.
#[derive(Clone, Debug)]
pub struct Grid {
    heights: Tilemap<f32>,
    scores: Tilemap<f32>,
}

impl Grid {
    /// Create a grid with every cell set to `fill`.
    pub fn new(width: usize, height: usize, fill: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SynthError::InvalidDimensions { width, height });
        }
        Ok(Self {
            heights: Tilemap::new_with(width, height, fill),
            scores: Tilemap::new_with(width, height, 0.0),
        })
    }

    pub fn width(&self) -> usize {
        self.heights.width
    }

    pub fn height(&self) -> usize {
        self.heights.height
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        self.heights.contains(x, z)
    }

    pub fn contains_cell(&self, cell: Cell) -> bool {
        self.contains(cell.x, cell.z)
    }

    /// Grid center, used as the reference point for agents and walkers.
    pub fn center(&self) -> Cell {
        Cell::new((self.width() / 2) as i32, (self.height() / 2) as i32)
    }

    /// Clamp a cell onto the grid.
    pub fn clamp_cell(&self, cell: Cell) -> Cell {
        Cell::new(
            cell.x.clamp(0, self.width() as i32 - 1),
            cell.z.clamp(0, self.height() as i32 - 1),
        )
    }

    fn check(&self, x: i32, z: i32) -> Result<(usize, usize)> {
        if self.contains(x, z) {
            Ok((x as usize, z as usize))
        } else {
            Err(SynthError::OutOfRange {
                x,
                z,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    pub fn get(&self, x: i32, z: i32) -> Result<f32> {
        let (ux, uz) = self.check(x, z)?;
        Ok(*self.heights.get(ux, uz))
    }

    pub fn set(&mut self, x: i32, z: i32, value: f32) -> Result<()> {
        let (ux, uz) = self.check(x, z)?;
        self.heights.set(ux, uz, value);
        Ok(())
    }

    pub fn get_cell(&self, cell: Cell) -> Result<f32> {
        self.get(cell.x, cell.z)
    }

    pub fn set_cell(&mut self, cell: Cell, value: f32) -> Result<()> {
        self.set(cell.x, cell.z, value)
    }

    /// Set a `size x size` square starting at `c - (size-1)/2`, clipped to the grid.
    pub fn region_set(&mut self, cx: i32, cz: i32, size: usize, value: f32) {
        if size == 0 {
            return;
        }
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        let half = (size - 1) / 2;
        let span = |center: i32, len: usize| {
            let start = i64::from(center) - half;
            let end = start.saturating_add(size);
            (start.max(0), end.min(len as i64))
        };
        let (x0, x1) = span(cx, self.width());
        let (z0, z1) = span(cz, self.height());
        for z in z0..z1 {
            for x in x0..x1 {
                self.heights.set(x as usize, z as usize, value);
            }
        }
    }

    /// Extended-cross average: the cell itself plus the horizontal run
    /// `x-2..=x+2` and the vertical run `z-2..=z+2`. Both runs pass through
    /// the center, so a fully interior cell averages 11 samples with the
    /// center counted three times. Out-of-range samples are skipped and not
    /// counted. A zero sum reports 0.
    pub fn weighted_neighborhood_average(&self, x: i32, z: i32) -> Result<f32> {
        let (ux, uz) = self.check(x, z)?;
        let mut sum = *self.heights.get(ux, uz);
        let mut samples = 1u32;

        for d in -2..=2 {
            if self.contains(x + d, z) {
                sum += *self.heights.get((x + d) as usize, uz);
                samples += 1;
            }
            if self.contains(x, z + d) {
                sum += *self.heights.get(ux, (z + d) as usize);
                samples += 1;
            }
        }

        if sum == 0.0 {
            return Ok(0.0);
        }
        Ok(sum / samples as f32)
    }

    /// Land is anything strictly above sea level.
    pub fn is_land(&self, cell: Cell) -> Result<bool> {
        Ok(self.get_cell(cell)? > 0.0)
    }

    /// In-bounds 8-neighbours of `cell` that are still sea, row-major order.
    pub fn open_neighbors(&self, cell: Cell) -> Vec<Cell> {
        NEIGHBOR_OFFSETS
            .iter()
            .map(|&(dx, dz)| cell.offset(dx, dz))
            .filter(|n| self.contains_cell(*n))
            .filter(|n| *self.heights.get(n.x as usize, n.z as usize) <= 0.0)
            .collect()
    }

    /// A cell is landlocked when none of its in-bounds neighbours is sea.
    pub fn is_landlocked(&self, cell: Cell) -> bool {
        self.open_neighbors(cell).is_empty()
    }

    // -------------------------------------------------------------------------
    // Scratch score array
    // -------------------------------------------------------------------------

    pub fn score(&self, x: i32, z: i32) -> Result<f32> {
        let (ux, uz) = self.check(x, z)?;
        Ok(*self.scores.get(ux, uz))
    }

    pub fn set_score(&mut self, x: i32, z: i32, value: f32) -> Result<()> {
        let (ux, uz) = self.check(x, z)?;
        self.scores.set(ux, uz, value);
        Ok(())
    }

    /// Add to a cell's score. Out-of-range cells are ignored.
    pub fn add_score(&mut self, x: i32, z: i32, amount: f32) {
        if self.contains(x, z) {
            *self.scores.get_mut(x as usize, z as usize) += amount;
        }
    }

    pub fn clear_scores(&mut self) {
        self.scores.fill(0.0);
    }

    /// Highest-scoring cell; ties go to the first in row-major order.
    /// `None` once every score is `-inf`.
    pub fn max_score_cell(&self) -> Option<Cell> {
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;
        for (x, z, &s) in self.scores.iter() {
            if s > best_score {
                best_score = s;
                best = Some(Cell::new(x as i32, z as i32));
            }
        }
        best
    }

    // -------------------------------------------------------------------------
    // Aggregates and export
    // -------------------------------------------------------------------------

    pub fn stats(&self) -> GridStats {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0f64;
        let mut land = 0usize;
        for (_, _, &h) in self.heights.iter() {
            min = min.min(h);
            max = max.max(h);
            sum += h as f64;
            if h > 0.0 {
                land += 1;
            }
        }
        let cells = (self.width() * self.height()) as f64;
        GridStats {
            min,
            max,
            mean: (sum / cells) as f32,
            land_fraction: (land as f64 / cells) as f32,
        }
    }

    /// Clamp every value into `[lo, hi]`. Returns how many cells changed.
    pub fn clamp_values(&mut self, lo: f32, hi: f32) -> usize {
        let mut changed = 0;
        for (_, _, h) in self.heights.iter_mut() {
            let clamped = h.clamp(lo, hi);
            if clamped != *h {
                *h = clamped;
                changed += 1;
            }
        }
        changed
    }

    pub fn heights(&self) -> &Tilemap<f32> {
        &self.heights
    }

    /// Copy of the elevations in row-major order (`index = z * width + x`).
    pub fn to_row_major(&self) -> Vec<f32> {
        self.heights.as_slice().to_vec()
    }
}
