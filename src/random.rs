//! The single seeded random stream consumed by every generator.
//!
//! Components never reach for ambient randomness. Each one takes
//! `&mut RandomSource` and draws from it in a fixed order, so one seed
//! reproduces the whole heightmap.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::grid::Cell;

/// Offsets of the 8 neighbours in row-major order over the 3x3 block
/// (the center is skipped).
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Seeded pseudo-random generator.
#[derive(Clone, Debug)]
pub struct RandomSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform float in [lo, hi). Returns `lo` for an empty range.
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// Uniform float in [lo, hi) at double precision. Returns `lo` for an empty range.
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// Uniform integer in [lo, hi). Returns `lo` for an empty range.
    pub fn range_usize(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// True with probability `1 / one_in`. `one_in` of 0 or 1 always succeeds.
    pub fn one_in(&mut self, one_in: u32) -> bool {
        if one_in <= 1 {
            return true;
        }
        self.rng.gen_range(0..one_in) == 0
    }

    /// Unit vector with a uniformly distributed angle.
    pub fn direction(&mut self) -> (f32, f32) {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        (angle.cos(), angle.sin())
    }

    /// One of the 8 compass steps, each component in {-1, 0, 1} and never both zero.
    pub fn step_direction(&mut self) -> (i32, i32) {
        NEIGHBOR_OFFSETS[self.rng.gen_range(0..NEIGHBOR_OFFSETS.len())]
    }

    /// A uniformly chosen 8-neighbour of `cell`. May lie outside the grid;
    /// callers decide whether to clamp or recenter.
    pub fn adjacent_cell(&mut self, cell: Cell) -> Cell {
        let (dx, dz) = self.step_direction();
        cell.offset(dx, dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RandomSource::new(7);
        let mut b = RandomSource::new(7);
        for _ in 0..32 {
            assert_eq!(a.next_f32(), b.next_f32());
            assert_eq!(a.step_direction(), b.step_direction());
        }
    }

    #[test]
    fn test_empty_ranges_return_lower_bound() {
        let mut rng = RandomSource::new(1);
        assert_eq!(rng.range_f32(3.0, 3.0), 3.0);
        assert_eq!(rng.range_usize(5, 2), 5);
    }

    #[test]
    fn test_direction_is_unit_length() {
        let mut rng = RandomSource::new(99);
        for _ in 0..100 {
            let (x, z) = rng.direction();
            assert!(((x * x + z * z).sqrt() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_adjacent_cell_is_a_neighbor() {
        let mut rng = RandomSource::new(3);
        let center = Cell::new(10, 10);
        for _ in 0..100 {
            let next = rng.adjacent_cell(center);
            let dx = (next.x - center.x).abs();
            let dz = (next.z - center.z).abs();
            assert!(dx <= 1 && dz <= 1 && (dx, dz) != (0, 0));
        }
    }

    #[test]
    fn test_one_in_one_always_fires() {
        let mut rng = RandomSource::new(11);
        assert!((0..50).all(|_| rng.one_in(1)));
    }
}
