//! Procedural heightmap synthesis library
//!
//! Re-exports modules for use by the CLI and integration tests.

pub mod coastline;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod islands;
pub mod network;
pub mod pipeline;
pub mod random;
pub mod raster;
pub mod refine;
pub mod scale;
pub mod tilemap;
pub mod voronoi;

pub use config::{GeneratorKind, SynthConfig};
pub use error::{Result, SynthError};
pub use grid::{Cell, Grid};
pub use pipeline::{generate, SynthOutput};
pub use random::RandomSource;
