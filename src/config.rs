//! Run configuration.
//!
//! Every field has a default, so a JSON file only needs to name what it
//! changes. Elevations are given in world units and divided by the vertical
//! scale before they reach the grid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coastline::CoastlineParams;
use crate::error::{invalid, Result, SynthError};
use crate::network::BridgeParams;
use crate::refine::RefineParams;
use crate::scale::VerticalScale;

/// Which generator fills the grid before refinement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Voronoi rivers, bridges and flood-filled islands
    #[default]
    Archipelago,
    /// Agent-grown landmass from the grid center
    Coastline,
    /// Plain Perlin fill
    Noise,
}

impl GeneratorKind {
    /// Parse from string (for CLI)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "archipelago" | "arch" | "voronoi" | "islands" => Some(Self::Archipelago),
            "coastline" | "coast" | "agents" => Some(Self::Coastline),
            "noise" | "perlin" => Some(Self::Noise),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Archipelago => "archipelago",
            Self::Coastline => "coastline",
            Self::Noise => "noise",
        }
    }
}

/// Parameters for the archipelago generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchipelagoParams {
    /// Starting plateau (world units)
    pub base_elevation: f32,
    /// Site count is drawn from `[min_sites, max_sites)`
    pub min_sites: usize,
    pub max_sites: usize,
    /// Lloyd relaxation rounds
    pub relaxation: usize,
    pub river_width: usize,
    pub bridges: BridgeParams,
    /// Island heights are drawn from `[min, min + range)` (world units)
    pub island_height_min: f32,
    pub island_height_range: f32,
}

impl Default for ArchipelagoParams {
    fn default() -> Self {
        Self {
            base_elevation: 20.0,
            min_sites: 20,
            max_sites: 40,
            relaxation: 5,
            river_width: 3,
            bridges: BridgeParams::default(),
            island_height_min: 30.0,
            island_height_range: 90.0,
        }
    }
}

impl ArchipelagoParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_elevation > 0.0) {
            return Err(invalid("archipelago.base_elevation", "must be above sea level"));
        }
        if self.min_sites < 3 {
            return Err(invalid("archipelago.min_sites", "needs at least 3 sites"));
        }
        if self.max_sites < self.min_sites {
            return Err(invalid("archipelago.max_sites", "must not be below min_sites"));
        }
        if !(self.island_height_range >= 0.0) {
            return Err(invalid("archipelago.island_height_range", "must not be negative"));
        }
        self.bridges.validate()
    }
}

/// Full configuration of one synthesis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    /// World units per normalized elevation unit
    pub vertical_scale: VerticalScale,
    pub generator: GeneratorKind,
    pub archipelago: ArchipelagoParams,
    pub coastline: CoastlineParams,
    /// Elevation given to coastline-grown land (world units)
    pub coastline_elevation: f32,
    /// Perlin fill spacing: the grid spans `noise_divisor` noise periods
    pub noise_divisor: f64,
    pub refine: RefineParams,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            seed: 0,
            vertical_scale: VerticalScale::default(),
            generator: GeneratorKind::default(),
            archipelago: ArchipelagoParams::default(),
            coastline: CoastlineParams::default(),
            coastline_elevation: 60.0,
            noise_divisor: 5.0,
            refine: RefineParams::default(),
        }
    }
}

impl SynthConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check every parameter the selected generator and refinement use.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SynthError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !self.vertical_scale.is_valid() {
            return Err(invalid("vertical_scale", "must be positive and finite"));
        }
        match self.generator {
            GeneratorKind::Archipelago => self.archipelago.validate()?,
            GeneratorKind::Coastline => {
                if !(self.coastline_elevation > 0.0) {
                    return Err(invalid("coastline_elevation", "must be above sea level"));
                }
                self.coastline.validate()?;
            }
            GeneratorKind::Noise => {
                if !(self.noise_divisor > 0.0) {
                    return Err(invalid("noise_divisor", "must be positive"));
                }
            }
        }
        self.refine.validate()
    }
}
