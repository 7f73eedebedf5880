use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use terrain_synth::config::{GeneratorKind, SynthConfig};
use terrain_synth::error::{Result, SynthError};
use terrain_synth::{export, pipeline};

#[derive(Parser, Debug)]
#[command(name = "terrain_synth")]
#[command(about = "Synthesize procedural heightmaps: archipelagos, coastlines and Perlin terrain")]
struct Args {
    /// Width of the heightmap in cells (overrides the config file)
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the heightmap in cells (overrides the config file)
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Random seed (uses random seed if neither this nor the config sets one)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Generator: archipelago, coastline or noise
    #[arg(short, long)]
    generator: Option<String>,

    /// JSON configuration file; missing fields take defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Output PNG with the spectral colormap
    #[arg(short, long, default_value = "heightmap.png")]
    output: String,

    /// Also write a 16-bit grayscale PNG
    #[arg(long)]
    grayscale: Option<String>,

    /// Also write the full result as JSON
    #[arg(long)]
    json: Option<String>,
}

fn build_config(args: &Args) -> Result<SynthConfig> {
    let mut config = match &args.config {
        Some(path) => SynthConfig::from_json_file(path)?,
        None => SynthConfig {
            seed: rand::random(),
            ..SynthConfig::default()
        },
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(name) = &args.generator {
        config.generator = GeneratorKind::from_str(name).ok_or_else(|| SynthError::InvalidParameter {
            name: "generator",
            reason: format!("unknown generator '{}' (expected archipelago, coastline or noise)", name),
        })?;
    }

    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;
    info!("Generating {} heightmap with seed: {}", config.generator.name(), config.seed);
    info!("Map size: {}x{}", config.width, config.height);

    let output = pipeline::generate(&config)?;
    info!(
        "Heightmap range: {:.3} to {:.3} ({:.1}% above sea level)",
        output.stats.min,
        output.stats.max,
        output.stats.land_fraction * 100.0
    );
    if let Some(growth) = &output.growth {
        info!(
            "Coastline: {} leaf agents raised {} cells (depth {})",
            growth.leaves.len(),
            growth.cells_raised,
            growth.max_depth
        );
    }
    if !output.sites.is_empty() {
        info!(
            "Archipelago: {} sites, {} edges, {} bridges",
            output.sites.len(),
            output.edges.len(),
            output.bridges.len()
        );
    }

    export::export_heightmap(&output, &args.output)?;
    if let Some(path) = &args.grayscale {
        export::export_grayscale(&output, path)?;
    }
    if let Some(path) = &args.json {
        export::export_json(&output, path)?;
    }

    info!("Done!");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
