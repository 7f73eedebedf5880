//! End-to-end synthesis runs through the public API.

use terrain_synth::coastline::CoastlineParams;
use terrain_synth::config::ArchipelagoParams;
use terrain_synth::refine::RefineParams;
use terrain_synth::{generate, GeneratorKind, SynthConfig, SynthError};

fn config(generator: GeneratorKind, seed: u64) -> SynthConfig {
    SynthConfig {
        width: 80,
        height: 64,
        seed,
        generator,
        archipelago: ArchipelagoParams {
            min_sites: 5,
            max_sites: 9,
            relaxation: 1,
            ..ArchipelagoParams::default()
        },
        coastline: CoastlineParams {
            total_tokens: 300,
            split_threshold: 40,
            ..CoastlineParams::default()
        },
        refine: RefineParams {
            walkers: 8,
            tokens_per_walker: 150,
            ..RefineParams::default()
        },
        ..SynthConfig::default()
    }
}

const GENERATORS: [GeneratorKind; 3] = [
    GeneratorKind::Archipelago,
    GeneratorKind::Coastline,
    GeneratorKind::Noise,
];

#[test]
fn test_same_seed_same_heightmap() {
    for generator in GENERATORS {
        let a = generate(&config(generator, 42)).unwrap();
        let b = generate(&config(generator, 42)).unwrap();
        assert_eq!(a.heights, b.heights, "{:?} is not reproducible", generator);
    }
}

#[test]
fn test_different_seed_different_heightmap() {
    for generator in GENERATORS {
        let a = generate(&config(generator, 1)).unwrap();
        let b = generate(&config(generator, 2)).unwrap();
        assert_ne!(a.heights, b.heights, "{:?} ignored the seed", generator);
    }
}

#[test]
fn test_output_is_normalized() {
    for generator in GENERATORS {
        let output = generate(&config(generator, 7)).unwrap();
        assert_eq!(output.heights.len(), 80 * 64);
        assert!(
            output.heights.iter().all(|h| (0.0..=1.0).contains(h)),
            "{:?} produced out-of-range heights",
            generator
        );
        assert!(output.stats.min >= 0.0 && output.stats.max <= 1.0);
    }
}

#[test]
fn test_zero_size_rejected() {
    let bad = SynthConfig {
        width: 0,
        ..config(GeneratorKind::Noise, 1)
    };
    assert!(matches!(generate(&bad), Err(SynthError::InvalidDimensions { .. })));
}

#[test]
fn test_invalid_parameters_rejected() {
    let mut bad = config(GeneratorKind::Coastline, 1);
    bad.coastline.split_threshold = 0;
    assert!(matches!(generate(&bad), Err(SynthError::InvalidParameter { .. })));

    let mut bad = config(GeneratorKind::Archipelago, 1);
    bad.archipelago.max_sites = 2;
    assert!(matches!(generate(&bad), Err(SynthError::InvalidParameter { .. })));
}

#[test]
fn test_config_json_drives_generation() {
    let config = SynthConfig::from_json(
        r#"{
            "width": 48,
            "height": 40,
            "seed": 9,
            "generator": "noise",
            "refine": { "walkers": 2, "tokens_per_walker": 50 }
        }"#,
    )
    .unwrap();
    let output = generate(&config).unwrap();
    assert_eq!((output.width, output.height), (48, 40));
    assert_eq!(output.seed, 9);
    assert!(output.sites.is_empty() && output.growth.is_none());
}
