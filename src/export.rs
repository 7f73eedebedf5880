//! Image and JSON export of synthesis results.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use tracing::info;

use crate::error::Result;
use crate::pipeline::SynthOutput;

/// 16-bit grayscale image, as used by terrain importers.
pub type GrayImage16 = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Render heights with the spectral colormap (low = blue, high = red).
pub fn render_heightmap(output: &SynthOutput) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(output.width as u32, output.height as u32);

    for (i, &h) in output.heights.iter().enumerate() {
        let x = (i % output.width) as u32;
        let z = (i / output.width) as u32;
        img.put_pixel(x, z, Rgb(spectral_colormap(h.clamp(0.0, 1.0))));
    }

    img
}

/// Render heights as 16-bit luminance, 0 -> black, 1 -> white.
pub fn render_grayscale(output: &SynthOutput) -> GrayImage16 {
    let mut img: GrayImage16 = ImageBuffer::new(output.width as u32, output.height as u32);

    for (i, &h) in output.heights.iter().enumerate() {
        let x = (i % output.width) as u32;
        let z = (i / output.width) as u32;
        let level = (h.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16;
        img.put_pixel(x, z, Luma([level]));
    }

    img
}

/// Export the heightmap as a colored PNG.
pub fn export_heightmap(output: &SynthOutput, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    render_heightmap(output).save(path)?;
    info!(path = %path.display(), "wrote heightmap image");
    Ok(())
}

/// Export the heightmap as a 16-bit grayscale PNG.
pub fn export_grayscale(output: &SynthOutput, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    render_grayscale(output).save(path)?;
    info!(path = %path.display(), "wrote grayscale heightmap");
    Ok(())
}

/// Dump the whole output (heights, sites, edges, islands, bridges, growth)
/// as pretty-printed JSON.
pub fn export_json(output: &SynthOutput, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, output)?;
    info!(path = %path.display(), "wrote json dump");
    Ok(())
}

/// Spectral colormap (matplotlib style): dark blue -> cyan -> green -> yellow -> orange -> red
fn spectral_colormap(t: f32) -> [u8; 3] {
    let colors: [[f32; 3]; 11] = [
        [0.37, 0.31, 0.64],  // Dark blue/purple (sea level)
        [0.20, 0.53, 0.74],  // Blue
        [0.40, 0.76, 0.65],  // Teal
        [0.67, 0.87, 0.64],  // Light green
        [0.90, 0.96, 0.60],  // Yellow-green
        [1.00, 1.00, 0.75],  // Light yellow
        [1.00, 0.88, 0.55],  // Yellow
        [0.99, 0.68, 0.38],  // Light orange
        [0.96, 0.43, 0.26],  // Orange
        [0.84, 0.24, 0.31],  // Red
        [0.62, 0.00, 0.26],  // Dark red (peak)
    ];

    let t_scaled = t * 10.0;
    let idx = (t_scaled as usize).min(9);
    let frac = t_scaled - idx as f32;

    let c1 = colors[idx];
    let c2 = colors[idx + 1];

    [
        ((c1[0] + (c2[0] - c1[0]) * frac) * 255.0) as u8,
        ((c1[1] + (c2[1] - c1[1]) * frac) * 255.0) as u8,
        ((c1[2] + (c2[2] - c1[2]) * frac) * 255.0) as u8,
    ]
}
