use super::RenderError;
use crate::core::models::angles::Domain;
use image::{ImageFormat, Rgba, RgbaImage};
use plotters::style::colors::colormaps::{ColorMap, ViridisRGB};
use std::path::Path;

/// A fixed-resolution raster over a fixed 2D angle domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityCanvas {
    pub width: u32,
    pub height: u32,
    pub x_range: Domain,
    pub y_range: Domain,
}

/// Sample counts per pixel; row 0 is the top of the image (highest y).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityGrid {
    width: u32,
    height: u32,
    counts: Vec<u32>,
}

impl DensityCanvas {
    pub fn new(width: u32, height: u32, domain: Domain) -> Self {
        Self {
            width,
            height,
            x_range: domain,
            y_range: domain,
        }
    }

    /// Bins `samples` into pixels. Samples outside the domain or not finite are
    /// dropped; a sample on the upper edge lands in the last pixel.
    pub fn aggregate(&self, samples: &[(f64, f64)]) -> DensityGrid {
        let mut grid = DensityGrid {
            width: self.width,
            height: self.height,
            counts: vec![0; self.width as usize * self.height as usize],
        };
        for &(x, y) in samples {
            let (Some(col), Some(bin_y)) = (
                bin(x, self.x_range, self.width),
                bin(y, self.y_range, self.height),
            ) else {
                continue;
            };
            let row = self.height - 1 - bin_y;
            grid.counts[(row * self.width + col) as usize] += 1;
        }
        grid
    }

    pub fn render(&self, samples: &[(f64, f64)]) -> RgbaImage {
        self.aggregate(samples).shade()
    }

    pub fn render_to_path(&self, samples: &[(f64, f64)], path: &Path) -> Result<(), RenderError> {
        self.render(samples)
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| RenderError::Image {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

fn bin(value: f64, range: Domain, pixels: u32) -> Option<u32> {
    if !value.is_finite() || !range.contains(value) || range.span() <= 0.0 {
        return None;
    }
    let scaled = ((value - range.lo) / range.span() * pixels as f64).floor() as u32;
    Some(scaled.min(pixels - 1))
}

impl DensityGrid {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn count(&self, col: u32, row: u32) -> u32 {
        self.counts[(row * self.width + col) as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Colours each pixel by `ln(1 + count) / ln(1 + max)` along viridis; empty
    /// pixels stay transparent.
    pub fn shade(&self) -> RgbaImage {
        let norm = (1.0 + self.max() as f64).ln();
        RgbaImage::from_fn(self.width, self.height, |col, row| {
            let count = self.count(col, row);
            if count == 0 {
                return Rgba([0, 0, 0, 0]);
            }
            let [r, g, b] = viridis((1.0 + count as f64).ln() / norm);
            Rgba([r, g, b, 255])
        })
    }
}

/// Viridis at `t`, clamped to `[0, 1]`; NaN maps to the dark end.
pub fn viridis(t: f64) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let color = ViridisRGB.get_color(t as f32);
    [color.0, color.1, color.2]
}
