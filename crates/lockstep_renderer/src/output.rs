//! Pixel accumulation and image output.
//!
//! Colors stay on the 0-255 scale throughout; the only conversion on the
//! way out is a clamp to [0, 255] per channel.

use std::path::Path;

use crate::RenderError;
use lockstep_math::{to_rgb8, Color, BLACK, WHITE};

/// Row/column address of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelTag {
    pub row: u32,
    pub col: u32,
}

impl PixelTag {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Per-pixel running color sums and sample counts.
#[derive(Debug, Clone)]
pub struct PixelAccumulator {
    pub rows: u32,
    pub cols: u32,
    sums: Vec<Color>,
    samples: Vec<u32>,
}

impl PixelAccumulator {
    /// Create an accumulator with every pixel at zero.
    pub fn new(rows: u32, cols: u32) -> Self {
        let n = rows as usize * cols as usize;
        Self {
            rows,
            cols,
            sums: vec![Color::ZERO; n],
            samples: vec![0; n],
        }
    }

    #[inline]
    fn index(&self, pixel: PixelTag) -> usize {
        pixel.row as usize * self.cols as usize + pixel.col as usize
    }

    /// Add one terminal path color to a pixel.
    pub fn add(&mut self, pixel: PixelTag, color: Color) {
        let i = self.index(pixel);
        self.sums[i] += color;
        self.samples[i] += 1;
    }

    /// Fold another accumulator of the same size into this one.
    pub fn merge(&mut self, other: &PixelAccumulator) {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        for (sum, s) in self.sums.iter_mut().zip(&other.sums) {
            *sum += *s;
        }
        for (count, c) in self.samples.iter_mut().zip(&other.samples) {
            *count += *c;
        }
    }

    pub fn sum(&self, pixel: PixelTag) -> Color {
        self.sums[self.index(pixel)]
    }

    pub fn samples(&self, pixel: PixelTag) -> u32 {
        self.samples[self.index(pixel)]
    }

    /// Total number of contributions across all pixels.
    pub fn total_samples(&self) -> u64 {
        self.samples.iter().map(|&c| c as u64).sum()
    }

    /// First pixel whose sample count is not `expected`, with its count.
    pub fn find_incomplete(&self, expected: u32) -> Option<(PixelTag, u32)> {
        let cols = self.cols.max(1) as usize;
        self.samples
            .iter()
            .position(|&c| c != expected)
            .map(|i| (PixelTag::new((i / cols) as u32, (i % cols) as u32), self.samples[i]))
    }

    /// Average the sums over `rays_per_pixel` passes, clamped to [0, 255].
    pub fn resolve(&self, rays_per_pixel: u32) -> ImageBuffer {
        let scale = 1.0 / rays_per_pixel.max(1) as f32;
        ImageBuffer {
            rows: self.rows,
            cols: self.cols,
            pixels: self.sums.iter().map(|&sum| clamp_color(sum * scale)).collect(),
        }
    }
}

/// Clamp every channel to [0, 255].
#[inline]
pub fn clamp_color(color: Color) -> Color {
    color.clamp(BLACK, WHITE)
}

/// Final image: one 0-255 color per pixel, row-major.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub rows: u32,
    pub cols: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            pixels: vec![Color::ZERO; rows as usize * cols as usize],
        }
    }

    /// Get the pixel at (row, col).
    pub fn get(&self, row: u32, col: u32) -> Color {
        self.pixels[row as usize * self.cols as usize + col as usize]
    }

    /// Set the pixel at (row, col).
    pub fn set(&mut self, row: u32, col: u32, color: Color) {
        self.pixels[row as usize * self.cols as usize + col as usize] = color;
    }

    /// Clamp to [0, 255] and flatten to a rows x cols x 3 byte array.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&to_rgb8(*color));
        }
        bytes
    }

    /// Save the image; the format is chosen from the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let path = path.as_ref();
        let mismatch = || RenderError::BufferSize {
            rows: self.rows,
            cols: self.cols,
            pixels: self.pixels.len(),
        };
        if self.pixels.len() != self.rows as usize * self.cols as usize {
            return Err(mismatch());
        }
        let image =
            image::RgbImage::from_raw(self.cols, self.rows, self.to_rgb8()).ok_or_else(mismatch)?;
        image.save(path)?;
        log::info!("Saved {}x{} image to {}", self.cols, self.rows, path.display());
        Ok(())
    }
}
