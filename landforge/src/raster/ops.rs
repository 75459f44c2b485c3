//! Per-pixel composite operators on single-channel rasters.

use image::{GrayImage, Luma};

use super::{ensure_same_size, RasterError};

/// Side of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    /// The edge that touches this one on a horizontally or vertically adjacent raster.
    pub fn opposite(self) -> Edge {
        match self {
            Edge::Top => Edge::Bottom,
            Edge::Right => Edge::Left,
            Edge::Bottom => Edge::Top,
            Edge::Left => Edge::Right,
        }
    }
}

/// Binarizes to 0/255: pixels at or above `level` become white.
pub fn threshold(image: &GrayImage, level: u8) -> GrayImage {
    map(image, |v| if v >= level { 255 } else { 0 })
}

/// Inverts every pixel.
pub fn negate(image: &GrayImage) -> GrayImage {
    map(image, |v| 255 - v)
}

/// Absolute per-pixel difference.
pub fn difference(a: &GrayImage, b: &GrayImage) -> Result<GrayImage, RasterError> {
    zip(a, b, |x, y| x.abs_diff(y))
}

/// Saturating per-pixel sum.
pub fn add(a: &GrayImage, b: &GrayImage) -> Result<GrayImage, RasterError> {
    zip(a, b, |x, y| x.saturating_add(y))
}

/// Per-pixel product, with 255 acting as 1.0.
pub fn multiply(a: &GrayImage, b: &GrayImage) -> Result<GrayImage, RasterError> {
    zip(a, b, |x, y| ((x as u16 * y as u16 + 127) / 255) as u8)
}

/// Pixel values along one edge, in reading order (left to right, top to bottom).
pub fn edge_pixels(image: &GrayImage, edge: Edge) -> Vec<u8> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    match edge {
        Edge::Top => (0..width).map(|x| image.get_pixel(x, 0)[0]).collect(),
        Edge::Bottom => (0..width).map(|x| image.get_pixel(x, height - 1)[0]).collect(),
        Edge::Left => (0..height).map(|y| image.get_pixel(0, y)[0]).collect(),
        Edge::Right => (0..height).map(|y| image.get_pixel(width - 1, y)[0]).collect(),
    }
}

fn map(image: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        px[0] = f(px[0]);
    }
    out
}

fn zip(a: &GrayImage, b: &GrayImage, f: impl Fn(u8, u8) -> u8) -> Result<GrayImage, RasterError> {
    ensure_same_size(a.dimensions(), b.dimensions())?;
    Ok(GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([f(a.get_pixel(x, y)[0], b.get_pixel(x, y)[0])])
    }))
}
