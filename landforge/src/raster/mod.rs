//! Raster primitives.
//!
//! Thin helpers over the `image` crate used by every pipeline stage:
//! decoding and encoding PNG buffers, resampling, grayscale conversion,
//! thresholding, per-pixel composite operators and edge extraction.
//!
//! Colour rasters are always handled as [`RgbaImage`] and single-channel
//! rasters as [`GrayImage`], so stage code never has to match on
//! `DynamicImage` variants.

mod ops;

pub use ops::{add, difference, edge_pixels, multiply, negate, threshold, Edge};

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbaImage};
use thiserror::Error;

/// Errors raised by raster operations.
#[derive(Debug, Error)]
pub enum RasterError {
    /// Bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Image could not be encoded
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Operands of a binary operation differ in size
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A height field whose length is not a perfect square
    #[error("Height field of length {0} is not square")]
    NotSquare(usize),

    /// Stitching needs exactly four inputs
    #[error("Expected {expected} images, got {actual}")]
    WrongImageCount { expected: usize, actual: usize },

    /// A quad-tree leaf has no image to composite
    #[error("No image for tile node {0}")]
    MissingTile(usize),

    /// Reading an image file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Decodes a PNG into RGBA.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(RasterError::Decode)
}

/// Reads and decodes an image file into RGBA.
pub fn load(path: &Path) -> Result<RgbaImage, RasterError> {
    let bytes = std::fs::read(path).map_err(|source| RasterError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode(&bytes)
}

/// Encodes an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    encode(DynamicImage::ImageRgba8(image.clone()))
}

/// Encodes a single-channel image as an 8-bit grayscale PNG.
pub fn encode_gray_png(image: &GrayImage) -> Result<Vec<u8>, RasterError> {
    encode(DynamicImage::ImageLuma8(image.clone()))
}

fn encode(image: DynamicImage) -> Result<Vec<u8>, RasterError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(RasterError::Encode)?;
    Ok(buffer.into_inner())
}

/// Resamples with bilinear filtering.
pub fn resize(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Resamples with nearest-neighbour filtering.
///
/// Used for classified rasters, where interpolation would invent colours
/// that are not in the palette.
pub fn resize_nearest(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image::imageops::resize(image, width, height, FilterType::Nearest)
}

/// Converts to 8-bit luminance.
pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Fails with [`RasterError::DimensionMismatch`] unless both sizes agree.
pub fn ensure_same_size(expected: (u32, u32), actual: (u32, u32)) -> Result<(), RasterError> {
    if expected != actual {
        return Err(RasterError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
