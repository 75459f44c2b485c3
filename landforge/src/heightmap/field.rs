//! Square height fields.

use image::{GrayImage, ImageBuffer, Luma, RgbaImage};

use crate::raster::RasterError;

/// Terrain-RGB base offset in metres.
const TERRAIN_RGB_BASE: f64 = -10000.0;

/// Terrain-RGB resolution in metres per unit.
const TERRAIN_RGB_STEP: f64 = 0.1;

/// A square grid of heights, stored row-major.
///
/// Values are nominally in `[0, 1]` but intermediate results of
/// [`super::merge`] may leave that range until [`HeightField::normalize`]
/// is called.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    size: usize,
    data: Vec<f32>,
}

/// Elevation range in metres observed while decoding terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationRange {
    pub min: f64,
    pub max: f64,
}

impl HeightField {
    /// A field of zeros with `size × size` cells.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Wraps row-major data, which must have a perfect-square length.
    pub fn from_vec(data: Vec<f32>) -> Result<Self, RasterError> {
        let size = (data.len() as f64).sqrt().round() as usize;
        if size * size != data.len() {
            return Err(RasterError::NotSquare(data.len()));
        }
        Ok(Self { size, data })
    }

    /// Decodes a Mapbox Terrain-RGB raster and min-max normalizes it.
    ///
    /// Returns the normalized field and the elevation range in metres.
    pub fn from_terrain_rgb(image: &RgbaImage) -> Result<(Self, ElevationRange), RasterError> {
        let (width, height) = image.dimensions();
        if width != height {
            return Err(RasterError::NotSquare((width * height) as usize));
        }

        let metres: Vec<f64> = image
            .pixels()
            .map(|px| {
                let [r, g, b, _] = px.0;
                TERRAIN_RGB_BASE
                    + (r as f64 * 65536.0 + g as f64 * 256.0 + b as f64) * TERRAIN_RGB_STEP
            })
            .collect();

        let range = metres.iter().fold(
            ElevationRange {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |acc, &h| ElevationRange {
                min: acc.min.min(h),
                max: acc.max.max(h),
            },
        );

        let span = range.max - range.min;
        let data = metres
            .iter()
            .map(|&h| {
                if span > 0.0 {
                    ((h - range.min) / span) as f32
                } else {
                    0.0
                }
            })
            .collect();

        Ok((
            Self {
                size: width as usize,
                data,
            },
            range,
        ))
    }

    /// Reads an 8-bit grayscale raster, mapping 0..255 onto 0..1.
    pub fn from_gray(image: &GrayImage) -> Result<Self, RasterError> {
        let (width, height) = image.dimensions();
        if width != height {
            return Err(RasterError::NotSquare((width * height) as usize));
        }
        Ok(Self {
            size: width as usize,
            data: image.pixels().map(|px| px[0] as f32 / 255.0).collect(),
        })
    }

    /// Rasterizes to 8-bit grayscale, 0 for the lowest value and 255 for the highest.
    ///
    /// Values outside `[0, 1]` are clamped.
    pub fn to_gray(&self) -> GrayImage {
        let side = self.size as u32;
        GrayImage::from_fn(side, side, |x, y| {
            let v = self.get(x as usize, y as usize).clamp(0.0, 1.0);
            Luma([(v * 255.0).round() as u8])
        })
    }

    /// Bilinear resample to `size × size`.
    pub fn resized(&self, size: usize) -> Self {
        if size == self.size {
            return self.clone();
        }
        let side = self.size as u32;
        let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
            match ImageBuffer::from_raw(side, side, self.data.clone()) {
                Some(buffer) => buffer,
                None => return Self::zeros(size),
            };
        let resized = image::imageops::resize(
            &buffer,
            size as u32,
            size as u32,
            image::imageops::FilterType::Triangle,
        );
        Self {
            size,
            data: resized.into_raw(),
        }
    }

    /// Rescales values so the minimum becomes 0 and the maximum 1.
    ///
    /// A flat field becomes all zeros.
    pub fn normalize(&mut self) {
        let (min, max) = self.min_max();
        let span = max - min;
        for v in &mut self.data {
            *v = if span > 0.0 { (*v - min) / span } else { 0.0 };
        }
    }

    /// Smallest and largest value.
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Fails unless `other` has the same resolution.
    pub fn ensure_same_size(&self, other: &HeightField) -> Result<(), RasterError> {
        let expected = (self.size as u32, self.size as u32);
        let actual = (other.size as u32, other.size as u32);
        crate::raster::ensure_same_size(expected, actual)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.size + x]
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
