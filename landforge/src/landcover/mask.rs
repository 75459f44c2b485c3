//! Binary class masks.

use std::collections::HashMap;

use image::{GrayImage, Luma, RgbaImage};

use crate::heightmap::HeightField;
use crate::raster::RasterError;

use super::{LandcoverClass, Palette};

/// Marks pixels exactly equal to `target` (RGB, alpha ignored) as 255, others 0.
pub fn extract_mask(image: &RgbaImage, target: [u8; 3]) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Luma([if [r, g, b] == target { 255 } else { 0 }])
    })
}

/// Per-class masks as height fields in `[0, 1]`, ready for composition.
#[derive(Debug, Clone, Default)]
pub struct MaskSet {
    masks: HashMap<LandcoverClass, HeightField>,
}

impl MaskSet {
    /// Extracts one mask per palette class from a snapped image.
    ///
    /// The image is resampled (nearest neighbour) to `resolution` first so
    /// masks line up with the heightmap.
    pub fn from_classified(
        image: &RgbaImage,
        palette: &Palette,
        resolution: usize,
    ) -> Result<Self, RasterError> {
        let side = resolution as u32;
        let image = crate::raster::resize_nearest(image, side, side);
        let mut set = MaskSet::default();
        for &class in palette.classes() {
            let mask = extract_mask(&image, class.paint());
            set.insert(class, HeightField::from_gray(&mask)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, class: LandcoverClass, mask: HeightField) {
        self.masks.insert(class, mask);
    }

    pub fn get(&self, class: LandcoverClass) -> Option<&HeightField> {
        self.masks.get(&class)
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}
