//! Perceptual nearest-colour classification.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use super::{LandcoverClass, Palette};

/// A colour in hue/saturation/lightness space, every component in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let r = r as f64 / 255.0;
        let g = g as f64 / 255.0;
        let b = b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let diff = max - min;
        let s = if l > 0.5 {
            diff / (2.0 - max - min)
        } else {
            diff / (max + min)
        };
        let h = if max == r {
            (g - b) / diff + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / diff + 2.0
        } else {
            (r - g) / diff + 4.0
        };

        Hsl { h: h / 6.0, s, l }
    }

    /// Weighted distance `|ΔH| + |ΔS| / 2 + |ΔL| / 3`.
    ///
    /// Hue is not treated as circular.
    pub fn distance(&self, other: &Hsl) -> f64 {
        (self.h - other.h).abs() + (self.s - other.s).abs() / 2.0 + (self.l - other.l).abs() / 3.0
    }
}

/// Returns the palette class whose paint colour is perceptually closest to `pixel`.
///
/// Ties go to the class listed first in the palette.
pub fn classify(pixel: [u8; 3], palette: &Palette) -> LandcoverClass {
    let target = Hsl::from_rgb(pixel);
    let mut best = palette.classes()[0];
    let mut best_distance = f64::INFINITY;
    for &class in palette.classes() {
        let d = target.distance(&Hsl::from_rgb(class.paint()));
        if d < best_distance {
            best_distance = d;
            best = class;
        }
    }
    best
}

/// Classifies every pixel, memoizing per distinct colour.
fn map_pixels(
    image: &RgbaImage,
    palette: &Palette,
    output: impl Fn(LandcoverClass) -> Rgba<u8>,
) -> RgbaImage {
    let mut cache: HashMap<[u8; 3], Rgba<u8>> = HashMap::new();
    let mut out = RgbaImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let [r, g, b, _] = src.0;
        *dst = *cache
            .entry([r, g, b])
            .or_insert_with(|| output(classify([r, g, b], palette)));
    }
    out
}

/// Snaps every pixel onto the nearest palette paint colour.
///
/// Applying this to an already-snapped image returns it unchanged apart
/// from alpha, which is always set opaque.
pub fn snap_to_palette(image: &RgbaImage, palette: &Palette) -> RgbaImage {
    map_pixels(image, palette, |class| {
        let [r, g, b] = class.paint();
        Rgba([r, g, b, 255])
    })
}

/// Converts a classified image into the texture encoding.
pub fn to_texture(image: &RgbaImage, palette: &Palette) -> RgbaImage {
    map_pixels(image, palette, |class| Rgba(class.texture()))
}
