//! Coverage statistics over a classified image.

use std::collections::BTreeMap;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::{LandcoverClass, Palette};

/// Fraction of pixels per class name.
///
/// Serialized as a flat `{ "water": 0.25, ... }` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageMap(BTreeMap<String, f64>);

impl CoverageMap {
    pub fn get(&self, class: LandcoverClass) -> Option<f64> {
        self.0.get(class.name()).copied()
    }

    /// Sum of all fractions; at most 1.0.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Counts pixels exactly matching each class paint colour.
///
/// Every palette class gets an entry, zero if absent. Pixels matching no
/// class are counted in the total only, so the fractions sum to less
/// than one for images that are not fully snapped.
pub fn coverage(image: &RgbaImage, palette: &Palette) -> CoverageMap {
    let total = (image.width() as u64) * (image.height() as u64);
    let mut counts: BTreeMap<String, u64> = palette
        .classes()
        .iter()
        .map(|c| (c.name().to_string(), 0))
        .collect();

    for px in image.pixels() {
        let [r, g, b, _] = px.0;
        if let Some(class) = palette.classes().iter().find(|c| c.paint() == [r, g, b]) {
            if let Some(count) = counts.get_mut(class.name()) {
                *count += 1;
            }
        }
    }

    if total == 0 {
        return CoverageMap(counts.into_keys().map(|k| (k, 0.0)).collect());
    }

    CoverageMap(
        counts
            .into_iter()
            .map(|(k, n)| (k, n as f64 / total as f64))
            .collect(),
    )
}
