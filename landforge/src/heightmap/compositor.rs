//! Heightmap composition: merging fields and applying landcover masks.

use crate::landcover::{LandcoverClass, MaskSet};
use crate::raster::RasterError;

use super::{blur, generate_noise, HeightField};

/// How a masked rule modifies the running heightmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendKind {
    Add,
    Subtract,
    Multiply,
}

/// A per-class heightmap modifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeRule {
    pub kind: BlendKind,
    pub amount: f32,
    /// Gaussian radius applied to the class mask before use; 0 disables it.
    pub blur: usize,
}

impl CompositeRule {
    pub const fn new(kind: BlendKind, amount: f32, blur: usize) -> Self {
        Self { kind, amount, blur }
    }
}

/// Elementwise `base + overlay * multiplier`.
///
/// The result is not renormalized.
pub fn merge(
    base: &HeightField,
    overlay: &HeightField,
    multiplier: f32,
) -> Result<HeightField, RasterError> {
    base.ensure_same_size(overlay)?;
    let mut out = base.clone();
    for (v, o) in out.data_mut().iter_mut().zip(overlay.data()) {
        *v += o * multiplier;
    }
    Ok(out)
}

/// Applies `rule` wherever `mask` is non-zero.
///
/// Cells with a zero mask value pass through unchanged. Elsewhere:
/// `add` gives `base + amount * mask`, `subtract` gives
/// `base - amount * mask` and `multiply` gives `base * (amount * mask)`.
pub fn apply_mask(
    base: &HeightField,
    mask: &HeightField,
    rule: &CompositeRule,
) -> Result<HeightField, RasterError> {
    base.ensure_same_size(mask)?;
    let mut out = base.clone();
    for (v, &m) in out.data_mut().iter_mut().zip(mask.data()) {
        if m == 0.0 {
            continue;
        }
        *v = match rule.kind {
            BlendKind::Add => *v + rule.amount * m,
            BlendKind::Subtract => *v - rule.amount * m,
            BlendKind::Multiply => *v * (rule.amount * m),
        };
    }
    Ok(out)
}

/// Tunables for [`compose`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapParams {
    /// Gaussian radius applied to the raw elevation.
    pub blur_radius: usize,
    pub detail_noise_scale: f64,
    pub detail_noise_weight: f32,
    pub final_noise_scale: f64,
    pub final_noise_weight: f32,
    /// Base seed; successive noise fields use consecutive seeds.
    pub seed: Option<u32>,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            blur_radius: 16,
            detail_noise_scale: 1.5,
            detail_noise_weight: 0.1,
            final_noise_scale: 8.0,
            final_noise_weight: 0.02,
            seed: None,
        }
    }
}

impl HeightmapParams {
    fn seed(&self, offset: u32) -> Option<u32> {
        self.seed.map(|s| s.wrapping_add(offset))
    }
}

/// Ocean noise scales: a high-frequency ripple over a low-frequency swell.
const OCEAN_HIGH_SCALE: f64 = 24.0;
const OCEAN_LOW_SCALE: f64 = 3.0;

/// Output of [`compose`].
#[derive(Debug, Clone)]
pub struct ComposedHeightmap {
    /// Elevation after landcover modifiers, normalized to `[0, 1]`.
    pub elevation: HeightField,
    /// Ocean surface field, present when the tile has any water.
    pub ocean: Option<HeightField>,
}

/// Builds a tile's final heightmap from raw elevation and class masks.
///
/// 1. Gaussian-blur the elevation.
/// 2. Merge a coarse detail noise at low weight.
/// 3. Build the ocean field from the water mask, then apply every other
///    class rule in ascending stacking order.
/// 4. Merge a final fine noise pass.
/// 5. Normalize.
pub fn compose(
    elevation: &HeightField,
    masks: &MaskSet,
    params: &HeightmapParams,
) -> Result<ComposedHeightmap, RasterError> {
    let resolution = elevation.size();

    let blurred = blur(elevation, params.blur_radius);
    let detail = generate_noise(resolution, params.detail_noise_scale, params.seed(0));
    let mut running = merge(&blurred, &detail, params.detail_noise_weight)?;

    let ocean = match masks.get(LandcoverClass::Water) {
        Some(water) if water.data().iter().any(|&m| m > 0.0) => {
            Some(ocean_field(water, params)?)
        }
        _ => None,
    };

    for class in LandcoverClass::by_stacking_order() {
        if class == LandcoverClass::Water {
            continue;
        }
        let (Some(rule), Some(mask)) = (class.rule(), masks.get(class)) else {
            continue;
        };
        let mask = blur(mask, rule.blur);
        running = apply_mask(&running, &mask, &rule)?;
    }

    let fine = generate_noise(resolution, params.final_noise_scale, params.seed(1));
    running = merge(&running, &fine, params.final_noise_weight)?;
    running.normalize();

    Ok(ComposedHeightmap {
        elevation: running,
        ocean,
    })
}

/// Blended two-scale noise scaled by the water rule depth and masked to water.
fn ocean_field(water: &HeightField, params: &HeightmapParams) -> Result<HeightField, RasterError> {
    let resolution = water.size();
    let rule = LandcoverClass::Water
        .rule()
        .unwrap_or(CompositeRule::new(BlendKind::Multiply, 1.0, 0));

    let high = generate_noise(resolution, OCEAN_HIGH_SCALE, params.seed(2));
    let low = generate_noise(resolution, OCEAN_LOW_SCALE, params.seed(3));
    let mut surface = merge(&high, &low, 1.0)?;
    for v in surface.data_mut() {
        *v *= 0.5;
    }

    let mask = blur(water, rule.blur);
    let mut ocean = HeightField::zeros(resolution);
    for ((o, s), m) in ocean
        .data_mut()
        .iter_mut()
        .zip(surface.data())
        .zip(mask.data())
    {
        *o = s * m * rule.amount;
    }
    Ok(ocean)
}
