//! Height fields, procedural noise and heightmap composition.
//!
//! A [`HeightField`] is a square grid of `f32` heights. Raw elevation comes
//! from Terrain-RGB tiles ([`HeightField::from_terrain_rgb`]); detail comes
//! from [`generate_noise`]; landcover masks reshape it in [`compose`].
//!
//! # Example
//!
//! ```ignore
//! use landforge::heightmap::{compose, HeightField, HeightmapParams};
//!
//! let (elevation, range) = HeightField::from_terrain_rgb(&terrain)?;
//! let composed = compose(&elevation, &masks, &HeightmapParams::default())?;
//! let png = landforge::raster::encode_gray_png(&composed.elevation.to_gray())?;
//! ```

mod compositor;
mod field;
mod noise;

pub use compositor::{
    apply_mask, compose, merge, BlendKind, ComposedHeightmap, CompositeRule, HeightmapParams,
};
pub use field::{ElevationRange, HeightField};
pub use noise::{blur, gaussian_kernel, generate_noise, LACUNARITY, OCTAVES, PERSISTENCE};
