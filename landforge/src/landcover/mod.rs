//! Landcover classification.
//!
//! Raw classification tiles come back with anti-aliased or re-styled
//! colours. They are snapped onto the fixed [`Palette`] by HSL distance,
//! split into one binary mask per class, summarized as a
//! [`CoverageMap`], and re-encoded into the simulation texture colours.

mod classify;
mod coverage;
mod mask;
mod palette;

pub use classify::{classify, snap_to_palette, to_texture, Hsl};
pub use coverage::{coverage, CoverageMap};
pub use mask::{extract_mask, MaskSet};
pub use palette::{LandcoverClass, Palette};
