//! The landcover palette.

use std::fmt;
use std::str::FromStr;

use crate::heightmap::{BlendKind, CompositeRule};

/// A landcover class.
///
/// Variants are listed in canonical palette order, which is also the
/// tie-break order when two reference colours are equally close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LandcoverClass {
    Water,
    Trees,
    Grass,
    FloodedVegetation,
    Crops,
    Shrub,
    Built,
    Bare,
    Snow,
}

impl LandcoverClass {
    /// Every class in canonical order.
    pub const ALL: [LandcoverClass; 9] = [
        LandcoverClass::Water,
        LandcoverClass::Trees,
        LandcoverClass::Grass,
        LandcoverClass::FloodedVegetation,
        LandcoverClass::Crops,
        LandcoverClass::Shrub,
        LandcoverClass::Built,
        LandcoverClass::Bare,
        LandcoverClass::Snow,
    ];

    /// Name used in file names and coverage keys.
    pub fn name(self) -> &'static str {
        match self {
            LandcoverClass::Water => "water",
            LandcoverClass::Trees => "trees",
            LandcoverClass::Grass => "grass",
            LandcoverClass::FloodedVegetation => "flooded_vegetation",
            LandcoverClass::Crops => "crops",
            LandcoverClass::Shrub => "shrub",
            LandcoverClass::Built => "built",
            LandcoverClass::Bare => "bare",
            LandcoverClass::Snow => "snow",
        }
    }

    /// Reference colour as produced by the classification service.
    pub fn paint(self) -> [u8; 3] {
        match self {
            LandcoverClass::Water => [65, 155, 223],
            LandcoverClass::Trees => [57, 125, 73],
            LandcoverClass::Grass => [136, 176, 83],
            LandcoverClass::FloodedVegetation => [122, 135, 198],
            LandcoverClass::Crops => [228, 150, 53],
            LandcoverClass::Shrub => [223, 195, 90],
            LandcoverClass::Built => [196, 40, 27],
            LandcoverClass::Bare => [165, 155, 143],
            LandcoverClass::Snow => [179, 159, 225],
        }
    }

    /// Output colour for the simulation texture.
    pub fn texture(self) -> [u8; 4] {
        match self {
            LandcoverClass::Water => [255, 255, 0, 255],
            LandcoverClass::Trees => [0, 255, 255, 255],
            LandcoverClass::Grass => [0, 255, 0, 255],
            LandcoverClass::FloodedVegetation => [255, 0, 0, 255],
            LandcoverClass::Crops => [0, 255, 255, 0],
            LandcoverClass::Shrub => [255, 0, 255, 255],
            LandcoverClass::Built => [255, 0, 0, 255],
            LandcoverClass::Bare => [0, 255, 0, 0],
            LandcoverClass::Snow => [255, 255, 255, 255],
        }
    }

    /// Heightmap modifier applied under this class's mask, if any.
    pub fn rule(self) -> Option<CompositeRule> {
        match self {
            LandcoverClass::Water => Some(CompositeRule::new(BlendKind::Subtract, 0.75, 18)),
            LandcoverClass::Shrub => Some(CompositeRule::new(BlendKind::Add, 0.15, 36)),
            LandcoverClass::Grass => Some(CompositeRule::new(BlendKind::Subtract, 0.1, 24)),
            LandcoverClass::Bare => Some(CompositeRule::new(BlendKind::Add, 0.2, 12)),
            _ => None,
        }
    }

    /// Stacking order; higher values are applied later and win on overlap.
    pub fn order(self) -> u8 {
        match self {
            LandcoverClass::Shrub => 0,
            LandcoverClass::Water => 1,
            LandcoverClass::Grass => 2,
            LandcoverClass::Bare => 3,
            LandcoverClass::Trees => 4,
            LandcoverClass::FloodedVegetation => 5,
            LandcoverClass::Crops => 6,
            LandcoverClass::Built => 7,
            LandcoverClass::Snow => 8,
        }
    }

    /// Classes sorted by ascending [`order`](Self::order).
    pub fn by_stacking_order() -> Vec<LandcoverClass> {
        let mut classes = Self::ALL.to_vec();
        classes.sort_by_key(|c| c.order());
        classes
    }
}

impl fmt::Display for LandcoverClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LandcoverClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown landcover class '{}'", s))
    }
}

/// An ordered, non-empty set of landcover classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    classes: Vec<LandcoverClass>,
}

impl Palette {
    /// Every class in canonical order.
    pub fn standard() -> Self {
        Self {
            classes: LandcoverClass::ALL.to_vec(),
        }
    }

    /// A palette restricted to `classes`, kept in the given order.
    ///
    /// Returns `None` when `classes` is empty.
    pub fn new(classes: Vec<LandcoverClass>) -> Option<Self> {
        if classes.is_empty() {
            return None;
        }
        Some(Self { classes })
    }

    pub fn classes(&self) -> &[LandcoverClass] {
        &self.classes
    }

    pub fn contains(&self, class: LandcoverClass) -> bool {
        self.classes.contains(&class)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}
