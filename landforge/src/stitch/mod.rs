//! Tile hierarchy and stitching.
//!
//! A tile job's cover is arranged into a [`TileTree`]; leaves are fetched in
//! depth-first stitch order and composited back up with [`stitch`]. Heightmap
//! tiles are seam-normalized with [`normalize_quad`] before stitching.

mod compose;
mod seam;
mod tree;

pub use compose::stitch;
pub use seam::{normalize_pair, normalize_quad, stitch_normalized, SeamAdjustment};
pub use tree::{NodeId, TileNode, TileTree, TreeError};
