//! Quad-tree of tiles stored as a flat arena.
//!
//! Nodes reference each other by [`NodeId`] index. Directory layout and
//! stitch order are both derived from this structure rather than from the
//! filesystem.

use std::collections::HashMap;

use image::{ImageBuffer, Pixel};

use crate::coord::TileCoord;
use crate::raster::RasterError;

use super::stitch;

/// Index of a node in a [`TileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One tile in the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct TileNode {
    pub coord: TileCoord,
    /// Ordinal among siblings, in stitch order.
    pub index: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Errors building a [`TileTree`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("No tiles to build a tree from")]
    Empty,
    #[error("{0} tiles do not form a single tile or a complete sibling group")]
    UnsupportedLayout(usize),
}

/// A quad-tree rooted at a single tile.
#[derive(Debug, Clone)]
pub struct TileTree {
    nodes: Vec<TileNode>,
}

impl TileTree {
    /// Builds a tree from a decomposed cover and expands it `depth` levels.
    ///
    /// `cover` must be either a single tile, which becomes the root, or the
    /// four children of one parent in stitch order, in which case the parent
    /// becomes the root.
    pub fn from_cover(cover: &[TileCoord], depth: u8) -> Result<Self, TreeError> {
        let root_coord = match cover {
            [] => return Err(TreeError::Empty),
            [single] => *single,
            [first, ..] if cover.len() == 4 => {
                let parent = first
                    .parent()
                    .ok_or(TreeError::UnsupportedLayout(cover.len()))?;
                if parent.children() != cover {
                    return Err(TreeError::UnsupportedLayout(cover.len()));
                }
                parent
            }
            _ => return Err(TreeError::UnsupportedLayout(cover.len())),
        };

        let expand_levels = if cover.len() == 1 { depth } else { depth + 1 };

        let mut tree = TileTree {
            nodes: vec![TileNode {
                coord: root_coord,
                index: 0,
                parent: None,
                children: Vec::new(),
            }],
        };
        tree.expand(NodeId(0), expand_levels);
        Ok(tree)
    }

    fn expand(&mut self, node: NodeId, levels: u8) {
        if levels == 0 {
            return;
        }
        let coord = self.nodes[node.0].coord;
        for (index, child) in coord.children().into_iter().enumerate() {
            let id = NodeId(self.nodes.len());
            self.nodes.push(TileNode {
                coord: child,
                index,
                parent: Some(node),
                children: Vec::new(),
            });
            self.nodes[node.0].children.push(id);
            self.expand(id, levels - 1);
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &TileNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes directly below the root; the tiles a cover was built from.
    pub fn top_level(&self) -> Vec<NodeId> {
        let root = self.node(self.root());
        if root.children.is_empty() {
            vec![self.root()]
        } else {
            root.children.clone()
        }
    }

    /// Sibling indices from the root down to `id`; empty for the root.
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            path.push(self.node(current).index);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Leaf nodes in depth-first stitch order.
    ///
    /// Within each sibling group this is top-left, top-right, bottom-right,
    /// bottom-left, so consecutive leaves are spatial neighbours.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root(), &mut out);
        out
    }

    /// Leaves below `id` in depth-first stitch order.
    pub fn leaves_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(id, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        if node.children.is_empty() {
            out.push(id);
        } else {
            for &child in &node.children {
                self.collect_leaves(child, out);
            }
        }
    }

    /// Composites leaf images bottom-up into one image for `id`.
    ///
    /// Each inner node is the 2×2 stitch of its children's composites. A
    /// leaf's own image is returned unchanged.
    pub fn composite<P>(
        &self,
        id: NodeId,
        leaves: &HashMap<NodeId, ImageBuffer<P, Vec<P::Subpixel>>>,
    ) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, RasterError>
    where
        P: Pixel + 'static,
    {
        let node = self.node(id);
        if node.children.is_empty() {
            return leaves
                .get(&id)
                .cloned()
                .ok_or(RasterError::MissingTile(id.index()));
        }

        let children = node
            .children
            .iter()
            .map(|&child| self.composite(child, leaves))
            .collect::<Result<Vec<_>, _>>()?;
        stitch(&children)
    }
}
