//! Octree acceleration structure.
//!
//! Each object owns one octree over its triangles. Nodes live in a flat
//! arena and refer to their children by index. A node is either a leaf
//! holding triangle ids or an internal node with exactly eight children,
//! one per octant of its box.
//!
//! A triangle is placed in every child it touches, so a triangle that
//! straddles a split plane appears in several leaves. Queries return a
//! conservative candidate set; exact testing happens afterwards.

use octray_core::Triangle;
use octray_math::{Aabb, Ray};
use serde::{Deserialize, Serialize};

/// Build parameters for an [`Octree`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Nodes at this depth are always leaves (the root has depth 1)
    pub max_depth: u32,
    /// Nodes holding this many triangles or fewer are not split
    pub min_leaf_size: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_leaf_size: 5,
        }
    }
}

/// Index of a node in the octree arena.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Ids of the triangles overlapping this node
    Leaf(Vec<usize>),
    /// Children indexed by octant (bit 0 = upper X, bit 1 = upper Y, bit 2 = upper Z)
    Internal([NodeId; 8]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OctreeNode {
    pub depth: u32,
    pub bounds: Aabb,
    pub kind: NodeKind,
}

/// Summary of a built octree, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: u32,
    /// Sum of leaf list lengths; exceeds the triangle count when triangles straddle octants
    pub leaf_entries: usize,
}

#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
}

impl Octree {
    /// The root node is always stored first.
    pub const ROOT: NodeId = 0;

    /// Build an octree over `triangles` inside `bounds`.
    ///
    /// Triangle ids stored in the leaves are indices into `triangles`.
    pub fn build(bounds: Aabb, triangles: &[Triangle], config: &OctreeConfig) -> Self {
        let mut octree = Self { nodes: Vec::new() };
        let ids: Vec<usize> = (0..triangles.len()).collect();
        octree.build_node(bounds, ids, triangles, 1, config);
        octree
    }

    fn build_node(
        &mut self,
        bounds: Aabb,
        ids: Vec<usize>,
        triangles: &[Triangle],
        depth: u32,
        config: &OctreeConfig,
    ) -> NodeId {
        let id = self.nodes.len();

        if depth >= config.max_depth || ids.len() <= config.min_leaf_size {
            self.nodes.push(OctreeNode {
                depth,
                bounds,
                kind: NodeKind::Leaf(ids),
            });
            return id;
        }

        // Reserve the slot so the parent precedes its children in the arena
        self.nodes.push(OctreeNode {
            depth,
            bounds,
            kind: NodeKind::Leaf(Vec::new()),
        });

        let octants = bounds.octants();
        let mut children = [0; 8];
        for (child, octant) in children.iter_mut().zip(octants) {
            let members: Vec<usize> = ids
                .iter()
                .copied()
                .filter(|&i| touches(&octant, &triangles[i]))
                .collect();
            *child = self.build_node(octant, members, triangles, depth + 1, config);
        }

        self.nodes[id].kind = NodeKind::Internal(children);
        id
    }

    /// Append the ids of every triangle the ray might hit to `candidates`.
    ///
    /// Subtrees whose box the ray misses are skipped. Ids may repeat.
    pub fn query(&self, ray: &Ray, candidates: &mut Vec<usize>) {
        self.visit_leaves(ray, &mut |ids: &[usize]| candidates.extend_from_slice(ids));
    }

    /// Call `visit` with the triangle list of every leaf whose box the ray hits.
    ///
    /// Same traversal as [`Octree::query`] without collecting into a buffer.
    pub fn visit_leaves<F>(&self, ray: &Ray, visit: &mut F)
    where
        F: FnMut(&[usize]),
    {
        self.visit_node(Self::ROOT, ray, visit);
    }

    fn visit_node<F>(&self, id: NodeId, ray: &Ray, visit: &mut F)
    where
        F: FnMut(&[usize]),
    {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.bounds.hit(ray) {
            return;
        }
        match &node.kind {
            NodeKind::Leaf(ids) => visit(ids),
            NodeKind::Internal(children) => {
                for &child in children {
                    self.visit_node(child, ray, visit);
                }
            }
        }
    }

    pub fn root(&self) -> &OctreeNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&OctreeNode> {
        self.nodes.get(id)
    }

    pub fn stats(&self) -> OctreeStats {
        self.nodes
            .iter()
            .fold(OctreeStats::default(), |mut stats, node| {
                stats.node_count += 1;
                stats.max_depth = stats.max_depth.max(node.depth);
                if let NodeKind::Leaf(ids) = &node.kind {
                    stats.leaf_count += 1;
                    stats.leaf_entries += ids.len();
                }
                stats
            })
    }
}

/// Conservative membership test for a child octant.
fn touches(octant: &Aabb, triangle: &Triangle) -> bool {
    octant.contains_any_vertex_of(&triangle.positions()) || octant.overlaps(&triangle.bounds())
}
