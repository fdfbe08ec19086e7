//! Nested output contours.
//!
//! A [`PolyTree`] arranges the result of a clipping operation by containment:
//! its top-level children are outer contours, their children are the holes
//! directly inside them, whose children are the islands inside those holes,
//! and so on. Open paths, when clipped, are top-level children without
//! children of their own.
//!
//! Nodes live in a [`Pool`] owned by the tree and are addressed by
//! [`NodeIdx`]. Clearing the tree (which [`Clipper::execute_into`] does) keeps
//! the node storage, including the contour buffers, for the next result.
//!
//! [`Clipper::execute_into`]: crate::Clipper::execute_into

use crate::{
    geom::{IntPoint, Path, Paths},
    pool::{Handle, Pool, Recycle},
};

impl_handle!(
    /// A handle to a [`PolyNode`] in a [`PolyTree`].
    NodeIdx,
    "n"
);

/// One contour in a [`PolyTree`].
#[derive(Clone, Debug, Default)]
pub struct PolyNode {
    contour: Path,
    parent: Option<NodeIdx>,
    children: Vec<NodeIdx>,
    index: usize,
    is_open: bool,
}

impl Recycle for PolyNode {
    fn reset(&mut self) {
        self.contour.clear();
        self.children.clear();
        self.parent = None;
        self.index = 0;
        self.is_open = false;
    }
}

impl PolyNode {
    /// The vertices of this contour.
    pub fn contour(&self) -> &[IntPoint] {
        &self.contour
    }

    /// The contour directly containing this one, or `None` for top-level contours.
    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    /// The contours directly inside this one.
    pub fn children(&self) -> &[NodeIdx] {
        &self.children
    }

    /// The number of contours directly inside this one.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The position of this node among its siblings.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this is an open path.
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

/// The result of a clipping operation, as a forest of nested contours.
#[derive(Clone, Debug, Default)]
pub struct PolyTree {
    nodes: Pool<NodeIdx, PolyNode>,
    children: Vec<NodeIdx>,
}

impl std::ops::Index<NodeIdx> for PolyTree {
    type Output = PolyNode;

    fn index(&self, index: NodeIdx) -> &PolyNode {
        &self.nodes[index]
    }
}

impl PolyTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every node, keeping their storage for reuse.
    pub fn clear(&mut self) {
        self.nodes.reclaim_all();
        self.children.clear();
    }

    /// The top-level contours.
    pub fn children(&self) -> &[NodeIdx] {
        &self.children
    }

    /// Looks up a node.
    pub fn node(&self, node: NodeIdx) -> &PolyNode {
        &self.nodes[node]
    }

    /// The vertices of a node's contour.
    pub fn contour(&self, node: NodeIdx) -> &[IntPoint] {
        self.nodes[node].contour()
    }

    /// The contour directly containing `node`.
    pub fn parent(&self, node: NodeIdx) -> Option<NodeIdx> {
        self.nodes[node].parent
    }

    /// The number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The number of contours in the tree.
    ///
    /// This is [`PolyTree::len`], except that it doesn't count an outer
    /// contour that only exists to hold the real result (which happens when
    /// the first node to be created ends up below the top level).
    pub fn total(&self) -> usize {
        let n = self.nodes.len();
        match self.children.first() {
            Some(first) if first.slot() != 0 => n - 1,
            _ => n,
        }
    }

    /// Whether `node` is a hole, which is the case when it has an odd number
    /// of ancestors. Open paths are never holes.
    pub fn is_hole(&self, node: NodeIdx) -> bool {
        !self.nodes[node].is_open && self.depth(node) % 2 == 1
    }

    /// The number of ancestors of `node`.
    pub fn depth(&self, node: NodeIdx) -> usize {
        std::iter::successors(self.nodes[node].parent, |&p| self.nodes[p].parent).count()
    }

    /// The first node in depth-first order.
    pub fn first(&self) -> Option<NodeIdx> {
        self.children.first().copied()
    }

    /// The node after `node` in depth-first order: its first child if it has
    /// one, otherwise the next sibling of it or of its closest ancestor.
    pub fn next(&self, node: NodeIdx) -> Option<NodeIdx> {
        match self.nodes[node].children.first() {
            Some(&child) => Some(child),
            None => self.next_sibling_up(node),
        }
    }

    fn next_sibling_up(&self, mut node: NodeIdx) -> Option<NodeIdx> {
        loop {
            let n = &self.nodes[node];
            let siblings = match n.parent {
                Some(p) => &self.nodes[p].children,
                None => &self.children,
            };
            if let Some(&sibling) = siblings.get(n.index + 1) {
                return Some(sibling);
            }
            node = n.parent?;
        }
    }

    /// Iterates over all nodes in depth-first order.
    pub fn iter(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        std::iter::successors(self.first(), |&n| self.next(n))
    }

    /// Every contour, open or closed, in depth-first order.
    pub fn to_paths(&self) -> Paths {
        self.iter()
            .map(|n| self.contour(n))
            .filter(|c| !c.is_empty())
            .map(<[IntPoint]>::to_vec)
            .collect()
    }

    /// Every closed contour, in depth-first order.
    pub fn closed_paths(&self) -> Paths {
        self.iter()
            .filter(|&n| !self.nodes[n].is_open)
            .map(|n| self.contour(n).to_vec())
            .collect()
    }

    /// Every open path.
    pub fn open_paths(&self) -> Paths {
        self.children
            .iter()
            .filter(|&&n| self.nodes[n].is_open)
            .map(|&n| self.contour(n).to_vec())
            .collect()
    }

    pub(crate) fn new_node(&mut self, contour: impl IntoIterator<Item = IntPoint>) -> NodeIdx {
        let node = self.nodes.claim();
        self.nodes[node].contour.extend(contour);
        node
    }

    pub(crate) fn set_open(&mut self, node: NodeIdx) {
        self.nodes[node].is_open = true;
    }

    /// Appends `child` to the children of `parent`, or to the top level.
    pub(crate) fn add_child(&mut self, parent: Option<NodeIdx>, child: NodeIdx) {
        let siblings = match parent {
            Some(p) => &mut self.nodes[p].children,
            None => &mut self.children,
        };
        let index = siblings.len();
        siblings.push(child);
        let c = &mut self.nodes[child];
        c.parent = parent;
        c.index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: i64, y: i64, size: i64) -> Vec<IntPoint> {
        vec![
            IntPoint::new(x, y),
            IntPoint::new(x, y + size),
            IntPoint::new(x + size, y + size),
            IntPoint::new(x + size, y),
        ]
    }

    /// An outer square with a hole holding an island, a second outer square
    /// and an open path.
    fn nested() -> (PolyTree, [NodeIdx; 5]) {
        let mut tree = PolyTree::new();
        let outer = tree.new_node(square(0, 0, 100));
        let hole = tree.new_node(square(10, 10, 80));
        let island = tree.new_node(square(20, 20, 10));
        let other = tree.new_node(square(200, 0, 10));
        let line = tree.new_node([IntPoint::new(0, 300), IntPoint::new(50, 300)]);
        tree.set_open(line);
        tree.add_child(None, outer);
        tree.add_child(Some(outer), hole);
        tree.add_child(Some(hole), island);
        tree.add_child(None, other);
        tree.add_child(None, line);
        (tree, [outer, hole, island, other, line])
    }

    #[test]
    fn hole_parity() {
        let (tree, [outer, hole, island, other, line]) = nested();
        assert!(!tree.is_hole(outer));
        assert!(tree.is_hole(hole));
        assert!(!tree.is_hole(island));
        assert!(!tree.is_hole(other));
        assert!(!tree.is_hole(line));
        assert_eq!(tree.depth(island), 2);
        assert_eq!(tree.parent(island), Some(hole));
        assert_eq!(tree[hole].index(), 0);
        assert_eq!(tree[other].index(), 1);
    }

    #[test]
    fn depth_first_order() {
        let (tree, nodes) = nested();
        assert_eq!(tree.iter().collect::<Vec<_>>(), nodes);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.total(), 5);
    }

    #[test]
    fn path_lists() {
        let (tree, [outer, hole, island, other, line]) = nested();
        assert_eq!(tree.to_paths().len(), 5);
        assert_eq!(
            tree.closed_paths(),
            [outer, hole, island, other].map(|n| tree.contour(n).to_vec())
        );
        assert_eq!(tree.open_paths(), vec![tree.contour(line).to_vec()]);
    }

    #[test]
    fn hidden_outer_contour_is_not_counted() {
        let mut tree = PolyTree::new();
        let inner = tree.new_node(square(10, 10, 10));
        let outer = tree.new_node(square(0, 0, 100));
        tree.add_child(None, outer);
        tree.add_child(Some(outer), inner);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.total(), 1);
    }

    #[test]
    fn clearing_reuses_nodes() {
        let (mut tree, _) = nested();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);

        let n = tree.new_node(square(0, 0, 1));
        tree.add_child(None, n);
        assert_eq!(n.slot(), 0);
        assert!(tree[n].children().is_empty());
        assert!(!tree[n].is_open());
        assert_eq!(tree.contour(n).len(), 4);
        assert_eq!(tree.nodes.created(), 5);
    }
}
