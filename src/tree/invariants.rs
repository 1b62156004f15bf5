use allocator_api2::alloc::Allocator;
use log::debug;
use std::fmt::Debug;

use crate::error::InvariantViolation;
use crate::tree::engine::RedBlackTree;
use crate::tree::node::{ NodeArena, NodeId };

// One in-order pass over the tree. Absent children count as one black leaf.
struct Walk<'a, T, A>
where A: Allocator + Clone
{
    nodes: &'a NodeArena<T, A>,
    previous: Option<&'a T>,
    leaf_depth: Option<usize>,
    reachable: usize,
    reported: usize
}

impl<'a, T, A> Walk<'a, T, A>
where T: Ord + Debug,
      A: Allocator + Clone
{
    fn visit(&mut self, id: Option<NodeId>, blacks: usize) -> Result<(), InvariantViolation> {
        let id = match id {
            Some(v) => v,
            None => {
                let depth = blacks + 1;
                return match self.leaf_depth {
                    None => { self.leaf_depth = Some(depth); Ok(()) },
                    Some(expected) if expected == depth => Ok(()),
                    Some(expected) => Err(InvariantViolation::BlackHeightMismatch { expected, found: depth })
                };
            }
        };
        self.reachable += 1;
        // more nodes than the tree owns means the links loop back on themselves
        if self.reachable > self.reported {
            return Err(InvariantViolation::SizeMismatch { reported: self.reported, reachable: self.reachable });
        }
        let nodes = self.nodes;
        let node = &nodes[id];
        for child in [node.left(), node.right()].into_iter().flatten() {
            if nodes.parent(child) != Some(id) {
                return Err(InvariantViolation::BrokenParentLink(format!("{:?}", nodes[child].key())));
            }
            if node.color().is_red() && nodes[child].color().is_red() {
                return Err(InvariantViolation::RedRedEdge(format!("{:?}", node.key())));
            }
        }
        let blacks = blacks + node.color().is_black() as usize;
        self.visit(node.left(), blacks)?;
        if let Some(previous) = self.previous {
            if previous >= node.key() {
                return Err(InvariantViolation::OrderViolation(format!("{:?}", node.key())));
            }
        }
        self.previous = Some(node.key());
        self.visit(node.right(), blacks)
    }
}

impl<T, A> RedBlackTree<T, A>
where T: Ord + Debug,
      A: Allocator + Clone
{
    /// Validates every red-black and ordering property. Never panics.
    pub fn check_invariants(&self) -> bool {
        match self.check_invariants_detailed() {
            Ok(_) => true,
            Err(e) => {
                debug!("invariant check failed: {}", e);
                false
            }
        }
    }

    /// Returns the black height of the tree (absent leaves excluded), or the
    /// first broken property found.
    pub fn check_invariants_detailed(&self) -> Result<usize, InvariantViolation> {
        let nodes = self.nodes();
        let root = match self.root_id() {
            Some(v) => v,
            None => return match self.len() {
                0 => Ok(0),
                n => Err(InvariantViolation::SizeMismatch { reported: n, reachable: 0 })
            }
        };
        if nodes[root].color().is_red() {
            return Err(InvariantViolation::RedRoot);
        }
        if nodes.parent(root).is_some() {
            return Err(InvariantViolation::BrokenParentLink(format!("{:?}", nodes[root].key())));
        }
        let mut walk = Walk { nodes, previous: None, leaf_depth: None, reachable: 0, reported: self.len() };
        walk.visit(Some(root), 0)?;
        if walk.reachable != self.len() {
            return Err(InvariantViolation::SizeMismatch { reported: self.len(), reachable: walk.reachable });
        }
        Ok(walk.leaf_depth.map_or(0, |d| d - 1))
    }
}
