use allocator_api2::alloc::{ Allocator, Global };
use serde::{ Deserialize, Serialize };
use std::{
    collections::HashMap,
    fmt::{ self, Display }
};

use crate::tree::node::{ NodeArena, NodeColor, NodeId, NodeRef, Nodes };

/// Transient highlight attached to a node for one step of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    #[default]
    Default,
    Touched,
    Current,
    ToDelete,
    Rotate,
    Found
}

impl NodeStatus {
    pub fn name(self) -> &'static str {
        match self {
            NodeStatus::Default => "default",
            NodeStatus::Touched => "touched",
            NodeStatus::Current => "current",
            NodeStatus::ToDelete => "to-delete",
            NodeStatus::Rotate => "rotate",
            NodeStatus::Found => "found"
        }
    }
}

impl Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Highlight tags keyed by node identity. Untagged nodes read as `Default`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMap {
    tags: HashMap<NodeId, NodeStatus>
}

impl StatusMap {
    pub fn new() -> Self { Self::default() }
    pub fn get(&self, id: NodeId) -> NodeStatus {
        self.tags.get(&id).copied().unwrap_or_default()
    }
    pub fn set(&mut self, id: NodeId, status: NodeStatus) {
        match status {
            NodeStatus::Default => { self.tags.remove(&id); },
            _ => { self.tags.insert(id, status); }
        }
    }
    pub(crate) fn remove(&mut self, id: NodeId) { self.tags.remove(&id); }
    pub(crate) fn clear(&mut self) { self.tags.clear(); }
    pub fn len(&self) -> usize { self.tags.len() }
    pub fn is_empty(&self) -> bool { self.tags.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeStatus)> + '_ {
        self.tags.iter().map(|(id, status)| (*id, *status))
    }
}

/// A point-in-time view of the tree for one step of a mutation.
///
/// This borrows the live tree: node references inside it are only valid while the
/// subscriber callback runs. Subscribers that want to keep something around past
/// the callback should copy it out, either by cloning [`TreeInfo::statuses`] or by
/// capturing an owned [`Frame`].
pub struct TreeInfo<'a, T, A = Global>
where A: Allocator + Clone
{
    nodes: &'a NodeArena<T, A>,
    root: Option<NodeId>,
    tree_size: usize,
    node_status: &'a StatusMap
}

impl<'a, T, A> TreeInfo<'a, T, A>
where A: Allocator + Clone
{
    pub(crate) fn new(nodes: &'a NodeArena<T, A>, root: Option<NodeId>, tree_size: usize,
        node_status: &'a StatusMap) -> Self {
        Self { nodes, root, tree_size, node_status }
    }
    pub fn tree_size(&self) -> usize { self.tree_size }
    pub fn is_empty(&self) -> bool { self.root.is_none() }
    pub fn root(&self) -> Option<NodeRef<'a, T, A>> {
        self.root.map(|id| NodeRef::new(self.nodes, id))
    }
    /// Resolves `id` against the tree as it is at this step.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'a, T, A>> {
        self.nodes.contains(id).then(|| NodeRef::new(self.nodes, id))
    }
    pub fn status(&self, id: NodeId) -> NodeStatus { self.node_status.get(id) }
    pub fn statuses(&self) -> &'a StatusMap { self.node_status }

    /// Nodes in key order.
    pub fn iter(&self) -> Nodes<'a, T, A> { Nodes::new(self.nodes, self.root) }

    /// Every tagged node that is still in the tree, in key order.
    pub fn highlighted(&self) -> Vec<(NodeRef<'a, T, A>, NodeStatus)> {
        self.iter()
            .map(|n| (n, self.status(n.id())))
            .filter(|(_, s)| *s != NodeStatus::Default)
            .collect()
    }

    pub fn to_frame(&self) -> Frame<T>
    where T: Clone
    {
        Frame {
            tree_size: self.tree_size,
            root: self.root().map(|r| r.key().clone()),
            nodes: self.iter().map(|n| FrameNode {
                key: n.key().clone(),
                color: n.color(),
                status: self.status(n.id()),
                depth: n.depth()
            }).collect()
        }
    }
}

impl<T, A> Display for TreeInfo<'_, T, A>
where T: Display,
      A: Allocator + Clone
{
    /// Same layout as the tree dump, with tagged nodes suffixed by their status.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::tree::render::write_tree(f, self.nodes, self.root, Some(self.node_status))
    }
}

/// Owned copy of one snapshot, for harnesses that record the whole stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<T> {
    pub tree_size: usize,
    pub root: Option<T>,
    /// In key order.
    pub nodes: Vec<FrameNode<T>>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNode<T> {
    pub key: T,
    pub color: NodeColor,
    pub status: NodeStatus,
    pub depth: usize
}

impl<T> Frame<T> {
    pub fn keys(&self) -> Vec<&T> { self.nodes.iter().map(|n| &n.key).collect() }
    pub fn get(&self, key: &T) -> Option<&FrameNode<T>>
    where T: PartialEq
    {
        self.nodes.iter().find(|n| n.key == *key)
    }
    pub fn status_of(&self, key: &T) -> NodeStatus
    where T: PartialEq
    {
        self.get(key).map_or(NodeStatus::Default, |n| n.status)
    }
    pub fn highlighted(&self) -> Vec<(&T, NodeStatus)> {
        self.nodes.iter()
            .filter(|n| n.status != NodeStatus::Default)
            .map(|n| (&n.key, n.status))
            .collect()
    }
}
