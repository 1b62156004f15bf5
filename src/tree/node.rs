use allocator_api2::alloc::{ Allocator, Global };
use allocator_api2::vec::Vec as ArenaVec;
use std::{
    fmt::Debug,
    ops::{ Index, IndexMut }
};

// Nodes live in a slot arena owned by the tree. Child links are the only
// structural edges; `parent` is a back-reference used for navigation and
// rotation bookkeeping and never decides when a node is freed.

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeColor {
    Red = 0,
    Black
}

impl NodeColor {
    pub fn is_red(self) -> bool { self == NodeColor::Red }
    pub fn is_black(self) -> bool { self == NodeColor::Black }
    pub(crate) fn short_name(self) -> char {
        match self {
            NodeColor::Red => 'r',
            NodeColor::Black => 'b'
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeDirection {
    Left = 0,
    Right
}

impl NodeDirection {
    pub fn opposite(self) -> Self {
        match self {
            NodeDirection::Left => NodeDirection::Right,
            NodeDirection::Right => NodeDirection::Left
        }
    }
}

/// Identity of a node inside one tree.
///
/// The generation is bumped whenever a slot is freed, so an id kept around after
/// its node was erased resolves to nothing instead of aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32
}

impl NodeId {
    pub fn index(&self) -> u32 { self.index }
    pub fn generation(&self) -> u32 { self.generation }
}

#[derive(Debug)]
pub struct TreeNode<T> {
    pub(crate) key: T,
    pub(crate) color: NodeColor,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>
}

impl<T> TreeNode<T> {
    pub(crate) fn new(key: T, color: NodeColor, parent: Option<NodeId>) -> Self {
        Self { key, color, parent, left: None, right: None }
    }
    pub fn key(&self) -> &T { &self.key }
    pub fn color(&self) -> NodeColor { self.color }
    pub fn parent(&self) -> Option<NodeId> { self.parent }
    pub fn left(&self) -> Option<NodeId> { self.left }
    pub fn right(&self) -> Option<NodeId> { self.right }

    pub fn child(&self, dir: NodeDirection) -> Option<NodeId> {
        match dir {
            NodeDirection::Left => self.left,
            NodeDirection::Right => self.right
        }
    }
    pub(crate) fn set_child(&mut self, dir: NodeDirection, child: Option<NodeId>) {
        match dir {
            NodeDirection::Left => self.left = child,
            NodeDirection::Right => self.right = child
        }
    }
}

struct Slot<T> {
    generation: u32,
    node: Option<TreeNode<T>>
}

pub struct NodeArena<T, A = Global>
where A: Allocator + Clone
{
    slots: ArenaVec<Slot<T>, A>,
    free: ArenaVec<u32, A>,
    len: usize
}

impl<T, A> NodeArena<T, A>
where A: Allocator + Clone
{
    pub fn new_in(alloc: A) -> Self {
        Self {
            slots: ArenaVec::new_in(alloc.clone()),
            free: ArenaVec::new_in(alloc),
            len: 0
        }
    }
    /// Number of live nodes.
    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub(crate) fn allocate(&mut self, node: TreeNode<T>) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, node: Some(node) });
        NodeId { index, generation: 0 }
    }

    /// Frees the slot behind `id` and hands back the key it stored.
    pub(crate) fn release(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation { return None }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(node.key)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode<T>> {
        self.slots.get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode<T>> {
        self.slots.get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }
    pub fn contains(&self, id: NodeId) -> bool { self.get(id).is_some() }

    /// Overwrites the key of `to` with a copy of the key of `from`.
    pub(crate) fn copy_key(&mut self, from: NodeId, to: NodeId)
    where T: Clone
    {
        let key = self[from].key.clone();
        self[to].key = key;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> { self[id].parent }
    pub fn grandparent(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).and_then(|p| self.parent(p))
    }
    pub fn uncle(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let grandparent = self.parent(parent)?;
        self.sibling(grandparent, self.which_child(grandparent, parent))
    }
    /// Child of `parent` on the other side from `side`.
    pub fn sibling(&self, parent: NodeId, side: NodeDirection) -> Option<NodeId> {
        self[parent].child(side.opposite())
    }
    // NOTE: Assume that `child` is linked below `parent`
    pub fn which_child(&self, parent: NodeId, child: NodeId) -> NodeDirection {
        match self[parent].left == Some(child) {
            true => NodeDirection::Left,
            false => NodeDirection::Right
        }
    }
    /// Side of its parent that `id` hangs from, `None` for the root.
    pub fn direction_of(&self, id: NodeId) -> Option<NodeDirection> {
        self.parent(id).map(|p| self.which_child(p, id))
    }
    /// Absent children count as black leaves.
    pub fn color_of(&self, id: Option<NodeId>) -> NodeColor {
        id.map_or(NodeColor::Black, |id| self[id].color)
    }
    pub(crate) fn set_color(&mut self, id: NodeId, color: NodeColor) {
        self[id].color = color;
    }

    pub fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self[id].left { id = left; }
        id
    }

    /// In-order successor: leftmost node of the right subtree, otherwise the
    /// nearest ancestor reached through a left link.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self[id].right {
            return Some(self.leftmost(right));
        }
        let mut node = id;
        while let Some(parent) = self[node].parent {
            if self[parent].right != Some(node) { return Some(parent) }
            node = parent;
        }
        None
    }

    /// Number of links between `id` and the root.
    pub fn depth(&self, mut id: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self[id].parent {
            depth += 1;
            id = parent;
        }
        depth
    }
}

impl<T> NodeArena<T, Global> {
    pub fn new() -> Self { Self::new_in(Global) }
}

impl<T> Default for NodeArena<T, Global> {
    fn default() -> Self { Self::new() }
}

impl<T, A> Index<NodeId> for NodeArena<T, A>
where A: Allocator + Clone
{
    type Output = TreeNode<T>;
    fn index(&self, id: NodeId) -> &Self::Output {
        match self.get(id) {
            Some(node) => node,
            None => panic!("{:?} does not refer to a live node", id)
        }
    }
}

impl<T, A> IndexMut<NodeId> for NodeArena<T, A>
where A: Allocator + Clone
{
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("{:?} does not refer to a live node", id)
        }
    }
}

/// Read-only handle on a live node, valid for as long as the tree is borrowed.
pub struct NodeRef<'a, T, A = Global>
where A: Allocator + Clone
{
    nodes: &'a NodeArena<T, A>,
    id: NodeId
}

impl<T, A> Clone for NodeRef<'_, T, A>
where A: Allocator + Clone
{
    fn clone(&self) -> Self { *self }
}
impl<T, A> Copy for NodeRef<'_, T, A> where A: Allocator + Clone {}

impl<'a, T, A> NodeRef<'a, T, A>
where A: Allocator + Clone
{
    pub(crate) fn new(nodes: &'a NodeArena<T, A>, id: NodeId) -> Self { Self { nodes, id } }
    fn node(&self) -> &'a TreeNode<T> { &self.nodes[self.id] }

    pub fn id(&self) -> NodeId { self.id }
    pub fn key(&self) -> &'a T { &self.node().key }
    pub fn color(&self) -> NodeColor { self.node().color }
    pub fn left(&self) -> Option<Self> { self.node().left.map(|id| Self::new(self.nodes, id)) }
    pub fn right(&self) -> Option<Self> { self.node().right.map(|id| Self::new(self.nodes, id)) }
    pub fn parent(&self) -> Option<Self> { self.node().parent.map(|id| Self::new(self.nodes, id)) }
    pub fn child(&self, dir: NodeDirection) -> Option<Self> {
        self.node().child(dir).map(|id| Self::new(self.nodes, id))
    }
    pub fn next(&self) -> Option<Self> { self.nodes.next(self.id).map(|id| Self::new(self.nodes, id)) }
    pub fn depth(&self) -> usize { self.nodes.depth(self.id) }
}

impl<T, A> Debug for NodeRef<'_, T, A>
where T: Debug,
      A: Allocator + Clone
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("key", self.key())
            .field("color", &self.color())
            .finish()
    }
}

/// In-order walk over the nodes below some root, following successor links.
pub struct Nodes<'a, T, A = Global>
where A: Allocator + Clone
{
    nodes: &'a NodeArena<T, A>,
    current: Option<NodeId>
}

impl<'a, T, A> Nodes<'a, T, A>
where A: Allocator + Clone
{
    pub(crate) fn new(nodes: &'a NodeArena<T, A>, root: Option<NodeId>) -> Self {
        Self { nodes, current: root.map(|r| nodes.leftmost(r)) }
    }
}

impl<'a, T, A> Iterator for Nodes<'a, T, A>
where A: Allocator + Clone
{
    type Item = NodeRef<'a, T, A>;
    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.nodes.next(id);
        Some(NodeRef::new(self.nodes, id))
    }
}
