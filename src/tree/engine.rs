use allocator_api2::alloc::{ Allocator, Global };
use log::{ debug, trace };
use std::{
    cmp::Ordering,
    fmt::Debug
};

use crate::channel::{ Channel, Subscriber, SubscriberId };
use crate::config::TreeConfig;
use crate::snapshot::{ NodeStatus, StatusMap, TreeInfo };
use crate::tree::node::{ NodeArena, NodeColor, NodeDirection, NodeId, NodeRef, Nodes, TreeNode };

/// Red-black tree that reports every step of its mutations.
///
/// Each call to [`insert`](Self::insert), [`erase`](Self::erase) or
/// [`find`](Self::find) pushes a sequence of [`TreeInfo`] snapshots to the
/// subscribers, synchronously and before the next structural change happens.
/// Duplicate keys are rejected.
pub struct RedBlackTree<T, A = Global>
where A: Allocator + Clone
{
    nodes: NodeArena<T, A>,
    root: Option<NodeId>,
    size: usize,
    // tags of the mutation in progress, or of the last one once it returned
    status: StatusMap,
    channel: Channel<T, A>,
    config: TreeConfig
}

enum Lookup {
    Found(NodeId),
    Vacant(NodeId, NodeDirection),
    Empty
}

impl<T> RedBlackTree<T, Global> {
    pub fn new() -> Self { Self::new_in(Global) }
    pub fn with_config(config: TreeConfig) -> Self { Self::with_config_in(config, Global) }
}

impl<T> Default for RedBlackTree<T, Global> {
    fn default() -> Self { Self::new() }
}

impl<T, A> RedBlackTree<T, A>
where A: Allocator + Clone
{
    pub fn new_in(alloc: A) -> Self { Self::with_config_in(TreeConfig::default(), alloc) }
    pub fn with_config_in(config: TreeConfig, alloc: A) -> Self {
        Self {
            nodes: NodeArena::new_in(alloc),
            root: None,
            size: 0,
            status: StatusMap::new(),
            channel: Channel::new(),
            config
        }
    }
    pub fn len(&self) -> usize { self.size }
    pub fn is_empty(&self) -> bool { self.size == 0 }
    pub fn config(&self) -> &TreeConfig { &self.config }

    pub(crate) fn nodes(&self) -> &NodeArena<T, A> { &self.nodes }
    pub(crate) fn root_id(&self) -> Option<NodeId> { self.root }
    #[cfg(test)]
    pub(crate) fn nodes_mut(&mut self) -> &mut NodeArena<T, A> { &mut self.nodes }

    pub fn root(&self) -> Option<NodeRef<'_, T, A>> { self.root.map(|id| NodeRef::new(&self.nodes, id)) }
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, T, A>> {
        self.nodes.contains(id).then(|| NodeRef::new(&self.nodes, id))
    }
    /// Smallest key.
    pub fn first(&self) -> Option<&T> { self.root.map(|r| self.nodes[self.nodes.leftmost(r)].key()) }
    pub fn iter(&self) -> Iter<'_, T, A> { Iter { inner: Nodes::new(&self.nodes, self.root) } }
    pub fn values(&self) -> Vec<T>
    where T: Clone
    {
        self.iter().cloned().collect()
    }

    /// The tree as it is now, tagged with whatever the last mutation left behind.
    pub fn snapshot(&self) -> TreeInfo<'_, T, A> {
        TreeInfo::new(&self.nodes, self.root, self.size, &self.status)
    }
    pub fn last_status(&self) -> &StatusMap { &self.status }

    /// Registers `subscriber` and delivers the current snapshot to it right away.
    pub fn subscribe<S>(&mut self, subscriber: S) -> SubscriberId
    where S: Subscriber<T, A> + 'static
    {
        let info = TreeInfo::new(&self.nodes, self.root, self.size, &self.status);
        let id = self.channel.subscribe(Box::new(subscriber), &info);
        debug!("subscribe {:?} ({} subscribers)", id, self.channel.len());
        id
    }
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let info = TreeInfo::new(&self.nodes, self.root, self.size, &self.status);
        let removed = self.channel.unsubscribe(id, &info);
        debug!("unsubscribe {:?} -> {}", id, removed);
        removed
    }
    pub fn subscriber_count(&self) -> usize { self.channel.len() }

    /// Pushes the current snapshot to every subscriber.
    pub fn notify(&mut self) {
        let info = TreeInfo::new(&self.nodes, self.root, self.size, &self.status);
        self.channel.notify(&info);
    }

    fn push_with(&mut self, status: &StatusMap) {
        if self.config.trace_steps {
            trace!("snapshot: size {} root {:?}, {} tagged", self.size, self.root, status.len());
        }
        let info = TreeInfo::new(&self.nodes, self.root, self.size, status);
        self.channel.notify(&info);
    }
    fn push(&mut self) {
        let status = std::mem::take(&mut self.status);
        self.push_with(&status);
        self.status = status;
    }
    fn tag(&mut self, id: NodeId, status: NodeStatus) { self.status.set(id, status) }

    fn trace_case(&self, case: &str, id: NodeId) {
        if self.config.trace_steps {
            trace!("{} at {:?}", case, id);
        }
    }

    //
    //      u               p
    //     / \             / \
    //    x   p     =>    u   z
    //       / \         / \
    //      y   z       x   y
    //
    // `pivot` (p) moves up into its parent's (u) place; this is a left rotation
    // when p is a right child and a right rotation otherwise. The rotated nodes
    // are shown tagged `rotate` before and after the relink.
    fn rotate(&mut self, pivot: NodeId) {
        let upper = match self.nodes.parent(pivot) {
            Some(v) => v,
            None => return
        };
        let side = self.nodes.which_child(upper, pivot);
        let inner = self.nodes[pivot].child(side.opposite());
        let grand = self.nodes.parent(upper);
        self.trace_case(match side {
            NodeDirection::Right => "rotate left",
            NodeDirection::Left => "rotate right"
        }, pivot);

        let mut tags = StatusMap::new();
        let affected = [
            Some(upper),
            self.nodes[upper].child(side.opposite()),
            Some(pivot),
            self.nodes[pivot].left(),
            self.nodes[pivot].right()
        ];
        for id in affected.into_iter().flatten() {
            tags.set(id, NodeStatus::Rotate);
        }
        self.push_with(&tags);

        self.nodes[upper].set_child(side, inner);
        if let Some(inner) = inner { self.nodes[inner].parent = Some(upper) }
        self.nodes[pivot].set_child(side.opposite(), Some(upper));
        self.nodes[upper].parent = Some(pivot);
        self.nodes[pivot].parent = grand;
        match grand {
            Some(g) => {
                let dir = self.nodes.which_child(g, upper);
                self.nodes[g].set_child(dir, Some(pivot));
            },
            None => self.root = Some(pivot)
        }
        self.push_with(&tags);
    }

    /// Rotates `pivot`, a right child, up over its parent.
    pub(crate) fn rotate_left(&mut self, pivot: NodeId) {
        debug_assert_eq!(self.nodes.direction_of(pivot), Some(NodeDirection::Right));
        self.rotate(pivot)
    }
    /// Rotates `pivot`, a left child, up over its parent.
    pub(crate) fn rotate_right(&mut self, pivot: NodeId) {
        debug_assert_eq!(self.nodes.direction_of(pivot), Some(NodeDirection::Left));
        self.rotate(pivot)
    }
    fn rotate_up(&mut self, pivot: NodeId) {
        match self.nodes.direction_of(pivot) {
            Some(NodeDirection::Right) => self.rotate_left(pivot),
            Some(NodeDirection::Left) => self.rotate_right(pivot),
            None => ()
        }
    }
}

impl<T, A> RedBlackTree<T, A>
where T: Ord + Debug,
      A: Allocator + Clone
{
    /// Non-instrumented lookup.
    pub fn contains(&self, value: &T) -> bool {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            current = match value.cmp(node.key()) {
                Ordering::Equal => return true,
                Ordering::Less => node.left(),
                Ordering::Greater => node.right()
            };
        }
        false
    }

    // Walks down from the root. Every visited node is shown as `current`, then
    // `touched` once the walk moves past it, with one snapshot per step. A match
    // is left for the caller to tag.
    fn search(&mut self, value: &T) -> Lookup {
        let mut current = match self.root {
            Some(v) => v,
            None => {
                self.push();
                return Lookup::Empty
            }
        };
        self.tag(current, NodeStatus::Current);
        self.push();
        loop {
            let dir = match value.cmp(self.nodes[current].key()) {
                Ordering::Equal => return Lookup::Found(current),
                Ordering::Less => NodeDirection::Left,
                Ordering::Greater => NodeDirection::Right
            };
            self.tag(current, NodeStatus::Touched);
            let next = self.nodes[current].child(dir);
            if let Some(next) = next { self.tag(next, NodeStatus::Current) }
            self.push();
            current = match next {
                Some(v) => v,
                None => return Lookup::Vacant(current, dir)
            };
        }
    }

    /// Adds `value`, returning `false` if it is already present.
    pub fn insert(&mut self, value: T) -> bool {
        debug!("insert {:?}", value);
        self.status.clear();
        if self.root.is_none() {
            // nothing to walk: the new root is shown straight away
            let node = self.nodes.allocate(TreeNode::new(value, NodeColor::Black, None));
            self.root = Some(node);
            self.size += 1;
            self.tag(node, NodeStatus::Current);
            self.push();
            self.tag(node, NodeStatus::Touched);
            self.push();
            return true;
        }
        let (parent, side) = match self.search(&value) {
            Lookup::Found(_) => {
                self.push();
                debug!("insert: duplicate");
                return false;
            },
            Lookup::Vacant(parent, side) => (parent, side),
            Lookup::Empty => return false
        };
        let node = self.nodes.allocate(TreeNode::new(value, NodeColor::Red, Some(parent)));
        self.nodes[parent].set_child(side, Some(node));
        self.size += 1;
        self.tag(node, NodeStatus::Current);
        self.push();
        self.post_insert_maintain_rbt(node);
        true
    }

    fn post_insert_maintain_rbt(&mut self, mut node: NodeId) {
        loop {
            // a black parent (or none) leaves nothing to repair
            let parent = match self.nodes.parent(node) {
                Some(v) if self.nodes[v].color().is_red() => v,
                _ => break
            };
            // the parent is red, so it is not the root
            let grandparent = match self.nodes.parent(parent) {
                Some(v) => v,
                None => break
            };
            let parent_side = self.nodes.which_child(grandparent, parent);
            let uncle = self.nodes.sibling(grandparent, parent_side);
            if let Some(uncle) = uncle.filter(|u| self.nodes[*u].color().is_red()) {
                self.trace_case("insert: red uncle", node);
                self.nodes.set_color(parent, NodeColor::Black);
                self.nodes.set_color(uncle, NodeColor::Black);
                self.nodes.set_color(grandparent, NodeColor::Red);
                // travel up 2 tree levels
                self.tag(node, NodeStatus::Touched);
                node = grandparent;
                self.tag(node, NodeStatus::Current);
                self.push();
                continue;
            }
            // black uncle: straighten a zig-zag first so the red pair lines up
            if self.nodes.which_child(parent, node) != parent_side {
                self.trace_case("insert: inner grandchild", node);
                self.rotate_up(node);
                self.tag(node, NodeStatus::Touched);
                node = parent;
                self.tag(node, NodeStatus::Current);
                self.push();
            }
            let parent = match self.nodes.parent(node) {
                Some(v) => v,
                None => break
            };
            self.trace_case("insert: outer grandchild", node);
            self.rotate_up(parent);
            self.nodes.set_color(parent, NodeColor::Black);
            self.nodes.set_color(grandparent, NodeColor::Red);
            self.push();
            self.tag(node, NodeStatus::Touched);
            self.push();
            return;
        }
        if let Some(root) = self.root { self.nodes.set_color(root, NodeColor::Black) }
        self.push();
        self.tag(node, NodeStatus::Touched);
        self.push();
    }

    /// Looks `value` up, tagging the match `found`. Does not change the tree.
    pub fn find(&mut self, value: &T) -> bool {
        debug!("find {:?}", value);
        self.status.clear();
        match self.search(value) {
            Lookup::Found(id) => {
                self.tag(id, NodeStatus::Found);
                self.push();
                true
            },
            _ => false
        }
    }

    /// Removes `value`, returning `false` if it is not present.
    pub fn erase(&mut self, value: &T) -> bool
    where T: Clone
    {
        debug!("erase {:?}", value);
        self.status.clear();
        let target = match self.search(value) {
            Lookup::Found(v) => v,
            Lookup::Vacant(..) | Lookup::Empty => {
                debug!("erase: not found");
                return false;
            }
        };
        self.tag(target, NodeStatus::ToDelete);
        self.push();
        let mut victim = target;
        if let (Some(_), Some(right)) = (self.nodes[target].left(), self.nodes[target].right()) {
            // two children: the successor's key is copied into the target and
            // the successor node, which has no left child, is removed instead.
            // Until then both nodes hold the same key.
            let successor = self.nodes.leftmost(right);
            self.tag(successor, NodeStatus::Current);
            self.push();
            self.tag(successor, NodeStatus::ToDelete);
            self.tag(target, NodeStatus::Current);
            self.push();
            self.nodes.copy_key(successor, target);
            self.tag(target, NodeStatus::Touched);
            self.push();
            victim = successor;
        }
        self.size -= 1;
        self.unlink(victim);
        true
    }

    // Splices out a node with at most one child and restores the black height.
    fn unlink(&mut self, victim: NodeId) {
        let child = self.nodes[victim].left().or(self.nodes[victim].right());
        let parent = self.nodes.parent(victim);
        let side = self.nodes.direction_of(victim);
        let color = self.nodes[victim].color();
        if let Some(child) = child { self.nodes[child].parent = parent }
        match (parent, side) {
            (Some(p), Some(dir)) => self.nodes[p].set_child(dir, child),
            _ => self.root = child
        }
        self.nodes.release(victim);
        self.status.remove(victim);

        if color.is_red() {
            self.push();
            return;
        }
        if let Some(child) = child {
            // a black node with a single child always has a red leaf below it
            self.nodes.set_color(child, NodeColor::Black);
            self.tag(child, NodeStatus::Current);
            self.push();
            return;
        }
        match (parent, side) {
            (Some(p), Some(dir)) => {
                self.push();
                self.post_erase_maintain_rbt(None, p, dir);
            },
            // the tree is now empty
            _ => self.push()
        }
    }

    // `node` sits in `parent`'s `side` slot (possibly empty) and is one black
    // short compared with its sibling.
    fn post_erase_maintain_rbt(&mut self, mut node: Option<NodeId>, mut parent: NodeId, mut side: NodeDirection) {
        loop {
            let mut sibling = match self.nodes.sibling(parent, side) {
                Some(v) => v,
                None => return
            };
            if self.nodes[sibling].color().is_red() {
                self.trace_case("erase: red sibling", sibling);
                self.nodes.set_color(sibling, NodeColor::Black);
                self.nodes.set_color(parent, NodeColor::Red);
                self.rotate_up(sibling);
                sibling = match self.nodes.sibling(parent, side) {
                    Some(v) => v,
                    None => return
                };
                self.push();
            }
            let near = self.nodes[sibling].child(side);
            let far = self.nodes[sibling].child(side.opposite());
            if self.nodes.color_of(near).is_black() && self.nodes.color_of(far).is_black() {
                if self.nodes[parent].color().is_black() {
                    self.trace_case("erase: black sibling, black parent", sibling);
                    self.nodes.set_color(sibling, NodeColor::Red);
                    if let Some(node) = node { self.tag(node, NodeStatus::Touched) }
                    node = Some(parent);
                    self.tag(parent, NodeStatus::Current);
                    self.push();
                    match self.nodes.parent(parent) {
                        Some(grand) => {
                            side = self.nodes.which_child(grand, parent);
                            parent = grand;
                            continue;
                        },
                        // the deficiency reached the root and is absorbed there
                        None => return
                    }
                }
                self.trace_case("erase: black sibling, red parent", sibling);
                self.nodes.set_color(parent, NodeColor::Black);
                self.nodes.set_color(sibling, NodeColor::Red);
                self.push();
                return;
            }
            if self.nodes.color_of(far).is_black() {
                // near child is red: turn it into the far child
                if let Some(near) = near {
                    self.trace_case("erase: red near nephew", near);
                    self.rotate_up(near);
                    self.nodes.set_color(sibling, NodeColor::Red);
                    self.nodes.set_color(near, NodeColor::Black);
                    sibling = near;
                    self.push();
                }
            }
            let far = self.nodes[sibling].child(side.opposite());
            self.trace_case("erase: red far nephew", sibling);
            self.rotate_up(sibling);
            let parent_color = self.nodes[parent].color();
            self.nodes.set_color(sibling, parent_color);
            self.nodes.set_color(parent, NodeColor::Black);
            if let Some(far) = far { self.nodes.set_color(far, NodeColor::Black) }
            self.push();
            return;
        }
    }
}

impl<T, A> Drop for RedBlackTree<T, A>
where A: Allocator + Clone
{
    fn drop(&mut self) {
        if self.channel.is_empty() { return }
        let info = TreeInfo::new(&self.nodes, self.root, self.size, &self.status);
        self.channel.close(&info);
    }
}

pub struct Iter<'a, T, A = Global>
where A: Allocator + Clone
{
    inner: Nodes<'a, T, A>
}

impl<'a, T, A> Iterator for Iter<'a, T, A>
where A: Allocator + Clone
{
    type Item = &'a T;
    fn next(&mut self) -> Option<Self::Item> { self.inner.next().map(|n| n.key()) }
}

impl<'a, T, A> IntoIterator for &'a RedBlackTree<T, A>
where A: Allocator + Clone
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}
