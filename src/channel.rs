use allocator_api2::alloc::{ Allocator, Global };
use std::{
    cell::RefCell,
    rc::Rc
};

use crate::snapshot::{ Frame, TreeInfo };

/// Receives the snapshot stream of one tree. Every reaction defaults to a no-op.
///
/// Reactions run synchronously inside the tree operation that produced the
/// snapshot, so they cannot call back into the tree.
pub trait Subscriber<T, A = Global>
where A: Allocator + Clone
{
    fn on_subscribe(&mut self, _info: &TreeInfo<'_, T, A>) {}
    fn on_notify(&mut self, _info: &TreeInfo<'_, T, A>) {}
    fn on_unsubscribe(&mut self, _info: &TreeInfo<'_, T, A>) {}
}

// Lets the caller keep a handle on a subscriber after handing it to the tree
impl<T, A, S> Subscriber<T, A> for Rc<RefCell<S>>
where S: Subscriber<T, A>,
      A: Allocator + Clone
{
    fn on_subscribe(&mut self, info: &TreeInfo<'_, T, A>) { self.borrow_mut().on_subscribe(info) }
    fn on_notify(&mut self, info: &TreeInfo<'_, T, A>) { self.borrow_mut().on_notify(info) }
    fn on_unsubscribe(&mut self, info: &TreeInfo<'_, T, A>) { self.borrow_mut().on_unsubscribe(info) }
}

// `None` reacts by doing nothing
type Reaction<T, A> = Option<Box<dyn FnMut(&TreeInfo<'_, T, A>)>>;

/// Subscriber assembled from closures.
pub struct Observer<T, A = Global>
where A: Allocator + Clone
{
    on_subscribe: Reaction<T, A>,
    on_notify: Reaction<T, A>,
    on_unsubscribe: Reaction<T, A>
}

impl<T, A> Observer<T, A>
where A: Allocator + Clone
{
    /// Observer reacting to notifications only.
    pub fn new<F>(on_notify: F) -> Self
    where F: FnMut(&TreeInfo<'_, T, A>) + 'static
    {
        Self { on_subscribe: None, on_notify: Some(Box::new(on_notify)), on_unsubscribe: None }
    }
    pub fn with_subscribe<F>(mut self, on_subscribe: F) -> Self
    where F: FnMut(&TreeInfo<'_, T, A>) + 'static
    {
        self.on_subscribe = Some(Box::new(on_subscribe));
        self
    }
    pub fn with_unsubscribe<F>(mut self, on_unsubscribe: F) -> Self
    where F: FnMut(&TreeInfo<'_, T, A>) + 'static
    {
        self.on_unsubscribe = Some(Box::new(on_unsubscribe));
        self
    }
}

impl<T, A> Subscriber<T, A> for Observer<T, A>
where A: Allocator + Clone
{
    fn on_subscribe(&mut self, info: &TreeInfo<'_, T, A>) {
        if let Some(f) = self.on_subscribe.as_mut() { f(info) }
    }
    fn on_notify(&mut self, info: &TreeInfo<'_, T, A>) {
        if let Some(f) = self.on_notify.as_mut() { f(info) }
    }
    fn on_unsubscribe(&mut self, info: &TreeInfo<'_, T, A>) {
        if let Some(f) = self.on_unsubscribe.as_mut() { f(info) }
    }
}

/// Records every notification as an owned [`Frame`].
#[derive(Debug, Clone, Default)]
pub struct Recorder<T> {
    pub subscribed: Option<Frame<T>>,
    pub frames: Vec<Frame<T>>,
    pub unsubscribed: Option<Frame<T>>
}

impl<T> Recorder<T> {
    pub fn new() -> Self { Self { subscribed: None, frames: vec![], unsubscribed: None } }
    pub fn shared() -> Rc<RefCell<Self>> { Rc::new(RefCell::new(Self::new())) }
    pub fn last(&self) -> Option<&Frame<T>> { self.frames.last() }
    /// Drops the recorded notifications, keeping subscribe/unsubscribe frames.
    pub fn take_frames(&mut self) -> Vec<Frame<T>> { std::mem::take(&mut self.frames) }
}

impl<T, A> Subscriber<T, A> for Recorder<T>
where T: Clone,
      A: Allocator + Clone
{
    fn on_subscribe(&mut self, info: &TreeInfo<'_, T, A>) { self.subscribed = Some(info.to_frame()) }
    fn on_notify(&mut self, info: &TreeInfo<'_, T, A>) { self.frames.push(info.to_frame()) }
    fn on_unsubscribe(&mut self, info: &TreeInfo<'_, T, A>) { self.unsubscribed = Some(info.to_frame()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

/// Ordered fan-out of snapshots to registered subscribers.
pub struct Channel<T, A = Global>
where A: Allocator + Clone
{
    subscribers: Vec<(SubscriberId, Box<dyn Subscriber<T, A>>)>,
    next_id: u64
}

impl<T, A> Channel<T, A>
where A: Allocator + Clone
{
    pub fn new() -> Self { Self { subscribers: vec![], next_id: 0 } }
    pub fn len(&self) -> usize { self.subscribers.len() }
    pub fn is_empty(&self) -> bool { self.subscribers.is_empty() }
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.iter().any(|(i, _)| *i == id)
    }

    /// Registers `subscriber` and immediately hands it `info`.
    pub fn subscribe(&mut self, mut subscriber: Box<dyn Subscriber<T, A>>, info: &TreeInfo<'_, T, A>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        subscriber.on_subscribe(info);
        self.subscribers.push((id, subscriber));
        id
    }

    /// Removes `id`, delivering `info` to it one last time. Returns false for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriberId, info: &TreeInfo<'_, T, A>) -> bool {
        let pos = match self.subscribers.iter().position(|(i, _)| *i == id) {
            Some(v) => v,
            None => return false
        };
        let (_, mut subscriber) = self.subscribers.remove(pos);
        subscriber.on_unsubscribe(info);
        true
    }

    /// Pushes `info` to every subscriber in registration order.
    pub fn notify(&mut self, info: &TreeInfo<'_, T, A>) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber.on_notify(info);
        }
    }

    /// Unsubscribes everyone, in registration order.
    pub fn close(&mut self, info: &TreeInfo<'_, T, A>) {
        for (_, mut subscriber) in self.subscribers.drain(..) {
            subscriber.on_unsubscribe(info);
        }
    }
}

impl<T, A> Default for Channel<T, A>
where A: Allocator + Clone
{
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
pub mod tests {
    use super::{ Channel, Observer, Recorder };
    use crate::snapshot::{ StatusMap, TreeInfo };
    use crate::tree::node::NodeArena;
    use std::{ cell::{ Cell, RefCell }, error::Error, rc::Rc };

    type TestReturn = Result<(), Box<dyn Error>>;

    fn counter(cell: &Rc<Cell<usize>>) -> impl FnMut(&TreeInfo<'_, u32>) + 'static {
        let cell = cell.clone();
        move |_: &TreeInfo<'_, u32>| cell.set(cell.get() + 1)
    }

    #[test]
    pub fn reactions_fire_in_order() -> TestReturn {
        let nodes: NodeArena<u32> = NodeArena::new();
        let status = StatusMap::new();
        let info = TreeInfo::new(&nodes, None, 0, &status);
        let (subs, notes, unsubs) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
        let mut channel: Channel<u32> = Channel::new();
        let observer = Observer::new(counter(&notes))
            .with_subscribe(counter(&subs))
            .with_unsubscribe(counter(&unsubs));
        let id = channel.subscribe(Box::new(observer), &info);
        assert_eq!((subs.get(), notes.get(), unsubs.get()), (1, 0, 0));
        channel.notify(&info);
        channel.notify(&info);
        assert_eq!((subs.get(), notes.get(), unsubs.get()), (1, 2, 0));
        assert!(channel.unsubscribe(id, &info));
        assert_eq!((subs.get(), notes.get(), unsubs.get()), (1, 2, 1));
        assert!(!channel.unsubscribe(id, &info), "Second unsubscribe should be rejected");
        channel.notify(&info);
        assert_eq!(notes.get(), 2);
        Ok(())
    }

    #[test]
    pub fn notify_keeps_registration_order() -> TestReturn {
        let nodes: NodeArena<u32> = NodeArena::new();
        let status = StatusMap::new();
        let info = TreeInfo::new(&nodes, None, 0, &status);
        let log = Rc::new(RefCell::new(vec![]));
        let mut channel: Channel<u32> = Channel::new();
        for i in 0..5 {
            let log = log.clone();
            channel.subscribe(Box::new(Observer::new(move |_: &TreeInfo<'_, u32>| log.borrow_mut().push(i))), &info);
        }
        channel.notify(&info);
        assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 4]);
        channel.close(&info);
        assert!(channel.is_empty());
        Ok(())
    }

    #[test]
    pub fn shared_recorder() -> TestReturn {
        let nodes: NodeArena<u32> = NodeArena::new();
        let status = StatusMap::new();
        let info = TreeInfo::new(&nodes, None, 0, &status);
        let recorder = Recorder::shared();
        let mut channel: Channel<u32> = Channel::new();
        channel.subscribe(Box::new(recorder.clone()), &info);
        channel.notify(&info);
        assert!(recorder.borrow().subscribed.is_some());
        assert_eq!(recorder.borrow().frames.len(), 1);
        assert_eq!(recorder.borrow().last().map(|f| f.tree_size), Some(0));
        channel.close(&info);
        assert!(recorder.borrow().unsubscribed.is_some());
        Ok(())
    }
}
