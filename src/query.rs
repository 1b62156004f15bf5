use allocator_api2::alloc::{ Allocator, Global };
use log::debug;
use serde::{ Deserialize, Serialize };

use crate::config::TreeConfig;
use crate::error::QueryError;
use crate::tree::engine::RedBlackTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    #[default]
    DoNothing,
    Insert,
    Erase,
    Find
}

/// Request from whoever drives the tree. Carries no reply channel: the
/// answer is the returned flag plus the snapshots pushed while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreeQuery {
    pub kind: QueryKind,
    pub value: i32
}

impl TreeQuery {
    pub fn new(kind: QueryKind, value: i32) -> Self { Self { kind, value } }
    pub fn insert(value: i32) -> Self { Self::new(QueryKind::Insert, value) }
    pub fn erase(value: i32) -> Self { Self::new(QueryKind::Erase, value) }
    pub fn find(value: i32) -> Self { Self::new(QueryKind::Find, value) }
}

/// Owns an integer tree and applies queries to it within the configured range.
pub struct Controller<A = Global>
where A: Allocator + Clone
{
    tree: RedBlackTree<i32, A>
}

impl Controller<Global> {
    pub fn new(config: TreeConfig) -> Self { Self { tree: RedBlackTree::with_config(config) } }
}

impl Default for Controller<Global> {
    fn default() -> Self { Self::new(TreeConfig::default()) }
}

impl<A> Controller<A>
where A: Allocator + Clone
{
    pub fn with_tree(tree: RedBlackTree<i32, A>) -> Self { Self { tree } }

    /// Runs `query`, returning the tree operation's result. `DoNothing` is
    /// accepted for any value and reports `false` without touching the tree.
    pub fn submit(&mut self, query: TreeQuery) -> Result<bool, QueryError> {
        let range = self.tree.config().value_range;
        if query.kind != QueryKind::DoNothing && !range.contains(query.value) {
            debug!("rejecting {:?}: outside {}..={}", query, range.min, range.max);
            return Err(QueryError::OutOfRange { value: query.value, min: range.min, max: range.max });
        }
        let result = match query.kind {
            QueryKind::DoNothing => false,
            QueryKind::Insert => self.tree.insert(query.value),
            QueryKind::Erase => self.tree.erase(&query.value),
            QueryKind::Find => self.tree.find(&query.value)
        };
        debug!("{:?} -> {}", query, result);
        Ok(result)
    }

    pub fn tree(&self) -> &RedBlackTree<i32, A> { &self.tree }
    pub fn tree_mut(&mut self) -> &mut RedBlackTree<i32, A> { &mut self.tree }
    pub fn into_tree(self) -> RedBlackTree<i32, A> { self.tree }
}

#[cfg(test)]
pub mod tests {
    use super::{ Controller, QueryKind, TreeQuery };
    use crate::channel::Recorder;
    use crate::config::{ TreeConfig, ValueRange };
    use crate::error::QueryError;
    use std::error::Error;

    type TestReturn = Result<(), Box<dyn Error>>;

    fn bounded() -> Result<Controller, Box<dyn Error>> {
        Ok(Controller::new(TreeConfig { value_range: ValueRange::new(-99, 999)?, ..Default::default() }))
    }

    #[test]
    pub fn dispatch_queries() -> TestReturn {
        let mut controller = bounded()?;
        assert_eq!(controller.submit(TreeQuery::insert(5)), Ok(true));
        assert_eq!(controller.submit(TreeQuery::insert(5)), Ok(false));
        assert_eq!(controller.submit(TreeQuery::find(5)), Ok(true));
        assert_eq!(controller.submit(TreeQuery::erase(5)), Ok(true));
        assert_eq!(controller.submit(TreeQuery::find(5)), Ok(false));
        assert!(controller.tree().is_empty());
        Ok(())
    }

    #[test]
    pub fn out_of_range_is_rejected() -> TestReturn {
        let mut controller = bounded()?;
        assert_eq!(
            controller.submit(TreeQuery::insert(1000)),
            Err(QueryError::OutOfRange { value: 1000, min: -99, max: 999 })
        );
        assert!(controller.submit(TreeQuery::erase(-100)).is_err());
        assert!(controller.tree().is_empty());
        Ok(())
    }

    #[test]
    pub fn do_nothing_is_silent() -> TestReturn {
        let mut controller = bounded()?;
        let recorder = Recorder::shared();
        controller.tree_mut().subscribe(recorder.clone());
        assert_eq!(controller.submit(TreeQuery::new(QueryKind::DoNothing, 1_000_000)), Ok(false));
        assert_eq!(controller.submit(TreeQuery::default()), Ok(false));
        assert!(recorder.borrow().frames.is_empty());
        assert!(controller.submit(TreeQuery::insert(3))?);
        assert!(!recorder.borrow().frames.is_empty());
        Ok(())
    }

    #[test]
    pub fn queries_from_json() -> TestReturn {
        let query: TreeQuery = serde_json::from_str(r#"{ "kind": "erase", "value": 12 }"#)?;
        assert_eq!(query, TreeQuery::erase(12));
        let query: TreeQuery = serde_json::from_str(r#"{ "kind": "do-nothing", "value": 0 }"#)?;
        assert_eq!(query.kind, QueryKind::DoNothing);
        Ok(())
    }
}
