pub mod tree {
    pub mod engine;
    pub mod invariants;
    pub mod node;
    pub mod render;
}
pub mod channel;
pub mod config;
pub mod error;
pub mod query;
pub mod snapshot;

pub use channel::{ Channel, Observer, Recorder, Subscriber, SubscriberId };
pub use config::{ TreeConfig, ValueRange };
pub use error::{ ConfigError, InvariantViolation, QueryError };
pub use query::{ Controller, QueryKind, TreeQuery };
pub use snapshot::{ Frame, FrameNode, NodeStatus, StatusMap, TreeInfo };
pub use tree::engine::RedBlackTree;
pub use tree::node::{ NodeColor, NodeDirection, NodeId, NodeRef };
