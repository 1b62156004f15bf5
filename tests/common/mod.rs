#![allow(dead_code)]

use rbtree_visual::Frame;
use simplelog::{ Config, LevelFilter, TestLogger };

/// Routes `log` output through the test harness. Safe to call from every test;
/// only the first call in a binary installs the logger.
pub fn init_logging() {
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

/// Every ordering of `items`.
pub fn permutations(items: &[i32]) -> Vec<Vec<i32>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = vec![];
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// Describes the first way `frame` fails to show a well-formed tree: keys out
/// of order, a node count different from `tree_size`, or a root that does not
/// match the single depth 0 node.
pub fn frame_problem(frame: &Frame<i32>) -> Option<String> {
    if frame.nodes.len() != frame.tree_size {
        return Some(format!("{} nodes shown for size {}", frame.nodes.len(), frame.tree_size));
    }
    if let Some(pair) = frame.nodes.windows(2).find(|w| w[0].key > w[1].key) {
        return Some(format!("{} shown before {}", pair[0].key, pair[1].key));
    }
    let tops: Vec<i32> = frame.nodes.iter().filter(|n| n.depth == 0).map(|n| n.key).collect();
    match (frame.root, tops.as_slice()) {
        (None, []) => None,
        (Some(root), [top]) if root == *top => None,
        (root, tops) => Some(format!("root {:?} but depth 0 holds {:?}", root, tops))
    }
}
