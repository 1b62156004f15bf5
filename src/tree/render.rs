use allocator_api2::alloc::Allocator;
use std::fmt::{ self, Display, Write };

use crate::snapshot::{ NodeStatus, StatusMap };
use crate::tree::engine::RedBlackTree;
use crate::tree::node::{ NodeArena, NodeId };

// Pre-order dump, one node per line:
//
// (2, b)
// |---(1, r)
// |   |---(NIL, b)
// |   |---(NIL, b)
// |---(NIL, b)

fn write_indent<W: Write>(out: &mut W, depth: usize) -> fmt::Result {
    if depth > 0 {
        for _ in 1..depth { out.write_str("|   ")?; }
        out.write_str("|---")?;
    }
    Ok(())
}

fn write_node<W, T, A>(out: &mut W, nodes: &NodeArena<T, A>, id: Option<NodeId>, depth: usize,
    statuses: Option<&StatusMap>) -> fmt::Result
where W: Write,
      T: Display,
      A: Allocator + Clone
{
    write_indent(out, depth)?;
    let id = match id {
        Some(v) => v,
        None => return out.write_str("(NIL, b)\n")
    };
    let node = &nodes[id];
    write!(out, "({}, {})", node.key(), node.color().short_name())?;
    match statuses.map(|s| s.get(id)) {
        Some(NodeStatus::Default) | None => (),
        Some(status) => write!(out, " <{}>", status)?
    }
    out.write_char('\n')?;
    write_node(out, nodes, node.left(), depth + 1, statuses)?;
    write_node(out, nodes, node.right(), depth + 1, statuses)
}

pub(crate) fn write_tree<W, T, A>(out: &mut W, nodes: &NodeArena<T, A>, root: Option<NodeId>,
    statuses: Option<&StatusMap>) -> fmt::Result
where W: Write,
      T: Display,
      A: Allocator + Clone
{
    match root {
        Some(_) => write_node(out, nodes, root, 0, statuses),
        None => out.write_str("Empty\n")
    }
}

impl<T, A> RedBlackTree<T, A>
where T: Display,
      A: Allocator + Clone
{
    /// Plain dump of the tree, without highlight tags.
    pub fn str(&self) -> String { self.to_string() }
}

impl<T, A> Display for RedBlackTree<T, A>
where T: Display,
      A: Allocator + Clone
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(f, self.nodes(), self.root_id(), None)
    }
}

#[cfg(test)]
pub mod tests {
    use crate::tree::engine::RedBlackTree;
    use std::error::Error;

    type TestReturn = Result<(), Box<dyn Error>>;

    #[test]
    pub fn empty_tree() -> TestReturn {
        let tree: RedBlackTree<i32> = RedBlackTree::new();
        assert_eq!(tree.to_string(), "Empty\n");
        Ok(())
    }

    #[test]
    pub fn first_insert() -> TestReturn {
        let mut tree = RedBlackTree::new();
        assert!(tree.insert(1));
        assert_eq!(tree.to_string(), "(1, b)\n|---(NIL, b)\n|---(NIL, b)\n");
        assert_eq!(tree.str(), "(1, b)\n|---(NIL, b)\n|---(NIL, b)\n");
        Ok(())
    }

    #[test]
    pub fn nested_indent() -> TestReturn {
        let mut tree = RedBlackTree::new();
        assert!(tree.insert(5));
        assert!(tree.insert(3));
        let expected = "(5, b)\n\
                        |---(3, r)\n\
                        |   |---(NIL, b)\n\
                        |   |---(NIL, b)\n\
                        |---(NIL, b)\n";
        assert_eq!(tree.to_string(), expected);
        Ok(())
    }

    #[test]
    pub fn snapshot_dump_marks_status() -> TestReturn {
        let mut tree = RedBlackTree::new();
        tree.insert(2);
        tree.insert(1);
        assert!(tree.find(&1));
        let expected = "(2, b) <touched>\n\
                        |---(1, r) <found>\n\
                        |   |---(NIL, b)\n\
                        |   |---(NIL, b)\n\
                        |---(NIL, b)\n";
        assert_eq!(tree.snapshot().to_string(), expected);
        Ok(())
    }
}
