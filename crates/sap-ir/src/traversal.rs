//! Visitor traversal over trees

use crate::node::Node;

/// Trait for traversing a tree
pub trait Traversal {
    /// Visit a node
    fn visit(&mut self, node: &Node, path: &[String]);

    /// Called when entering a node with children
    fn enter(&mut self, _node: &Node, _path: &[String]) {}

    /// Called when leaving a node with children
    fn leave(&mut self, _node: &Node, _path: &[String]) {}

    /// Returns true if traversal should continue
    fn should_continue(&self) -> bool {
        true
    }
}

/// Walk the tree using a visitor
pub fn walk<T: Traversal>(node: &Node, visitor: &mut T) {
    walk_recursive(node, visitor, &mut vec![]);
}

fn walk_recursive<T: Traversal>(node: &Node, visitor: &mut T, path: &mut Vec<String>) {
    if !visitor.should_continue() {
        return;
    }

    visitor.visit(node, path);

    if !node.children.is_empty() {
        visitor.enter(node, path);
        path.push(node.name.clone());

        for child in &node.children {
            walk_recursive(child, visitor, path);
        }

        path.pop();
        visitor.leave(node, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeType};

    fn segments() -> Node {
        Node::new("IDOCTYPE_READ_COMPLETE", NodeType::Root).with_child(
            Node::new("PT_SEGMENTS", NodeType::Table)
                .with_child(Node::row().with_field("SEGMENTTYP", "E1EDK01"))
                .with_child(Node::row().with_field("SEGMENTTYP", "E1EDKA1")),
        )
    }

    struct NameCollector {
        visited: Vec<String>,
        entered: Vec<String>,
        left: Vec<String>,
        max_visits: usize,
    }

    impl NameCollector {
        fn with_max_visits(max_visits: usize) -> Self {
            Self {
                visited: Vec::new(),
                entered: Vec::new(),
                left: Vec::new(),
                max_visits,
            }
        }
    }

    impl Traversal for NameCollector {
        fn visit(&mut self, node: &Node, _path: &[String]) {
            self.visited.push(node.name.clone());
        }

        fn enter(&mut self, node: &Node, _path: &[String]) {
            self.entered.push(node.name.clone());
        }

        fn leave(&mut self, node: &Node, _path: &[String]) {
            self.left.push(node.name.clone());
        }

        fn should_continue(&self) -> bool {
            self.visited.len() < self.max_visits
        }
    }

    #[test]
    fn test_walk_enter_leave_order() {
        let root = segments();
        let mut visitor = NameCollector::with_max_visits(usize::MAX);
        walk(&root, &mut visitor);

        assert_eq!(
            visitor.visited,
            vec![
                "IDOCTYPE_READ_COMPLETE",
                "PT_SEGMENTS",
                "item",
                "SEGMENTTYP",
                "item",
                "SEGMENTTYP"
            ]
        );
        assert_eq!(visitor.entered[0], "IDOCTYPE_READ_COMPLETE");
        assert_eq!(visitor.left.last().unwrap(), "IDOCTYPE_READ_COMPLETE");
    }

    #[test]
    fn test_walk_should_continue() {
        let root = segments();
        let mut visitor = NameCollector::with_max_visits(2);
        walk(&root, &mut visitor);
        assert_eq!(visitor.visited, vec!["IDOCTYPE_READ_COMPLETE", "PT_SEGMENTS"]);
    }
}
