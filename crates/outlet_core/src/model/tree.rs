//! Ordered tree container and outlet-position keys.

use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Ordered tree node. Child order is preserved from construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<T> {
    pub value: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            children: Vec::new(),
        }
    }

    /// Appends one child and returns the updated node (builder style).
    pub fn with_child(mut self, child: TreeNode<T>) -> Self {
        self.children.push(child);
        self
    }

    /// Appends many children in iteration order.
    pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode<T>>) -> Self {
        self.children.extend(children);
        self
    }

    /// Counts nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Visits values in pre-order (parent before children).
    pub fn pre_order(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.node_count());
        collect_pre_order(self, &mut out);
        out
    }
}

fn collect_pre_order<'a, T>(node: &'a TreeNode<T>, out: &mut Vec<&'a T>) {
    out.push(&node.value);
    for child in &node.children {
        collect_pre_order(child, out);
    }
}

/// Stable outlet-position key: outlet names from the root down.
///
/// The root position is the empty path and displays as `/`. Serializes as
/// its display string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutletPath(Vec<String>);

impl OutletPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `primary/sidebar` style keys. Empty segments are ignored.
    pub fn parse(value: &str) -> Self {
        Self(
            value
                .split('/')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Returns the key for one child outlet below this position.
    pub fn child(&self, outlet: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(outlet.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the last outlet name, or `None` for the root.
    pub fn outlet(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl Display for OutletPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        write!(f, "{}", self.0.join("/"))
    }
}

impl Serialize for OutletPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{OutletPath, TreeNode};

    #[test]
    fn pre_order_visits_parent_before_children() {
        let tree = TreeNode::new("a")
            .with_child(TreeNode::new("b").with_child(TreeNode::new("c")))
            .with_child(TreeNode::new("d"));

        assert_eq!(tree.pre_order(), vec![&"a", &"b", &"c", &"d"]);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn outlet_path_parse_and_display_agree() {
        let path = OutletPath::parse(" primary / / sidebar ");
        assert_eq!(path.segments(), &["primary".to_string(), "sidebar".to_string()]);
        assert_eq!(path.to_string(), "primary/sidebar");
        assert_eq!(path.outlet(), Some("sidebar"));
        assert_eq!(OutletPath::root().to_string(), "/");
        assert_eq!(OutletPath::root().child("primary"), OutletPath::parse("primary"));
    }
}
