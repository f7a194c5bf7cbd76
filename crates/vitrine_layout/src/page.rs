//! Page capability

use vitrine_core::NodeId;

/// Element lookup and mutation, the part of a page features touch.
///
/// Selector syntax is [`crate::SelectorList`]; an unparsable selector matches
/// nothing. Results come back in document order.
pub trait Page: Send + Sync {
    /// The document body
    fn body(&self) -> NodeId;

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// First descendant of `root` matching `selector`
    fn query_within(&self, root: NodeId, selector: &str) -> Option<NodeId>;

    fn add_class(&self, node: NodeId, class: &str);

    fn remove_class(&self, node: NodeId, class: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Text of a node and all its descendants, `None` for unknown nodes
    fn text(&self, node: NodeId) -> Option<String>;

    /// Text held directly by a node, children excluded
    fn own_text(&self, node: NodeId) -> Option<String>;

    /// Replace a node's own text
    fn set_text(&self, node: NodeId, text: &str);

    /// Create a detached element
    fn create_element(&self, tag: &str, classes: &[&str]) -> NodeId;

    fn append_child(&self, parent: NodeId, child: NodeId);

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Detach every child and clear the node's own text
    fn clear(&self, node: NodeId);
}
