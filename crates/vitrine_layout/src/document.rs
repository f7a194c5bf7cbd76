//! In-memory document
//!
//! A tree of elements with tags, ids, classes, text and explicit geometry.
//! Geometry is assigned by the host (or a test), never computed; this is a
//! measurement source, not a layout engine.

use crate::page::Page;
use crate::selector::{Selector, SelectorList};
use smallvec::SmallVec;
use std::sync::{Mutex, MutexGuard};
use vitrine_core::{LayoutOracle, NodeId, Rect, Viewport};

#[derive(Clone, Debug, Default)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: SmallVec<[String; 4]>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bounds: Rect,
    content_width: Option<f32>,
}

#[derive(Debug)]
struct DocumentState {
    nodes: Vec<Node>,
    viewport: Viewport,
}

impl DocumentState {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(node);
        id
    }

    fn matches(&self, id: NodeId, selectors: &SelectorList) -> bool {
        self.node(id).is_some_and(|node| {
            selectors.matches(
                &node.tag,
                node.id.as_deref(),
                node.classes.iter().map(String::as_str),
            )
        })
    }

    /// Pre-order walk of `root`'s descendants, `root` excluded
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(root) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(node) = self.node(id) {
            out.push_str(&node.text);
            for &child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|node| node.parent) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
    }
}

/// In-memory page with explicit geometry
#[derive(Debug)]
pub struct Document {
    state: Mutex<DocumentState>,
}

impl Document {
    pub const BODY: NodeId = NodeId(0);

    pub fn new(viewport: Viewport) -> Self {
        let body = Node {
            tag: "body".to_string(),
            ..Default::default()
        };
        Self {
            state: Mutex::new(DocumentState {
                nodes: vec![body],
                viewport,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an element described like a selector (`div#loader`, `.card`,
    /// `img`). The tag defaults to `div`. Malformed specs still create a
    /// plain `div` so fixtures never fail half-built.
    pub fn spawn(&self, parent: NodeId, spec: &str) -> NodeId {
        let selector = Selector::parse(spec).unwrap_or_else(|err| {
            tracing::warn!(spec, %err, "malformed element spec");
            Selector::default()
        });
        let node = Node {
            tag: selector.tag.unwrap_or_else(|| "div".to_string()),
            id: selector.id,
            classes: selector.classes.into_iter().collect(),
            ..Default::default()
        };
        let mut state = self.lock();
        let id = state.push(node);
        drop(state);
        self.append_child(parent, id);
        id
    }

    /// Same as [`Document::spawn`] followed by setting the text
    pub fn spawn_text(&self, parent: NodeId, spec: &str, text: &str) -> NodeId {
        let id = self.spawn(parent, spec);
        self.set_text(id, text);
        id
    }

    pub fn set_bounds(&self, node: NodeId, bounds: Rect) {
        if let Some(node) = self.lock().node_mut(node) {
            node.bounds = bounds;
        }
    }

    /// Override the scrollable content width (defaults to the bounds width)
    pub fn set_content_width(&self, node: NodeId, width: f32) {
        if let Some(node) = self.lock().node_mut(node) {
            node.content_width = Some(width);
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.lock().viewport = viewport;
    }

    /// Detach a node (and its subtree) from the tree
    pub fn remove(&self, node: NodeId) {
        self.lock().detach(node);
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.lock().node(node).and_then(|n| n.parent)
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.lock().node(node).map(|n| n.tag.clone())
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.lock()
            .node(node)
            .map(|n| n.classes.to_vec())
            .unwrap_or_default()
    }

    /// Number of elements ever created, detached ones included
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Page for Document {
    fn body(&self) -> NodeId {
        Self::BODY
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let selectors = match SelectorList::parse(selector) {
            Ok(selectors) => selectors,
            Err(err) => {
                tracing::warn!(selector, %err, "invalid selector");
                return Vec::new();
            }
        };
        let state = self.lock();
        let mut found: Vec<NodeId> = Vec::new();
        if state.matches(Self::BODY, &selectors) {
            found.push(Self::BODY);
        }
        found.extend(
            state
                .descendants(Self::BODY)
                .into_iter()
                .filter(|&id| state.matches(id, &selectors)),
        );
        found
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let selectors = SelectorList::parse(selector).ok()?;
        let state = self.lock();
        state
            .descendants(root)
            .into_iter()
            .find(|&id| state.matches(id, &selectors))
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(node) = self.lock().node_mut(node) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(node) = self.lock().node_mut(node) {
            node.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.lock()
            .node(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn text(&self, node: NodeId) -> Option<String> {
        let state = self.lock();
        state.node(node)?;
        let mut text = String::new();
        state.collect_text(node, &mut text);
        Some(text)
    }

    fn own_text(&self, node: NodeId) -> Option<String> {
        self.lock().node(node).map(|n| n.text.clone())
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(node) = self.lock().node_mut(node) {
            node.text = text.to_string();
        }
    }

    fn create_element(&self, tag: &str, classes: &[&str]) -> NodeId {
        self.lock().push(Node {
            tag: tag.to_ascii_lowercase(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        })
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut state = self.lock();
        if parent == child || state.node(parent).is_none() || state.node(child).is_none() {
            return;
        }
        state.detach(child);
        if let Some(node) = state.node_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = state.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.lock()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn clear(&self, node: NodeId) {
        let mut state = self.lock();
        let children = match state.node_mut(node) {
            Some(n) => {
                n.text.clear();
                std::mem::take(&mut n.children)
            }
            None => return,
        };
        for child in children {
            if let Some(child) = state.node_mut(child) {
                child.parent = None;
            }
        }
    }
}

impl LayoutOracle for Document {
    fn content_width(&self, node: NodeId) -> Option<f32> {
        let state = self.lock();
        let node = state.node(node)?;
        Some(node.content_width.unwrap_or(node.bounds.width))
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.lock().node(node).map(|n| n.bounds)
    }

    fn viewport(&self) -> Viewport {
        self.lock().viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gallery_page() -> (Document, NodeId, NodeId) {
        let doc = Document::new(Viewport::new(1000.0, 800.0));
        let container = doc.spawn(Document::BODY, "section.gallery-container");
        let track = doc.spawn(container, ".gallery-track");
        for _ in 0..3 {
            let card = doc.spawn(track, ".card");
            doc.spawn(card, "img");
            doc.spawn(card, ".card-overlay");
        }
        (doc, container, track)
    }

    #[test]
    fn test_query_in_document_order() {
        let (doc, container, track) = gallery_page();

        assert_eq!(doc.query(".gallery-container"), Some(container));
        assert_eq!(doc.query("section"), Some(container));
        assert_eq!(doc.query(".gallery-track"), Some(track));
        assert_eq!(doc.query_all(".card").len(), 3);
        assert_eq!(doc.query_all("img, .card-overlay").len(), 6);
        assert_eq!(doc.query(".missing"), None);
        assert!(doc.query_all(".card >").is_empty());

        let first_card = doc.query(".card").unwrap();
        let img = doc.query_within(first_card, "img").unwrap();
        assert_eq!(doc.parent(img), Some(first_card));
    }

    #[test]
    fn test_classes_and_text() {
        let doc = Document::new(Viewport::default());
        let body = doc.body();
        doc.add_class(body, "visible");
        doc.add_class(body, "visible");
        assert_eq!(doc.classes(body), vec!["visible".to_string()]);
        assert!(doc.has_class(body, "visible"));
        doc.remove_class(body, "visible");
        assert!(!doc.has_class(body, "visible"));

        let link = doc.spawn_text(body, "a.menu-link", "Work");
        let wrapper = doc.create_element("div", &["link-wrapper"]);
        let span = doc.create_element("span", &["original-text"]);
        doc.set_text(span, "Work");
        doc.clear(link);
        doc.append_child(wrapper, span);
        doc.append_child(link, wrapper);

        assert_eq!(doc.text(link).as_deref(), Some("Work"));
        assert_eq!(doc.query(".original-text"), Some(span));
        assert_eq!(doc.text(NodeId(999)), None);
    }

    #[test]
    fn test_layout_measurement() {
        let (doc, _, track) = gallery_page();
        doc.set_bounds(track, Rect::new(0.0, 900.0, 1000.0, 600.0));
        assert_eq!(doc.content_width(track), Some(1000.0));

        doc.set_content_width(track, 3000.0);
        assert_eq!(doc.content_width(track), Some(3000.0));
        assert_eq!(doc.overflow_width(track), Some(2000.0));

        doc.set_viewport(Viewport::new(1920.0, 1080.0));
        assert_eq!(doc.overflow_width(track), Some(1080.0));

        doc.remove(track);
        assert_eq!(doc.query(".gallery-track"), None);
    }
}
