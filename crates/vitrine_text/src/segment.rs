//! Line, word and character segmentation

use std::sync::Arc;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;
use vitrine_core::{LayoutOracle, NodeId, Result, VitrineError};
use vitrine_layout::Page;

/// Which levels to materialize as elements
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Granularity {
    pub lines: bool,
    pub words: bool,
    pub chars: bool,
}

impl Granularity {
    pub const CHARS: Granularity = Granularity {
        lines: false,
        words: false,
        chars: true,
    };

    pub const ALL: Granularity = Granularity {
        lines: true,
        words: true,
        chars: true,
    };
}

/// Result of splitting one element
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    pub element: NodeId,
    pub lines: Vec<NodeId>,
    pub words: Vec<NodeId>,
    pub chars: Vec<NodeId>,
    original_text: String,
    original_children: Vec<NodeId>,
}

/// Capability interface of the text splitter
pub trait TextSegmenter: Send + Sync {
    /// Replace an element's content with line/word/char elements
    fn segment(&self, element: NodeId, granularity: Granularity) -> Result<Segmentation>;

    /// Put the element's original content back
    fn revert(&self, segmentation: &Segmentation);
}

/// Average glyph advance as a fraction of the font size
const GLYPH_ADVANCE: f32 = 0.55;

/// Segmenter that wraps lines at UAX #14 break opportunities.
///
/// Lines are filled greedily up to a character budget; mandatory breaks
/// always end a line. With a layout attached the budget is estimated from
/// the element's measured width, otherwise it is `max_line_chars`.
/// Characters are grapheme clusters, so combining marks and emoji
/// sequences stay whole.
pub struct BreakSegmenter {
    page: Arc<dyn Page>,
    measure: Option<(Arc<dyn LayoutOracle>, f32)>,
    max_line_chars: usize,
    line_class: String,
}

impl BreakSegmenter {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            page,
            measure: None,
            max_line_chars: 40,
            line_class: "split-line".to_string(),
        }
    }

    /// Size lines to the element's width as laid out by `layout`, for text
    /// set at `font_size` px
    pub fn with_layout(mut self, layout: Arc<dyn LayoutOracle>, font_size: f32) -> Self {
        self.measure = Some((layout, font_size.max(1.0) * GLYPH_ADVANCE));
        self
    }

    pub fn with_max_line_chars(mut self, max: usize) -> Self {
        self.max_line_chars = max.max(1);
        self
    }

    pub fn with_line_class(mut self, class: impl Into<String>) -> Self {
        self.line_class = class.into();
        self
    }

    /// Characters that fit on one line of `element`
    pub fn line_capacity(&self, element: NodeId) -> usize {
        let measured = self.measure.as_ref().and_then(|(layout, advance)| {
            let width = layout.bounds(element)?.width;
            (width > 0.0).then(|| ((width / advance).floor() as usize).max(1))
        });
        measured.unwrap_or(self.max_line_chars)
    }

    /// Wrap `text` into lines of at most `max_line_chars`
    pub fn wrap(&self, text: &str) -> Vec<String> {
        wrap_text(text, self.max_line_chars)
    }

    fn spacer(&self, parent: NodeId) {
        let space = self.page.create_element("span", &[]);
        self.page.set_text(space, " ");
        self.page.append_child(parent, space);
    }
}

fn wrap_text(text: &str, capacity: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut start = 0;

    for (end, opportunity) in linebreaks(text) {
        let piece = &text[start..end];
        start = end;

        let candidate = format!("{line}{piece}");
        let fits = candidate.trim_end().graphemes(true).count() <= capacity;
        if !fits && !line.trim().is_empty() {
            lines.push(line.trim().to_string());
            line.clear();
        }
        line.push_str(piece);

        if opportunity == BreakOpportunity::Mandatory {
            let finished = line.trim();
            if !finished.is_empty() {
                lines.push(finished.to_string());
            }
            line.clear();
        }
    }

    if !line.trim().is_empty() {
        lines.push(line.trim().to_string());
    }
    lines
}

impl TextSegmenter for BreakSegmenter {
    fn segment(&self, element: NodeId, granularity: Granularity) -> Result<Segmentation> {
        let failure = |reason: &str| VitrineError::Segmentation {
            target: format!("{element:?}"),
            reason: reason.to_string(),
        };

        let text = self
            .page
            .text(element)
            .ok_or_else(|| failure("element not found"))?;
        if text.trim().is_empty() {
            return Err(failure("element has no text"));
        }
        let original_text = self.page.own_text(element).unwrap_or_default();
        let original_children = self.page.children(element);

        let mut segmentation = Segmentation {
            element,
            lines: Vec::new(),
            words: Vec::new(),
            chars: Vec::new(),
            original_text,
            original_children,
        };

        self.page.clear(element);
        let lines = wrap_text(&text, self.line_capacity(element));

        for (line_index, line) in lines.iter().enumerate() {
            if line_index > 0 {
                self.spacer(element);
            }
            let line_parent = if granularity.lines {
                let node = self.page.create_element("div", &[self.line_class.as_str()]);
                self.page.append_child(element, node);
                segmentation.lines.push(node);
                node
            } else {
                element
            };

            for (word_index, word) in line.split_whitespace().enumerate() {
                if word_index > 0 {
                    self.spacer(line_parent);
                }
                let word_parent = if granularity.words {
                    let node = self.page.create_element("div", &["split-word"]);
                    self.page.append_child(line_parent, node);
                    segmentation.words.push(node);
                    Some(node)
                } else {
                    None
                };

                if granularity.chars {
                    let parent = word_parent.unwrap_or(line_parent);
                    for grapheme in word.graphemes(true) {
                        let node = self.page.create_element("div", &["split-char"]);
                        self.page.set_text(node, grapheme);
                        self.page.append_child(parent, node);
                        segmentation.chars.push(node);
                    }
                } else if let Some(node) = word_parent {
                    self.page.set_text(node, word);
                } else {
                    let node = self.page.create_element("span", &[]);
                    self.page.set_text(node, word);
                    self.page.append_child(line_parent, node);
                }
            }
        }

        tracing::debug!(
            ?element,
            lines = segmentation.lines.len(),
            words = segmentation.words.len(),
            chars = segmentation.chars.len(),
            "text segmented"
        );
        Ok(segmentation)
    }

    fn revert(&self, segmentation: &Segmentation) {
        let element = segmentation.element;
        self.page.clear(element);
        self.page.set_text(element, &segmentation.original_text);
        for &child in &segmentation.original_children {
            self.page.append_child(element, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::{Rect, Viewport};
    use vitrine_layout::Document;

    fn page_with(text: &str) -> (Arc<Document>, NodeId) {
        let doc = Arc::new(Document::new(Viewport::default()));
        let quote = doc.spawn_text(Document::BODY, "p.quote", text);
        (doc, quote)
    }

    #[test]
    fn test_chars_only() {
        let (doc, title) = page_with("Studio");
        let segmenter = BreakSegmenter::new(doc.clone());

        let split = segmenter.segment(title, Granularity::CHARS).unwrap();
        assert_eq!(split.chars.len(), 6);
        assert!(split.words.is_empty());
        assert!(split.lines.is_empty());
        assert_eq!(doc.text(split.chars[0]).as_deref(), Some("S"));
        assert_eq!(doc.text(title).as_deref(), Some("Studio"));
    }

    #[test]
    fn test_chars_keep_grapheme_clusters_whole() {
        let (doc, title) = page_with("Cafe\u{301} \u{1F469}\u{200D}\u{1F4BB}");
        let segmenter = BreakSegmenter::new(doc.clone());

        let split = segmenter.segment(title, Granularity::CHARS).unwrap();
        assert_eq!(split.chars.len(), 5);
        assert_eq!(doc.text(split.chars[3]).as_deref(), Some("e\u{301}"));
        assert_eq!(
            doc.text(split.chars[4]).as_deref(),
            Some("\u{1F469}\u{200D}\u{1F4BB}")
        );
    }

    #[test]
    fn test_line_length_follows_measured_width() {
        let (doc, quote) = page_with("Design is how it works");
        // 11 px per character at 20 px
        let segmenter = BreakSegmenter::new(doc.clone()).with_layout(doc.clone(), 20.0);
        assert_eq!(segmenter.line_capacity(quote), 40);

        doc.set_bounds(quote, Rect::new(0.0, 0.0, 115.0, 60.0));
        assert_eq!(segmenter.line_capacity(quote), 10);
        let narrow = segmenter.segment(quote, Granularity::ALL).unwrap();
        assert_eq!(narrow.lines.len(), 3);
        segmenter.revert(&narrow);

        doc.set_bounds(quote, Rect::new(0.0, 0.0, 1000.0, 60.0));
        let wide = segmenter.segment(quote, Granularity::ALL).unwrap();
        assert_eq!(wide.lines.len(), 1);
        assert_eq!(wide.chars.len(), 18);
    }

    #[test]
    fn test_lines_words_chars() {
        let (doc, quote) = page_with("Design is how it works");
        let segmenter = BreakSegmenter::new(doc.clone()).with_max_line_chars(10);

        let split = segmenter.segment(quote, Granularity::ALL).unwrap();
        assert_eq!(split.words.len(), 5);
        assert_eq!(split.chars.len(), 18);
        assert_eq!(split.lines.len(), 3);
        assert!(doc.has_class(split.lines[0], "split-line"));
        assert_eq!(doc.text(quote).as_deref(), Some("Design is how it works"));
    }

    #[test]
    fn test_wrap_respects_mandatory_breaks() {
        let (doc, _) = page_with("x");
        let segmenter = BreakSegmenter::new(doc).with_max_line_chars(80);
        assert_eq!(
            segmenter.wrap("first line\nsecond line"),
            vec!["first line".to_string(), "second line".to_string()]
        );
        let narrow = segmenter.with_max_line_chars(6);
        assert_eq!(
            narrow.wrap("one two three"),
            vec!["one".to_string(), "two".to_string(), "three".to_string()]
        );
    }

    #[test]
    fn test_revert_restores_content() {
        let (doc, quote) = page_with("Less but better");
        let segmenter = BreakSegmenter::new(doc.clone());

        let split = segmenter.segment(quote, Granularity::ALL).unwrap();
        assert!(!doc.children(quote).is_empty());

        segmenter.revert(&split);
        assert!(doc.children(quote).is_empty());
        assert_eq!(doc.own_text(quote).as_deref(), Some("Less but better"));
    }

    #[test]
    fn test_failures() {
        let (doc, _) = page_with("x");
        let empty = doc.spawn(Document::BODY, "h1.hero-title");
        let segmenter = BreakSegmenter::new(doc);

        assert!(matches!(
            segmenter.segment(empty, Granularity::CHARS),
            Err(VitrineError::Segmentation { .. })
        ));
        assert!(segmenter.segment(NodeId(404), Granularity::CHARS).is_err());
    }
}
