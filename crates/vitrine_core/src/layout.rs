//! Node identity and layout measurement
//!
//! Features never walk a real render tree. They hold [`NodeId`]s resolved once
//! at initialization and ask a [`LayoutOracle`] for measurements when needed.

/// Stable identifier for an element on the page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Axis-aligned rectangle in page coordinates (pixels)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.left() && px <= self.right() && py >= self.top() && py <= self.bottom()
    }

    /// Position of a point relative to this rect, normalized to 0..1 on each axis.
    ///
    /// Returns `None` for degenerate rects.
    pub fn normalized(&self, px: f32, py: f32) -> Option<(f32, f32)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(((px - self.x) / self.width, (py - self.y) / self.height))
    }
}

/// Size of the visible window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Narrow layouts skip pointer-driven effects
    pub fn is_narrow(&self, breakpoint: f32) -> bool {
        self.width < breakpoint
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Read-only access to measured layout.
///
/// Implementations answer from whatever layout source the host has (a real
/// render tree, or the in-memory document used headless). All queries are
/// side-effect free.
pub trait LayoutOracle: Send + Sync {
    /// Full scrollable width of a node's content, `None` if the node is unknown
    fn content_width(&self, node: NodeId) -> Option<f32>;

    /// Bounds of a node in page coordinates, `None` if the node is unknown
    fn bounds(&self, node: NodeId) -> Option<Rect>;

    /// Current window size
    fn viewport(&self) -> Viewport;

    /// Horizontal overflow of a node relative to the viewport, clamped at zero
    fn overflow_width(&self, node: NodeId) -> Option<f32> {
        let content = self.content_width(node)?;
        Some((content - self.viewport().width).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLayout {
        content: Option<f32>,
        viewport: Viewport,
    }

    impl LayoutOracle for FixedLayout {
        fn content_width(&self, _node: NodeId) -> Option<f32> {
            self.content
        }

        fn bounds(&self, _node: NodeId) -> Option<Rect> {
            None
        }

        fn viewport(&self) -> Viewport {
            self.viewport
        }
    }

    #[test]
    fn test_overflow_width_clamps_at_zero() {
        let wide = FixedLayout {
            content: Some(3000.0),
            viewport: Viewport::new(1000.0, 800.0),
        };
        assert_eq!(wide.overflow_width(NodeId(1)), Some(2000.0));

        let narrow = FixedLayout {
            content: Some(800.0),
            viewport: Viewport::new(1000.0, 800.0),
        };
        assert_eq!(narrow.overflow_width(NodeId(1)), Some(0.0));

        let missing = FixedLayout {
            content: None,
            viewport: Viewport::default(),
        };
        assert_eq!(missing.overflow_width(NodeId(1)), None);
    }

    #[test]
    fn test_rect_normalized() {
        let rect = Rect::new(100.0, 50.0, 200.0, 100.0);
        assert_eq!(rect.normalized(200.0, 100.0), Some((0.5, 0.5)));
        assert_eq!(rect.normalized(100.0, 150.0), Some((0.0, 1.0)));
        assert!(rect.contains(150.0, 60.0));
        assert!(!rect.contains(99.0, 60.0));
        assert_eq!(Rect::new(0.0, 0.0, 0.0, 10.0).normalized(1.0, 1.0), None);
    }
}
