//! Vitrine Text Segmentation
//!
//! Splits an element's text into line, word and character child elements so
//! each piece can be animated on its own, and puts the original content back
//! on revert.

pub mod segment;

pub use segment::{BreakSegmenter, Granularity, Segmentation, TextSegmenter};
