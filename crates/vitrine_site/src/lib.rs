//! Vitrine Site
//!
//! The portfolio page's presentation layer: the gallery scroll-sync
//! controller plus the loader, navbar, cards, menu, cursor, smooth scrolling
//! and quote reveal features, all bootstrapped by [`Site`].
//!
//! # Example
//!
//! ```ignore
//! use vitrine_site::prelude::*;
//!
//! let document = Arc::new(Document::new(Viewport::new(1280.0, 800.0)));
//! let mut site = Site::new(document.clone(), document, SiteConfig::default(), 0.0)?;
//!
//! site.dispatch(Event::load(0.0));
//! site.tick(16.0);
//! site.dispatch(Event::wheel(120.0, 20.0));
//! ```

pub mod cards;
pub mod config;
pub mod context;
pub mod cursor;
pub mod debounce;
pub mod failsafe;
pub mod gallery;
pub mod hero;
pub mod menu;
pub mod navbar;
pub mod quotes;
pub mod site;
pub mod smooth_scroll;
pub mod telemetry;

pub use config::{Selectors, SiteConfig, SmoothScrollConfig};
pub use context::SiteContext;
pub use debounce::{Debouncer, TaskId};
pub use gallery::{GalleryRefs, GalleryState, GallerySyncController, RebuildOutcome, SharedGallery};
pub use navbar::{Clock, LocalClock};
pub use site::Site;

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::config::SiteConfig;
    pub use crate::gallery::{GalleryState, RebuildOutcome, SharedGallery};
    pub use crate::site::Site;

    pub use std::sync::Arc;
    pub use vitrine_core::{Event, NodeId, Rect, Viewport};
    pub use vitrine_layout::{Document, Page};
}
