//! Vitrine Scroll System
//!
//! - **Triggers**: bind animations and callbacks to a region's passage through
//!   the viewport, with pinning, scrubbing and toggle actions
//! - **Inertial scrolling**: eased scroll position decoupled from raw wheel input

pub mod inertial;
pub mod registry;
pub mod trigger;

pub use inertial::{
    InertialScroller, Orientation, ScrollListener, ScrollState, SmoothScroll, SmoothScrollOptions,
};
pub use registry::TriggerRegistry;
pub use trigger::{
    BindingId, BindingInfo, BindingSpec, Extent, RefreshListener, ScrollTrigger, Scrub,
    ToggleAction, ToggleActions, ToggleActionsParseError, TriggerCallback,
};
