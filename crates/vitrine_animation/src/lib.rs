//! Vitrine Animation System
//!
//! Tweens, timelines and the per-frame driver.
//!
//! # Features
//!
//! - **Easing**: the named curves the site uses (`power2.out`, `expo.inOut`, ...)
//! - **Timelines**: sequence tweens with position parameters (`<`, `-=1`)
//! - **Tween engine**: the [`TweenEngine`] capability and the in-process
//!   [`TweenRuntime`] implementing it, time-driven or scroll-scrubbed
//! - **Ticker**: frame callbacks with delta ratio and lag smoothing

pub mod easing;
pub mod runtime;
pub mod ticker;
pub mod timeline;
pub mod tween;

pub use easing::{Easing, EasingParseError};
pub use runtime::TweenRuntime;
pub use ticker::{FrameInfo, Ticker, TickerCallbackId};
pub use timeline::{Position, Timeline};
pub use tween::{AnimationHandle, Property, PropertyMap, TweenEngine, TweenVars};
