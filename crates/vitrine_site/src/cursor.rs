//! Custom cursor
//!
//! A follower element eases toward the pointer every frame and morphs into
//! a square while hovering interactive elements. Desktop only.

use crate::context::SiteContext;
use std::sync::{Arc, Mutex, MutexGuard};
use vitrine_animation::{Easing, FrameInfo, Property, PropertyMap, TweenEngine, TweenVars};
use vitrine_core::events::event_types;
use vitrine_core::{EventDispatcher, NodeId, Result};

/// Fraction of the remaining distance covered in a frame lasting
/// `delta_ratio` nominal frames, for a per-frame `smoothing` factor
pub fn follow_factor(smoothing: f32, delta_ratio: f64) -> f32 {
    (1.0 - (1.0 - smoothing as f64).powf(delta_ratio)) as f32
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Follow {
    pointer: (f32, f32),
    position: (f32, f32),
}

/// Pointer follower state, advanced by the ticker
pub struct CursorFollower {
    cursor: Option<NodeId>,
    smoothing: f32,
    tweens: Arc<dyn TweenEngine>,
    follow: Mutex<Follow>,
}

impl CursorFollower {
    /// Attach the follower. `Ok(None)` on narrow viewports.
    pub fn init(ctx: &SiteContext, dispatcher: &mut EventDispatcher) -> Result<Option<Arc<Self>>> {
        if ctx.is_mobile() {
            return Ok(None);
        }
        let selectors = &ctx.config.selectors;
        let cursor = ctx.find(&selectors.cursor);
        let follower = Arc::new(Self {
            cursor,
            smoothing: ctx.config.cursor_smoothing,
            tweens: ctx.tweens.clone(),
            follow: Mutex::new(Follow::default()),
        });

        dispatcher.register_window(event_types::POINTER_MOVE, {
            let follower = follower.clone();
            move |event| {
                if let Some(point) = event.pointer() {
                    follower.lock().pointer = point;
                }
            }
        });

        if let Some(cursor) = cursor {
            let targets = ctx.page.query_all(&selectors.cursor_targets);
            for &target in &targets {
                let morph = |to: PropertyMap| {
                    let ctx = ctx.clone();
                    move |_: &vitrine_core::Event| {
                        ctx.tween_to(&[cursor], &to, TweenVars::new(300, Easing::EaseOutCubic));
                    }
                };
                dispatcher.register(
                    target,
                    event_types::POINTER_ENTER,
                    morph(
                        PropertyMap::of(Property::BorderRadius, 0.0)
                            .with(Property::Scale, 2.5)
                            .with(Property::Opacity, 0.8),
                    ),
                );
                dispatcher.register(
                    target,
                    event_types::POINTER_LEAVE,
                    morph(
                        PropertyMap::of(Property::BorderRadius, 50.0)
                            .with(Property::Scale, 1.0)
                            .with(Property::Opacity, 1.0),
                    ),
                );
            }
            tracing::debug!(targets = targets.len(), "cursor follower attached");
        }

        Ok(Some(follower))
    }

    fn lock(&self) -> MutexGuard<'_, Follow> {
        self.follow.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ease toward the pointer for one frame
    pub fn on_frame(&self, frame: &FrameInfo) {
        let factor = follow_factor(self.smoothing, frame.delta_ratio);
        let position = {
            let mut follow = self.lock();
            let (px, py) = follow.pointer;
            let (cx, cy) = follow.position;
            follow.position = (cx + (px - cx) * factor, cy + (py - cy) * factor);
            follow.position
        };
        if let Some(cursor) = self.cursor {
            self.tweens.set(
                &[cursor],
                &PropertyMap::of(Property::X, position.0).with(Property::Y, position.1),
            );
        }
    }

    /// Current follower position
    pub fn position(&self) -> (f32, f32) {
        self.lock().position
    }

    /// Last pointer position seen
    pub fn pointer(&self) -> (f32, f32) {
        self.lock().pointer
    }
}

impl std::fmt::Debug for CursorFollower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorFollower")
            .field("cursor", &self.cursor)
            .field("smoothing", &self.smoothing)
            .field("follow", &*self.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_factor() {
        assert!((follow_factor(0.15, 1.0) - 0.15).abs() < 1e-6);
        assert!((follow_factor(0.15, 2.0) - (1.0 - 0.85 * 0.85)).abs() < 1e-6);
        assert_eq!(follow_factor(0.15, 0.0), 0.0);
        assert_eq!(follow_factor(1.0, 0.5), 1.0);
    }
}
