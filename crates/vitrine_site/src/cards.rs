//! Card hover: image zoom, overlay slide and a perspective tilt that follows
//! the pointer. Narrow viewports only get the overlay shown.

use crate::context::SiteContext;
use std::sync::{Arc, Mutex};
use vitrine_animation::{Easing, Property, PropertyMap, TweenVars};
use vitrine_core::events::event_types;
use vitrine_core::{EventDispatcher, NodeId, Rect, Result};

/// Maximum tilt in degrees at the card edges
const TILT_DEGREES: f32 = 10.0;
const PERSPECTIVE: f32 = 1000.0;

/// Tilt for a pointer at normalized card position (`x_pos`, `y_pos`),
/// as `(rotate_x, rotate_y)` degrees
pub fn tilt(x_pos: f32, y_pos: f32) -> (f32, f32) {
    ((y_pos - 0.5) * TILT_DEGREES, (x_pos - 0.5) * -TILT_DEGREES)
}

#[derive(Clone, Copy, Debug)]
struct CardParts {
    card: NodeId,
    image: Option<NodeId>,
    overlay: Option<NodeId>,
}

#[derive(Debug)]
pub struct CardHover {
    cards: Vec<NodeId>,
    interactive: bool,
}

impl CardHover {
    pub fn init(ctx: &SiteContext, dispatcher: &mut EventDispatcher) -> Result<Self> {
        let selectors = &ctx.config.selectors;
        let parts: Vec<CardParts> = ctx
            .page
            .query_all(&selectors.card)
            .into_iter()
            .map(|card| CardParts {
                card,
                image: ctx.page.query_within(card, &selectors.card_image),
                overlay: ctx.page.query_within(card, &selectors.card_overlay),
            })
            .collect();
        let cards = parts.iter().map(|p| p.card).collect();

        if ctx.is_mobile() {
            let overlays: Vec<NodeId> = parts.iter().filter_map(|p| p.overlay).collect();
            ctx.tweens.set(&overlays, &PropertyMap::of(Property::Y, 0.0));
            return Ok(Self {
                cards,
                interactive: false,
            });
        }

        let cursor = ctx.find(&selectors.cursor);
        for part in parts {
            // bounds captured on enter; moves before the first enter are ignored
            let bounds: Arc<Mutex<Option<Rect>>> = Arc::new(Mutex::new(None));

            dispatcher.register(part.card, event_types::POINTER_ENTER, {
                let ctx = ctx.clone();
                let bounds = bounds.clone();
                move |_| {
                    *lock(&bounds) = ctx.layout.bounds(part.card);
                    ctx.tween_to(
                        part.image.as_slice(),
                        &PropertyMap::of(Property::Scale, 1.15).with(Property::Brightness, 1.1),
                        TweenVars::new(800, Easing::EaseOutQuart),
                    );
                    ctx.tween_to(
                        part.overlay.as_slice(),
                        &PropertyMap::of(Property::Y, 0.0),
                        TweenVars::new(600, Easing::EaseOutQuart),
                    );
                    ctx.tween_to(
                        cursor.as_slice(),
                        &PropertyMap::of(Property::Scale, 3.5),
                        TweenVars::new(300, Easing::EaseOutQuad),
                    );
                }
            });

            dispatcher.register(part.card, event_types::POINTER_LEAVE, {
                let ctx = ctx.clone();
                move |_| {
                    ctx.tween_to(
                        part.image.as_slice(),
                        &PropertyMap::of(Property::Scale, 1.0).with(Property::Brightness, 1.0),
                        TweenVars::new(800, Easing::EaseOutQuart),
                    );
                    ctx.tween_to(
                        part.overlay.as_slice(),
                        &PropertyMap::of(Property::YPercent, 100.0),
                        TweenVars::new(600, Easing::EaseOutQuart),
                    );
                    ctx.tween_to(
                        cursor.as_slice(),
                        &PropertyMap::of(Property::Scale, 1.0),
                        TweenVars::new(300, Easing::EaseOutQuad),
                    );
                    ctx.tween_to(
                        &[part.card],
                        &PropertyMap::of(Property::RotateX, 0.0).with(Property::RotateY, 0.0),
                        TweenVars::new(500, Easing::EaseOutCubic),
                    );
                }
            });

            dispatcher.register(part.card, event_types::POINTER_MOVE, {
                let ctx = ctx.clone();
                move |event| {
                    let Some(rect) = *lock(&bounds) else {
                        return;
                    };
                    let Some((x_pos, y_pos)) =
                        event.pointer().and_then(|(x, y)| rect.normalized(x, y))
                    else {
                        return;
                    };
                    let (rotate_x, rotate_y) = tilt(x_pos, y_pos);
                    ctx.tween_to(
                        &[part.card],
                        &PropertyMap::of(Property::RotateX, rotate_x)
                            .with(Property::RotateY, rotate_y)
                            .with(Property::Perspective, PERSPECTIVE),
                        TweenVars::new(500, Easing::EaseOutCubic),
                    );
                }
            });
        }

        Ok(Self {
            cards,
            interactive: true,
        })
    }

    pub fn cards(&self) -> &[NodeId] {
        &self.cards
    }

    /// False on narrow viewports, where no hover handlers are attached
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilt_math() {
        assert_eq!(tilt(0.5, 0.5), (0.0, 0.0));
        assert_eq!(tilt(1.0, 1.0), (5.0, -5.0));
        assert_eq!(tilt(0.0, 0.0), (-5.0, 5.0));
        let (rotate_x, rotate_y) = tilt(0.75, 0.25);
        assert_eq!(rotate_x, -2.5);
        assert_eq!(rotate_y, -2.5);
    }
}
