//! Quote reveal
//!
//! Each quote is split into lines, words and characters; the characters rise
//! into place when the quote scrolls into view and sink back when it leaves
//! past the top. Line breaks depend on layout, so every trigger refresh
//! finishes the old animation, restores the original text and splits again.

use crate::context::SiteContext;
use std::sync::{Arc, Mutex, MutexGuard};
use vitrine_animation::{AnimationHandle, Easing, Position, Property, PropertyMap, Timeline, TweenVars};
use vitrine_core::{NodeId, Result};
use vitrine_scroll::{BindingId, BindingSpec, ToggleAction, ToggleActions};
use vitrine_text::{Granularity, Segmentation};

const TOGGLE_ACTIONS: ToggleActions = ToggleActions {
    on_enter: ToggleAction::Play,
    on_leave: ToggleAction::None,
    on_enter_back: ToggleAction::None,
    on_leave_back: ToggleAction::Reverse,
};

#[derive(Debug)]
struct QuoteSlot {
    quote: NodeId,
    split: Option<Segmentation>,
    animation: Option<AnimationHandle>,
    binding: Option<BindingId>,
}

/// Scroll-triggered character reveal for every quote on the page
pub struct QuoteReveal {
    ctx: SiteContext,
    slots: Mutex<Vec<QuoteSlot>>,
    generation: Mutex<u64>,
}

impl QuoteReveal {
    /// Split and bind every quote, and re-split on each trigger refresh
    pub fn init(ctx: &SiteContext) -> Result<Arc<Self>> {
        let slots = ctx
            .page
            .query_all(&ctx.config.selectors.quote)
            .into_iter()
            .map(|quote| QuoteSlot {
                quote,
                split: None,
                animation: None,
                binding: None,
            })
            .collect();
        let reveal = Arc::new(Self {
            ctx: ctx.clone(),
            slots: Mutex::new(slots),
            generation: Mutex::new(0),
        });

        let weak = Arc::downgrade(&reveal);
        ctx.triggers.add_refresh_listener(Arc::new(move || {
            if let Some(reveal) = weak.upgrade() {
                reveal.setup_splits();
            }
        }));
        reveal.setup_splits();
        Ok(reveal)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QuoteSlot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Tear down the previous split of every quote and build a fresh one
    pub fn setup_splits(&self) {
        let ctx = &self.ctx;
        let mut slots = self.lock();
        for slot in slots.iter_mut() {
            if let Some(animation) = slot.animation.take() {
                ctx.tweens.complete_and_kill(animation);
            }
            if let Some(binding) = slot.binding.take() {
                ctx.triggers.destroy(binding);
            }
            if let Some(split) = slot.split.take() {
                ctx.segmenter.revert(&split);
            }

            match self.reveal(slot.quote) {
                Ok((split, animation, binding)) => {
                    slot.split = Some(split);
                    slot.animation = Some(animation);
                    slot.binding = Some(binding);
                }
                Err(err) => tracing::warn!(%err, quote = ?slot.quote, "quote left plain"),
            }
        }
        drop(slots);

        let mut generation = self
            .generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *generation += 1;
    }

    fn reveal(&self, quote: NodeId) -> Result<(Segmentation, AnimationHandle, BindingId)> {
        let ctx = &self.ctx;
        let split = ctx.segmenter.segment(quote, Granularity::ALL)?;
        let timeline = Timeline::new().from(
            &split.chars,
            PropertyMap::of(Property::Y, 80.0).with(Property::Opacity, 0.0),
            TweenVars::new(800, Easing::CircOut).stagger(20),
            Position::Sequence,
        );
        let animation = match ctx.tweens.scrub(timeline) {
            Ok(animation) => animation,
            Err(err) => {
                ctx.segmenter.revert(&split);
                return Err(err);
            }
        };
        let spec = BindingSpec::new(quote)
            .start_at(ctx.config.quote_start)
            .animation(animation)
            .toggle_actions(TOGGLE_ACTIONS);
        match ctx.triggers.bind(spec) {
            Ok(binding) => Ok((split, animation, binding)),
            Err(err) => {
                ctx.tweens.kill(animation);
                ctx.segmenter.revert(&split);
                Err(err)
            }
        }
    }

    /// Number of quotes on the page
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Character nodes of the current split of quote `index`
    pub fn chars(&self, index: usize) -> Option<Vec<NodeId>> {
        self.lock()
            .get(index)
            .and_then(|slot| slot.split.as_ref())
            .map(|split| split.chars.clone())
    }

    pub fn animation(&self, index: usize) -> Option<AnimationHandle> {
        self.lock().get(index).and_then(|slot| slot.animation)
    }

    pub fn binding(&self, index: usize) -> Option<BindingId> {
        self.lock().get(index).and_then(|slot| slot.binding)
    }

    /// How many times the quotes have been split
    pub fn generation(&self) -> u64 {
        *self
            .generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for QuoteReveal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteReveal")
            .field("quotes", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_actions_match_keyword_form() {
        let parsed: ToggleActions = "play none none reverse".parse().unwrap();
        assert_eq!(parsed, TOGGLE_ACTIONS);
    }
}
