//! Loader and hero intro
//!
//! One timeline fades the loader text in and out, collapses the loader,
//! opens the hero image and drops the title characters into place. A scroll
//! trigger on the hero section snaps the characters back whenever the hero
//! scrolls into view again.

use crate::context::SiteContext;
use std::sync::Arc;
use vitrine_animation::{
    AnimationHandle, Easing, Position, Property, PropertyMap, Timeline, TweenVars,
};
use vitrine_core::{NodeId, Result};
use vitrine_scroll::{BindingId, BindingSpec, Extent};
use vitrine_text::Granularity;

/// Running hero intro
#[derive(Debug)]
pub struct HeroIntro {
    intro: Option<AnimationHandle>,
    chars: Vec<NodeId>,
    binding: Option<BindingId>,
}

impl HeroIntro {
    pub fn init(ctx: &SiteContext) -> Result<Self> {
        let selectors = &ctx.config.selectors;

        let chars = match ctx.find(&selectors.hero_title) {
            Some(title) => match ctx.segmenter.segment(title, Granularity::CHARS) {
                Ok(split) => split.chars,
                Err(err) => {
                    tracing::error!(%err, "hero title left unsplit");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let loader_text = ctx.page.query_all(&selectors.loader_text);
        let loader: Vec<NodeId> = ctx.find(&selectors.loader).into_iter().collect();
        let image_container = ctx.page.query_all(&selectors.hero_image_container);
        let image = ctx.page.query_all(&selectors.hero_image);

        ctx.tweens
            .set(&loader_text, &PropertyMap::of(Property::Opacity, 0.0));

        let timeline = Timeline::new()
            .to(
                &loader_text,
                PropertyMap::of(Property::Opacity, 1.0),
                TweenVars::new(1000, Easing::EaseOutQuad),
                Position::Sequence,
            )
            .to(
                &loader_text,
                PropertyMap::of(Property::Opacity, 0.0),
                TweenVars::new(500, Easing::EaseOutQuad).delay(200),
                Position::Sequence,
            )
            .to(
                &loader,
                PropertyMap::of(Property::Height, 0.0),
                TweenVars::new(1200, Easing::ExpoInOut),
                Position::Sequence,
            )
            .from(
                &image_container,
                PropertyMap::of(Property::ClipInset, 50.0),
                TweenVars::new(1500, Easing::ExpoInOut),
                Position::Offset(-1000),
            )
            .from(
                &image,
                PropertyMap::of(Property::Scale, 1.6),
                TweenVars::new(2000, Easing::EaseOutCubic),
                Position::Offset(-1500),
            )
            .from(
                &chars,
                PropertyMap::of(Property::YPercent, 120.0).with(Property::RotateX, -90.0),
                TweenVars::new(1200, Easing::EaseOutQuint).stagger(50),
                Position::Offset(-1200),
            );

        let intro = if timeline.is_empty() {
            None
        } else {
            Some(ctx.tweens.play(timeline)?)
        };

        let binding = match (ctx.find(&selectors.hero), chars.is_empty()) {
            (Some(hero), false) => {
                let replay = {
                    let tweens = Arc::clone(&ctx.tweens);
                    let chars = chars.clone();
                    move || {
                        let settled =
                            PropertyMap::of(Property::YPercent, 0.0).with(Property::RotateX, 0.0);
                        let vars = TweenVars::new(800, Easing::EaseOutQuint).stagger(20);
                        if let Err(err) = tweens.to(&chars, &settled, vars) {
                            tracing::debug!(%err, "hero replay skipped");
                        }
                    }
                };
                let spec = BindingSpec::new(hero)
                    .extent(Extent::TriggerHeight)
                    .on_enter(replay.clone())
                    .on_enter_back(replay);
                Some(ctx.triggers.bind(spec)?)
            }
            _ => None,
        };

        tracing::debug!(chars = chars.len(), "hero intro started");
        Ok(Self {
            intro,
            chars,
            binding,
        })
    }

    /// The intro timeline, while it is retained by the engine
    pub fn intro(&self) -> Option<AnimationHandle> {
        self.intro
    }

    /// Title characters, empty if the title could not be split
    pub fn chars(&self) -> &[NodeId] {
        &self.chars
    }

    pub fn binding(&self) -> Option<BindingId> {
        self.binding
    }
}
