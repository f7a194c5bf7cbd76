//! Overlay menu
//!
//! Every link is rebuilt as two stacked copies of its label; hovering rolls
//! both up by one line so the second copy replaces the first. The overlay
//! itself opens and closes through a two-state machine.

use crate::context::SiteContext;
use std::sync::{Arc, Mutex, MutexGuard};
use vitrine_animation::{Easing, Property, PropertyMap, TweenVars};
use vitrine_core::events::event_types;
use vitrine_core::fsm::{EventId, StateId, StateMachine};
use vitrine_core::{EventDispatcher, NodeId, Result};
use vitrine_text::Granularity;

const CLOSED: StateId = 0;
const OPEN: StateId = 1;

const OPEN_MENU: EventId = 0;
const CLOSE_MENU: EventId = 1;

/// One rebuilt menu link
#[derive(Clone, Debug, PartialEq)]
pub struct MenuLink {
    pub link: NodeId,
    pub original_chars: Vec<NodeId>,
    pub secondary_chars: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Menu {
    links: Vec<MenuLink>,
    machine: Arc<Mutex<StateMachine>>,
}

impl Menu {
    pub fn init(ctx: &SiteContext, dispatcher: &mut EventDispatcher) -> Result<Self> {
        let selectors = &ctx.config.selectors;
        let link_nodes = ctx.page.query_all(&selectors.menu_link);

        let mut links = Vec::with_capacity(link_nodes.len());
        for &link in &link_nodes {
            match rebuild_link(ctx, link) {
                Ok(rebuilt) => {
                    register_hover(ctx, dispatcher, &rebuilt);
                    links.push(rebuilt);
                }
                Err(err) => tracing::warn!(%err, ?link, "menu link split failed"),
            }
        }

        let overlay = ctx.find(&selectors.menu_overlay);
        let machine = {
            let page = ctx.page.clone();
            StateMachine::builder(CLOSED)
                .label(CLOSED, "closed")
                .label(OPEN, "open")
                .on(CLOSED, OPEN_MENU, OPEN)
                .on(OPEN, OPEN_MENU, OPEN)
                .on(OPEN, CLOSE_MENU, CLOSED)
                .on_enter(OPEN, {
                    let page = page.clone();
                    move || {
                        if let Some(overlay) = overlay {
                            page.add_class(overlay, "active");
                        }
                    }
                })
                .on_enter(CLOSED, move || {
                    if let Some(overlay) = overlay {
                        page.remove_class(overlay, "active");
                    }
                })
                .build()
        };
        let machine = Arc::new(Mutex::new(machine));

        if let Some(toggle) = ctx.find(&selectors.menu_toggle) {
            let ctx = ctx.clone();
            let machine = machine.clone();
            dispatcher.register(toggle, event_types::CLICK, move |_| {
                lock(&machine).send(OPEN_MENU);
                let from = PropertyMap::of(Property::Y, 50.0).with(Property::Opacity, 0.0);
                let to = PropertyMap::of(Property::Y, 0.0).with(Property::Opacity, 1.0);
                let vars = TweenVars::new(800, Easing::EaseOutQuart)
                    .stagger(100)
                    .delay(200);
                if !link_nodes.is_empty() {
                    if let Err(err) = ctx.tweens.animate(&link_nodes, Some(&from), &to, vars) {
                        tracing::debug!(%err, "menu link entrance skipped");
                    }
                }
            });
        }

        if let Some(close) = ctx.find(&selectors.menu_close) {
            let machine = machine.clone();
            dispatcher.register(close, event_types::CLICK, move |_| {
                lock(&machine).send(CLOSE_MENU);
            });
        }

        Ok(Self { links, machine })
    }

    pub fn links(&self) -> &[MenuLink] {
        &self.links
    }

    pub fn is_open(&self) -> bool {
        lock(&self.machine).is_in(OPEN)
    }
}

/// Replace the link's label with a wrapper holding two split copies
fn rebuild_link(ctx: &SiteContext, link: NodeId) -> Result<MenuLink> {
    let page = &ctx.page;
    let text = page.text(link).unwrap_or_default();
    page.clear(link);

    let wrapper = page.create_element("div", &["link-wrapper"]);
    let original = page.create_element("span", &["original-text"]);
    let secondary = page.create_element("span", &["secondary-text"]);
    page.set_text(original, &text);
    page.set_text(secondary, &text);
    page.append_child(wrapper, original);
    page.append_child(wrapper, secondary);
    page.append_child(link, wrapper);

    let original_chars = ctx.segmenter.segment(original, Granularity::CHARS)?.chars;
    let secondary_chars = ctx.segmenter.segment(secondary, Granularity::CHARS)?.chars;
    Ok(MenuLink {
        link,
        original_chars,
        secondary_chars,
    })
}

fn register_hover(ctx: &SiteContext, dispatcher: &mut EventDispatcher, link: &MenuLink) {
    let roll = |offset: f32| {
        let ctx = ctx.clone();
        let sets = [link.original_chars.clone(), link.secondary_chars.clone()];
        move |_: &vitrine_core::Event| {
            for chars in &sets {
                ctx.tween_to(
                    chars,
                    &PropertyMap::of(Property::YPercent, offset),
                    TweenVars::new(400, Easing::EaseOutCubic).stagger(20),
                );
            }
        }
    };
    dispatcher.register(link.link, event_types::POINTER_ENTER, roll(-100.0));
    dispatcher.register(link.link, event_types::POINTER_LEAVE, roll(0.0));
}

fn lock(machine: &Mutex<StateMachine>) -> MutexGuard<'_, StateMachine> {
    machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
