//! Inertial scrolling wired into the trigger engine and the frame ticker

use crate::context::SiteContext;
use crate::navbar::Navbar;
use std::sync::{Arc, Weak};
use vitrine_animation::Ticker;
use vitrine_core::{LayoutOracle, Result};
use vitrine_layout::Page;
use vitrine_scroll::{InertialScroller, ScrollState, ScrollTrigger, SmoothScroll};

/// Owns the page's [`SmoothScroll`] once it is hooked up
#[derive(Debug)]
pub struct ScrollDriver {
    ctx: SiteContext,
    scroller: Arc<SmoothScroll>,
}

impl ScrollDriver {
    /// Hook `scroller` up: its notifications drive scroll triggers and the
    /// navbar, and the ticker advances it every frame with lag smoothing off.
    /// The scroll limit follows every trigger refresh.
    pub fn init(
        ctx: &SiteContext,
        scroller: Arc<SmoothScroll>,
        navbar: Option<Arc<Navbar>>,
        ticker: &mut Ticker,
    ) -> Result<Self> {
        scroller.on_scroll(Arc::new({
            let triggers = ctx.triggers.clone();
            move |state: &ScrollState| {
                triggers.update(state.scroll);
                if let Some(navbar) = &navbar {
                    navbar.on_scroll(state.scroll);
                }
            }
        }));

        ticker.add({
            let scroller = scroller.clone();
            move |frame| scroller.raf(frame.time_ms)
        });
        ticker.set_lag_smoothing(0.0, 0.0);

        // both weak: the scroller's listener already owns the triggers
        let triggers: Weak<dyn ScrollTrigger> = Arc::downgrade(&ctx.triggers);
        let weak_scroller = Arc::downgrade(&scroller);
        ctx.triggers.add_refresh_listener(Arc::new({
            let page = ctx.page.clone();
            let layout = ctx.layout.clone();
            move || {
                if let (Some(triggers), Some(scroller)) = (triggers.upgrade(), weak_scroller.upgrade())
                {
                    let limit = scroll_limit(page.as_ref(), layout.as_ref(), triggers.as_ref());
                    scroller.set_limit(limit);
                }
            }
        }));

        let driver = Self {
            ctx: ctx.clone(),
            scroller,
        };
        driver.update_limit();
        tracing::debug!(options = ?driver.scroller.options(), "smooth scroll started");
        Ok(driver)
    }

    /// Recompute the scroll limit from the body height plus the scroll
    /// length pinned sections add
    pub fn update_limit(&self) {
        let ctx = &self.ctx;
        self.scroller.set_limit(scroll_limit(
            ctx.page.as_ref(),
            ctx.layout.as_ref(),
            ctx.triggers.as_ref(),
        ));
    }

    pub fn scroller(&self) -> &Arc<SmoothScroll> {
        &self.scroller
    }
}

/// Furthest scroll offset. An unmeasured body leaves scrolling unbounded.
fn scroll_limit(page: &dyn Page, layout: &dyn LayoutOracle, triggers: &dyn ScrollTrigger) -> f32 {
    let Some(body) = layout.bounds(page.body()) else {
        return f32::INFINITY;
    };
    (body.height + triggers.pin_spacing() - layout.viewport().height).max(0.0)
}
