//! Page bootstrap
//!
//! [`Site`] owns the collaborators, initializes every feature once and is
//! then driven by the host: [`Site::tick`] once per frame and
//! [`Site::dispatch`] for every page event. A feature that fails to
//! initialize is logged and left out; the rest of the page still runs.

use crate::cards::CardHover;
use crate::config::SiteConfig;
use crate::context::SiteContext;
use crate::cursor::CursorFollower;
use crate::failsafe::Failsafe;
use crate::gallery::{GalleryRefs, GallerySyncController, SharedGallery};
use crate::hero::HeroIntro;
use crate::menu::Menu;
use crate::navbar::{Clock, LocalClock, Navbar};
use crate::quotes::QuoteReveal;
use crate::smooth_scroll::ScrollDriver;
use std::sync::Arc;
use vitrine_animation::{Ticker, TweenEngine, TweenRuntime};
use vitrine_core::events::event_types;
use vitrine_core::{Event, EventData, EventDispatcher, LayoutOracle, Result};
use vitrine_layout::Page;
use vitrine_scroll::{InertialScroller, ScrollTrigger, Scrub, SmoothScroll, TriggerRegistry};
use vitrine_text::{BreakSegmenter, TextSegmenter};

/// Body class marking a page whose animations are already set up
pub const INITIALIZED_CLASS: &str = "animations-initialized";
/// Body class that reveals the page
pub const VISIBLE_CLASS: &str = "visible";

#[derive(Debug, Default)]
struct Features {
    navbar: Option<Arc<Navbar>>,
    hero: Option<HeroIntro>,
    gallery: Option<SharedGallery>,
    cards: Option<CardHover>,
    menu: Option<Menu>,
    cursor: Option<Arc<CursorFollower>>,
    scroll: Option<ScrollDriver>,
    quotes: Option<Arc<QuoteReveal>>,
}

/// A running page
pub struct Site {
    ctx: SiteContext,
    runtime: Arc<TweenRuntime>,
    registry: Arc<TriggerRegistry>,
    scroller: Arc<SmoothScroll>,
    clock: Arc<dyn Clock>,
    ticker: Ticker,
    dispatcher: EventDispatcher,
    failsafe: Failsafe,
    features: Features,
}

impl Site {
    /// Build the collaborators for `page` and arm the visibility failsafe
    /// at `now_ms`
    pub fn new(
        page: Arc<dyn Page>,
        layout: Arc<dyn LayoutOracle>,
        config: SiteConfig,
        now_ms: f64,
    ) -> Result<Self> {
        config.validate()?;
        let scroller = Arc::new(SmoothScroll::new(config.smooth_scroll.options()?));

        let runtime = Arc::new(TweenRuntime::new());
        let tweens: Arc<dyn TweenEngine> = runtime.clone();
        let registry = Arc::new(TriggerRegistry::new(layout.clone(), tweens.clone()));
        let segmenter = Arc::new(
            BreakSegmenter::new(page.clone())
                .with_layout(layout.clone(), config.quote_font_size)
                .with_max_line_chars(config.quote_line_chars),
        );

        let failsafe = Failsafe::new(now_ms, config.failsafe_ms as f64);
        let ctx = SiteContext {
            config: Arc::new(config),
            page,
            layout,
            tweens,
            triggers: registry.clone(),
            segmenter,
        };

        Ok(Self {
            ctx,
            runtime,
            registry,
            scroller,
            clock: Arc::new(LocalClock),
            ticker: Ticker::new(),
            dispatcher: EventDispatcher::new(),
            failsafe,
            features: Features::default(),
        })
    }

    /// Use `clock` for the navbar time instead of local time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `segmenter` for every text split
    pub fn with_segmenter(mut self, segmenter: Arc<dyn TextSegmenter>) -> Self {
        self.ctx.segmenter = segmenter;
        self
    }

    /// Set up every feature. Returns `false` if the page was already
    /// initialized, in which case nothing happens.
    pub fn init(&mut self, now_ms: f64) -> bool {
        let page = self.ctx.page.clone();
        let body = page.body();
        if page.has_class(body, INITIALIZED_CLASS) {
            tracing::debug!("animations already initialized");
            return false;
        }
        page.add_class(body, INITIALIZED_CLASS);
        page.add_class(body, VISIBLE_CLASS);

        let ctx = self.ctx.clone();
        let selectors = &ctx.config.selectors;

        let navbar = Arc::new(Navbar::new(
            page.clone(),
            ctx.find(&selectors.navbar),
            ctx.find(&selectors.time_display),
            ctx.config.navbar_threshold,
            self.clock.clone(),
            ctx.config.clock_interval_ms as f64,
        ));
        navbar.start_clock(now_ms);
        self.features.navbar = Some(navbar.clone());

        self.features.hero = contain("hero", HeroIntro::init(&ctx));

        let gallery = SharedGallery::new(self.gallery_controller());
        gallery.on_ready();
        self.features.gallery = Some(gallery);

        self.features.cards = contain("cards", CardHover::init(&ctx, &mut self.dispatcher));
        self.features.menu = contain("menu", Menu::init(&ctx, &mut self.dispatcher));

        self.features.cursor =
            contain("cursor", CursorFollower::init(&ctx, &mut self.dispatcher)).flatten();
        if let Some(cursor) = &self.features.cursor {
            let cursor = cursor.clone();
            self.ticker.add(move |frame| cursor.on_frame(frame));
        }

        self.features.scroll = contain(
            "smooth scroll",
            ScrollDriver::init(&ctx, self.scroller.clone(), Some(navbar), &mut self.ticker),
        );
        self.features.quotes = contain("quotes", QuoteReveal::init(&ctx));

        tracing::debug!(bindings = self.registry.len(), "site initialized");
        true
    }

    fn gallery_controller(&self) -> GallerySyncController {
        let ctx = &self.ctx;
        let selectors = &ctx.config.selectors;
        let refs = GalleryRefs {
            container: ctx.find(&selectors.gallery_container),
            track: ctx.find(&selectors.gallery_track),
            progress_line: ctx.find(&selectors.progress_line),
        };
        let scrub = if ctx.config.scrub_seconds > 0.0 {
            Scrub::Smoothed {
                seconds: ctx.config.scrub_seconds,
            }
        } else {
            Scrub::Instant
        };
        GallerySyncController::new(
            refs,
            ctx.layout.clone(),
            ctx.tweens.clone(),
            ctx.triggers.clone(),
        )
        .with_debounce(ctx.config.debounce_ms as f64)
        .with_scrub(scrub)
    }

    /// Advance everything time-driven to `now_ms`
    pub fn tick(&mut self, now_ms: f64) {
        if self.failsafe.poll(now_ms) {
            let body = self.ctx.page.body();
            self.ctx.page.add_class(body, VISIBLE_CLASS);
            tracing::debug!("failsafe made page visible");
        }

        let frame = self.ticker.tick(now_ms);
        let dt = frame.delta_ms as f32;
        self.runtime.tick(dt);
        self.registry.advance(dt);

        if let Some(gallery) = &self.features.gallery {
            gallery.poll(now_ms);
        }
        if let Some(navbar) = &self.features.navbar {
            navbar.poll_clock(now_ms);
        }
    }

    /// Route a page event
    pub fn dispatch(&mut self, mut event: Event) {
        match (event.event_type, event.data.clone()) {
            (event_types::LOAD, _) => {
                self.init(event.timestamp);
            }
            (event_types::RESIZE, _) => {
                if let Some(gallery) = &self.features.gallery {
                    gallery.on_resize(event.timestamp);
                }
                if let Some(scroll) = &self.features.scroll {
                    scroll.update_limit();
                }
            }
            (event_types::SCROLL, EventData::Scroll { y }) => self.scroller.scroll_to(y, true),
            (event_types::WHEEL, EventData::Wheel { delta_y }) => self.scroller.wheel(delta_y),
            (event_types::TOUCH_MOVE, EventData::Touch { delta_y }) => {
                self.scroller.touch(delta_y)
            }
            _ => {
                self.dispatcher.dispatch(&mut event);
                // the window also sees pointer moves over elements
                if event.event_type == event_types::POINTER_MOVE && event.target.is_some() {
                    let mut window_event =
                        Event::new(event.event_type, None, event.data.clone(), event.timestamp);
                    self.dispatcher.dispatch(&mut window_event);
                }
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        let page = &self.ctx.page;
        page.has_class(page.body(), INITIALIZED_CLASS)
    }

    pub fn context(&self) -> &SiteContext {
        &self.ctx
    }

    pub fn config(&self) -> &SiteConfig {
        &self.ctx.config
    }

    pub fn tweens(&self) -> &Arc<TweenRuntime> {
        &self.runtime
    }

    pub fn triggers(&self) -> &Arc<TriggerRegistry> {
        &self.registry
    }

    pub fn scroller(&self) -> &Arc<SmoothScroll> {
        &self.scroller
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn navbar(&self) -> Option<&Arc<Navbar>> {
        self.features.navbar.as_ref()
    }

    pub fn hero(&self) -> Option<&HeroIntro> {
        self.features.hero.as_ref()
    }

    pub fn gallery(&self) -> Option<&SharedGallery> {
        self.features.gallery.as_ref()
    }

    pub fn cards(&self) -> Option<&CardHover> {
        self.features.cards.as_ref()
    }

    pub fn menu(&self) -> Option<&Menu> {
        self.features.menu.as_ref()
    }

    pub fn cursor(&self) -> Option<&Arc<CursorFollower>> {
        self.features.cursor.as_ref()
    }

    pub fn scroll(&self) -> Option<&ScrollDriver> {
        self.features.scroll.as_ref()
    }

    pub fn quotes(&self) -> Option<&Arc<QuoteReveal>> {
        self.features.quotes.as_ref()
    }
}

/// Keep a feature if it initialized, log and drop it otherwise
fn contain<T>(feature: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(%err, feature, "feature disabled");
            None
        }
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("ctx", &self.ctx)
            .field("ticker", &self.ticker)
            .field("failsafe", &self.failsafe)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}
