//! Site configuration (vitrine.toml)
//!
//! Every tunable the page features read. All fields have defaults, so an
//! empty file (or no file) reproduces the stock page.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use vitrine_animation::Easing;
use vitrine_core::VitrineError;
use vitrine_scroll::{Orientation, SmoothScrollOptions};

/// Top-level site configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Settle time before a resize rebuilds the gallery (ms)
    pub debounce_ms: u32,
    /// Delay after which the page is forced visible (ms)
    pub failsafe_ms: u32,
    /// Viewports narrower than this are treated as touch devices (px)
    pub mobile_breakpoint: f32,
    /// Scroll offset past which the navbar gets its `scrolled` class (px)
    pub navbar_threshold: f32,
    /// Live clock refresh period (ms)
    pub clock_interval_ms: u32,
    /// Fraction of the remaining distance the cursor covers per nominal frame
    pub cursor_smoothing: f32,
    /// Time the gallery animation takes to catch up with the scrollbar (s)
    pub scrub_seconds: f32,
    /// Viewport fraction the top of a quote must reach to reveal it
    pub quote_start: f32,
    /// Longest line, in characters, for quotes that have no measured width
    pub quote_line_chars: usize,
    /// Quote font size, used to estimate how many characters fit a line (px)
    pub quote_font_size: f32,
    pub selectors: Selectors,
    pub smooth_scroll: SmoothScrollConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            failsafe_ms: 3000,
            mobile_breakpoint: 768.0,
            navbar_threshold: 50.0,
            clock_interval_ms: 1000,
            cursor_smoothing: 0.15,
            scrub_seconds: 1.0,
            quote_start: 0.8,
            quote_line_chars: 40,
            quote_font_size: 48.0,
            selectors: Selectors::default(),
            smooth_scroll: SmoothScrollConfig::default(),
        }
    }
}

/// Selectors the features resolve at init
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    pub navbar: String,
    pub time_display: String,
    pub hero: String,
    pub hero_title: String,
    pub loader: String,
    pub loader_text: String,
    pub hero_image_container: String,
    pub hero_image: String,
    pub gallery_container: String,
    pub gallery_track: String,
    pub progress_line: String,
    pub card: String,
    pub card_image: String,
    pub card_overlay: String,
    pub cursor: String,
    pub cursor_targets: String,
    pub menu_link: String,
    pub menu_toggle: String,
    pub menu_close: String,
    pub menu_overlay: String,
    pub quote: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            navbar: ".navbar".to_string(),
            time_display: "#timeDisplay".to_string(),
            hero: ".hero".to_string(),
            hero_title: ".hero-title".to_string(),
            loader: "#loader".to_string(),
            loader_text: ".loader-text".to_string(),
            hero_image_container: ".hero-img-container".to_string(),
            hero_image: ".hero-img".to_string(),
            gallery_container: ".gallery-container".to_string(),
            gallery_track: ".gallery-track".to_string(),
            progress_line: ".line".to_string(),
            card: ".card".to_string(),
            card_image: "img".to_string(),
            card_overlay: ".card-overlay".to_string(),
            cursor: "#cursor".to_string(),
            cursor_targets: "a, .card, .cta, .logo-container, .menu-toggle, .menu-close-btn, \
                             .menu-link, .hero-title, .nav-link"
                .to_string(),
            menu_link: ".menu-link".to_string(),
            menu_toggle: "#menuToggle".to_string(),
            menu_close: "#menuClose".to_string(),
            menu_overlay: ".menu-overlay".to_string(),
            quote: ".quote".to_string(),
        }
    }
}

/// Inertial scroll settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SmoothScrollConfig {
    pub duration_s: f32,
    /// Easing name; the default is the exponential settle curve
    pub easing: Option<String>,
    pub horizontal: bool,
    pub smooth_wheel: bool,
    pub wheel_multiplier: f32,
    pub smooth_touch: bool,
    pub touch_multiplier: f32,
    pub infinite: bool,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            duration_s: 1.2,
            easing: None,
            horizontal: false,
            smooth_wheel: true,
            wheel_multiplier: 1.0,
            smooth_touch: false,
            touch_multiplier: 2.0,
            infinite: false,
        }
    }
}

impl SmoothScrollConfig {
    /// Options for the inertial scroller
    pub fn options(&self) -> std::result::Result<SmoothScrollOptions, VitrineError> {
        let easing = match &self.easing {
            Some(name) => name
                .parse::<Easing>()
                .map_err(|err| VitrineError::Config(err.to_string()))?,
            None => Easing::ScrollSettle,
        };
        Ok(SmoothScrollOptions {
            duration_ms: self.duration_s * 1000.0,
            easing,
            orientation: if self.horizontal {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            },
            smooth_wheel: self.smooth_wheel,
            wheel_multiplier: self.wheel_multiplier,
            smooth_touch: self.smooth_touch,
            touch_multiplier: self.touch_multiplier,
            infinite: self.infinite,
        })
    }
}

impl SiteConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, VitrineError> {
        let config: SiteConfig =
            toml::from_str(content).map_err(|err| VitrineError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> std::result::Result<(), VitrineError> {
        let invalid = |reason: &str| Err(VitrineError::Config(reason.to_string()));
        if !(0.0..=1.0).contains(&self.cursor_smoothing) {
            return invalid("cursor_smoothing must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&self.quote_start) {
            return invalid("quote_start must be within 0..=1");
        }
        if self.scrub_seconds < 0.0 {
            return invalid("scrub_seconds must not be negative");
        }
        if self.clock_interval_ms == 0 {
            return invalid("clock_interval_ms must be positive");
        }
        if self.quote_line_chars == 0 {
            return invalid("quote_line_chars must be positive");
        }
        if self.quote_font_size <= 0.0 {
            return invalid("quote_font_size must be positive");
        }
        self.smooth_scroll.options().map(|_| ())
    }
}
