//! Navbar scroll state and live clock

use chrono::{Local, NaiveTime, Timelike};
use std::sync::{Arc, Mutex};
use vitrine_core::NodeId;
use vitrine_layout::Page;

/// Source of the wall-clock time shown in the navbar
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// Host local time
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// `HH:MM:SS`, zero padded
pub fn format_time(time: NaiveTime) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )
}

pub struct Navbar {
    page: Arc<dyn Page>,
    navbar: Option<NodeId>,
    time_display: Option<NodeId>,
    threshold: f32,
    clock: Arc<dyn Clock>,
    interval_ms: f64,
    next_tick_ms: Mutex<Option<f64>>,
}

impl Navbar {
    pub fn new(
        page: Arc<dyn Page>,
        navbar: Option<NodeId>,
        time_display: Option<NodeId>,
        threshold: f32,
        clock: Arc<dyn Clock>,
        interval_ms: f64,
    ) -> Self {
        if navbar.is_none() {
            tracing::debug!("no navbar on page");
        }
        Self {
            page,
            navbar,
            time_display,
            threshold,
            clock,
            interval_ms,
            next_tick_ms: Mutex::new(None),
        }
    }

    /// Toggle `scrolled` for the current scroll offset
    pub fn on_scroll(&self, scroll_y: f32) {
        let Some(navbar) = self.navbar else {
            return;
        };
        if scroll_y > self.threshold {
            self.page.add_class(navbar, "scrolled");
        } else {
            self.page.remove_class(navbar, "scrolled");
        }
    }

    /// Refresh the clock now and every interval after
    pub fn start_clock(&self, now_ms: f64) {
        self.render_time();
        *self.lock_next() = Some(now_ms + self.interval_ms);
    }

    /// Refresh the clock if an interval elapsed. Returns whether it did.
    pub fn poll_clock(&self, now_ms: f64) -> bool {
        let mut next = self.lock_next();
        match *next {
            Some(due) if now_ms >= due => {
                let mut following = due + self.interval_ms;
                while following <= now_ms {
                    following += self.interval_ms;
                }
                *next = Some(following);
                drop(next);
                self.render_time();
                true
            }
            _ => false,
        }
    }

    fn lock_next(&self) -> std::sync::MutexGuard<'_, Option<f64>> {
        self.next_tick_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn render_time(&self) {
        if let Some(display) = self.time_display {
            self.page.set_text(display, &format_time(self.clock.now()));
        }
    }
}

impl std::fmt::Debug for Navbar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navbar")
            .field("navbar", &self.navbar)
            .field("time_display", &self.time_display)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
