//! Inertial (eased) scrolling
//!
//! Raw wheel input moves a *target* position; the visible position eases
//! toward it over a fixed duration, advanced once per frame by [`InertialScroller::raf`].
//! Touch input can bypass the easing and move the position directly.

use std::sync::{Arc, Mutex, MutexGuard};
use vitrine_animation::Easing;

/// Scroll axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Configuration for [`SmoothScroll`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothScrollOptions {
    /// Time to settle on a new target (ms)
    pub duration_ms: f32,
    pub easing: Easing,
    pub orientation: Orientation,
    /// Ease wheel input instead of applying it directly
    pub smooth_wheel: bool,
    pub wheel_multiplier: f32,
    /// Ease touch input instead of applying it directly
    pub smooth_touch: bool,
    pub touch_multiplier: f32,
    /// Wrap around instead of clamping at the limits
    pub infinite: bool,
}

impl Default for SmoothScrollOptions {
    fn default() -> Self {
        Self {
            duration_ms: 1200.0,
            easing: Easing::ScrollSettle,
            orientation: Orientation::Vertical,
            smooth_wheel: true,
            wheel_multiplier: 1.0,
            smooth_touch: false,
            touch_multiplier: 2.0,
            infinite: false,
        }
    }
}

/// Snapshot handed to scroll listeners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    pub scroll: f32,
    /// Change since the previous notification (px)
    pub velocity: f32,
    /// -1 up, 1 down, 0 idle
    pub direction: i8,
    /// `scroll / limit`, 0 when there is nothing to scroll
    pub progress: f32,
}

/// Scroll notification callback
pub type ScrollListener = Arc<dyn Fn(&ScrollState) + Send + Sync>;

/// Capability interface of the inertial scroller
pub trait InertialScroller: Send + Sync {
    /// Advance the eased position to `time_ms`
    fn raf(&self, time_ms: f64);

    fn on_scroll(&self, listener: ScrollListener);

    fn wheel(&self, delta: f32);

    fn touch(&self, delta: f32);

    /// Move to `target`, immediately or eased
    fn scroll_to(&self, target: f32, immediate: bool);

    /// Current visible position
    fn scroll(&self) -> f32;

    /// Largest reachable position
    fn set_limit(&self, limit: f32);
}

#[derive(Debug, Clone, Copy)]
struct Glide {
    from: f32,
    to: f32,
    elapsed_ms: f32,
}

#[derive(Default)]
struct ScrollerState {
    scroll: f32,
    target: f32,
    limit: f32,
    last_notified: f32,
    last_time_ms: Option<f64>,
    glide: Option<Glide>,
    listeners: Vec<ScrollListener>,
}

impl ScrollerState {
    fn clamp(&self, value: f32, infinite: bool) -> f32 {
        if infinite {
            if self.limit > 0.0 {
                value.rem_euclid(self.limit)
            } else {
                0.0
            }
        } else {
            value.clamp(0.0, self.limit.max(0.0))
        }
    }

    fn snapshot(&mut self) -> ScrollState {
        let velocity = self.scroll - self.last_notified;
        self.last_notified = self.scroll;
        ScrollState {
            scroll: self.scroll,
            velocity,
            direction: if velocity > 0.0 {
                1
            } else if velocity < 0.0 {
                -1
            } else {
                0
            },
            progress: if self.limit > 0.0 {
                self.scroll / self.limit
            } else {
                0.0
            },
        }
    }
}

/// Eased scroller driven by frame timestamps
pub struct SmoothScroll {
    options: SmoothScrollOptions,
    state: Mutex<ScrollerState>,
}

impl SmoothScroll {
    pub fn new(options: SmoothScrollOptions) -> Self {
        Self {
            options,
            state: Mutex::new(ScrollerState::default()),
        }
    }

    pub fn options(&self) -> &SmoothScrollOptions {
        &self.options
    }

    /// Where the scroller is heading
    pub fn target(&self) -> f32 {
        self.lock().target
    }

    pub fn is_scrolling(&self) -> bool {
        self.lock().glide.is_some()
    }

    /// Largest reachable position
    pub fn limit(&self) -> f32 {
        self.lock().limit
    }

    fn lock(&self) -> MutexGuard<'_, ScrollerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn glide_to(&self, target: f32) {
        let mut state = self.lock();
        let target = state.clamp(target, self.options.infinite);
        state.target = target;
        state.glide = Some(Glide {
            from: state.scroll,
            to: target,
            elapsed_ms: 0.0,
        });
    }

    fn jump_to(&self, target: f32) {
        let snapshot = {
            let mut state = self.lock();
            let target = state.clamp(target, self.options.infinite);
            state.target = target;
            state.scroll = target;
            state.glide = None;
            (state.snapshot(), state.listeners.clone())
        };
        notify(snapshot);
    }
}

impl Default for SmoothScroll {
    fn default() -> Self {
        Self::new(SmoothScrollOptions::default())
    }
}

fn notify((snapshot, listeners): (ScrollState, Vec<ScrollListener>)) {
    for listener in listeners {
        listener(&snapshot);
    }
}

impl InertialScroller for SmoothScroll {
    fn raf(&self, time_ms: f64) {
        let snapshot = {
            let mut state = self.lock();
            let dt = state.last_time_ms.map_or(0.0, |last| (time_ms - last).max(0.0)) as f32;
            state.last_time_ms = Some(time_ms);

            let Some(mut glide) = state.glide else {
                return;
            };
            glide.elapsed_ms += dt;
            let t = if self.options.duration_ms > 0.0 {
                (glide.elapsed_ms / self.options.duration_ms).min(1.0)
            } else {
                1.0
            };
            let eased = self.options.easing.apply(t);
            state.scroll = glide.from + (glide.to - glide.from) * eased;
            if t >= 1.0 {
                state.scroll = glide.to;
                state.glide = None;
            } else {
                state.glide = Some(glide);
            }
            (state.snapshot(), state.listeners.clone())
        };
        notify(snapshot);
    }

    fn on_scroll(&self, listener: ScrollListener) {
        self.lock().listeners.push(listener);
    }

    fn wheel(&self, delta: f32) {
        let delta = delta * self.options.wheel_multiplier;
        let target = self.lock().target + delta;
        if self.options.smooth_wheel {
            self.glide_to(target);
        } else {
            self.jump_to(target);
        }
    }

    fn touch(&self, delta: f32) {
        let delta = delta * self.options.touch_multiplier;
        if self.options.smooth_touch {
            let target = self.lock().target + delta;
            self.glide_to(target);
        } else {
            let current = self.lock().scroll;
            self.jump_to(current + delta);
        }
    }

    fn scroll_to(&self, target: f32, immediate: bool) {
        if immediate {
            self.jump_to(target);
        } else {
            self.glide_to(target);
        }
    }

    fn scroll(&self) -> f32 {
        self.lock().scroll
    }

    fn set_limit(&self, limit: f32) {
        let mut state = self.lock();
        state.limit = limit.max(0.0);
        let infinite = self.options.infinite;
        state.target = state.clamp(state.target, infinite);
        state.scroll = state.clamp(state.scroll, infinite);
    }
}

impl std::fmt::Debug for SmoothScroll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SmoothScroll")
            .field("options", &self.options)
            .field("scroll", &state.scroll)
            .field("target", &state.target)
            .field("limit", &state.limit)
            .finish()
    }
}
