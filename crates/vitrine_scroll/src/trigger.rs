//! Scroll trigger vocabulary and capability interface

use slotmap::new_key_type;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use vitrine_animation::AnimationHandle;
use vitrine_core::{NodeId, Result};

new_key_type! {
    /// Handle to a registered scroll binding
    pub struct BindingId;
}

/// Callback fired on a trigger boundary crossing
pub type TriggerCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback fired after every refresh
pub type RefreshListener = Arc<dyn Fn() + Send + Sync>;

/// How an attached animation follows scroll progress
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Scrub {
    /// Animation is driven by toggle actions, not by progress
    #[default]
    Off,
    /// Animation progress equals scroll progress
    Instant,
    /// Animation progress catches up with scroll progress over `seconds`
    Smoothed { seconds: f32 },
}

/// Scroll length of the active range
#[derive(Clone)]
pub enum Extent {
    Fixed(f32),
    /// Re-evaluated on every refresh
    Measured(Arc<dyn Fn() -> f32 + Send + Sync>),
    /// The trigger element's own height
    TriggerHeight,
}

impl fmt::Debug for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Fixed(px) => f.debug_tuple("Fixed").field(px).finish(),
            Extent::Measured(_) => f.write_str("Measured(..)"),
            Extent::TriggerHeight => f.write_str("TriggerHeight"),
        }
    }
}

/// What happens to the attached animation on a boundary crossing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToggleAction {
    #[default]
    None,
    Play,
    Reverse,
    Restart,
    Reset,
    Complete,
}

/// Unknown toggle action keyword
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid toggle actions: {0:?}")]
pub struct ToggleActionsParseError(pub String);

/// Actions for enter, leave, enter-back and leave-back, in that order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl FromStr for ToggleActions {
    type Err = ToggleActionsParseError;

    /// Parses the four-keyword form, e.g. `"play none none reverse"`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |word: &str| -> std::result::Result<ToggleAction, Self::Err> {
            Ok(match word {
                "none" => ToggleAction::None,
                "play" | "resume" => ToggleAction::Play,
                "reverse" => ToggleAction::Reverse,
                "restart" => ToggleAction::Restart,
                "reset" => ToggleAction::Reset,
                "complete" => ToggleAction::Complete,
                _ => return Err(ToggleActionsParseError(s.to_string())),
            })
        };
        let words: Vec<&str> = s.split_whitespace().collect();
        let [enter, leave, enter_back, leave_back] = words.as_slice() else {
            return Err(ToggleActionsParseError(s.to_string()));
        };
        Ok(ToggleActions {
            on_enter: parse(enter)?,
            on_leave: parse(leave)?,
            on_enter_back: parse(enter_back)?,
            on_leave_back: parse(leave_back)?,
        })
    }
}

/// Everything needed to register a binding
#[derive(Clone)]
pub struct BindingSpec {
    pub trigger: NodeId,
    /// Fraction of the viewport height the trigger's top must reach to start
    /// (0.0 is "top of trigger at top of viewport")
    pub start_at: f32,
    pub extent: Extent,
    pub pin: bool,
    pub scrub: Scrub,
    pub animation: Option<AnimationHandle>,
    pub toggle_actions: ToggleActions,
    pub on_enter: Option<TriggerCallback>,
    pub on_enter_back: Option<TriggerCallback>,
}

impl BindingSpec {
    pub fn new(trigger: NodeId) -> Self {
        Self {
            trigger,
            start_at: 0.0,
            extent: Extent::TriggerHeight,
            pin: false,
            scrub: Scrub::Off,
            animation: None,
            toggle_actions: ToggleActions {
                on_enter: ToggleAction::Play,
                ..Default::default()
            },
            on_enter: None,
            on_enter_back: None,
        }
    }

    pub fn start_at(mut self, viewport_fraction: f32) -> Self {
        self.start_at = viewport_fraction;
        self
    }

    pub fn extent(mut self, extent: Extent) -> Self {
        self.extent = extent;
        self
    }

    pub fn pin(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    pub fn scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }

    pub fn animation(mut self, handle: AnimationHandle) -> Self {
        self.animation = Some(handle);
        self
    }

    pub fn toggle_actions(mut self, actions: ToggleActions) -> Self {
        self.toggle_actions = actions;
        self
    }

    pub fn on_enter<F: Fn() + Send + Sync + 'static>(mut self, callback: F) -> Self {
        self.on_enter = Some(Arc::new(callback));
        self
    }

    pub fn on_enter_back<F: Fn() + Send + Sync + 'static>(mut self, callback: F) -> Self {
        self.on_enter_back = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for BindingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSpec")
            .field("trigger", &self.trigger)
            .field("start_at", &self.start_at)
            .field("extent", &self.extent)
            .field("pin", &self.pin)
            .field("scrub", &self.scrub)
            .field("animation", &self.animation)
            .field("toggle_actions", &self.toggle_actions)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a binding's measured state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindingInfo {
    pub trigger: NodeId,
    /// Scroll offset where the range starts
    pub start_px: f32,
    /// Scroll offset where the range ends
    pub end_px: f32,
    pub pin: bool,
    /// True while the scroll position is inside the range of a pinned binding
    pub pinned: bool,
    /// Raw scroll progress through the range (0..1)
    pub progress: f32,
    /// Progress applied to the attached animation
    pub applied_progress: f32,
    pub animation: Option<AnimationHandle>,
}

impl BindingInfo {
    /// Length of the active range in pixels
    pub fn distance(&self) -> f32 {
        self.end_px - self.start_px
    }
}

/// Capability interface of the scroll-trigger engine
pub trait ScrollTrigger: Send + Sync {
    /// Measure and register a binding
    fn bind(&self, spec: BindingSpec) -> Result<BindingId>;

    /// Remove a binding and kill its attached animation
    fn destroy(&self, id: BindingId) -> bool;

    /// Every binding whose trigger is `region`, oldest first
    fn bindings_for(&self, region: NodeId) -> Vec<BindingId>;

    fn info(&self, id: BindingId) -> Option<BindingInfo>;

    /// Re-measure every binding, then notify refresh listeners
    fn refresh_all(&self);

    /// Feed the current scroll position
    fn update(&self, scroll_y: f32);

    /// Advance time-smoothed scrubbing
    fn advance(&self, dt_ms: f32);

    fn add_refresh_listener(&self, listener: RefreshListener);

    /// Number of live bindings
    fn len(&self) -> usize;

    /// Extra scroll length pinned bindings add below themselves
    fn pin_spacing(&self) -> f32 {
        0.0
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy every binding of a region; returns how many were removed
    fn destroy_for_region(&self, region: NodeId) -> usize {
        self.bindings_for(region)
            .into_iter()
            .filter(|&id| self.destroy(id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle_actions() {
        let actions: ToggleActions = "play none none reverse".parse().unwrap();
        assert_eq!(actions.on_enter, ToggleAction::Play);
        assert_eq!(actions.on_leave, ToggleAction::None);
        assert_eq!(actions.on_enter_back, ToggleAction::None);
        assert_eq!(actions.on_leave_back, ToggleAction::Reverse);

        assert!("play none".parse::<ToggleActions>().is_err());
        assert!("play none none rewind".parse::<ToggleActions>().is_err());
    }

    #[test]
    fn test_spec_builder_defaults() {
        let spec = BindingSpec::new(NodeId(3));
        assert!(!spec.pin);
        assert_eq!(spec.scrub, Scrub::Off);
        assert_eq!(spec.toggle_actions.on_enter, ToggleAction::Play);
        assert!(matches!(spec.extent, Extent::TriggerHeight));

        let spec = spec.pin(true).scrub(Scrub::Smoothed { seconds: 1.0 }).start_at(0.8);
        assert!(spec.pin);
        assert_eq!(spec.start_at, 0.8);
    }
}
