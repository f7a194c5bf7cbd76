//! Tween vocabulary and the tween engine capability

use crate::easing::Easing;
use crate::timeline::Timeline;
use slotmap::new_key_type;
use smallvec::SmallVec;
use vitrine_core::{NodeId, Result};

new_key_type! {
    /// Handle to a running or paused animation
    pub struct AnimationHandle;
}

/// Animatable visual properties
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Opacity,
    /// Horizontal translation in pixels
    X,
    /// Vertical translation in pixels
    Y,
    /// Horizontal translation as a percentage of the element width
    XPercent,
    /// Vertical translation as a percentage of the element height
    YPercent,
    /// Uniform scale
    Scale,
    ScaleX,
    /// 3D tilt in degrees
    RotateX,
    /// 3D turn in degrees
    RotateY,
    /// Height as a percentage of the element's natural height
    Height,
    /// Symmetric vertical clip inset in percent (top and bottom)
    ClipInset,
    /// Brightness filter multiplier
    Brightness,
    /// Corner radius in percent
    BorderRadius,
    /// Perspective distance in pixels
    Perspective,
}

impl Property {
    /// Value an element has before anything animated it
    pub fn rest_value(self) -> f32 {
        match self {
            Property::Opacity | Property::Scale | Property::ScaleX | Property::Brightness => 1.0,
            Property::Height => 100.0,
            Property::BorderRadius => 50.0,
            _ => 0.0,
        }
    }
}

/// A small ordered set of property values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: SmallVec<[(Property, f32); 4]>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map with a single property
    pub fn of(property: Property, value: f32) -> Self {
        Self::new().with(property, value)
    }

    /// Builder: set a property, replacing any previous value
    pub fn with(mut self, property: Property, value: f32) -> Self {
        self.insert(property, value);
        self
    }

    pub fn insert(&mut self, property: Property, value: f32) {
        match self.entries.iter_mut().find(|(p, _)| *p == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property, value)),
        }
    }

    pub fn get(&self, property: Property) -> Option<f32> {
        self.entries
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| *v)
    }

    pub fn properties(&self) -> impl Iterator<Item = Property> + '_ {
        self.entries.iter().map(|(p, _)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Timing parameters of a tween
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenVars {
    pub duration_ms: u32,
    pub easing: Easing,
    pub delay_ms: u32,
    /// Start offset between consecutive targets
    pub stagger_ms: u32,
}

impl TweenVars {
    pub fn new(duration_ms: u32, easing: Easing) -> Self {
        Self {
            duration_ms,
            easing,
            delay_ms: 0,
            stagger_ms: 0,
        }
    }

    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn stagger(mut self, stagger_ms: u32) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    /// Time from the first target starting to the last one finishing, delay excluded
    pub fn span_ms(&self, target_count: usize) -> u32 {
        let extra = self.stagger_ms * target_count.saturating_sub(1) as u32;
        self.duration_ms + extra
    }
}

impl Default for TweenVars {
    fn default() -> Self {
        Self::new(500, Easing::EaseOutQuad)
    }
}

/// Capability interface of the tweening engine.
///
/// Time-driven tweens created with [`TweenEngine::animate`] are dropped once
/// they finish. Timelines handed over with [`TweenEngine::play`] or
/// [`TweenEngine::scrub`] stay addressable until killed so that scroll
/// triggers can seek, reverse or resume them.
pub trait TweenEngine: Send + Sync {
    /// Animate targets between `from` and `to`.
    ///
    /// Properties present only in `from` animate toward their current value,
    /// properties present only in `to` animate from their current value.
    fn animate(
        &self,
        targets: &[NodeId],
        from: Option<&PropertyMap>,
        to: &PropertyMap,
        vars: TweenVars,
    ) -> Result<AnimationHandle>;

    /// Assign values immediately, without transition
    fn set(&self, targets: &[NodeId], props: &PropertyMap);

    /// Start a time-driven timeline
    fn play(&self, timeline: Timeline) -> Result<AnimationHandle>;

    /// Register a paused timeline driven externally through [`TweenEngine::seek`]
    fn scrub(&self, timeline: Timeline) -> Result<AnimationHandle>;

    /// Jump a retained animation to a normalized progress (0..1)
    fn seek(&self, handle: AnimationHandle, progress: f32) -> bool;

    /// Normalized progress of an animation
    fn progress(&self, handle: AnimationHandle) -> Option<f32>;

    /// Play forward from the current position
    fn resume(&self, handle: AnimationHandle) -> bool;

    /// Play backward from the current position
    fn reverse(&self, handle: AnimationHandle) -> bool;

    /// Stop advancing with time, keeping the current position
    fn pause(&self, handle: AnimationHandle) -> bool;

    /// Render the end state and drop the animation
    fn complete_and_kill(&self, handle: AnimationHandle) -> bool;

    /// Drop the animation, leaving values where they are
    fn kill(&self, handle: AnimationHandle) -> bool;

    fn is_active(&self, handle: AnimationHandle) -> bool;

    /// Current value of a property, `None` if never written
    fn value(&self, target: NodeId, property: Property) -> Option<f32>;

    /// Animate from current values to `to`
    fn to(&self, targets: &[NodeId], to: &PropertyMap, vars: TweenVars) -> Result<AnimationHandle> {
        self.animate(targets, None, to, vars)
    }

    /// Animate from `from` to current values
    fn from(
        &self,
        targets: &[NodeId],
        from: &PropertyMap,
        vars: TweenVars,
    ) -> Result<AnimationHandle> {
        self.animate(targets, Some(from), &PropertyMap::new(), vars)
    }

    /// Current value, falling back to the property's rest value
    fn value_or_rest(&self, target: NodeId, property: Property) -> f32 {
        self.value(target, property)
            .unwrap_or_else(|| property.rest_value())
    }
}
