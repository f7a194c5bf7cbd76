//! In-process scroll trigger engine
//!
//! Bindings are measured against a [`LayoutOracle`] when registered and on
//! every refresh. A pinned binding holds its trigger in place for its whole
//! range, so every trigger laid out below it starts and ends that much
//! later in scroll terms. Scroll positions fed through [`ScrollTrigger::update`] move
//! each binding between three phases (before, inside, after its range);
//! boundary crossings fire callbacks and toggle actions, and scrubbed
//! bindings map progress onto their animation.
//!
//! Callbacks, refresh listeners and tween operations all run after the
//! registry lock is released, so any of them may bind or destroy.

use crate::trigger::{
    BindingId, BindingInfo, BindingSpec, Extent, RefreshListener, ScrollTrigger, Scrub,
    ToggleAction, TriggerCallback,
};
use slotmap::SlotMap;
use std::sync::{Arc, Mutex, MutexGuard};
use vitrine_animation::{AnimationHandle, TweenEngine};
use vitrine_core::{LayoutOracle, NodeId, Result, VitrineError};

/// Progress differences below this snap to the target
const SCRUB_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Before,
    Active,
    After,
}

/// Where a binding sits in the unpinned layout
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    top: f32,
    bottom: f32,
    start: f32,
    extent: f32,
}

struct Binding {
    spec: BindingSpec,
    seq: u64,
    placement: Placement,
    start_px: f32,
    end_px: f32,
    phase: Phase,
    progress: f32,
    applied: f32,
}

impl Binding {
    fn info(&self) -> BindingInfo {
        BindingInfo {
            trigger: self.spec.trigger,
            start_px: self.start_px,
            end_px: self.end_px,
            pin: self.spec.pin,
            pinned: self.spec.pin && self.phase == Phase::Active,
            progress: self.progress,
            applied_progress: self.applied,
            animation: self.spec.animation,
        }
    }

    fn phase_at(&self, scroll_y: f32) -> Phase {
        if scroll_y < self.start_px {
            Phase::Before
        } else if scroll_y > self.end_px {
            Phase::After
        } else {
            Phase::Active
        }
    }

    fn progress_at(&self, scroll_y: f32) -> f32 {
        let distance = self.end_px - self.start_px;
        if distance <= 0.0 {
            return if scroll_y >= self.start_px { 1.0 } else { 0.0 };
        }
        ((scroll_y - self.start_px) / distance).clamp(0.0, 1.0)
    }
}

#[derive(Default)]
struct RegistryState {
    bindings: SlotMap<BindingId, Binding>,
    listeners: Vec<RefreshListener>,
    scroll_y: f32,
    next_seq: u64,
}

/// Deferred side effects of a state change
#[derive(Default)]
struct Effects {
    callbacks: Vec<TriggerCallback>,
    toggles: Vec<(AnimationHandle, ToggleAction)>,
    seeks: Vec<(AnimationHandle, f32)>,
}

impl Effects {
    fn run(self, tweens: &dyn TweenEngine) {
        for (handle, progress) in self.seeks {
            tweens.seek(handle, progress);
        }
        for (handle, action) in self.toggles {
            apply_toggle(tweens, handle, action);
        }
        for callback in self.callbacks {
            callback();
        }
    }
}

fn apply_toggle(tweens: &dyn TweenEngine, handle: AnimationHandle, action: ToggleAction) {
    match action {
        ToggleAction::None => {}
        ToggleAction::Play => {
            tweens.resume(handle);
        }
        ToggleAction::Reverse => {
            tweens.reverse(handle);
        }
        ToggleAction::Restart => {
            tweens.seek(handle, 0.0);
            tweens.resume(handle);
        }
        ToggleAction::Reset => {
            tweens.seek(handle, 0.0);
            tweens.pause(handle);
        }
        ToggleAction::Complete => {
            tweens.seek(handle, 1.0);
            tweens.pause(handle);
        }
    }
}

/// The default [`ScrollTrigger`] implementation
pub struct TriggerRegistry {
    layout: Arc<dyn LayoutOracle>,
    tweens: Arc<dyn TweenEngine>,
    state: Mutex<RegistryState>,
}

impl TriggerRegistry {
    pub fn new(layout: Arc<dyn LayoutOracle>, tweens: Arc<dyn TweenEngine>) -> Self {
        Self {
            layout,
            tweens,
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Last scroll position fed to the registry
    pub fn scroll_y(&self) -> f32 {
        self.lock().scroll_y
    }

    /// Every live binding, oldest first
    pub fn bindings(&self) -> Vec<BindingId> {
        let state = self.lock();
        let mut ids: Vec<(u64, BindingId)> =
            state.bindings.iter().map(|(id, b)| (b.seq, id)).collect();
        ids.sort_unstable_by_key(|&(seq, _)| seq);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Measure a binding against the unpinned layout. Calls user closures,
    /// so never invoke while holding the registry lock.
    fn measure(&self, spec: &BindingSpec) -> Result<Placement> {
        let bounds = self
            .layout
            .bounds(spec.trigger)
            .ok_or_else(|| VitrineError::missing(format!("trigger {:?}", spec.trigger)))?;
        let viewport = self.layout.viewport();
        let extent = match &spec.extent {
            Extent::Fixed(px) => *px,
            Extent::Measured(measure) => measure(),
            Extent::TriggerHeight => bounds.height,
        };
        Ok(Placement {
            top: bounds.top(),
            bottom: bounds.bottom(),
            start: bounds.top() - viewport.height * spec.start_at,
            extent: extent.max(0.0),
        })
    }

    /// Recompute scroll ranges, pushing each binding down by the extent of
    /// every pinned binding whose trigger ends above its own
    fn apply_pin_spacing(state: &mut RegistryState) {
        let pins: Vec<(NodeId, f32, f32)> = state
            .bindings
            .values()
            .filter(|b| b.spec.pin)
            .map(|b| (b.spec.trigger, b.placement.bottom, b.placement.extent))
            .collect();

        for binding in state.bindings.values_mut() {
            let (own, placement) = (binding.spec.trigger, binding.placement);
            let offset: f32 = pins
                .iter()
                .filter(|&&(trigger, bottom, _)| trigger != own && placement.top >= bottom)
                .map(|&(_, _, extent)| extent)
                .sum();
            binding.start_px = placement.start + offset;
            binding.end_px = binding.start_px + placement.extent;
        }
    }

    fn advance_to(state: &mut RegistryState, scroll_y: f32) -> Effects {
        state.scroll_y = scroll_y;
        let mut effects = Effects::default();

        let mut ordered: Vec<&mut Binding> = state.bindings.values_mut().collect();
        ordered.sort_unstable_by_key(|b| b.seq);

        for binding in ordered {
            binding.progress = binding.progress_at(scroll_y);
            let next = binding.phase_at(scroll_y);
            let previous = std::mem::replace(&mut binding.phase, next);

            if let (Scrub::Instant, Some(handle)) = (binding.spec.scrub, binding.spec.animation) {
                if (binding.applied - binding.progress).abs() > f32::EPSILON {
                    binding.applied = binding.progress;
                    effects.seeks.push((handle, binding.progress));
                }
            }

            if previous == next {
                continue;
            }
            let spec = &binding.spec;
            let actions = spec.toggle_actions;
            let enter = (actions.on_enter, spec.on_enter.clone());
            let enter_back = (actions.on_enter_back, spec.on_enter_back.clone());
            let leave = (actions.on_leave, None);
            let leave_back = (actions.on_leave_back, None);
            // crossings in the order they happen
            let crossings: Vec<(ToggleAction, Option<TriggerCallback>)> = match (previous, next) {
                (Phase::Before, Phase::Active) => vec![enter],
                (Phase::Active, Phase::After) => vec![leave],
                (Phase::After, Phase::Active) => vec![enter_back],
                (Phase::Active, Phase::Before) => vec![leave_back],
                (Phase::Before, Phase::After) => vec![enter, leave],
                (Phase::After, Phase::Before) => vec![enter_back, leave_back],
                _ => Vec::new(),
            };

            tracing::trace!(trigger = ?spec.trigger, ?previous, ?next, "trigger crossed boundary");
            for (action, callback) in crossings {
                effects.callbacks.extend(callback);
                if spec.scrub == Scrub::Off {
                    if let Some(handle) = spec.animation {
                        effects.toggles.push((handle, action));
                    }
                }
            }
        }

        effects
    }
}

impl ScrollTrigger for TriggerRegistry {
    fn bind(&self, spec: BindingSpec) -> Result<BindingId> {
        let placement = self.measure(&spec)?;
        let trigger = spec.trigger;

        let (id, range, effects) = {
            let mut state = self.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            let id = state.bindings.insert(Binding {
                spec,
                seq,
                placement,
                start_px: placement.start,
                end_px: placement.start + placement.extent,
                phase: Phase::Before,
                progress: 0.0,
                applied: 0.0,
            });
            Self::apply_pin_spacing(&mut state);
            let range = state.bindings.get(id).map(|b| (b.start_px, b.end_px));
            let scroll_y = state.scroll_y;
            (id, range, Self::advance_to(&mut state, scroll_y))
        };

        tracing::debug!(?trigger, ?range, "scroll binding created");
        effects.run(self.tweens.as_ref());
        Ok(id)
    }

    fn destroy(&self, id: BindingId) -> bool {
        let removed = {
            let mut state = self.lock();
            let removed = state.bindings.remove(id);
            if removed.as_ref().is_some_and(|b| b.spec.pin) {
                Self::apply_pin_spacing(&mut state);
            }
            removed
        };
        match removed {
            Some(binding) => {
                if let Some(handle) = binding.spec.animation {
                    self.tweens.kill(handle);
                }
                tracing::debug!(trigger = ?binding.spec.trigger, "scroll binding destroyed");
                true
            }
            None => false,
        }
    }

    fn bindings_for(&self, region: NodeId) -> Vec<BindingId> {
        let state = self.lock();
        let mut ids: Vec<(u64, BindingId)> = state
            .bindings
            .iter()
            .filter(|(_, b)| b.spec.trigger == region)
            .map(|(id, b)| (b.seq, id))
            .collect();
        ids.sort_unstable_by_key(|&(seq, _)| seq);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    fn info(&self, id: BindingId) -> Option<BindingInfo> {
        self.lock().bindings.get(id).map(Binding::info)
    }

    fn refresh_all(&self) {
        let specs: Vec<(BindingId, BindingSpec)> = {
            let state = self.lock();
            state
                .bindings
                .iter()
                .map(|(id, b)| (id, b.spec.clone()))
                .collect()
        };

        let measured: Vec<(BindingId, Placement)> = specs
            .iter()
            .filter_map(|(id, spec)| match self.measure(spec) {
                Ok(placement) => Some((*id, placement)),
                Err(err) => {
                    tracing::warn!(trigger = ?spec.trigger, %err, "binding kept stale measurement");
                    None
                }
            })
            .collect();

        let listeners = {
            let mut state = self.lock();
            for (id, placement) in measured {
                if let Some(binding) = state.bindings.get_mut(id) {
                    binding.placement = placement;
                }
            }
            Self::apply_pin_spacing(&mut state);
            state.listeners.clone()
        };
        tracing::debug!(bindings = specs.len(), "scroll triggers refreshed");

        for listener in listeners {
            listener();
        }

        let effects = {
            let mut state = self.lock();
            let scroll_y = state.scroll_y;
            Self::advance_to(&mut state, scroll_y)
        };
        effects.run(self.tweens.as_ref());
    }

    fn update(&self, scroll_y: f32) {
        let effects = Self::advance_to(&mut self.lock(), scroll_y);
        effects.run(self.tweens.as_ref());
    }

    fn advance(&self, dt_ms: f32) {
        let mut seeks = Vec::new();
        {
            let mut state = self.lock();
            for binding in state.bindings.values_mut() {
                let (Scrub::Smoothed { seconds }, Some(handle)) =
                    (binding.spec.scrub, binding.spec.animation)
                else {
                    continue;
                };
                let gap = binding.progress - binding.applied;
                if gap.abs() <= f32::EPSILON {
                    continue;
                }
                let catch_up = if seconds <= 0.0 {
                    1.0
                } else {
                    1.0 - (-dt_ms / (seconds * 1000.0) * 5.0).exp()
                };
                binding.applied += gap * catch_up;
                if (binding.progress - binding.applied).abs() < SCRUB_EPSILON {
                    binding.applied = binding.progress;
                }
                seeks.push((handle, binding.applied));
            }
        }
        for (handle, progress) in seeks {
            self.tweens.seek(handle, progress);
        }
    }

    fn add_refresh_listener(&self, listener: RefreshListener) {
        self.lock().listeners.push(listener);
    }

    fn len(&self) -> usize {
        self.lock().bindings.len()
    }

    fn pin_spacing(&self) -> f32 {
        self.lock()
            .bindings
            .values()
            .filter(|b| b.spec.pin)
            .map(|b| b.placement.extent)
            .sum()
    }
}

impl std::fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TriggerRegistry")
            .field("bindings", &state.bindings.len())
            .field("listeners", &state.listeners.len())
            .field("scroll_y", &state.scroll_y)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::ToggleActions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vitrine_animation::{Easing, Position, Property, PropertyMap, Timeline, TweenRuntime, TweenVars};
    use vitrine_core::{Rect, Viewport};
    use vitrine_layout::Document;

    struct Fixture {
        doc: Arc<Document>,
        tweens: Arc<TweenRuntime>,
        registry: Arc<TriggerRegistry>,
        section: NodeId,
        track: NodeId,
    }

    fn fixture() -> Fixture {
        let doc = Arc::new(Document::new(Viewport::new(1000.0, 800.0)));
        let section = doc.spawn(Document::BODY, "section.gallery-container");
        let track = doc.spawn(section, ".gallery-track");
        doc.set_bounds(section, Rect::new(0.0, 1000.0, 1000.0, 800.0));
        let tweens = Arc::new(TweenRuntime::new());
        let registry = Arc::new(TriggerRegistry::new(doc.clone(), tweens.clone()));
        Fixture {
            doc,
            tweens,
            registry,
            section,
            track,
        }
    }

    fn slide(fx: &Fixture, distance: f32) -> AnimationHandle {
        let timeline = Timeline::new().from_to(
            &[fx.track],
            PropertyMap::of(Property::X, 0.0),
            PropertyMap::of(Property::X, -distance),
            TweenVars::new(1000, Easing::Linear),
            Position::Sequence,
        );
        fx.tweens.scrub(timeline).unwrap()
    }

    #[test]
    fn test_measurement() {
        let fx = fixture();
        let id = fx
            .registry
            .bind(BindingSpec::new(fx.section).extent(Extent::Fixed(2000.0)).pin(true))
            .unwrap();
        let info = fx.registry.info(id).unwrap();
        assert_eq!(info.start_px, 1000.0);
        assert_eq!(info.end_px, 3000.0);
        assert_eq!(info.distance(), 2000.0);
        assert!(!info.pinned);

        let late = fx
            .registry
            .bind(BindingSpec::new(fx.section).start_at(0.8))
            .unwrap();
        let info = fx.registry.info(late).unwrap();
        assert_eq!(info.start_px, 360.0);
        assert_eq!(info.end_px, 1160.0);

        let err = fx.registry.bind(BindingSpec::new(NodeId(999))).unwrap_err();
        assert!(err.is_missing_target());
    }

    #[test]
    fn test_pinned_binding_pushes_later_triggers_down() {
        let fx = fixture();
        let hero = fx.doc.spawn(Document::BODY, "section.hero");
        fx.doc.set_bounds(hero, Rect::new(0.0, 0.0, 1000.0, 800.0));
        let quote = fx.doc.spawn(Document::BODY, "p.quote");
        fx.doc.set_bounds(quote, Rect::new(0.0, 1900.0, 1000.0, 100.0));

        let intro = fx.registry.bind(BindingSpec::new(hero)).unwrap();
        let reveal = fx
            .registry
            .bind(BindingSpec::new(quote).start_at(0.8))
            .unwrap();
        assert_eq!(fx.registry.info(reveal).unwrap().start_px, 1260.0);

        let travel = Arc::new(Mutex::new(2000.0_f32));
        let t = travel.clone();
        let pin = fx
            .registry
            .bind(
                BindingSpec::new(fx.section)
                    .extent(Extent::Measured(Arc::new(move || *t.lock().unwrap())))
                    .pin(true),
            )
            .unwrap();
        assert_eq!(fx.registry.pin_spacing(), 2000.0);

        let pinned = fx.registry.info(pin).unwrap();
        let info = fx.registry.info(reveal).unwrap();
        assert_eq!((pinned.start_px, pinned.end_px), (1000.0, 3000.0));
        assert_eq!((info.start_px, info.end_px), (3260.0, 3360.0));
        assert_eq!(fx.registry.info(intro).unwrap().start_px, 0.0);

        // scrolling through the pinned range leaves the quote untouched
        fx.registry.update(2900.0);
        assert_eq!(fx.registry.info(reveal).unwrap().progress, 0.0);

        *travel.lock().unwrap() = 500.0;
        fx.registry.refresh_all();
        assert_eq!(fx.registry.pin_spacing(), 500.0);
        assert_eq!(fx.registry.info(reveal).unwrap().start_px, 1760.0);

        fx.registry.destroy(pin);
        assert_eq!(fx.registry.pin_spacing(), 0.0);
        assert_eq!(fx.registry.info(reveal).unwrap().start_px, 1260.0);
    }

    #[test]
    fn test_instant_scrub_and_pin() {
        let fx = fixture();
        let handle = slide(&fx, 2000.0);
        let id = fx
            .registry
            .bind(
                BindingSpec::new(fx.section)
                    .extent(Extent::Fixed(2000.0))
                    .pin(true)
                    .scrub(Scrub::Instant)
                    .animation(handle),
            )
            .unwrap();

        fx.registry.update(2000.0);
        let info = fx.registry.info(id).unwrap();
        assert!(info.pinned);
        assert_eq!(info.progress, 0.5);
        assert_eq!(fx.tweens.value(fx.track, Property::X), Some(-1000.0));

        fx.registry.update(5000.0);
        assert!(!fx.registry.info(id).unwrap().pinned);
        assert_eq!(fx.tweens.value(fx.track, Property::X), Some(-2000.0));
    }

    #[test]
    fn test_smoothed_scrub_catches_up() {
        let fx = fixture();
        let handle = slide(&fx, 2000.0);
        let id = fx
            .registry
            .bind(
                BindingSpec::new(fx.section)
                    .extent(Extent::Fixed(2000.0))
                    .scrub(Scrub::Smoothed { seconds: 1.0 })
                    .animation(handle),
            )
            .unwrap();

        fx.registry.update(3000.0);
        assert_eq!(fx.tweens.value(fx.track, Property::X), Some(0.0));

        fx.registry.advance(100.0);
        let partial = fx.registry.info(id).unwrap().applied_progress;
        assert!(partial > 0.0 && partial < 1.0);

        for _ in 0..100 {
            fx.registry.advance(100.0);
        }
        assert_eq!(fx.registry.info(id).unwrap().applied_progress, 1.0);
        assert_eq!(fx.tweens.value(fx.track, Property::X), Some(-2000.0));
    }

    #[test]
    fn test_callbacks_fire_on_crossings() {
        let fx = fixture();
        let entered = Arc::new(AtomicUsize::new(0));
        let entered_back = Arc::new(AtomicUsize::new(0));
        let (e, eb) = (entered.clone(), entered_back.clone());
        fx.registry
            .bind(
                BindingSpec::new(fx.section)
                    .on_enter(move || {
                        e.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_enter_back(move || {
                        eb.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .unwrap();

        fx.registry.update(1200.0);
        fx.registry.update(1300.0);
        assert_eq!(entered.load(Ordering::SeqCst), 1);

        fx.registry.update(4000.0);
        fx.registry.update(1500.0);
        assert_eq!(entered_back.load(Ordering::SeqCst), 1);

        fx.registry.update(0.0);
        fx.registry.update(4000.0);
        assert_eq!(entered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_toggle_actions_drive_animation() {
        let fx = fixture();
        let quote = fx.doc.spawn(Document::BODY, "p.quote");
        fx.doc.set_bounds(quote, Rect::new(0.0, 2000.0, 1000.0, 100.0));
        let timeline = Timeline::new().from(
            &[quote],
            PropertyMap::of(Property::Opacity, 0.0),
            TweenVars::new(100, Easing::Linear),
            Position::Sequence,
        );
        let handle = fx.tweens.scrub(timeline).unwrap();
        fx.registry
            .bind(
                BindingSpec::new(quote)
                    .start_at(0.8)
                    .animation(handle)
                    .toggle_actions("play none none reverse".parse::<ToggleActions>().unwrap()),
            )
            .unwrap();

        fx.registry.update(1400.0);
        fx.tweens.tick(100.0);
        assert_eq!(fx.tweens.value(quote, Property::Opacity), Some(1.0));

        fx.registry.update(1000.0);
        fx.tweens.tick(100.0);
        assert_eq!(fx.tweens.value(quote, Property::Opacity), Some(0.0));
        assert!(fx.tweens.is_active(handle));
    }

    #[test]
    fn test_destroy_for_region_kills_animations() {
        let fx = fixture();
        let handle = slide(&fx, 500.0);
        fx.registry
            .bind(BindingSpec::new(fx.section).animation(handle))
            .unwrap();
        fx.registry.bind(BindingSpec::new(fx.section)).unwrap();

        assert_eq!(fx.registry.bindings_for(fx.section).len(), 2);
        assert_eq!(fx.registry.destroy_for_region(fx.section), 2);
        assert_eq!(fx.registry.destroy_for_region(fx.section), 0);
        assert!(fx.registry.is_empty());
        assert!(!fx.tweens.is_active(handle));
    }

    #[test]
    fn test_refresh_remeasures_and_listeners_can_rebind() {
        let fx = fixture();
        let width = Arc::new(Mutex::new(2000.0_f32));
        let w = width.clone();
        let id = fx
            .registry
            .bind(
                BindingSpec::new(fx.section)
                    .extent(Extent::Measured(Arc::new(move || *w.lock().unwrap()))),
            )
            .unwrap();

        let registry = Arc::downgrade(&fx.registry);
        let section = fx.section;
        let rebinds = Arc::new(AtomicUsize::new(0));
        let counter = rebinds.clone();
        fx.registry.add_refresh_listener(Arc::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.bind(BindingSpec::new(section)).unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        *width.lock().unwrap() = 500.0;
        fx.doc.set_bounds(fx.section, Rect::new(0.0, 1200.0, 1000.0, 800.0));
        fx.registry.refresh_all();

        let info = fx.registry.info(id).unwrap();
        assert_eq!(info.start_px, 1200.0);
        assert_eq!(info.end_px, 1700.0);
        assert_eq!(rebinds.load(Ordering::SeqCst), 1);
        assert_eq!(fx.registry.len(), 2);
        assert_eq!(fx.registry.bindings().first(), Some(&id));
    }
}
