//! In-process tween engine
//!
//! Holds every live animation and the last written value of every animated
//! property. Time-driven animations advance in [`TweenRuntime::tick`];
//! scrubbed ones only move when seeked.

use crate::timeline::{Position, Timeline, ValueStore};
use crate::tween::{AnimationHandle, Property, PropertyMap, TweenEngine, TweenVars};
use slotmap::SlotMap;
use std::sync::{Mutex, MutexGuard};
use vitrine_core::{NodeId, Result, VitrineError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
    Paused,
}

struct Playback {
    timeline: Timeline,
    time_ms: f32,
    direction: Direction,
    /// Dropped automatically once finished
    transient: bool,
}

impl Playback {
    fn progress(&self) -> f32 {
        let duration = self.timeline.duration_ms();
        if duration == 0 {
            return 1.0;
        }
        (self.time_ms / duration as f32).clamp(0.0, 1.0)
    }
}

#[derive(Default)]
struct RuntimeState {
    animations: SlotMap<AnimationHandle, Playback>,
    values: ValueStore,
}

/// The default [`TweenEngine`] implementation
#[derive(Default)]
pub struct TweenRuntime {
    state: Mutex<RuntimeState>,
}

impl TweenRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, mut timeline: Timeline, direction: Direction, transient: bool) -> AnimationHandle {
        let mut state = self.lock();
        let RuntimeState { animations, values } = &mut *state;
        timeline.resolve(values);
        timeline.render(0.0, values);
        animations.insert(Playback {
            timeline,
            time_ms: 0.0,
            direction,
            transient,
        })
    }

    /// Advance every playing animation by `dt_ms` milliseconds
    pub fn tick(&self, dt_ms: f32) {
        let mut state = self.lock();
        let RuntimeState { animations, values } = &mut *state;
        let mut finished = Vec::new();

        for (handle, playback) in animations.iter_mut() {
            let duration = playback.timeline.duration_ms() as f32;
            match playback.direction {
                Direction::Paused => continue,
                Direction::Forward => {
                    playback.time_ms = (playback.time_ms + dt_ms).min(duration);
                    if playback.time_ms >= duration {
                        playback.direction = Direction::Paused;
                    }
                }
                Direction::Backward => {
                    playback.time_ms = (playback.time_ms - dt_ms).max(0.0);
                    if playback.time_ms <= 0.0 {
                        playback.direction = Direction::Paused;
                    }
                }
            }
            playback.timeline.render(playback.time_ms, values);
            if playback.direction == Direction::Paused && playback.transient {
                finished.push(handle);
            }
        }

        for handle in finished {
            animations.remove(handle);
        }
    }

    /// Number of live animations
    pub fn active_count(&self) -> usize {
        self.lock().animations.len()
    }

    /// Number of animations currently advancing with time
    pub fn running_count(&self) -> usize {
        self.lock()
            .animations
            .values()
            .filter(|p| p.direction != Direction::Paused)
            .count()
    }
}

impl TweenEngine for TweenRuntime {
    fn animate(
        &self,
        targets: &[NodeId],
        from: Option<&PropertyMap>,
        to: &PropertyMap,
        vars: TweenVars,
    ) -> Result<AnimationHandle> {
        if targets.is_empty() {
            return Err(VitrineError::engine("tween has no targets"));
        }
        if to.is_empty() && from.map_or(true, PropertyMap::is_empty) {
            return Err(VitrineError::engine("tween has no properties"));
        }
        let mut timeline = Timeline::new();
        timeline.add(targets, from, to, vars, Position::Sequence);
        Ok(self.insert(timeline, Direction::Forward, true))
    }

    fn set(&self, targets: &[NodeId], props: &PropertyMap) {
        let mut state = self.lock();
        for &target in targets {
            for (property, value) in props.iter() {
                state.values.insert((target, property), value);
            }
        }
    }

    fn play(&self, timeline: Timeline) -> Result<AnimationHandle> {
        Ok(self.insert(timeline, Direction::Forward, false))
    }

    fn scrub(&self, timeline: Timeline) -> Result<AnimationHandle> {
        if timeline.is_empty() {
            return Err(VitrineError::engine("cannot scrub an empty timeline"));
        }
        Ok(self.insert(timeline, Direction::Paused, false))
    }

    fn seek(&self, handle: AnimationHandle, progress: f32) -> bool {
        let mut state = self.lock();
        let RuntimeState { animations, values } = &mut *state;
        let Some(playback) = animations.get_mut(handle) else {
            return false;
        };
        let duration = playback.timeline.duration_ms() as f32;
        playback.time_ms = progress.clamp(0.0, 1.0) * duration;
        playback.timeline.render(playback.time_ms, values);
        true
    }

    fn progress(&self, handle: AnimationHandle) -> Option<f32> {
        self.lock().animations.get(handle).map(Playback::progress)
    }

    fn resume(&self, handle: AnimationHandle) -> bool {
        let mut state = self.lock();
        match state.animations.get_mut(handle) {
            Some(playback) => {
                playback.direction = Direction::Forward;
                true
            }
            None => false,
        }
    }

    fn reverse(&self, handle: AnimationHandle) -> bool {
        let mut state = self.lock();
        match state.animations.get_mut(handle) {
            Some(playback) => {
                playback.direction = Direction::Backward;
                true
            }
            None => false,
        }
    }

    fn pause(&self, handle: AnimationHandle) -> bool {
        let mut state = self.lock();
        match state.animations.get_mut(handle) {
            Some(playback) => {
                playback.direction = Direction::Paused;
                true
            }
            None => false,
        }
    }

    fn complete_and_kill(&self, handle: AnimationHandle) -> bool {
        let mut state = self.lock();
        let RuntimeState { animations, values } = &mut *state;
        match animations.remove(handle) {
            Some(playback) => {
                let end = playback.timeline.duration_ms() as f32;
                playback.timeline.render(end, values);
                true
            }
            None => false,
        }
    }

    fn kill(&self, handle: AnimationHandle) -> bool {
        self.lock().animations.remove(handle).is_some()
    }

    fn is_active(&self, handle: AnimationHandle) -> bool {
        self.lock().animations.contains_key(handle)
    }

    fn value(&self, target: NodeId, property: Property) -> Option<f32> {
        self.lock().values.get(&(target, property)).copied()
    }
}

impl std::fmt::Debug for TweenRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TweenRuntime")
            .field("animations", &state.animations.len())
            .field("values", &state.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    const CARD: NodeId = NodeId(1);
    const LINE: NodeId = NodeId(2);

    #[test]
    fn test_to_tween_runs_and_is_dropped() {
        let engine = TweenRuntime::new();
        let handle = engine
            .to(
                &[CARD],
                &PropertyMap::of(Property::Scale, 2.0),
                TweenVars::new(100, Easing::Linear),
            )
            .unwrap();

        assert_eq!(engine.value(CARD, Property::Scale), Some(1.0));
        engine.tick(50.0);
        assert!((engine.value_or_rest(CARD, Property::Scale) - 1.5).abs() < 1e-5);
        engine.tick(60.0);
        assert_eq!(engine.value(CARD, Property::Scale), Some(2.0));
        assert!(!engine.is_active(handle));
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_from_tween_renders_immediately() {
        let engine = TweenRuntime::new();
        engine
            .from(
                &[CARD],
                &PropertyMap::of(Property::Y, 80.0).with(Property::Opacity, 0.0),
                TweenVars::new(800, Easing::CircOut),
            )
            .unwrap();

        assert_eq!(engine.value(CARD, Property::Y), Some(80.0));
        assert_eq!(engine.value(CARD, Property::Opacity), Some(0.0));
        engine.tick(800.0);
        assert_eq!(engine.value(CARD, Property::Y), Some(0.0));
        assert_eq!(engine.value(CARD, Property::Opacity), Some(1.0));
    }

    #[test]
    fn test_scrubbed_timeline_follows_seek() {
        let engine = TweenRuntime::new();
        let timeline = Timeline::new()
            .from_to(
                &[CARD],
                PropertyMap::of(Property::X, 0.0),
                PropertyMap::of(Property::X, -2000.0),
                TweenVars::new(500, Easing::Linear),
                Position::Sequence,
            )
            .from_to(
                &[LINE],
                PropertyMap::of(Property::ScaleX, 0.0),
                PropertyMap::of(Property::ScaleX, 1.0),
                TweenVars::new(500, Easing::Linear),
                Position::WithPrevious,
            );
        let handle = engine.scrub(timeline).unwrap();

        engine.tick(1000.0);
        assert_eq!(engine.value(CARD, Property::X), Some(0.0));

        assert!(engine.seek(handle, 0.5));
        assert_eq!(engine.value(CARD, Property::X), Some(-1000.0));
        assert_eq!(engine.value(LINE, Property::ScaleX), Some(0.5));
        assert_eq!(engine.progress(handle), Some(0.5));

        assert!(engine.kill(handle));
        assert!(!engine.seek(handle, 1.0));
        assert_eq!(engine.value(CARD, Property::X), Some(-1000.0));
    }

    #[test]
    fn test_reverse_and_complete() {
        let engine = TweenRuntime::new();
        let timeline = Timeline::new().from(
            &[CARD],
            PropertyMap::of(Property::Opacity, 0.0),
            TweenVars::new(100, Easing::Linear),
            Position::Sequence,
        );
        let handle = engine.scrub(timeline).unwrap();
        assert_eq!(engine.running_count(), 0);

        engine.resume(handle);
        engine.tick(100.0);
        assert_eq!(engine.value(CARD, Property::Opacity), Some(1.0));

        engine.reverse(handle);
        engine.tick(40.0);
        assert!((engine.value_or_rest(CARD, Property::Opacity) - 0.6).abs() < 1e-5);
        engine.tick(100.0);
        assert_eq!(engine.value(CARD, Property::Opacity), Some(0.0));
        assert!(engine.is_active(handle));

        assert!(engine.complete_and_kill(handle));
        assert_eq!(engine.value(CARD, Property::Opacity), Some(1.0));
        assert!(!engine.is_active(handle));
    }

    #[test]
    fn test_pause_holds_position() {
        let engine = TweenRuntime::new();
        let timeline = Timeline::new().to(
            &[CARD],
            PropertyMap::of(Property::Y, 100.0),
            TweenVars::new(200, Easing::Linear),
            Position::Sequence,
        );
        let handle = engine.play(timeline).unwrap();
        engine.tick(50.0);
        assert!(engine.pause(handle));
        engine.tick(100.0);
        assert_eq!(engine.value(CARD, Property::Y), Some(25.0));
        assert_eq!(engine.running_count(), 0);
    }

    #[test]
    fn test_rejects_empty_requests() {
        let engine = TweenRuntime::new();
        let vars = TweenVars::default();
        assert!(engine.to(&[], &PropertyMap::of(Property::X, 1.0), vars).is_err());
        assert!(engine.to(&[CARD], &PropertyMap::new(), vars).is_err());
        assert!(engine.scrub(Timeline::new()).is_err());
    }
}
