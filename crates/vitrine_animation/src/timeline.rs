//! Timeline orchestration for multiple tweens
//!
//! A timeline is a flat list of per-target entries with absolute start times.
//! Position parameters decide where each new tween lands relative to what is
//! already there. Start and end values missing from a tween are resolved when
//! the timeline is handed to the engine, chaining through earlier entries that
//! touch the same property.

use crate::easing::Easing;
use crate::tween::{Property, PropertyMap, TweenVars};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use vitrine_core::NodeId;

/// Property values keyed by element and property
pub(crate) type ValueStore = FxHashMap<(NodeId, Property), f32>;

/// Where a tween is inserted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    /// At the current end of the timeline
    #[default]
    Sequence,
    /// Together with the previously added tween (`"<"`)
    WithPrevious,
    /// Relative to the current end (`"-=1"` is `Offset(-1000)`)
    Offset(i32),
    /// Absolute time in milliseconds
    At(u32),
}

#[derive(Clone, Debug)]
struct Track {
    property: Property,
    from: Option<f32>,
    to: Option<f32>,
    resolved: (f32, f32),
}

#[derive(Clone, Debug)]
struct TimelineEntry {
    target: NodeId,
    start_ms: u32,
    duration_ms: u32,
    easing: Easing,
    tracks: SmallVec<[Track; 2]>,
}

impl TimelineEntry {
    fn sample(&self, track: &Track, time_ms: f32) -> f32 {
        let (from, to) = track.resolved;
        let local = time_ms - self.start_ms as f32;
        if self.duration_ms == 0 || local >= self.duration_ms as f32 {
            return to;
        }
        let progress = (local / self.duration_ms as f32).clamp(0.0, 1.0);
        from + (to - from) * self.easing.apply(progress)
    }
}

/// A timeline that orchestrates multiple tweens
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    duration_ms: u32,
    last_start_ms: u32,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tween. Each target becomes one entry, offset by the stagger.
    pub fn add(
        &mut self,
        targets: &[NodeId],
        from: Option<&PropertyMap>,
        to: &PropertyMap,
        vars: TweenVars,
        position: Position,
    ) {
        let base = match position {
            Position::Sequence => self.duration_ms as i64,
            Position::WithPrevious => self.last_start_ms as i64,
            Position::Offset(delta) => self.duration_ms as i64 + delta as i64,
            Position::At(at) => at as i64,
        };
        let start = base.max(0) as u32 + vars.delay_ms;
        self.last_start_ms = start;

        let mut properties: SmallVec<[Property; 4]> = SmallVec::new();
        for property in from
            .into_iter()
            .flat_map(|map| map.properties())
            .chain(to.properties())
        {
            if !properties.contains(&property) {
                properties.push(property);
            }
        }

        for (index, &target) in targets.iter().enumerate() {
            let entry_start = start + vars.stagger_ms * index as u32;
            let tracks = properties
                .iter()
                .map(|&property| Track {
                    property,
                    from: from.and_then(|map| map.get(property)),
                    to: to.get(property),
                    resolved: (property.rest_value(), property.rest_value()),
                })
                .collect();
            self.entries.push(TimelineEntry {
                target,
                start_ms: entry_start,
                duration_ms: vars.duration_ms,
                easing: vars.easing,
                tracks,
            });
            self.duration_ms = self.duration_ms.max(entry_start + vars.duration_ms);
        }
    }

    /// Builder: tween from current values
    pub fn to(mut self, targets: &[NodeId], to: PropertyMap, vars: TweenVars, position: Position) -> Self {
        self.add(targets, None, &to, vars, position);
        self
    }

    /// Builder: tween toward current values
    pub fn from(mut self, targets: &[NodeId], from: PropertyMap, vars: TweenVars, position: Position) -> Self {
        self.add(targets, Some(&from), &PropertyMap::new(), vars, position);
        self
    }

    /// Builder: tween with both ends explicit
    pub fn from_to(
        mut self,
        targets: &[NodeId],
        from: PropertyMap,
        to: PropertyMap,
        vars: TweenVars,
        position: Position,
    ) -> Self {
        self.add(targets, Some(&from), &to, vars, position);
        self
    }

    /// Total length in milliseconds
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Number of per-target entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start and end time of the first entry animating `target`/`property`
    pub fn span_of(&self, target: NodeId, property: Property) -> Option<(u32, u32)> {
        self.entries
            .iter()
            .find(|entry| {
                entry.target == target && entry.tracks.iter().any(|t| t.property == property)
            })
            .map(|entry| (entry.start_ms, entry.start_ms + entry.duration_ms))
    }

    /// Fill in missing start/end values, chaining entries in start order
    pub(crate) fn resolve(&mut self, values: &ValueStore) {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&idx| (self.entries[idx].start_ms, idx));

        let mut chain: ValueStore = FxHashMap::default();
        for idx in order {
            let entry = &mut self.entries[idx];
            for track in entry.tracks.iter_mut() {
                let key = (entry.target, track.property);
                let current = chain
                    .get(&key)
                    .or_else(|| values.get(&key))
                    .copied()
                    .unwrap_or_else(|| track.property.rest_value());
                let from = track.from.unwrap_or(current);
                let to = track.to.unwrap_or(current);
                track.resolved = (from, to);
                chain.insert(key, to);
            }
        }
    }

    /// Write every property's value at `time_ms` into the store.
    ///
    /// For each property the latest-starting entry that has begun wins;
    /// properties whose entries have not begun show the earliest entry's start
    /// value.
    pub(crate) fn render(&self, time_ms: f32, values: &mut ValueStore) {
        let mut started: FxHashMap<(NodeId, Property), (u32, usize, f32)> = FxHashMap::default();
        let mut pending: FxHashMap<(NodeId, Property), (u32, usize, f32)> = FxHashMap::default();

        for (idx, entry) in self.entries.iter().enumerate() {
            let begun = time_ms >= entry.start_ms as f32;
            for track in &entry.tracks {
                let key = (entry.target, track.property);
                if begun {
                    let candidate = (entry.start_ms, idx, entry.sample(track, time_ms));
                    match started.get(&key) {
                        Some(&(start, order, _)) if (start, order) > (candidate.0, candidate.1) => {}
                        _ => {
                            started.insert(key, candidate);
                        }
                    }
                } else {
                    let candidate = (entry.start_ms, idx, track.resolved.0);
                    match pending.get(&key) {
                        Some(&(start, order, _)) if (start, order) < (candidate.0, candidate.1) => {}
                        _ => {
                            pending.insert(key, candidate);
                        }
                    }
                }
            }
        }

        for (key, (_, _, value)) in pending {
            if !started.contains_key(&key) {
                values.insert(key, value);
            }
        }
        for (key, (_, _, value)) in started {
            values.insert(key, value);
        }
    }
}
