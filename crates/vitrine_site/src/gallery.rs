//! Gallery scroll-sync controller
//!
//! Keeps a pinned horizontal gallery in step with the page scroll. The
//! track's overflow (content width past the viewport) becomes both the
//! scroll distance the gallery stays pinned for and the distance the track
//! slides left; a progress line grows from 0 to 1 over the same range.
//!
//! Whenever the layout changes the binding is thrown away and rebuilt from a
//! fresh measurement, so at most one binding ever exists for the gallery.
//!
//! # Lifecycle
//!
//! ```text
//!            rebuild (overflow > 0)
//!   Unbound ─────────────────────────▶ Bound ──┐
//!      ▲                                  │    │ rebuild (overflow > 0)
//!      └──────────────────────────────────┘ ◀──┘
//!        rebuild (no overflow, missing track, engine failure)
//! ```

use crate::debounce::{Debouncer, TaskId};
use std::sync::{Arc, Mutex, MutexGuard};
use vitrine_animation::{
    AnimationHandle, Easing, Position, Property, PropertyMap, Timeline, TweenEngine, TweenVars,
};
use vitrine_core::fsm::{EventId, StateId, StateMachine};
use vitrine_core::{LayoutOracle, NodeId, Result, VitrineError};
use vitrine_scroll::{BindingId, BindingSpec, Extent, ScrollTrigger, Scrub};

const UNBOUND: StateId = 0;
const BOUND: StateId = 1;

const BIND: EventId = 0;
const RELEASE: EventId = 1;

/// Nominal length of the scrubbed timeline; only its proportions matter
const TIMELINE_MS: u32 = 500;

/// Whether a scroll binding currently drives the gallery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalleryState {
    Unbound,
    Bound,
}

/// What a rebuild did
#[derive(Clone, Debug, PartialEq)]
pub enum RebuildOutcome {
    /// A binding now covers `distance` pixels of scroll
    Bound { distance: f32 },
    /// The track fits the viewport; nothing to scroll
    Degenerate { distance: f32 },
    /// A required node is missing; the gallery stays inert
    Skipped,
    /// A collaborator rejected the request
    Failed(VitrineError),
}

/// Gallery nodes, resolved once at init
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GalleryRefs {
    /// Region that gets pinned
    pub container: Option<NodeId>,
    /// Element that slides horizontally
    pub track: Option<NodeId>,
    /// Element scaled along x as scroll progresses
    pub progress_line: Option<NodeId>,
}

/// Rebuilds the gallery's scroll binding from layout measurements
pub struct GallerySyncController {
    refs: GalleryRefs,
    layout: Arc<dyn LayoutOracle>,
    tweens: Arc<dyn TweenEngine>,
    triggers: Arc<dyn ScrollTrigger>,
    scrub: Scrub,
    machine: StateMachine,
    debouncer: Debouncer,
    distance: f32,
    binding: Option<BindingId>,
    animation: Option<AnimationHandle>,
    rebuilds: u64,
}

impl GallerySyncController {
    pub fn new(
        refs: GalleryRefs,
        layout: Arc<dyn LayoutOracle>,
        tweens: Arc<dyn TweenEngine>,
        triggers: Arc<dyn ScrollTrigger>,
    ) -> Self {
        let machine = StateMachine::builder(UNBOUND)
            .label(UNBOUND, "unbound")
            .label(BOUND, "bound")
            .on(UNBOUND, BIND, BOUND)
            .on(BOUND, BIND, BOUND)
            .on(BOUND, RELEASE, UNBOUND)
            .on(UNBOUND, RELEASE, UNBOUND)
            .build();

        Self {
            refs,
            layout,
            tweens,
            triggers,
            scrub: Scrub::Smoothed { seconds: 1.0 },
            machine,
            debouncer: Debouncer::new(250.0),
            distance: 0.0,
            binding: None,
            animation: None,
            rebuilds: 0,
        }
    }

    /// Resize settle window (ms)
    pub fn with_debounce(mut self, window_ms: f64) -> Self {
        self.debouncer = Debouncer::new(window_ms);
        self
    }

    pub fn with_scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }

    pub fn refs(&self) -> GalleryRefs {
        self.refs
    }

    /// How far the track extends past the viewport, never negative
    pub fn compute_overflow(&self) -> Result<f32> {
        let track = self
            .refs
            .track
            .ok_or_else(|| VitrineError::missing("gallery track"))?;
        let content = self
            .layout
            .content_width(track)
            .ok_or_else(|| VitrineError::missing(format!("gallery track {track:?} is not laid out")))?;
        let viewport = self.layout.viewport().width;
        Ok((content - viewport).max(0.0))
    }

    /// Destroy the current binding and create a new one from fresh
    /// measurements. Never fails; the outcome says what happened.
    pub fn rebuild(&mut self) -> RebuildOutcome {
        self.rebuilds += 1;

        if let Some(container) = self.refs.container {
            let destroyed = self.triggers.destroy_for_region(container);
            if destroyed > 0 {
                tracing::debug!(destroyed, "previous gallery binding destroyed");
            }
        }
        if let Some(animation) = self.animation.take() {
            self.tweens.kill(animation);
        }
        self.binding = None;
        self.distance = 0.0;

        let outcome = match self.try_bind() {
            Ok(outcome) => outcome,
            Err(err) if err.is_missing_target() => {
                tracing::debug!(%err, "gallery not bound");
                RebuildOutcome::Skipped
            }
            Err(err) => {
                tracing::error!(%err, "gallery rebuild failed");
                RebuildOutcome::Failed(err)
            }
        };

        match outcome {
            RebuildOutcome::Bound { .. } => self.machine.send(BIND),
            _ => self.machine.send(RELEASE),
        };
        outcome
    }

    fn try_bind(&mut self) -> Result<RebuildOutcome> {
        let container = self
            .refs
            .container
            .ok_or_else(|| VitrineError::missing("gallery container"))?;
        let distance = self.compute_overflow()?;

        if distance <= 0.0 {
            tracing::warn!(distance, "gallery track fits the viewport, not binding");
            return Ok(RebuildOutcome::Degenerate { distance });
        }
        let track = self
            .refs
            .track
            .ok_or_else(|| VitrineError::missing("gallery track"))?;

        let vars = TweenVars::new(TIMELINE_MS, Easing::Linear);
        let mut timeline = Timeline::new().from_to(
            &[track],
            PropertyMap::of(Property::X, 0.0),
            PropertyMap::of(Property::X, -distance),
            vars,
            Position::Sequence,
        );
        if let Some(line) = self.refs.progress_line {
            timeline = timeline.from_to(
                &[line],
                PropertyMap::of(Property::ScaleX, 0.0),
                PropertyMap::of(Property::ScaleX, 1.0),
                vars,
                Position::WithPrevious,
            );
        }

        let animation = self.tweens.scrub(timeline)?;
        let spec = BindingSpec::new(container)
            .extent(Extent::Fixed(distance))
            .pin(true)
            .scrub(self.scrub)
            .animation(animation);
        let binding = match self.triggers.bind(spec) {
            Ok(binding) => binding,
            Err(err) => {
                self.tweens.kill(animation);
                return Err(err);
            }
        };

        self.distance = distance;
        self.binding = Some(binding);
        self.animation = Some(animation);
        tracing::debug!(distance, "gallery bound");
        Ok(RebuildOutcome::Bound { distance })
    }

    /// Note a resize; the rebuild waits for the layout to settle
    pub fn on_resize(&mut self, now_ms: f64) -> TaskId {
        self.debouncer.schedule(now_ms)
    }

    /// Run the debounced rebuild once its window has passed, then refresh
    /// every scroll trigger so later bindings see the new layout
    pub fn poll(&mut self, now_ms: f64) -> Option<RebuildOutcome> {
        let task = self.debouncer.fire_due(now_ms)?;
        tracing::debug!(task = task.0, "debounced gallery rebuild");
        let outcome = self.rebuild();
        self.triggers.refresh_all();
        Some(outcome)
    }

    /// Initial build once the page is ready
    pub fn on_ready(&mut self) -> RebuildOutcome {
        self.rebuild()
    }

    pub fn state(&self) -> GalleryState {
        if self.machine.is_in(BOUND) {
            GalleryState::Bound
        } else {
            GalleryState::Unbound
        }
    }

    /// Scroll distance of the current binding, 0 when unbound
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn binding(&self) -> Option<BindingId> {
        self.binding
    }

    pub fn animation(&self) -> Option<AnimationHandle> {
        self.animation
    }

    pub fn pending_rebuild(&self) -> Option<TaskId> {
        self.debouncer.pending()
    }

    /// Number of rebuilds run so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Recent state transitions, oldest first
    pub fn history(&self) -> Vec<(GalleryState, GalleryState)> {
        let to_state = |id: StateId| {
            if id == BOUND {
                GalleryState::Bound
            } else {
                GalleryState::Unbound
            }
        };
        self.machine
            .history()
            .iter()
            .map(|&(from, _, to)| (to_state(from), to_state(to)))
            .collect()
    }
}

impl std::fmt::Debug for GallerySyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GallerySyncController")
            .field("refs", &self.refs)
            .field("state", &self.state())
            .field("distance", &self.distance)
            .field("binding", &self.binding)
            .field("rebuilds", &self.rebuilds)
            .finish()
    }
}

/// Controller shared between event handlers and threads.
///
/// Every operation holds the lock for its whole duration, so two rebuilds
/// never interleave.
#[derive(Clone, Debug)]
pub struct SharedGallery(Arc<Mutex<GallerySyncController>>);

impl SharedGallery {
    pub fn new(controller: GallerySyncController) -> Self {
        Self(Arc::new(Mutex::new(controller)))
    }

    /// Exclusive access to the controller
    pub fn lock(&self) -> MutexGuard<'_, GallerySyncController> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn rebuild(&self) -> RebuildOutcome {
        self.lock().rebuild()
    }

    pub fn on_resize(&self, now_ms: f64) -> TaskId {
        self.lock().on_resize(now_ms)
    }

    pub fn poll(&self, now_ms: f64) -> Option<RebuildOutcome> {
        self.lock().poll(now_ms)
    }

    pub fn on_ready(&self) -> RebuildOutcome {
        self.lock().on_ready()
    }

    pub fn state(&self) -> GalleryState {
        self.lock().state()
    }

    pub fn distance(&self) -> f32 {
        self.lock().distance()
    }

    pub fn binding(&self) -> Option<BindingId> {
        self.lock().binding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vitrine_animation::TweenRuntime;
    use vitrine_core::{Rect, Viewport};
    use vitrine_layout::{Document, Page};
    use vitrine_scroll::TriggerRegistry;

    struct Fixture {
        doc: Arc<Document>,
        tweens: Arc<TweenRuntime>,
        triggers: Arc<TriggerRegistry>,
        refs: GalleryRefs,
    }

    fn page(content: f32, viewport: f32) -> Fixture {
        let doc = Arc::new(Document::new(Viewport::new(viewport, 800.0)));
        let container = doc.spawn(Document::BODY, "section.gallery-container");
        let track = doc.spawn(container, ".gallery-track");
        let line = doc.spawn(container, ".line");
        doc.set_bounds(container, Rect::new(0.0, 900.0, viewport, 800.0));
        doc.set_bounds(track, Rect::new(0.0, 900.0, viewport, 600.0));
        doc.set_content_width(track, content);

        let tweens = Arc::new(TweenRuntime::new());
        let triggers = Arc::new(TriggerRegistry::new(doc.clone(), tweens.clone()));
        Fixture {
            doc,
            tweens,
            triggers,
            refs: GalleryRefs {
                container: Some(container),
                track: Some(track),
                progress_line: Some(line),
            },
        }
    }

    fn controller(page: &Fixture) -> GallerySyncController {
        GallerySyncController::new(
            page.refs,
            page.doc.clone(),
            page.tweens.clone(),
            page.triggers.clone(),
        )
    }

    #[test]
    fn test_overflow_is_never_negative() {
        let wide = page(3000.0, 1000.0);
        assert_eq!(controller(&wide).compute_overflow(), Ok(2000.0));

        let narrow = page(800.0, 1000.0);
        assert_eq!(controller(&narrow).compute_overflow(), Ok(0.0));

        let mut missing = page(3000.0, 1000.0);
        missing.refs.track = None;
        assert!(controller(&missing)
            .compute_overflow()
            .unwrap_err()
            .is_missing_target());
    }

    #[test]
    fn test_ready_binds_when_track_overflows() {
        let page = page(3000.0, 1000.0);
        let mut gallery = controller(&page);

        assert_eq!(gallery.on_ready(), RebuildOutcome::Bound { distance: 2000.0 });
        assert_eq!(gallery.state(), GalleryState::Bound);
        assert_eq!(gallery.distance(), 2000.0);

        let info = page.triggers.info(gallery.binding().unwrap()).unwrap();
        assert!(info.pin);
        assert_eq!(info.distance(), 2000.0);
    }

    #[test]
    fn test_degenerate_layout_stays_unbound() {
        let page = page(800.0, 1000.0);
        let mut gallery = controller(&page);

        assert_eq!(gallery.on_ready(), RebuildOutcome::Degenerate { distance: 0.0 });
        assert_eq!(gallery.state(), GalleryState::Unbound);
        assert_eq!(gallery.binding(), None);
        assert!(page.triggers.is_empty());
    }

    #[test]
    fn test_track_exactly_filling_viewport_is_degenerate() {
        let page = page(1000.0, 1000.0);
        let mut gallery = controller(&page);

        assert_eq!(gallery.compute_overflow(), Ok(0.0));
        assert_eq!(gallery.on_ready(), RebuildOutcome::Degenerate { distance: 0.0 });
        assert_eq!(gallery.state(), GalleryState::Unbound);
        assert!(page.triggers.is_empty());
        assert_eq!(page.tweens.active_count(), 0);
    }

    #[test]
    fn test_repeated_rebuilds_keep_one_binding() {
        let page = page(3000.0, 1000.0);
        let mut gallery = controller(&page);
        let container = page.refs.container.unwrap();

        gallery.rebuild();
        let first = gallery.animation().unwrap();
        gallery.rebuild();

        assert_eq!(page.triggers.bindings_for(container).len(), 1);
        assert!(!page.tweens.is_active(first));
        assert_eq!(page.tweens.active_count(), 1);
        assert_eq!(
            gallery.history(),
            vec![
                (GalleryState::Unbound, GalleryState::Bound),
                (GalleryState::Bound, GalleryState::Bound),
            ]
        );
    }

    #[test]
    fn test_shrinking_layout_releases_binding() {
        let page = page(3000.0, 1000.0);
        let mut gallery = controller(&page);
        gallery.on_ready();

        page.doc.set_content_width(page.refs.track.unwrap(), 900.0);
        assert_eq!(gallery.rebuild(), RebuildOutcome::Degenerate { distance: 0.0 });
        assert_eq!(gallery.state(), GalleryState::Unbound);
        assert!(page.triggers.is_empty());
        assert_eq!(page.tweens.active_count(), 0);
    }

    #[test]
    fn test_missing_nodes_skip() {
        let mut no_track = page(3000.0, 1000.0);
        no_track.refs.track = None;
        assert_eq!(controller(&no_track).on_ready(), RebuildOutcome::Skipped);

        let mut no_container = page(3000.0, 1000.0);
        no_container.refs.container = None;
        let mut gallery = controller(&no_container);
        assert_eq!(gallery.on_ready(), RebuildOutcome::Skipped);
        assert_eq!(gallery.state(), GalleryState::Unbound);
    }

    #[test]
    fn test_unmeasurable_container_skips_and_recovers() {
        let mut page = page(3000.0, 1000.0);
        page.refs.container = Some(NodeId(4242));
        let mut gallery = controller(&page);

        assert!(matches!(gallery.rebuild(), RebuildOutcome::Skipped));
        assert_eq!(page.tweens.active_count(), 0);

        gallery.refs.container = page.doc.query(".gallery-container");
        assert_eq!(gallery.rebuild(), RebuildOutcome::Bound { distance: 2000.0 });
    }

    /// Rejects the first `failures` binds, then defers to a real registry
    struct FlakyTriggers {
        inner: Arc<TriggerRegistry>,
        failures: AtomicUsize,
    }

    impl ScrollTrigger for FlakyTriggers {
        fn bind(&self, spec: BindingSpec) -> Result<BindingId> {
            let rejected = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                return Err(VitrineError::engine("trigger engine unavailable"));
            }
            self.inner.bind(spec)
        }
        fn destroy(&self, id: BindingId) -> bool {
            self.inner.destroy(id)
        }
        fn bindings_for(&self, region: NodeId) -> Vec<BindingId> {
            self.inner.bindings_for(region)
        }
        fn info(&self, id: BindingId) -> Option<vitrine_scroll::BindingInfo> {
            self.inner.info(id)
        }
        fn refresh_all(&self) {
            self.inner.refresh_all()
        }
        fn update(&self, scroll_y: f32) {
            self.inner.update(scroll_y)
        }
        fn advance(&self, dt_ms: f32) {
            self.inner.advance(dt_ms)
        }
        fn add_refresh_listener(&self, listener: vitrine_scroll::RefreshListener) {
            self.inner.add_refresh_listener(listener)
        }
        fn len(&self) -> usize {
            self.inner.len()
        }
        fn pin_spacing(&self) -> f32 {
            self.inner.pin_spacing()
        }
    }

    #[test]
    fn test_engine_failure_is_contained() {
        let page = page(3000.0, 1000.0);
        let mut gallery = GallerySyncController::new(
            page.refs,
            page.doc.clone(),
            page.tweens.clone(),
            Arc::new(FlakyTriggers {
                inner: page.triggers.clone(),
                failures: AtomicUsize::new(2),
            }),
        );

        assert!(matches!(
            gallery.on_ready(),
            RebuildOutcome::Failed(VitrineError::Engine(_))
        ));
        assert_eq!(gallery.state(), GalleryState::Unbound);
        assert_eq!(page.tweens.active_count(), 0);

        // later resizes still rebuild through the debouncer
        gallery.on_resize(1000.0);
        assert_eq!(gallery.poll(1100.0), None);
        assert!(matches!(
            gallery.poll(1250.0),
            Some(RebuildOutcome::Failed(VitrineError::Engine(_)))
        ));
        assert_eq!(page.tweens.active_count(), 0);

        gallery.on_resize(2000.0);
        assert_eq!(
            gallery.poll(2250.0),
            Some(RebuildOutcome::Bound { distance: 2000.0 })
        );
        assert_eq!(gallery.state(), GalleryState::Bound);
        assert_eq!(page.triggers.len(), 1);
        assert_eq!(gallery.rebuild_count(), 3);
    }

    #[test]
    fn test_track_and_line_finish_together() {
        let page = page(3000.0, 1000.0);
        let mut gallery = controller(&page).with_scrub(Scrub::Instant);
        gallery.on_ready();
        let track = page.refs.track.unwrap();
        let line = page.refs.progress_line.unwrap();

        page.triggers.update(900.0 + 1000.0);
        assert_eq!(page.tweens.value(track, Property::X), Some(-1000.0));
        assert_eq!(page.tweens.value(line, Property::ScaleX), Some(0.5));

        page.triggers.update(900.0 + 2000.0);
        assert_eq!(page.tweens.value(track, Property::X), Some(-2000.0));
        assert_eq!(page.tweens.value(line, Property::ScaleX), Some(1.0));
    }

    #[test]
    fn test_resize_burst_rebuilds_once_with_last_layout() {
        let page = page(1800.0, 1000.0);
        let mut gallery = controller(&page);
        gallery.on_ready();

        page.doc.set_viewport(Viewport::new(800.0, 800.0));
        gallery.on_resize(0.0);
        page.doc.set_viewport(Viewport::new(1024.0, 800.0));
        gallery.on_resize(100.0);

        assert_eq!(gallery.poll(250.0), None);
        assert_eq!(gallery.poll(350.0), Some(RebuildOutcome::Bound { distance: 776.0 }));
        assert_eq!(gallery.poll(1000.0), None);
        assert_eq!(gallery.rebuild_count(), 2);
    }
}
