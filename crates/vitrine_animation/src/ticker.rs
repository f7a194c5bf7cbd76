//! Frame ticker
//!
//! Calls every registered callback once per frame with the elapsed time and a
//! delta ratio (elapsed frame time over the nominal frame time) for
//! frame-rate independent smoothing.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct TickerCallbackId;
}

/// Timing of the frame being delivered
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    /// Ticker time in milliseconds, lag adjustments included
    pub time_ms: f64,
    pub delta_ms: f64,
    /// `delta_ms` divided by the nominal frame time; 1.0 at the target rate
    pub delta_ratio: f64,
    pub frame: u64,
}

/// Per-frame callback
pub type TickCallback = Box<dyn FnMut(&FrameInfo) + Send>;

/// Drives per-frame callbacks from host timestamps
pub struct Ticker {
    callbacks: SlotMap<TickerCallbackId, TickCallback>,
    last_now: Option<f64>,
    time_ms: f64,
    frame: u64,
    target_fps: u32,
    /// Deltas above this are treated as lag; 0 disables lag smoothing
    lag_threshold_ms: f64,
    adjusted_lag_ms: f64,
    last_delta_ratio: f64,
}

impl Ticker {
    pub fn new() -> Self {
        Self {
            callbacks: SlotMap::with_key(),
            last_now: None,
            time_ms: 0.0,
            frame: 0,
            target_fps: 60,
            lag_threshold_ms: 500.0,
            adjusted_lag_ms: 33.0,
            last_delta_ratio: 1.0,
        }
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps.max(1);
    }

    /// Clamp deltas larger than `threshold_ms` to `adjusted_ms`.
    ///
    /// A threshold of zero disables lag smoothing, so a long stall is reported
    /// as-is and time-based consumers catch up in one step.
    pub fn set_lag_smoothing(&mut self, threshold_ms: f64, adjusted_ms: f64) {
        self.lag_threshold_ms = threshold_ms.max(0.0);
        self.adjusted_lag_ms = adjusted_ms.max(0.0);
    }

    pub fn add<F>(&mut self, callback: F) -> TickerCallbackId
    where
        F: FnMut(&FrameInfo) + Send + 'static,
    {
        self.callbacks.insert(Box::new(callback))
    }

    pub fn remove(&mut self, id: TickerCallbackId) -> bool {
        self.callbacks.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn nominal_frame_ms(&self) -> f64 {
        1000.0 / self.target_fps as f64
    }

    /// Delta ratio of the last delivered frame
    pub fn delta_ratio(&self) -> f64 {
        self.last_delta_ratio
    }

    /// Ticker time in milliseconds
    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    /// Deliver a frame for host timestamp `now_ms`
    pub fn tick(&mut self, now_ms: f64) -> FrameInfo {
        let mut delta = match self.last_now {
            Some(last) => (now_ms - last).max(0.0),
            None => self.nominal_frame_ms(),
        };
        self.last_now = Some(now_ms);

        if self.lag_threshold_ms > 0.0 && delta > self.lag_threshold_ms {
            tracing::trace!(delta, adjusted = self.adjusted_lag_ms, "ticker lag smoothed");
            delta = self.adjusted_lag_ms;
        }

        self.time_ms += delta;
        self.frame += 1;
        self.last_delta_ratio = delta / self.nominal_frame_ms();

        let info = FrameInfo {
            time_ms: self.time_ms,
            delta_ms: delta,
            delta_ratio: self.last_delta_ratio,
            frame: self.frame,
        };

        for (_, callback) in self.callbacks.iter_mut() {
            callback(&info);
        }

        info
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("callbacks", &self.callbacks.len())
            .field("time_ms", &self.time_ms)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_delta_ratio_tracks_frame_time() {
        let mut ticker = Ticker::new();
        let first = ticker.tick(1000.0);
        assert!((first.delta_ratio - 1.0).abs() < 1e-9);

        let frame = ticker.tick(1000.0 + 2000.0 / 60.0);
        assert!((frame.delta_ratio - 2.0).abs() < 1e-9);
        assert_eq!(frame.frame, 2);
    }

    #[test]
    fn test_lag_smoothing_clamps_stalls() {
        let mut ticker = Ticker::new();
        ticker.tick(0.0);
        let stalled = ticker.tick(5000.0);
        assert_eq!(stalled.delta_ms, 33.0);

        ticker.set_lag_smoothing(0.0, 0.0);
        let raw = ticker.tick(10000.0);
        assert_eq!(raw.delta_ms, 5000.0);
    }

    #[test]
    fn test_callbacks_receive_frames() {
        let mut ticker = Ticker::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let id = ticker.add(move |frame| seen_clone.lock().unwrap().push(frame.frame));
        ticker.tick(0.0);
        ticker.tick(16.0);
        assert!(ticker.remove(id));
        ticker.tick(32.0);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert!(ticker.is_empty());
    }
}
