//! Page events
//!
//! Page events (pointer, scroll, wheel, resize) with a dispatcher keyed by
//! target node and event type. Window-level listeners use `None` as target.

use crate::layout::NodeId;
use rustc_hash::FxHashMap;

/// Numeric event kind, see [`event_types`]
pub type EventType = u32;

/// Event kinds the page emits
pub mod event_types {
    use super::EventType;

    pub const POINTER_MOVE: EventType = 3;
    pub const POINTER_ENTER: EventType = 4;
    pub const POINTER_LEAVE: EventType = 5;
    pub const CLICK: EventType = 8;
    /// Native page scroll position changed
    pub const SCROLL: EventType = 30;
    /// Wheel input, fed to the inertial scroller
    pub const WHEEL: EventType = 33;
    /// Touch drag input, fed to the inertial scroller
    pub const TOUCH_MOVE: EventType = 34;
    pub const RESIZE: EventType = 40;
    /// Page finished loading
    pub const LOAD: EventType = 60;
}

/// A page event with associated data
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: EventType,
    pub target: Option<NodeId>,
    pub data: EventData,
    /// Milliseconds on the page clock
    pub timestamp: f64,
    pub propagation_stopped: bool,
}

/// Payload carried by an [`Event`]
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    Pointer { x: f32, y: f32 },
    Scroll { y: f32 },
    Wheel { delta_y: f32 },
    Touch { delta_y: f32 },
    Resize { width: f32, height: f32 },
    None,
}

impl Event {
    pub fn new(event_type: EventType, target: Option<NodeId>, data: EventData, timestamp: f64) -> Self {
        Self {
            event_type,
            target,
            data,
            timestamp,
            propagation_stopped: false,
        }
    }

    pub fn pointer_move(x: f32, y: f32, timestamp: f64) -> Self {
        Self::new(event_types::POINTER_MOVE, None, EventData::Pointer { x, y }, timestamp)
    }

    /// Pointer moving over a specific element
    pub fn pointer_move_on(target: NodeId, x: f32, y: f32, timestamp: f64) -> Self {
        Self::new(event_types::POINTER_MOVE, Some(target), EventData::Pointer { x, y }, timestamp)
    }

    pub fn pointer_enter(target: NodeId, x: f32, y: f32, timestamp: f64) -> Self {
        Self::new(event_types::POINTER_ENTER, Some(target), EventData::Pointer { x, y }, timestamp)
    }

    pub fn pointer_leave(target: NodeId, timestamp: f64) -> Self {
        Self::new(event_types::POINTER_LEAVE, Some(target), EventData::None, timestamp)
    }

    pub fn click(target: NodeId, timestamp: f64) -> Self {
        Self::new(event_types::CLICK, Some(target), EventData::None, timestamp)
    }

    pub fn scroll(y: f32, timestamp: f64) -> Self {
        Self::new(event_types::SCROLL, None, EventData::Scroll { y }, timestamp)
    }

    pub fn wheel(delta_y: f32, timestamp: f64) -> Self {
        Self::new(event_types::WHEEL, None, EventData::Wheel { delta_y }, timestamp)
    }

    pub fn touch_move(delta_y: f32, timestamp: f64) -> Self {
        Self::new(event_types::TOUCH_MOVE, None, EventData::Touch { delta_y }, timestamp)
    }

    pub fn resize(width: f32, height: f32, timestamp: f64) -> Self {
        Self::new(event_types::RESIZE, None, EventData::Resize { width, height }, timestamp)
    }

    pub fn load(timestamp: f64) -> Self {
        Self::new(event_types::LOAD, None, EventData::None, timestamp)
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Pointer coordinates, if this is a pointer event
    pub fn pointer(&self) -> Option<(f32, f32)> {
        match self.data {
            EventData::Pointer { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

/// Event handler callback
pub type EventHandler = Box<dyn Fn(&Event) + Send + Sync>;

/// Routes events to handlers registered per (target, event type).
///
/// Handlers for the same key run in registration order.
pub struct EventDispatcher {
    handlers: FxHashMap<(Option<NodeId>, EventType), Vec<EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    /// Register a handler for events on a specific node
    pub fn register<F>(&mut self, target: NodeId, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handlers
            .entry((Some(target), event_type))
            .or_default()
            .push(Box::new(handler));
    }

    /// Register a window-level handler
    pub fn register_window<F>(&mut self, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handlers
            .entry((None, event_type))
            .or_default()
            .push(Box::new(handler));
    }

    /// Run the handlers for the event's target and type until one stops it
    pub fn dispatch(&self, event: &mut Event) {
        if let Some(handlers) = self.handlers.get(&(event.target, event.event_type)) {
            for handler in handlers {
                if event.propagation_stopped {
                    break;
                }
                handler(event);
            }
        }
    }

    /// Number of handlers registered for a key
    pub fn handler_count(&self, target: Option<NodeId>, event_type: EventType) -> usize {
        self.handlers
            .get(&(target, event_type))
            .map_or(0, |handlers| handlers.len())
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("keys", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_dispatch_routes_by_target_and_type() {
        let mut dispatcher = EventDispatcher::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let hits_clone = hits.clone();
        dispatcher.register(NodeId(1), event_types::CLICK, move |_| {
            hits_clone.lock().unwrap().push("node-1");
        });
        let hits_clone = hits.clone();
        dispatcher.register_window(event_types::RESIZE, move |_| {
            hits_clone.lock().unwrap().push("window");
        });

        dispatcher.dispatch(&mut Event::click(NodeId(1), 0.0));
        dispatcher.dispatch(&mut Event::click(NodeId(2), 0.0));
        dispatcher.dispatch(&mut Event::resize(800.0, 600.0, 0.0));

        assert_eq!(*hits.lock().unwrap(), vec!["node-1", "window"]);
    }

    #[test]
    fn test_stop_propagation() {
        let mut dispatcher = EventDispatcher::new();
        let count = Arc::new(Mutex::new(0));

        dispatcher.register_window(event_types::SCROLL, |event| {
            assert_eq!(event.data, EventData::Scroll { y: 10.0 });
        });
        let count_clone = count.clone();
        dispatcher.register_window(event_types::SCROLL, move |_| {
            *count_clone.lock().unwrap() += 1;
        });

        let mut event = Event::scroll(10.0, 0.0);
        event.stop_propagation();
        dispatcher.dispatch(&mut event);
        assert_eq!(*count.lock().unwrap(), 0);

        dispatcher.dispatch(&mut Event::scroll(10.0, 0.0));
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(dispatcher.handler_count(None, event_types::SCROLL), 2);
    }
}
