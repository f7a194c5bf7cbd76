//! Flat state machines
//!
//! Lifecycles with a handful of states (gallery binding, menu overlay) as a
//! `(state, event) -> state` table. Entering a state runs its entry actions,
//! including re-entry through a self-transition. Recent transitions are kept
//! for diagnostics.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;

pub type StateId = u32;

pub type EventId = u32;

/// Runs when a state is entered
pub type EntryAction = Box<dyn FnMut() + Send>;

const HISTORY_LIMIT: usize = 64;

/// Collects the table, labels and entry actions of a [`StateMachine`]
pub struct StateMachineBuilder {
    initial: StateId,
    table: FxHashMap<(StateId, EventId), StateId>,
    labels: FxHashMap<StateId, &'static str>,
    entry: FxHashMap<StateId, SmallVec<[EntryAction; 1]>>,
}

impl StateMachineBuilder {
    /// `event` moves `from` to `to`. A later entry for the same pair wins.
    pub fn on(mut self, from: StateId, event: EventId, to: StateId) -> Self {
        self.table.insert((from, event), to);
        self
    }

    /// Name a state for log output
    pub fn label(mut self, state: StateId, name: &'static str) -> Self {
        self.labels.insert(state, name);
        self
    }

    pub fn on_enter<F: FnMut() + Send + 'static>(mut self, state: StateId, action: F) -> Self {
        self.entry.entry(state).or_default().push(Box::new(action));
        self
    }

    pub fn build(self) -> StateMachine {
        StateMachine {
            state: self.initial,
            table: self.table,
            labels: self.labels,
            entry: self.entry,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }
}

pub struct StateMachine {
    state: StateId,
    table: FxHashMap<(StateId, EventId), StateId>,
    labels: FxHashMap<StateId, &'static str>,
    entry: FxHashMap<StateId, SmallVec<[EntryAction; 1]>>,
    history: VecDeque<(StateId, EventId, StateId)>,
}

impl StateMachine {
    pub fn builder(initial: StateId) -> StateMachineBuilder {
        StateMachineBuilder {
            initial,
            table: FxHashMap::default(),
            labels: FxHashMap::default(),
            entry: FxHashMap::default(),
        }
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn is_in(&self, state: StateId) -> bool {
        self.state == state
    }

    /// Label registered for a state, or `"?"`
    pub fn label_of(&self, state: StateId) -> &'static str {
        self.labels.get(&state).copied().unwrap_or("?")
    }

    /// Up to the last 64 transitions as `(from, event, to)`, oldest first
    pub fn history(&self) -> Vec<(StateId, EventId, StateId)> {
        self.history.iter().copied().collect()
    }

    /// Apply `event` and return the resulting state. Events with no entry in
    /// the table for the current state are ignored.
    pub fn send(&mut self, event: EventId) -> StateId {
        let from = self.state;
        let Some(&to) = self.table.get(&(from, event)) else {
            tracing::trace!(state = self.label_of(from), event, "event ignored");
            return from;
        };

        self.state = to;
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back((from, event, to));
        tracing::trace!(
            from = self.label_of(from),
            to = self.label_of(to),
            event,
            "state transition"
        );

        if let Some(actions) = self.entry.get_mut(&to) {
            for action in actions.iter_mut() {
                action();
            }
        }
        to
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.label_of(self.state))
            .field("transitions", &self.table.len())
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const CLOSED: StateId = 0;
    const OPEN: StateId = 1;

    const OPEN_CLICKED: EventId = 1;
    const CLOSE_CLICKED: EventId = 2;

    fn door() -> StateMachineBuilder {
        StateMachine::builder(CLOSED)
            .label(CLOSED, "closed")
            .label(OPEN, "open")
            .on(CLOSED, OPEN_CLICKED, OPEN)
            .on(OPEN, CLOSE_CLICKED, CLOSED)
    }

    #[test]
    fn test_table_transitions() {
        let mut fsm = door().build();

        assert!(fsm.is_in(CLOSED));
        assert_eq!(fsm.send(OPEN_CLICKED), OPEN);
        assert_eq!(fsm.label_of(fsm.state()), "open");
        assert_eq!(fsm.send(CLOSE_CLICKED), CLOSED);
        assert_eq!(fsm.label_of(42), "?");
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let mut fsm = door().build();

        assert_eq!(fsm.send(CLOSE_CLICKED), CLOSED);
        assert!(fsm.history().is_empty());
    }

    #[test]
    fn test_entry_actions_run_on_reentry() {
        let entries = Arc::new(Mutex::new(0));
        let probe = entries.clone();

        let mut fsm = door()
            .on(OPEN, OPEN_CLICKED, OPEN)
            .on_enter(OPEN, move || *probe.lock().unwrap() += 1)
            .build();

        fsm.send(OPEN_CLICKED);
        fsm.send(OPEN_CLICKED);
        fsm.send(CLOSE_CLICKED);

        assert_eq!(*entries.lock().unwrap(), 2);
        assert_eq!(
            fsm.history(),
            vec![
                (CLOSED, OPEN_CLICKED, OPEN),
                (OPEN, OPEN_CLICKED, OPEN),
                (OPEN, CLOSE_CLICKED, CLOSED)
            ]
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let mut fsm = door().build();
        for _ in 0..HISTORY_LIMIT {
            fsm.send(OPEN_CLICKED);
            fsm.send(CLOSE_CLICKED);
        }

        let history = fsm.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], (CLOSED, OPEN_CLICKED, OPEN));
    }
}
