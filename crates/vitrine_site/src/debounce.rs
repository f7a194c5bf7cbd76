//! Cancel-and-restart delayed task
//!
//! Scheduling while a task is pending supersedes it: only the latest task
//! can ever fire, once, after a full quiet window.

/// Identity of one scheduled task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Clone, Copy, Debug)]
struct Pending {
    id: TaskId,
    deadline_ms: f64,
}

/// Debounce timer owned by its caller
#[derive(Debug)]
pub struct Debouncer {
    window_ms: f64,
    pending: Option<Pending>,
    next_id: u64,
}

impl Debouncer {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms: window_ms.max(0.0),
            pending: None,
            next_id: 0,
        }
    }

    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    /// Arm the timer at `now_ms`, replacing any pending task
    pub fn schedule(&mut self, now_ms: f64) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        if let Some(previous) = self.pending.replace(Pending {
            id,
            deadline_ms: now_ms + self.window_ms,
        }) {
            tracing::trace!(superseded = previous.id.0, task = id.0, "debounce restarted");
        }
        id
    }

    /// The pending task, if its deadline has passed. Clears it.
    pub fn fire_due(&mut self, now_ms: f64) -> Option<TaskId> {
        match self.pending {
            Some(pending) if now_ms >= pending.deadline_ms => {
                self.pending = None;
                Some(pending.id)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> Option<TaskId> {
        self.pending.take().map(|pending| pending.id)
    }

    pub fn pending(&self) -> Option<TaskId> {
        self.pending.map(|pending| pending.id)
    }

    pub fn deadline_ms(&self) -> Option<f64> {
        self.pending.map(|pending| pending.deadline_ms)
    }
}
