//! One-shot deadline that forces the page visible

/// Fires once, `delay_ms` after it was armed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Failsafe {
    deadline_ms: f64,
    fired: bool,
}

impl Failsafe {
    pub fn new(armed_at_ms: f64, delay_ms: f64) -> Self {
        Self {
            deadline_ms: armed_at_ms + delay_ms,
            fired: false,
        }
    }

    /// True exactly once, on the first poll at or after the deadline
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if self.fired || now_ms < self.deadline_ms {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn deadline_ms(&self) -> f64 {
        self.deadline_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let mut failsafe = Failsafe::new(100.0, 3000.0);
        assert!(!failsafe.poll(3099.0));
        assert!(failsafe.poll(3100.0));
        assert!(!failsafe.poll(5000.0));
        assert!(failsafe.has_fired());
    }
}
