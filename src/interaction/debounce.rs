use serde::{Deserialize, Serialize};

/// Host-clocked debounce timer.
///
/// Arming pushes the deadline `delay_ms` past `now`; `poll` fires once when
/// the deadline has passed and disarms the timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Debounce {
    delay_ms: f64,
    deadline_ms: Option<f64>,
}

impl Debounce {
    #[must_use]
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            deadline_ms: None,
        }
    }

    #[must_use]
    pub fn delay_ms(self) -> f64 {
        self.delay_ms
    }

    #[must_use]
    pub fn deadline_ms(self) -> Option<f64> {
        self.deadline_ms
    }

    #[must_use]
    pub fn is_armed(self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn arm(&mut self, now_ms: f64) {
        self.deadline_ms = Some(now_ms + self.delay_ms);
    }

    /// Arms only when idle, so a burst fires at most once per `delay_ms`.
    pub fn arm_if_idle(&mut self, now_ms: f64) {
        if self.deadline_ms.is_none() {
            self.arm(now_ms);
        }
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    /// Returns `true` exactly once after the deadline has passed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}
