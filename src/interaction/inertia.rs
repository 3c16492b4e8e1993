use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{ChartError, ChartResult};

/// Tuning for post-drag momentum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertiaConfig {
    /// Release is only "thrown" when the last pointer sample is younger than
    /// this.
    pub sample_window_ms: f64,
    /// Time constant of the velocity moving average.
    pub velocity_time_constant_ms: f64,
    /// Squared release speed (px/s)² below which no animation starts.
    pub min_velocity_sq: f64,
    pub duration_ms: f64,
    /// Total throw distance is `velocity * displacement_seconds`.
    pub displacement_seconds: f64,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            sample_window_ms: 100.0,
            velocity_time_constant_ms: 1000.0,
            min_velocity_sq: 100.0,
            duration_ms: 1200.0,
            displacement_seconds: 0.25,
        }
    }
}

impl InertiaConfig {
    pub fn validate(self) -> ChartResult<Self> {
        let positive = [
            ("sample_window_ms", self.sample_window_ms),
            ("velocity_time_constant_ms", self.velocity_time_constant_ms),
            ("duration_ms", self.duration_ms),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChartError::InvalidExtent(format!(
                    "inertia {name} must be finite and > 0"
                )));
            }
        }
        if !self.min_velocity_sq.is_finite() || self.min_velocity_sq < 0.0 {
            return Err(ChartError::InvalidExtent(
                "inertia min_velocity_sq must be finite and >= 0".to_owned(),
            ));
        }
        if !self.displacement_seconds.is_finite() || self.displacement_seconds < 0.0 {
            return Err(ChartError::InvalidExtent(
                "inertia displacement_seconds must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InertiaEvent {
    /// Incremental displacement in pixels to apply as a further pan.
    Render { dx: f64, dy: f64 },
    Finish,
    /// Interrupted by a new gesture.
    Stop,
}

pub type InertiaEvents = SmallVec<[InertiaEvent; 2]>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tracker {
    position: Point,
    time_ms: f64,
    velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    start_ms: f64,
    total: Vec2,
    applied: Vec2,
}

/// Progress curve `limit * (1 - e^(-b t))`, reaching exactly 1 at `t = 1`.
const LIMIT: f64 = 1.0001;

/// Release-velocity estimator plus the decay animation it drives.
#[derive(Debug, Clone, PartialEq)]
pub struct Inertia {
    config: InertiaConfig,
    tracker: Option<Tracker>,
    animation: Option<Animation>,
}

impl Inertia {
    #[must_use]
    pub fn new(config: InertiaConfig) -> Self {
        Self {
            config,
            tracker: None,
            animation: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> InertiaConfig {
        self.config
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Current velocity estimate in px/s.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.tracker.map_or(Vec2::ZERO, |tracker| tracker.velocity)
    }

    /// Starts sampling a new drag; interrupts a running animation.
    pub fn start(&mut self, position: Point, now_ms: f64) -> Option<InertiaEvent> {
        let stopped = self.stop();
        self.tracker = Some(Tracker {
            position,
            time_ms: now_ms,
            velocity: Vec2::ZERO,
        });
        stopped
    }

    /// Feeds one pointer sample into the exponential moving average.
    pub fn track(&mut self, position: Point, now_ms: f64) {
        let time_constant = self.config.velocity_time_constant_ms;
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };
        let dt = now_ms - tracker.time_ms;
        if dt <= 0.0 {
            tracker.position = position;
            return;
        }
        let instant = (position - tracker.position) * (1000.0 / dt);
        let decay = 1.0 - (-dt / time_constant).exp();
        tracker.velocity = instant * (1.0 - decay) + tracker.velocity * decay;
        tracker.position = position;
        tracker.time_ms = now_ms;
    }

    /// Ends sampling. Returns `true` when the release was fast and recent
    /// enough to start an animation.
    pub fn release(&mut self, now_ms: f64) -> bool {
        let Some(tracker) = self.tracker.take() else {
            return false;
        };
        if now_ms - tracker.time_ms > self.config.sample_window_ms {
            return false;
        }
        if tracker.velocity.hypot2() < self.config.min_velocity_sq {
            return false;
        }
        self.animation = Some(Animation {
            start_ms: now_ms,
            total: tracker.velocity * self.config.displacement_seconds,
            applied: Vec2::ZERO,
        });
        true
    }

    /// Advances the animation to `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> InertiaEvents {
        let mut events = InertiaEvents::new();
        let Some(animation) = self.animation.as_mut() else {
            return events;
        };
        let elapsed = (now_ms - animation.start_ms).max(0.0);
        let progress = progress(elapsed / self.config.duration_ms);
        let target = animation.total * progress;
        let step = target - animation.applied;
        animation.applied = target;
        if step.x != 0.0 || step.y != 0.0 {
            events.push(InertiaEvent::Render {
                dx: step.x,
                dy: step.y,
            });
        }
        if progress >= 1.0 {
            self.animation = None;
            events.push(InertiaEvent::Finish);
        }
        events
    }

    /// Cancels sampling and any running animation.
    pub fn stop(&mut self) -> Option<InertiaEvent> {
        self.tracker = None;
        self.animation.take().map(|_| InertiaEvent::Stop)
    }
}

fn progress(t: f64) -> f64 {
    if t >= 1.0 {
        return 1.0;
    }
    let b = -(1.0 - 1.0 / LIMIT).ln();
    (LIMIT * (1.0 - (-b * t).exp())).min(1.0)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use kurbo::Point;

    use super::{Inertia, InertiaConfig, InertiaEvent, progress};

    fn thrown() -> Inertia {
        let mut inertia = Inertia::new(InertiaConfig::default());
        inertia.start(Point::new(0.0, 0.0), 0.0);
        for step in 1..=10 {
            let t = f64::from(step) * 10.0;
            inertia.track(Point::new(t * 2.0, 0.0), t);
        }
        inertia
    }

    #[test]
    fn progress_reaches_one_at_the_end() {
        assert_relative_eq!(progress(0.0), 0.0);
        assert_relative_eq!(progress(1.0), 1.0, epsilon = 1e-9);
        assert!(progress(0.5) > 0.99);
    }

    #[test]
    fn fast_recent_release_animates_to_the_total_displacement() {
        let mut inertia = thrown();
        assert!(inertia.velocity().x > 0.0);
        assert!(inertia.release(110.0));

        let mut travelled = 0.0;
        let mut finished = false;
        for frame in 0..200 {
            for event in inertia.tick(110.0 + f64::from(frame) * 16.0) {
                match event {
                    InertiaEvent::Render { dx, .. } => travelled += dx,
                    InertiaEvent::Finish => finished = true,
                    InertiaEvent::Stop => panic!("unexpected stop"),
                }
            }
        }
        assert!(finished);
        assert!(!inertia.is_animating());
        assert!(travelled > 0.0);
    }

    #[test]
    fn stale_or_slow_release_does_not_animate() {
        let mut stale = thrown();
        assert!(!stale.release(500.0));

        let mut slow = Inertia::new(InertiaConfig::default());
        slow.start(Point::ORIGIN, 0.0);
        slow.track(Point::new(0.1, 0.0), 50.0);
        assert!(!slow.release(60.0));
    }

    #[test]
    fn new_gesture_stops_a_running_animation() {
        let mut inertia = thrown();
        assert!(inertia.release(100.0));
        assert_eq!(inertia.start(Point::ORIGIN, 120.0), Some(InertiaEvent::Stop));
        assert!(!inertia.is_animating());
    }
}
