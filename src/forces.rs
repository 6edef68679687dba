use nalgebra::{Point2, Vector2};

/// A force that acts over a window of simulated time.
///
/// The window is half-open: the force starts contributing on the first step
/// evaluated strictly after `start_time` and is dropped once the evaluation
/// instant reaches `start_time + duration`. A force scheduled exactly at the
/// current instant therefore fires for the first time on the *following*
/// step; with a duration shorter than one step it never fires at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedForce {
    /// Unit-less direction of the force.
    pub direction: Vector2<f64>,
    /// Magnitude in Newtons.
    pub magnitude: f64,
    /// Length of the active window in seconds.
    pub duration: f64,
    /// Simulated time at which the window opens.
    pub start_time: f64,
}

impl TimedForce {
    pub fn new(direction: Vector2<f64>, magnitude: f64, duration: f64, start_time: f64) -> Self {
        Self {
            direction,
            magnitude,
            duration,
            start_time,
        }
    }

    /// The force vector contributed while the window is open.
    pub fn vector(&self) -> Vector2<f64> {
        self.direction * self.magnitude
    }

    /// Whether the window has fully elapsed at `now`.
    pub fn expired(&self, now: f64) -> bool {
        self.start_time + self.duration <= now
    }

    /// Whether the window has opened at `now` (strict: a force starting
    /// exactly at `now` is not yet active this step).
    pub fn active(&self, now: f64) -> bool {
        self.start_time < now
    }
}

/// A timed force applied at a world point rather than the center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointForce {
    pub force: TimedForce,
    pub point: Point2<f64>,
}

/// Per-object collection of scheduled forces.
///
/// Forces may be scheduled at any time, including into the past or future;
/// no validation is applied here. The step loop runs `expire` exactly once
/// per step, then aggregates whatever survived, so the collection is
/// non-increasing for a fixed schedule and no entry is ever re-examined
/// after its window closes.
#[derive(Debug, Clone, Default)]
pub struct ForceSchedule {
    centered: Vec<TimedForce>,
    at_point: Vec<PointForce>,
}

impl ForceSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_centered(&mut self, force: TimedForce) {
        self.centered.push(force);
    }

    pub fn push_at_point(&mut self, force: TimedForce, point: Point2<f64>) {
        self.at_point.push(PointForce { force, point });
    }

    /// Expiry pass: permanently drop every entry whose window has elapsed.
    pub fn expire(&mut self, now: f64) {
        self.centered.retain(|force| !force.expired(now));
        self.at_point.retain(|entry| !entry.force.expired(now));
    }

    /// Resultant of all currently active centered forces.
    pub fn resultant_centered(&self, now: f64) -> Vector2<f64> {
        self.centered
            .iter()
            .filter(|force| force.active(now))
            .map(TimedForce::vector)
            .sum()
    }

    /// Currently active point forces. These are applied to the body one by
    /// one, never summed, since each has its own application point.
    pub fn active_at_point(&self, now: f64) -> impl Iterator<Item = &PointForce> {
        self.at_point.iter().filter(move |entry| entry.force.active(now))
    }

    /// Total number of scheduled entries still alive.
    pub fn len(&self) -> usize {
        self.centered.len() + self.at_point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centered.is_empty() && self.at_point.is_empty()
    }
}
