// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transition effects: timing, easing and lifecycle callbacks.

use crate::dispatch::DispatchPriority;
use crate::target::TargetId;
use cadence_interp::{Ease, EaseCalculator};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// `loop_time` value that repeats forever
pub const LOOP_FOREVER: u32 = u32::MAX;

/// Arguments passed to every lifecycle callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionEventArgs {
    /// Target being animated
    pub target: TargetId,
    /// Eased progress of the current pass in `[0, 1]`
    pub progress: f64,
    /// Frame index applied (or about to be applied)
    pub frame_index: usize,
    /// Zero-based loop iteration
    pub iteration: u32,
}

impl TransitionEventArgs {
    /// Arguments before any frame has played
    pub fn initial(target: TargetId) -> Self {
        Self { target, progress: 0.0, frame_index: 0, iteration: 0 }
    }
}

/// Lifecycle callback
pub type EventHandler = Arc<dyn Fn(&TransitionEventArgs) + Send + Sync>;

/// Points in a transition's life where callbacks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Before frames are realized
    Awake,
    /// Right before the first frame
    Start,
    /// Every frame, before values are applied
    Update,
    /// Every frame, after values are applied
    LateUpdate,
    /// The transition was aborted
    Canceled,
    /// The transition ran to its natural end
    Completed,
    /// Always last, after either `Completed` or `Canceled`
    Finally,
}

impl LifecycleEvent {
    /// All events in firing order
    pub const ALL: [LifecycleEvent; 7] = [
        Self::Awake,
        Self::Start,
        Self::Update,
        Self::LateUpdate,
        Self::Canceled,
        Self::Completed,
        Self::Finally,
    ];

    fn index(self) -> usize {
        match self {
            Self::Awake => 0,
            Self::Start => 1,
            Self::Update => 2,
            Self::LateUpdate => 3,
            Self::Canceled => 4,
            Self::Completed => 5,
            Self::Finally => 6,
        }
    }
}

/// Timing and lifecycle contract of one transition step.
///
/// Cloning copies the scalar fields and the subscriber lists; the handlers
/// themselves are shared. The engine clones the effect for every run, so
/// subscribing on one run's copy never leaks into another run.
#[derive(Clone)]
pub struct TransitionEffect {
    /// Frames per second
    pub fps: u32,
    /// Length of one forward pass
    pub duration: Duration,
    /// Play backwards after each forward pass
    pub is_auto_reverse: bool,
    /// Extra passes after the first (`0` plays once, [`LOOP_FOREVER`] never stops)
    pub loop_time: u32,
    /// Progress reshaping in `[-1, 1]`: positive accelerates, negative decelerates
    pub acceleration: f64,
    /// Easing curve
    pub ease: Arc<dyn EaseCalculator>,
    /// Priority of queued frame writes
    pub priority: DispatchPriority,
    events: [Vec<EventHandler>; 7],
}

impl Default for TransitionEffect {
    fn default() -> Self {
        Self {
            fps: 60,
            duration: Duration::ZERO,
            is_auto_reverse: false,
            loop_time: 0,
            acceleration: 0.0,
            ease: Arc::new(Ease::Linear),
            priority: DispatchPriority::default(),
            events: Default::default(),
        }
    }
}

impl fmt::Debug for TransitionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: usize = self.events.iter().map(Vec::len).sum();
        f.debug_struct("TransitionEffect")
            .field("fps", &self.fps)
            .field("duration", &self.duration)
            .field("is_auto_reverse", &self.is_auto_reverse)
            .field("loop_time", &self.loop_time)
            .field("acceleration", &self.acceleration)
            .field("priority", &self.priority)
            .field("handlers", &handlers)
            .finish_non_exhaustive()
    }
}

impl TransitionEffect {
    /// Effect with default timing and no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the duration of one pass
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Enable or disable auto-reverse
    pub fn with_auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.is_auto_reverse = auto_reverse;
        self
    }

    /// Set the number of extra passes
    pub fn with_loop_time(mut self, loop_time: u32) -> Self {
        self.loop_time = loop_time;
        self
    }

    /// Set the acceleration, clamped to `[-1, 1]`
    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration.clamp(-1.0, 1.0);
        self
    }

    /// Set the easing curve
    pub fn with_ease(mut self, ease: Arc<dyn EaseCalculator>) -> Self {
        self.ease = ease;
        self
    }

    /// Set the dispatch priority
    pub fn with_priority(mut self, priority: DispatchPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Whether the effect never stops on its own
    pub fn is_infinite(&self) -> bool {
        self.loop_time == LOOP_FOREVER
    }

    /// Number of realized frames: `round(fps * duration)`, at least 1
    pub fn frame_count(&self) -> usize {
        let frames = (f64::from(self.fps) * self.duration.as_secs_f64()).round();
        (frames as usize).max(1)
    }

    /// Delay between two frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Apply acceleration, then easing, to linear progress
    pub fn shape_progress(&self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        let a = self.acceleration.clamp(-1.0, 1.0);
        let accelerated = if a > 0.0 {
            p.powf(1.0 + a)
        } else if a < 0.0 {
            1.0 - (1.0 - p).powf(1.0 - a)
        } else {
            p
        };
        self.ease.ease(accelerated)
    }

    /// Subscribe a handler to a lifecycle event
    pub fn subscribe<F>(&mut self, event: LifecycleEvent, handler: F) -> &mut Self
    where
        F: Fn(&TransitionEventArgs) + Send + Sync + 'static,
    {
        self.events[event.index()].push(Arc::new(handler));
        self
    }

    /// Subscribe to `Awake`
    pub fn on_awake<F: Fn(&TransitionEventArgs) + Send + Sync + 'static>(&mut self, f: F) -> &mut Self {
        self.subscribe(LifecycleEvent::Awake, f)
    }

    /// Subscribe to `Start`
    pub fn on_start<F: Fn(&TransitionEventArgs) + Send + Sync + 'static>(&mut self, f: F) -> &mut Self {
        self.subscribe(LifecycleEvent::Start, f)
    }

    /// Subscribe to `Update`
    pub fn on_update<F: Fn(&TransitionEventArgs) + Send + Sync + 'static>(&mut self, f: F) -> &mut Self {
        self.subscribe(LifecycleEvent::Update, f)
    }

    /// Subscribe to `LateUpdate`
    pub fn on_late_update<F: Fn(&TransitionEventArgs) + Send + Sync + 'static>(&mut self, f: F) -> &mut Self {
        self.subscribe(LifecycleEvent::LateUpdate, f)
    }

    /// Subscribe to `Canceled`
    pub fn on_canceled<F: Fn(&TransitionEventArgs) + Send + Sync + 'static>(&mut self, f: F) -> &mut Self {
        self.subscribe(LifecycleEvent::Canceled, f)
    }

    /// Subscribe to `Completed`
    pub fn on_completed<F: Fn(&TransitionEventArgs) + Send + Sync + 'static>(&mut self, f: F) -> &mut Self {
        self.subscribe(LifecycleEvent::Completed, f)
    }

    /// Subscribe to `Finally`
    pub fn on_finally<F: Fn(&TransitionEventArgs) + Send + Sync + 'static>(&mut self, f: F) -> &mut Self {
        self.subscribe(LifecycleEvent::Finally, f)
    }

    /// Number of handlers subscribed to `event`
    pub fn handler_count(&self, event: LifecycleEvent) -> usize {
        self.events[event.index()].len()
    }

    /// Run every handler of `event`. No-op without subscribers.
    pub fn invoke(&self, event: LifecycleEvent, args: &TransitionEventArgs) {
        for handler in &self.events[event.index()] {
            handler(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn args() -> TransitionEventArgs {
        TransitionEventArgs::initial(TargetId::of(&Arc::new(0_u8)))
    }

    #[test]
    fn test_defaults() {
        let effect = TransitionEffect::new();
        assert_eq!(effect.fps, 60);
        assert_eq!(effect.duration, Duration::ZERO);
        assert!(!effect.is_auto_reverse);
        assert_eq!(effect.loop_time, 0);
        assert_eq!(effect.priority, DispatchPriority::Render);
        assert_eq!(effect.frame_count(), 1);
    }

    #[test]
    fn test_frame_count() {
        let effect = TransitionEffect::new().with_duration(Duration::from_millis(500));
        assert_eq!(effect.frame_count(), 30);

        let effect = TransitionEffect::new().with_fps(24).with_duration(Duration::from_secs(2));
        assert_eq!(effect.frame_count(), 48);

        let effect = TransitionEffect::new().with_duration(Duration::from_millis(1));
        assert_eq!(effect.frame_count(), 1);
    }

    #[test]
    fn test_clone_shares_handlers_not_lists() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let mut authored = TransitionEffect::new();
        let log = hits.clone();
        authored.on_completed(move |_| log.lock().push("authored"));

        let mut run = authored.clone();
        let log = hits.clone();
        run.on_completed(move |_| log.lock().push("run"));

        assert_eq!(authored.handler_count(LifecycleEvent::Completed), 1);
        assert_eq!(run.handler_count(LifecycleEvent::Completed), 2);

        run.invoke(LifecycleEvent::Completed, &args());
        assert_eq!(*hits.lock(), vec!["authored", "run"]);
    }

    #[test]
    fn test_invoke_without_subscribers_is_noop() {
        let effect = TransitionEffect::new();
        for event in LifecycleEvent::ALL {
            effect.invoke(event, &args());
        }
    }

    #[test]
    fn test_acceleration_shapes_progress() {
        let linear = TransitionEffect::new();
        assert_eq!(linear.shape_progress(0.5), 0.5);

        let accel = TransitionEffect::new().with_acceleration(1.0);
        assert!((accel.shape_progress(0.5) - 0.25).abs() < 1e-12);

        let decel = TransitionEffect::new().with_acceleration(-1.0);
        assert!((decel.shape_progress(0.5) - 0.75).abs() < 1e-12);

        for effect in [&accel, &decel] {
            assert_eq!(effect.shape_progress(0.0), 0.0);
            assert_eq!(effect.shape_progress(1.0), 1.0);
        }
    }

    #[test]
    fn test_ease_applies_after_acceleration() {
        let effect = TransitionEffect::new().with_ease(Arc::new(Ease::InQuad));
        assert!((effect.shape_progress(0.5) - 0.25).abs() < 1e-12);
        assert_eq!(effect.shape_progress(2.0), 1.0);
    }
}
