// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine facade.
//!
//! A [`TransitionEngine`] bundles the services every run needs: the
//! interpolator registry, the scheduler, the home-thread dispatcher, the
//! configuration and the tokio runtime handle used to spawn runs. It is cheap
//! to clone; clones share everything.

use crate::board::{Board, Outcome, RunControl};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::dispatch::{HomeDispatcher, InlineDispatcher};
use crate::effect::TransitionEffect;
use crate::error::{Result, TransitionError};
use crate::property::Animatable;
use crate::scheduler::{Scheduler, TransitionUnit};
use crate::snapshot::{StateSnapshot, TransitionHandle};
use crate::state::FrameState;
use crate::target::{TargetId, TargetRef};
use cadence_interp::InterpolatorRegistry;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;

struct EngineInner {
    registry: Arc<InterpolatorRegistry>,
    scheduler: Scheduler,
    dispatcher: Arc<dyn HomeDispatcher>,
    config: EngineConfig,
    runtime: Handle,
}

/// Entry point for authoring and running transitions
#[derive(Clone)]
pub struct TransitionEngine {
    inner: Arc<EngineInner>,
}

/// Builder for [`TransitionEngine`]
#[derive(Default)]
pub struct EngineBuilder {
    registry: Option<Arc<InterpolatorRegistry>>,
    dispatcher: Option<Arc<dyn HomeDispatcher>>,
    config: EngineConfig,
    runtime: Option<Handle>,
}

impl EngineBuilder {
    /// Share an existing interpolator registry
    pub fn registry(mut self, registry: Arc<InterpolatorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Home-thread dispatcher (defaults to [`InlineDispatcher`])
    pub fn dispatcher(mut self, dispatcher: Arc<dyn HomeDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Runtime used to spawn runs (defaults to the current one)
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the engine. Fails outside a tokio runtime unless one was given.
    pub fn build(self) -> Result<TransitionEngine> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| TransitionError::NoRuntime)?,
        };
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(InterpolatorRegistry::with_defaults()));
        let dispatcher = self.dispatcher.unwrap_or_else(|| Arc::new(InlineDispatcher));

        tracing::debug!(
            "Transition engine ready ({} interpolators, {} fps default)",
            registry.len(),
            self.config.default_fps
        );

        Ok(TransitionEngine {
            inner: Arc::new(EngineInner {
                registry,
                scheduler: Scheduler::new(),
                dispatcher,
                config: self.config,
                runtime,
            }),
        })
    }
}

impl TransitionEngine {
    /// Start building an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Engine with default services on the current runtime
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Interpolator registry
    pub fn registry(&self) -> &Arc<InterpolatorRegistry> {
        &self.inner.registry
    }

    /// Scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Home-thread dispatcher
    pub fn dispatcher(&self) -> &Arc<dyn HomeDispatcher> {
        &self.inner.dispatcher
    }

    /// Configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Runtime runs are spawned on
    pub fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Effect carrying the configured defaults
    pub fn effect(&self) -> TransitionEffect {
        self.inner.config.effect()
    }

    /// Start a chain bound to `target`
    pub fn transition<T: Animatable>(&self, target: &Arc<T>) -> StateSnapshot<T> {
        StateSnapshot::new_root(self.clone(), Some(TargetRef::new(target)))
    }

    /// Start a chain without a target, to be run with
    /// [`StateSnapshot::execute_on`]
    pub fn chain<T: Animatable>(&self) -> StateSnapshot<T> {
        StateSnapshot::new_root(self.clone(), None)
    }

    /// Run a single state with an effect
    pub fn animate<T: Animatable>(
        &self,
        target: &Arc<T>,
        state: FrameState<T>,
        effect: TransitionEffect,
        exclusive: bool,
    ) -> TransitionHandle {
        let token = CancelToken::new();
        let target = TargetRef::new(target);
        let engine = self.clone();
        let run_token = token.clone();
        let task = self.inner.runtime.spawn(async move {
            engine.play(&target, exclusive, state, effect, run_token).await
        });
        TransitionHandle::new(token, task)
    }

    /// Cancel the transitions running on `target`. Returns how many were cancelled.
    pub fn exit<T: Animatable>(&self, target: &Arc<T>, include_shared: bool) -> usize {
        self.inner.scheduler.exit(TargetId::of(target), include_shared)
    }

    /// Play one state to its end on the scheduler's track for `target`
    pub(crate) async fn play<T: Animatable>(
        &self,
        target: &TargetRef<T>,
        exclusive: bool,
        state: FrameState<T>,
        mut effect: TransitionEffect,
        token: CancelToken,
    ) -> Outcome {
        if !target.is_alive() {
            return Outcome::TargetDropped;
        }
        effect.fps = self.inner.config.clamp_fps(effect.fps);

        let control = RunControl::new(token, target.id(), effect);
        let unit = self.inner.scheduler.start(target, exclusive, control.clone());
        let _release = Release { scheduler: &self.inner.scheduler, unit, control: control.clone() };

        Board::new(
            target.clone(),
            state,
            control,
            self.inner.registry.clone(),
            self.inner.dispatcher.clone(),
        )
        .play()
        .await
    }
}

impl fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("registry", &self.inner.registry)
            .field("scheduler", &self.inner.scheduler)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Releases a unit when its run ends, including when the run is dropped
struct Release<'a> {
    scheduler: &'a Scheduler,
    unit: Arc<TransitionUnit>,
    control: Arc<RunControl>,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.scheduler.release(&self.unit, &self.control);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{read_on_home, DispatchPriority, HomeThread};
    use crate::property::Property;
    use crate::testing::{EventLog, Widget, X, Y};
    use parking_lot::Mutex;
    use std::sync::Weak;
    use std::time::Duration;

    /// Target whose setter calls back into the engine, like change-notification plumbing
    struct Knob {
        value: Mutex<f64>,
        me: Weak<Knob>,
        engine: TransitionEngine,
        seen_running: Mutex<Vec<bool>>,
    }

    impl Knob {
        fn new(engine: TransitionEngine) -> Arc<Self> {
            Arc::new_cyclic(|me| Self {
                value: Mutex::new(0.0),
                me: me.clone(),
                engine,
                seen_running: Mutex::new(Vec::new()),
            })
        }

        fn set_value(&self, value: f64) {
            *self.value.lock() = value;
            let Some(me) = self.me.upgrade() else { return };
            let running = self.engine.scheduler().is_running(TargetId::of(&me));
            self.seen_running.lock().push(running);
            if value >= 5.0 {
                self.engine.exit(&me, true);
            }
        }
    }

    const KNOB: Property<Knob, f64> = Property::new("value", |k| *k.value.lock(), Knob::set_value);

    #[test]
    fn test_build_requires_runtime() {
        assert!(matches!(TransitionEngine::new(), Err(TransitionError::NoRuntime)));
    }

    #[test]
    fn test_build_with_explicit_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let engine = TransitionEngine::builder().runtime(runtime.handle().clone()).build().unwrap();
        assert_eq!(engine.registry().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_one_shot() {
        let engine = TransitionEngine::new().unwrap();
        let widget = Widget::new();
        let mut state = FrameState::new();
        state.set_value(X, 3.0);
        state.set_value(Y, 6.0);

        let handle = engine.animate(&widget, state, engine.effect().with_duration(Duration::from_millis(100)), true);
        assert_eq!(handle.join().await, Outcome::Completed);
        assert_eq!((widget.x(), widget.y()), (3.0, 6.0));
        assert!(engine.scheduler().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fps_is_clamped_by_config() {
        let config = EngineConfig { max_fps: 10, ..Default::default() };
        let engine = TransitionEngine::builder().config(config).build().unwrap();
        let widget = Widget::new();
        let mut state = FrameState::new();
        state.set_value(X, 1.0);

        let effect = TransitionEffect::new().with_fps(1000).with_duration(Duration::from_secs(1));
        let handle = engine.animate(&widget, state, effect, true);
        assert_eq!(handle.join().await, Outcome::Completed);
        // 10 fps over one second: about ten ticks plus the terminal frame
        assert!(widget.history().len() <= 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_cancels_running_transition() {
        let engine = TransitionEngine::new().unwrap();
        let widget = Widget::new();
        let log = EventLog::default();
        let mut effect = engine.effect().with_duration(Duration::from_secs(5));
        log.record(&mut effect, "run");
        let mut state = FrameState::new();
        state.set_value(X, 1.0);

        let handle = engine.animate(&widget, state, effect, true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(engine.scheduler().is_running(TargetId::of(&widget)));

        assert_eq!(engine.exit(&widget, true), 1);
        assert_eq!(log.count("run:Canceled"), 1);
        assert_eq!(log.count("run:Finally"), 1);
        assert_eq!(handle.join().await, Outcome::Canceled);
        assert!(engine.scheduler().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_writes_land_on_home_thread() {
        let home = Arc::new(HomeThread::spawn("cadence-engine-test").unwrap());
        let engine = TransitionEngine::builder().dispatcher(home.clone()).build().unwrap();
        let widget = Widget::new();
        let mut state = FrameState::new();
        state.set_value(X, 10.0);

        let handle = engine.animate(&widget, state, engine.effect().with_duration(Duration::from_millis(50)), true);
        assert_eq!(handle.join().await, Outcome::Completed);

        // Queued writes are fire-and-continue; flush the queue before checking
        read_on_home(home.as_ref(), DispatchPriority::Idle, || ()).await;
        assert_eq!(widget.x(), 10.0);
        assert_eq!(widget.writer(), Some(home.thread_id()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_setter_can_call_back_into_engine() {
        let engine = TransitionEngine::new().unwrap();
        let knob = Knob::new(engine.clone());
        let log = EventLog::default();
        let mut effect = engine.effect().with_duration(Duration::from_millis(100));
        log.record(&mut effect, "run");
        let mut state = FrameState::new();
        state.set_value(KNOB, 10.0);

        let handle = engine.animate(&knob, state, effect, true);
        let outcome = tokio::time::timeout(Duration::from_secs(3), handle.join()).await;
        assert_eq!(outcome.ok(), Some(Outcome::Canceled));

        let seen = knob.seen_running.lock().clone();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&running| running));
        assert!(*knob.value.lock() >= 5.0);
        assert_eq!(log.count("run:Canceled"), 1);
        assert_eq!(log.count("run:Finally"), 1);
        assert_eq!(log.count("run:Completed"), 0);
        assert!(engine.scheduler().is_empty());
    }
}
