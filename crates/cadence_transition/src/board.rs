// SPDX-License-Identifier: MIT OR Apache-2.0
//! The frame loop.
//!
//! A [`Board`] plays one frame state with one effect against one target:
//! realize the frames, then tick at the effect's frame rate, mapping elapsed
//! time to eased progress to a frame index, until the passes run out or the
//! run is cancelled.
//!
//! Terminal events are arbitrated by [`RunControl`]: whichever of completion
//! and cancellation gets there first fires its events, exactly once, followed
//! by `Finally`.

use crate::cancel::CancelToken;
use crate::dispatch::{read_on_home, HomeDispatcher};
use crate::effect::{LifecycleEvent, TransitionEffect, TransitionEventArgs};
use crate::error::Result;
use crate::frames::FrameSequence;
use crate::property::Animatable;
use crate::state::FrameState;
use crate::target::{TargetId, TargetRef};
use cadence_interp::InterpolatorRegistry;
use futures::FutureExt;
use parking_lot::{Mutex, ReentrantMutex};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::time::Instant;

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardState {
    /// Created, not yet playing
    #[default]
    Pending,
    /// Frames are being applied
    Playing,
    /// Ran to its natural end
    Completed,
    /// Aborted
    Canceled,
    /// Terminal events have fired
    Finalized,
}

impl BoardState {
    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Finalized)
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Played to the end
    Completed,
    /// Cancelled, superseded, or aborted by a failure
    Canceled,
    /// The target was dropped; no terminal events fired
    TargetDropped,
}

struct ControlInner {
    state: BoardState,
    last_args: TransitionEventArgs,
}

/// Shared control block of one run, held by its board and its scheduler unit
pub(crate) struct RunControl {
    token: CancelToken,
    target: TargetId,
    effect: Arc<TransitionEffect>,
    inner: Mutex<ControlInner>,
    apply_gate: ReentrantMutex<()>,
}

impl RunControl {
    pub(crate) fn new(token: CancelToken, target: TargetId, effect: TransitionEffect) -> Arc<Self> {
        Arc::new(Self {
            token,
            target,
            effect: Arc::new(effect),
            inner: Mutex::new(ControlInner {
                state: BoardState::Pending,
                last_args: TransitionEventArgs::initial(target),
            }),
            apply_gate: ReentrantMutex::new(()),
        })
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.token
    }

    pub(crate) fn effect(&self) -> &Arc<TransitionEffect> {
        &self.effect
    }

    pub(crate) fn state(&self) -> BoardState {
        self.inner.lock().state
    }

    fn enter_playing(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != BoardState::Pending || self.token.is_cancelled() {
            return false;
        }
        inner.state = BoardState::Playing;
        true
    }

    fn record(&self, args: TransitionEventArgs) {
        self.inner.lock().last_args = args;
    }

    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.inner.lock().state.is_terminal()
    }

    /// Run `f` while holding the run open; `None` once cancelled or ended.
    ///
    /// Cancellation from another thread waits for a running `f` to return, so
    /// a frame is either fully applied before `Canceled` fires or not applied
    /// at all. The state lock is not held while `f` runs, and the gate is
    /// re-entrant, so `f` may query or cancel this run itself.
    fn while_live<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.apply_gate.lock();
        if !self.is_live() {
            return None;
        }
        Some(f())
    }

    fn begin_terminal(&self, to: BoardState) -> Option<TransitionEventArgs> {
        let mut inner = self.inner.lock();
        if inner.state.is_terminal() {
            return None;
        }
        inner.state = to;
        Some(inner.last_args)
    }

    fn finalize(&self) {
        self.inner.lock().state = BoardState::Finalized;
    }

    /// Fire one event, containing panics. Returns `false` if a handler panicked.
    fn fire_guarded(&self, event: LifecycleEvent, args: &TransitionEventArgs) -> bool {
        let fired = catch_unwind(AssertUnwindSafe(|| self.effect.invoke(event, args)));
        if let Err(panic) = &fired {
            tracing::error!("{:?} handler panicked on {}: {}", event, self.target, panic_message(panic.as_ref()));
        }
        fired.is_ok()
    }

    /// Cancel the run. Fires `Canceled` then `Finally` if the run had not
    /// already ended; returns whether it did.
    pub(crate) fn cancel(&self) -> bool {
        let args = {
            let _gate = self.apply_gate.lock();
            self.token.cancel();
            self.begin_terminal(BoardState::Canceled)
        };
        let Some(args) = args else {
            return false;
        };
        tracing::debug!("Transition on {} canceled", self.target);
        self.fire_guarded(LifecycleEvent::Canceled, &args);
        self.fire_guarded(LifecycleEvent::Finally, &args);
        self.finalize();
        true
    }

    /// End the run naturally. A panicking `Completed` handler turns the
    /// outcome into `Canceled`; `Finally` fires either way.
    fn complete(&self, args: TransitionEventArgs) -> Outcome {
        self.record(args);
        if self.token.is_cancelled() {
            self.cancel();
            return Outcome::Canceled;
        }
        let Some(args) = self.begin_terminal(BoardState::Completed) else {
            return Outcome::Canceled;
        };
        tracing::debug!("Transition on {} completed", self.target);
        let completed = self.fire_guarded(LifecycleEvent::Completed, &args);
        self.fire_guarded(LifecycleEvent::Finally, &args);
        self.finalize();
        if completed {
            Outcome::Completed
        } else {
            Outcome::Canceled
        }
    }

    /// The target is gone: end without events
    fn abandon(&self) {
        let mut inner = self.inner.lock();
        if !inner.state.is_terminal() {
            inner.state = BoardState::Finalized;
            tracing::debug!("Transition on {} dropped with its target", self.target);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Frame index for eased progress over `count` frames
pub fn frame_index(progress: f64, count: usize) -> usize {
    let last = count.saturating_sub(1);
    let index = (progress * last as f64).round();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(last)
    }
}

/// Direction-adjusted progress within one pass.
///
/// With auto-reverse a pass is forward over its first half and backward over
/// its second half.
pub fn pass_progress(local: f64, auto_reverse: bool) -> f64 {
    if !auto_reverse {
        local
    } else if local < 0.5 {
        local * 2.0
    } else {
        2.0 * (1.0 - local)
    }
}

/// Executes one frame state against one target
pub(crate) struct Board<T> {
    target: TargetRef<T>,
    state: FrameState<T>,
    control: Arc<RunControl>,
    registry: Arc<InterpolatorRegistry>,
    dispatcher: Arc<dyn HomeDispatcher>,
}

impl<T: Animatable> Board<T> {
    pub(crate) fn new(
        target: TargetRef<T>,
        state: FrameState<T>,
        control: Arc<RunControl>,
        registry: Arc<InterpolatorRegistry>,
        dispatcher: Arc<dyn HomeDispatcher>,
    ) -> Self {
        Self { target, state, control, registry, dispatcher }
    }

    /// Play to the end. Failures and panics become `Canceled`.
    pub(crate) async fn play(self) -> Outcome {
        let id = self.target.id();
        match AssertUnwindSafe(self.drive()).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                tracing::warn!("Transition on {} failed: {err}", id);
                self.control.cancel();
                Outcome::Canceled
            }
            Err(panic) => {
                tracing::error!("Transition on {} panicked: {}", id, panic_message(panic.as_ref()));
                self.control.cancel();
                Outcome::Canceled
            }
        }
    }

    fn canceled(&self) -> Outcome {
        self.control.cancel();
        Outcome::Canceled
    }

    fn dropped(&self) -> Outcome {
        self.control.abandon();
        Outcome::TargetDropped
    }

    /// One frame: `Update`, apply, `LateUpdate`. Returns `false` once the run
    /// is no longer live.
    fn step(&self, sequence: &Arc<FrameSequence<T>>, args: TransitionEventArgs) -> Result<bool> {
        self.control.record(args);
        if !self.control.is_live() {
            return Ok(false);
        }
        let effect = self.control.effect();
        effect.invoke(LifecycleEvent::Update, &args);

        let applied = self.control.while_live(|| {
            sequence.apply_on_home(
                &self.target,
                args.frame_index,
                &self.dispatcher,
                effect.priority,
                self.control.token(),
            )
        });
        match applied {
            Some(result) => result?,
            None => return Ok(false),
        }
        if !self.control.is_live() {
            return Ok(false);
        }

        effect.invoke(LifecycleEvent::LateUpdate, &args);
        tracing::trace!("Frame {} on {}", args.frame_index, args.target);
        Ok(true)
    }

    async fn drive(&self) -> Result<Outcome> {
        let id = self.target.id();
        let effect = self.control.effect().clone();
        let token = self.control.token().clone();

        if !self.target.is_alive() {
            return Ok(self.dropped());
        }
        if !self.control.enter_playing() {
            return Ok(self.canceled());
        }

        let mut args = TransitionEventArgs::initial(id);
        effect.invoke(LifecycleEvent::Awake, &args);

        let count = effect.frame_count();
        let realized = {
            let target = self.target.clone();
            let state = self.state.clone();
            let registry = self.registry.clone();
            read_on_home(self.dispatcher.as_ref(), effect.priority, move || {
                target
                    .upgrade()
                    .map(|target| FrameSequence::realize(&*target, &state, &registry, count))
            })
            .await
        };
        let Some(Some(sequence)) = realized else {
            return Ok(self.dropped());
        };
        let sequence = Arc::new(sequence);
        let last = sequence.count() - 1;

        if token.is_cancelled() {
            return Ok(self.canceled());
        }
        effect.invoke(LifecycleEvent::Start, &args);

        if !effect.duration.is_zero() {
            let pass = if effect.is_auto_reverse { effect.duration * 2 } else { effect.duration };
            let interval = effect.frame_interval();
            let started = Instant::now();

            loop {
                if token.is_cancelled() {
                    return Ok(self.canceled());
                }
                if !self.target.is_alive() {
                    return Ok(self.dropped());
                }

                let raw = started.elapsed().as_secs_f64() / pass.as_secs_f64();
                if !effect.is_infinite() && raw >= f64::from(effect.loop_time) + 1.0 {
                    break;
                }

                let progress = effect.shape_progress(pass_progress(raw.fract(), effect.is_auto_reverse));
                args = TransitionEventArgs {
                    target: id,
                    progress,
                    frame_index: frame_index(progress, sequence.count()),
                    iteration: raw.floor().min(f64::from(u32::MAX)) as u32,
                };
                if !self.step(&sequence, args)? {
                    return Ok(self.canceled());
                }

                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }

        // Settle on the terminal frame: the end, or the start after a reverse pass
        let (progress, frame) = if effect.is_auto_reverse && !effect.duration.is_zero() {
            (0.0, 0)
        } else {
            (1.0, last)
        };
        args = TransitionEventArgs { target: id, progress, frame_index: frame, iteration: effect.loop_time };
        if !self.step(&sequence, args)? {
            return Ok(self.canceled());
        }
        Ok(self.control.complete(args))
    }
}
