// SPDX-License-Identifier: MIT OR Apache-2.0
//! State-snapshot chains.
//!
//! A chain is an ordered list of steps, each pairing a [`FrameState`] with a
//! [`TransitionEffect`] and an optional start delay. Builder calls return a
//! [`StateSnapshot`] handle to one step; `then` appends a step after it.
//! Executing from any handle always plays the whole chain from the first step.
//!
//! ```ignore
//! engine
//!     .transition(&panel)
//!     .property(OPACITY, 1.0)?
//!     .effect_with(|e| e.duration = Duration::from_millis(200))
//!     .await_then(Duration::from_millis(50))
//!     .property(OFFSET, Point::new(0.0, 12.0))?
//!     .execute();
//! ```

use crate::board::Outcome;
use crate::cancel::CancelToken;
use crate::effect::TransitionEffect;
use crate::engine::TransitionEngine;
use crate::error::{Result, TransitionError};
use crate::property::{Animatable, Property};
use crate::state::FrameState;
use crate::target::TargetRef;
use cadence_interp::Interpolator;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct ChainNode<T> {
    delay: Duration,
    state: FrameState<T>,
    effect: TransitionEffect,
}

impl<T> Clone for ChainNode<T> {
    fn clone(&self) -> Self {
        Self { delay: self.delay, state: self.state.clone(), effect: self.effect.clone() }
    }
}

impl<T: Animatable> ChainNode<T> {
    fn new(effect: TransitionEffect) -> Self {
        Self { delay: Duration::ZERO, state: FrameState::new(), effect }
    }
}

struct RunSlot {
    token: CancelToken,
    exclusive: bool,
}

struct ChainRoot<T> {
    engine: TransitionEngine,
    target: Option<TargetRef<T>>,
    nodes: Mutex<Vec<ChainNode<T>>>,
    run: Mutex<Option<RunSlot>>,
}

/// Handle to one step of a transition chain
pub struct StateSnapshot<T> {
    root: Arc<ChainRoot<T>>,
    index: usize,
}

impl<T> Clone for StateSnapshot<T> {
    fn clone(&self) -> Self {
        Self { root: self.root.clone(), index: self.index }
    }
}

impl<T> fmt::Debug for StateSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSnapshot")
            .field("target", &std::any::type_name::<T>())
            .field("index", &self.index)
            .field("steps", &self.root.nodes.lock().len())
            .finish()
    }
}

impl<T: Animatable> StateSnapshot<T> {
    pub(crate) fn new_root(engine: TransitionEngine, target: Option<TargetRef<T>>) -> Self {
        let first = ChainNode::new(engine.effect());
        Self {
            root: Arc::new(ChainRoot {
                engine,
                target,
                nodes: Mutex::new(vec![first]),
                run: Mutex::new(None),
            }),
            index: 0,
        }
    }

    fn with_node(self, f: impl FnOnce(&mut ChainNode<T>)) -> Self {
        {
            let mut nodes = self.root.nodes.lock();
            if let Some(node) = nodes.get_mut(self.index) {
                f(node);
            }
        }
        self
    }

    /// Position of this step in the chain
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of steps in the chain
    pub fn len(&self) -> usize {
        self.root.nodes.lock().len()
    }

    /// Always `false`: a chain has at least one step
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The chain's target, if bound
    pub fn target(&self) -> Option<&TargetRef<T>> {
        self.root.target.as_ref()
    }

    /// Set the value `property` should reach in this step.
    ///
    /// Fails right away if no interpolator is registered for `V` and the step
    /// has no override for the property.
    pub fn property<V: Clone + Send + Sync + 'static>(self, property: Property<T, V>, value: V) -> Result<Self> {
        let key = property.key();
        let has_override = self
            .root
            .nodes
            .lock()
            .get(self.index)
            .is_some_and(|node| node.state.try_get_interpolator(&key).is_some());
        if !has_override && !self.root.engine.registry().contains(TypeId::of::<V>()) {
            return Err(TransitionError::NotInterpolable {
                property: property.name(),
                type_name: std::any::type_name::<V>(),
            });
        }
        Ok(self.with_node(|node| node.state.set_value(property, value)))
    }

    /// Set a property value together with the interpolator to use for it
    pub fn property_with<V: Clone + Send + Sync + 'static>(
        self,
        property: Property<T, V>,
        value: V,
        interpolator: Arc<dyn Interpolator>,
    ) -> Self {
        self.with_node(|node| {
            node.state.set_interpolator(property.key(), interpolator);
            node.state.set_value(property, value);
        })
    }

    /// Merge a prepared frame state into this step
    pub fn state(self, state: &FrameState<T>) -> Self {
        self.with_node(|node| node.state.merge(state))
    }

    /// Replace this step's effect
    pub fn effect(self, effect: TransitionEffect) -> Self {
        self.with_node(|node| node.effect = effect)
    }

    /// Adjust this step's effect in place
    pub fn effect_with(self, f: impl FnOnce(&mut TransitionEffect)) -> Self {
        self.with_node(|node| f(&mut node.effect))
    }

    /// Wait `delay` before this step plays
    pub fn await_for(self, delay: Duration) -> Self {
        self.with_node(|node| node.delay = delay)
    }

    /// Append a step after this one and return it.
    ///
    /// Steps that previously followed this one are discarded.
    pub fn then(self) -> Self {
        let index = {
            let mut nodes = self.root.nodes.lock();
            nodes.truncate(self.index + 1);
            nodes.push(ChainNode::new(self.root.engine.effect()));
            nodes.len() - 1
        };
        Self { root: self.root, index }
    }

    /// `then` followed by `await_for`
    pub fn await_then(self, delay: Duration) -> Self {
        self.then().await_for(delay)
    }

    /// Run the whole chain exclusively on its bound target
    pub fn execute(&self) -> TransitionHandle {
        self.execute_with(true)
    }

    /// Run the whole chain on its bound target.
    ///
    /// A chain without a target finishes immediately with
    /// [`Outcome::TargetDropped`].
    pub fn execute_with(&self, exclusive: bool) -> TransitionHandle {
        self.launch(self.root.target.clone(), exclusive)
    }

    /// Run the whole chain on `target`
    pub fn execute_on(&self, target: &Arc<T>, exclusive: bool) -> TransitionHandle {
        self.launch(Some(TargetRef::new(target)), exclusive)
    }

    fn launch(&self, target: Option<TargetRef<T>>, exclusive: bool) -> TransitionHandle {
        let nodes = self.root.nodes.lock().clone();
        let token = CancelToken::new();

        let previous = self.root.run.lock().replace(RunSlot { token: token.clone(), exclusive });
        if let Some(previous) = previous {
            if previous.exclusive && previous.token.cancel() {
                tracing::debug!("Re-executed chain supersedes its previous run");
            }
        }

        let engine = self.root.engine.clone();
        let run_token = token.clone();
        let task = engine.runtime().clone().spawn(async move {
            match target {
                Some(target) => run_chain(engine, target, nodes, exclusive, run_token).await,
                None => {
                    tracing::debug!("Chain executed without a target");
                    Outcome::TargetDropped
                }
            }
        });
        TransitionHandle::new(token, task)
    }

    /// Erase the target type
    pub fn into_dyn(self) -> DynSnapshot {
        DynSnapshot::new(self)
    }
}

/// Play chain steps in order; stop at the first step that does not complete
async fn run_chain<T: Animatable>(
    engine: TransitionEngine,
    target: TargetRef<T>,
    nodes: Vec<ChainNode<T>>,
    exclusive: bool,
    token: CancelToken,
) -> Outcome {
    let steps = nodes.len();
    for (step, node) in nodes.into_iter().enumerate() {
        if token.is_cancelled() {
            return Outcome::Canceled;
        }
        if !target.is_alive() {
            return Outcome::TargetDropped;
        }
        if !node.delay.is_zero() {
            tokio::select! {
                _ = token.cancelled() => return Outcome::Canceled,
                _ = tokio::time::sleep(node.delay) => {}
            }
        }

        tracing::trace!("Chain step {}/{} on {}", step + 1, steps, target.id());
        let outcome = engine.play(&target, exclusive, node.state, node.effect, token.clone()).await;
        if outcome != Outcome::Completed {
            return outcome;
        }
    }
    Outcome::Completed
}

/// Handle to a launched chain or one-shot transition
#[derive(Debug)]
pub struct TransitionHandle {
    token: CancelToken,
    task: JoinHandle<Outcome>,
}

impl TransitionHandle {
    pub(crate) fn new(token: CancelToken, task: JoinHandle<Outcome>) -> Self {
        Self { token, task }
    }

    /// Cancel the run; `Canceled` and `Finally` fire for the playing step
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the run has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancellation token of the run
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Wait for the run to end
    pub async fn join(self) -> Outcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("Transition task ended abnormally: {err}");
                Outcome::Canceled
            }
        }
    }
}

trait ErasedChain: Send + Sync {
    fn execute(&self, exclusive: bool) -> TransitionHandle;
    fn target_type(&self) -> TypeId;
    fn target_type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Animatable> ErasedChain for StateSnapshot<T> {
    fn execute(&self, exclusive: bool) -> TransitionHandle {
        self.execute_with(exclusive)
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn target_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// A chain with its target type erased, so chains over different target
/// types can be stored and executed together
pub struct DynSnapshot(Box<dyn ErasedChain>);

impl DynSnapshot {
    /// Erase a typed chain
    pub fn new<T: Animatable>(snapshot: StateSnapshot<T>) -> Self {
        Self(Box::new(snapshot))
    }

    /// Run the chain on its bound target
    pub fn execute(&self, exclusive: bool) -> TransitionHandle {
        self.0.execute(exclusive)
    }

    /// Name of the chain's target type
    pub fn target_type_name(&self) -> &'static str {
        self.0.target_type_name()
    }

    /// Whether the chain targets `T`
    pub fn is<T: Animatable>(&self) -> bool {
        self.0.target_type() == TypeId::of::<T>()
    }

    /// Borrow as a typed chain
    pub fn downcast_ref<T: Animatable>(&self) -> Result<&StateSnapshot<T>> {
        self.0.as_any().downcast_ref::<StateSnapshot<T>>().ok_or(TransitionError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found: self.0.target_type_name(),
        })
    }

    /// Recover the typed chain
    pub fn downcast<T: Animatable>(self) -> Result<StateSnapshot<T>> {
        let found = self.0.target_type_name();
        match self.0.into_any().downcast::<StateSnapshot<T>>() {
            Ok(snapshot) => Ok(*snapshot),
            Err(_) => Err(TransitionError::TypeMismatch { expected: std::any::type_name::<T>(), found }),
        }
    }
}

impl<T: Animatable> From<StateSnapshot<T>> for DynSnapshot {
    fn from(snapshot: StateSnapshot<T>) -> Self {
        Self::new(snapshot)
    }
}

impl fmt::Debug for DynSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynSnapshot").field(&self.0.target_type_name()).finish()
    }
}
