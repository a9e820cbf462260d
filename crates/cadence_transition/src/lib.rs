// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property transitions for Cadence.
//!
//! This crate plays value changes on shared targets over time:
//! - Frame states describing the values a step should reach
//! - Effects carrying timing, easing and lifecycle callbacks
//! - Fluent state-snapshot chains (`then`, `await_for`, `await_then`)
//! - A scheduler enforcing one exclusive transition per target
//! - A frame loop that writes values through the home thread
//!
//! ## Architecture
//!
//! The engine is built on:
//! - `cadence_interp` for easing and value interpolation
//! - tokio tasks, one per running chain, with cancellable frame delays
//! - A [`HomeDispatcher`] capability that marshals writes onto the UI thread
//! - Weak target handles, so transitions never keep a target alive

pub mod board;
pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod effect;
pub mod engine;
pub mod error;
pub mod frames;
pub mod property;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod target;

#[cfg(test)]
mod testing;

pub use board::{frame_index, pass_progress, BoardState, Outcome};
pub use cancel::CancelToken;
pub use config::{EngineConfig, DEFAULT_HOME_THREAD_NAME};
pub use dispatch::{read_on_home, DispatchPriority, HomeDispatcher, HomeJob, HomeThread, InlineDispatcher};
pub use effect::{EventHandler, LifecycleEvent, TransitionEffect, TransitionEventArgs, LOOP_FOREVER};
pub use engine::{EngineBuilder, TransitionEngine};
pub use error::{Result, TransitionError};
pub use frames::{FrameSequence, FrameTrack};
pub use property::{Animatable, Property, PropertyAccessor, PropertyKey};
pub use scheduler::{Scheduler, TransitionUnit, UnitId};
pub use snapshot::{DynSnapshot, StateSnapshot, TransitionHandle};
pub use state::{FrameState, StateEntry};
pub use target::{TargetId, TargetRef};
