// SPDX-License-Identifier: MIT OR Apache-2.0
//! Realized frame sequences.
//!
//! A [`FrameSequence`] holds every frame value of every property up front, so
//! the frame loop only has to pick an index and write it back.

use crate::cancel::CancelToken;
use crate::dispatch::{DispatchPriority, HomeDispatcher};
use crate::error::Result;
use crate::property::{Animatable, PropertyAccessor, PropertyKey};
use crate::state::FrameState;
use crate::target::TargetRef;
use cadence_interp::{InterpolatorRegistry, Value};
use std::fmt;
use std::sync::Arc;

/// Frames of one property
pub struct FrameTrack<T> {
    accessor: Arc<dyn PropertyAccessor<T>>,
    frames: Vec<Value>,
}

impl<T> FrameTrack<T> {
    /// Property this track writes
    pub fn key(&self) -> PropertyKey {
        self.accessor.key()
    }

    /// Frame values in order
    pub fn frames(&self) -> &[Value] {
        &self.frames
    }
}

/// Per-property frame arrays sharing one frame count
pub struct FrameSequence<T> {
    tracks: Vec<FrameTrack<T>>,
    count: usize,
}

impl<T> fmt::Debug for FrameSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSequence")
            .field("tracks", &self.tracks.iter().map(FrameTrack::key).collect::<Vec<_>>())
            .field("count", &self.count)
            .finish()
    }
}

impl<T: Animatable> FrameSequence<T> {
    /// Realize the frames from the target's current values to `state`.
    ///
    /// The per-property override wins over the registry. Properties without an
    /// interpolator, or whose interpolator fails or returns malformed frames,
    /// are left out of the sequence.
    pub fn realize(target: &T, state: &FrameState<T>, registry: &InterpolatorRegistry, count: usize) -> Self {
        let count = count.max(1);
        let mut tracks = Vec::with_capacity(state.len());

        for entry in state.entries() {
            let key = entry.accessor.key();
            let interpolator = state
                .try_get_interpolator(&key)
                .or_else(|| registry.try_get(key.value_type()));
            let Some(interpolator) = interpolator else {
                tracing::debug!("No interpolator for {:?}, skipping", key);
                continue;
            };

            let start = entry.accessor.read(target);
            match interpolator.interpolate(&start, &entry.value, count) {
                Ok(frames) if frames.len() != count => {
                    tracing::warn!(
                        "Interpolator for {:?} produced {} frames, expected {}; skipping",
                        key,
                        frames.len(),
                        count
                    );
                }
                Ok(frames) => {
                    if let Some(bad) = frames.iter().find(|v| v.value_type() != key.value_type()) {
                        tracing::warn!("Interpolator for {:?} produced {} values; skipping", key, bad.type_name());
                        continue;
                    }
                    tracks.push(FrameTrack { accessor: entry.accessor.clone(), frames });
                }
                Err(err) => tracing::warn!("Interpolating {:?} failed: {err}; skipping", key),
            }
        }

        tracing::trace!("Realized {} tracks of {} frames", tracks.len(), count);
        Self { tracks, count }
    }

    /// Number of frames
    pub fn count(&self) -> usize {
        self.count
    }

    /// Realized tracks
    pub fn tracks(&self) -> &[FrameTrack<T>] {
        &self.tracks
    }

    /// Frames of one property
    pub fn frames_of(&self, key: &PropertyKey) -> Option<&[Value]> {
        self.tracks.iter().find(|t| t.key() == *key).map(FrameTrack::frames)
    }

    /// Write frame `index` of every track. Out of range indices clamp.
    ///
    /// Every track is written even if one fails; the first failure is returned.
    pub fn apply(&self, target: &T, index: usize) -> Result<()> {
        let index = index.min(self.count.saturating_sub(1));
        let mut first_error = None;
        for track in &self.tracks {
            if let Err(err) = track.accessor.write(target, &track.frames[index]) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Write frame `index` through the home thread.
    ///
    /// Synchronous when already on the home thread. Otherwise the write is
    /// queued and this returns immediately. The queued write re-checks the
    /// token, the target and the host when it runs. Nothing is written once
    /// the host is no longer alive.
    pub fn apply_on_home(
        self: &Arc<Self>,
        target: &TargetRef<T>,
        index: usize,
        dispatcher: &Arc<dyn HomeDispatcher>,
        priority: DispatchPriority,
        token: &CancelToken,
    ) -> Result<()> {
        if !dispatcher.is_host_alive() {
            tracing::trace!("Host gone, frame {} suppressed", index);
            return Ok(());
        }

        if dispatcher.is_home_thread() {
            return match target.upgrade() {
                Some(target) => self.apply(&target, index),
                None => Ok(()),
            };
        }

        let sequence = Arc::clone(self);
        let target = target.clone();
        let token = token.clone();
        let host = Arc::downgrade(dispatcher);
        dispatcher.run_on_home_thread(
            Box::new(move || {
                if token.is_cancelled() {
                    return;
                }
                if !host.upgrade().is_some_and(|host| host.is_host_alive()) {
                    tracing::trace!("Host gone, queued frame {} suppressed", index);
                    return;
                }
                let Some(target) = target.upgrade() else { return };
                if let Err(err) = sequence.apply(&target, index) {
                    tracing::warn!("Applying frame {} failed: {err}", index);
                }
            }),
            priority,
        );
        Ok(())
    }
}
