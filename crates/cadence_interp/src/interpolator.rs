// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interpolator strategies.
//!
//! An interpolator turns a `(start, end, steps)` triple into the ordered list
//! of frame values for one property. The contract every strategy keeps:
//! - the result has exactly `steps` entries (a single `[end]` when `steps` is 0 or 1)
//! - `result[0] == start` whenever `steps > 1`
//! - `result[steps - 1] == end`

use crate::error::{InterpError, Result};
use crate::value::Value;
use std::any::Any;
use std::marker::PhantomData;

/// Strategy that realizes the frames between two values of one type
pub trait Interpolator: Send + Sync + 'static {
    /// Produce `steps` ordered frame values from `start` to `end`
    fn interpolate(&self, start: &Value, end: &Value, steps: usize) -> Result<Vec<Value>>;
}

/// Types that blend linearly with themselves
pub trait Lerp: Clone + Send + Sync + 'static {
    /// Blend towards `to` by factor `t` (0.0 = self, 1.0 = to)
    fn lerp(&self, to: &Self, t: f64) -> Self;
}

/// Linear interpolation between two floats
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Progress of frame `index` out of `steps` frames
#[inline]
pub fn frame_progress(index: usize, steps: usize) -> f64 {
    if steps <= 1 {
        1.0
    } else {
        index as f64 / (steps - 1) as f64
    }
}

/// Realize frames with an arbitrary sampler.
///
/// The sampler is only consulted for interior frames; the endpoints are the
/// inputs themselves so they compare equal exactly.
pub fn sample_frames<V: Clone>(start: &V, end: &V, steps: usize, sample: impl Fn(f64) -> V) -> Vec<V> {
    if steps <= 1 {
        return vec![end.clone()];
    }
    (0..steps)
        .map(|i| {
            if i == 0 {
                start.clone()
            } else if i == steps - 1 {
                end.clone()
            } else {
                sample(frame_progress(i, steps))
            }
        })
        .collect()
}

/// Linear frames for any [`Lerp`] type
pub fn linear_frames<V: Lerp>(start: &V, end: &V, steps: usize) -> Vec<V> {
    sample_frames(start, end, steps, |t| start.lerp(end, t))
}

/// Downcast a value or report the mismatch
pub fn expect_value<'a, V: Any>(value: &'a Value) -> Result<&'a V> {
    value.downcast_ref::<V>().ok_or(InterpError::ValueTypeMismatch {
        expected: std::any::type_name::<V>(),
        found: value.type_name(),
    })
}

/// Component-wise linear interpolator for a [`Lerp`] type
pub struct LinearInterpolator<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> LinearInterpolator<V> {
    /// Create the interpolator
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<V> Default for LinearInterpolator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Lerp> Interpolator for LinearInterpolator<V> {
    fn interpolate(&self, start: &Value, end: &Value, steps: usize) -> Result<Vec<Value>> {
        let from = expect_value::<V>(start)?;
        let to = expect_value::<V>(end)?;
        Ok(linear_frames(from, to, steps).into_iter().map(Value::new).collect())
    }
}

/// Adapts a closure into an [`Interpolator`]
pub struct FnInterpolator<F>(pub F);

impl<F> Interpolator for FnInterpolator<F>
where
    F: Fn(&Value, &Value, usize) -> Result<Vec<Value>> + Send + Sync + 'static,
{
    fn interpolate(&self, start: &Value, end: &Value, steps: usize) -> Result<Vec<Value>> {
        (self.0)(start, end, steps)
    }
}

impl Lerp for f64 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl Lerp for f32 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        lerp(f64::from(*self), f64::from(*to), t) as f32
    }
}

impl Lerp for i32 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        lerp(f64::from(*self), f64::from(*to), t).round() as i32
    }
}
