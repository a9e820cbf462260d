// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared fixtures for unit tests.

use crate::effect::{LifecycleEvent, TransitionEffect};
use crate::property::Property;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Widget with a few animatable properties that records every `x` write
#[derive(Default)]
pub(crate) struct Widget {
    x: Mutex<f64>,
    y: Mutex<f64>,
    label: Mutex<String>,
    history: Mutex<Vec<f64>>,
    writer: Mutex<Option<ThreadId>>,
}

impl Widget {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn x(&self) -> f64 {
        *self.x.lock()
    }

    pub(crate) fn y(&self) -> f64 {
        *self.y.lock()
    }

    pub(crate) fn history(&self) -> Vec<f64> {
        self.history.lock().clone()
    }

    pub(crate) fn writer(&self) -> Option<ThreadId> {
        *self.writer.lock()
    }

    fn set_x(&self, value: f64) {
        *self.x.lock() = value;
        self.history.lock().push(value);
        *self.writer.lock() = Some(thread::current().id());
    }
}

pub(crate) const X: Property<Widget, f64> = Property::new("x", Widget::x, Widget::set_x);
pub(crate) const Y: Property<Widget, f64> = Property::new("y", Widget::y, |w, v| *w.y.lock() = v);
pub(crate) const LABEL: Property<Widget, String> =
    Property::new("label", |w| w.label.lock().clone(), |w, v| *w.label.lock() = v);

/// Ordered record of lifecycle events across several effects
#[derive(Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    /// Subscribe to every event of `effect`, tagging entries with `tag`
    pub(crate) fn record(&self, effect: &mut TransitionEffect, tag: &'static str) {
        for event in LifecycleEvent::ALL {
            let log = self.0.clone();
            effect.subscribe(event, move |_| log.lock().push(format!("{tag}:{event:?}")));
        }
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub(crate) fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }
}

/// Number of times consecutive values go down
pub(crate) fn drops(values: &[f64]) -> usize {
    values.windows(2).filter(|w| w[1] < w[0]).count()
}
