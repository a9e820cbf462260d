// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame state: the target values of one transition step.

use crate::property::{Animatable, Property, PropertyAccessor, PropertyKey};
use cadence_interp::{Interpolator, Value};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Target value of one property plus the accessor that applies it
pub struct StateEntry<T> {
    /// Accessor for the property
    pub accessor: Arc<dyn PropertyAccessor<T>>,
    /// Value to reach
    pub value: Value,
}

impl<T> Clone for StateEntry<T> {
    fn clone(&self) -> Self {
        Self { accessor: self.accessor.clone(), value: self.value.clone() }
    }
}

/// Property target values and per-property interpolator overrides.
///
/// Keys are unique; setting a key again overwrites it but keeps its original
/// position, so frames are applied in a stable order.
pub struct FrameState<T> {
    values: IndexMap<PropertyKey, StateEntry<T>>,
    interpolators: IndexMap<PropertyKey, Arc<dyn Interpolator>>,
}

impl<T> Default for FrameState<T> {
    fn default() -> Self {
        Self { values: IndexMap::new(), interpolators: IndexMap::new() }
    }
}

impl<T> Clone for FrameState<T> {
    fn clone(&self) -> Self {
        Self { values: self.values.clone(), interpolators: self.interpolators.clone() }
    }
}

impl<T> fmt::Debug for FrameState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameState")
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .field("interpolators", &self.interpolators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Animatable> FrameState<T> {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value `property` should reach
    pub fn set_value<V: Clone + Send + Sync + 'static>(&mut self, property: Property<T, V>, value: V) {
        self.set_erased(Arc::new(property), Value::new(value));
    }

    /// Record a value through a type-erased accessor
    pub fn set_erased(&mut self, accessor: Arc<dyn PropertyAccessor<T>>, value: Value) {
        self.values.insert(accessor.key(), StateEntry { accessor, value });
    }

    /// Override the interpolator for one property
    pub fn set_interpolator(&mut self, key: PropertyKey, interpolator: Arc<dyn Interpolator>) {
        self.interpolators.insert(key, interpolator);
    }

    /// Target value of a property
    pub fn try_get_value(&self, key: &PropertyKey) -> Option<&Value> {
        self.values.get(key).map(|entry| &entry.value)
    }

    /// Typed target value of a property
    pub fn value_of<V: Any + Clone>(&self, property: &Property<T, V>) -> Option<V>
    where
        V: Send + Sync,
    {
        self.try_get_value(&property.key()).and_then(Value::get::<V>)
    }

    /// Interpolator override of a property
    pub fn try_get_interpolator(&self, key: &PropertyKey) -> Option<Arc<dyn Interpolator>> {
        self.interpolators.get(key).cloned()
    }

    /// Overlay `other` onto this state; its entries win
    pub fn merge(&mut self, other: &FrameState<T>) {
        for (key, entry) in &other.values {
            self.values.insert(*key, entry.clone());
        }
        for (key, interpolator) in &other.interpolators {
            self.interpolators.insert(*key, interpolator.clone());
        }
    }

    /// Number of properties with a target value
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no property has a target value
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Property keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.values.keys()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &StateEntry<T>> {
        self.values.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_interp::LinearInterpolator;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Slider {
        value: Mutex<f64>,
        label: Mutex<String>,
    }

    const VALUE: Property<Slider, f64> =
        Property::new("value", |s| *s.value.lock(), |s, v| *s.value.lock() = v);
    const LABEL: Property<Slider, String> =
        Property::new("label", |s| s.label.lock().clone(), |s, v| *s.label.lock() = v);

    #[test]
    fn test_later_set_overwrites() {
        let mut state = FrameState::new();
        state.set_value(VALUE, 1.0);
        state.set_value(LABEL, "a".to_string());
        state.set_value(VALUE, 2.0);

        assert_eq!(state.len(), 2);
        assert_eq!(state.value_of(&VALUE), Some(2.0));
        let names: Vec<_> = state.keys().map(PropertyKey::name).collect();
        assert_eq!(names, vec!["value", "label"]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = FrameState::new();
        original.set_value(VALUE, 1.0);
        let mut copy = original.clone();
        copy.set_value(VALUE, 5.0);
        copy.set_value(LABEL, "copy".to_string());

        assert_eq!(original.value_of(&VALUE), Some(1.0));
        assert_eq!(original.len(), 1);
        assert_eq!(copy.value_of(&VALUE), Some(5.0));
    }

    #[test]
    fn test_merge_later_wins() {
        let mut base = FrameState::new();
        base.set_value(VALUE, 1.0);
        base.set_value(LABEL, "base".to_string());

        let mut overlay = FrameState::new();
        overlay.set_value(VALUE, 9.0);
        overlay.set_interpolator(VALUE.key(), Arc::new(LinearInterpolator::<f64>::new()));

        base.merge(&overlay);
        assert_eq!(base.value_of(&VALUE), Some(9.0));
        assert_eq!(base.value_of(&LABEL), Some("base".to_string()));
        assert!(base.try_get_interpolator(&VALUE.key()).is_some());
        assert!(base.try_get_interpolator(&LABEL.key()).is_none());
    }

    #[test]
    fn test_missing_entries() {
        let state = FrameState::<Slider>::new();
        assert!(state.is_empty());
        assert!(state.try_get_value(&VALUE.key()).is_none());
        assert_eq!(state.value_of(&LABEL), None);
    }
}
