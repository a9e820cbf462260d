// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type-keyed interpolator registry.

use crate::brush::{Brush, BrushInterpolator};
use crate::interpolator::{Interpolator, LinearInterpolator};
use crate::types::{Color, CornerRadius, Point, Size, Thickness, Transform2D};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps a value type to the interpolator used for it.
///
/// The registry is an injected service: engines hold an `Arc` to one and can
/// share it, and registrations made after construction are visible to every
/// later lookup. At most one interpolator exists per type; registering again
/// replaces the previous one.
#[derive(Default)]
pub struct InterpolatorRegistry {
    entries: RwLock<HashMap<TypeId, Arc<dyn Interpolator>>>,
}

impl InterpolatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the built-in value types
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register::<f64>(LinearInterpolator::<f64>::new());
        registry.register::<f32>(LinearInterpolator::<f32>::new());
        registry.register::<i32>(LinearInterpolator::<i32>::new());
        registry.register::<Point>(LinearInterpolator::<Point>::new());
        registry.register::<Size>(LinearInterpolator::<Size>::new());
        registry.register::<Thickness>(LinearInterpolator::<Thickness>::new());
        registry.register::<CornerRadius>(LinearInterpolator::<CornerRadius>::new());
        registry.register::<Transform2D>(LinearInterpolator::<Transform2D>::new());
        registry.register::<Color>(LinearInterpolator::<Color>::new());
        registry.register::<Brush>(BrushInterpolator);
        registry
    }

    /// Register (or replace) the interpolator for `V`. Always succeeds.
    pub fn register<V: Any>(&self, interpolator: impl Interpolator) -> bool {
        self.register_arc(TypeId::of::<V>(), Arc::new(interpolator))
    }

    /// Register a shared interpolator under an explicit type id
    pub fn register_arc(&self, value_type: TypeId, interpolator: Arc<dyn Interpolator>) -> bool {
        let replaced = self.entries.write().insert(value_type, interpolator).is_some();
        if replaced {
            tracing::debug!("Replaced interpolator for {:?}", value_type);
        }
        true
    }

    /// Look up the interpolator for a type id
    pub fn try_get(&self, value_type: TypeId) -> Option<Arc<dyn Interpolator>> {
        self.entries.read().get(&value_type).cloned()
    }

    /// Look up the interpolator for `V`
    pub fn try_get_for<V: Any>(&self) -> Option<Arc<dyn Interpolator>> {
        self.try_get(TypeId::of::<V>())
    }

    /// Whether an interpolator exists for a type id
    pub fn contains(&self, value_type: TypeId) -> bool {
        self.entries.read().contains_key(&value_type)
    }

    /// Remove the interpolator for `V`
    pub fn remove<V: Any>(&self) -> Option<Arc<dyn Interpolator>> {
        self.remove_type(TypeId::of::<V>())
    }

    /// Remove the interpolator for a type id
    pub fn remove_type(&self, value_type: TypeId) -> Option<Arc<dyn Interpolator>> {
        self.entries.write().remove(&value_type)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl fmt::Debug for InterpolatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolatorRegistry").field("types", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::interpolator::FnInterpolator;
    use crate::value::Value;

    #[test]
    fn test_defaults_cover_builtin_types() {
        let registry = InterpolatorRegistry::with_defaults();
        assert_eq!(registry.len(), 10);
        assert!(registry.try_get_for::<f64>().is_some());
        assert!(registry.try_get_for::<Color>().is_some());
        assert!(registry.try_get_for::<Brush>().is_some());
        assert!(registry.try_get_for::<String>().is_none());
    }

    #[test]
    fn test_register_replaces_previous_entry() {
        let registry = InterpolatorRegistry::with_defaults();
        let before = registry.len();
        let snap = FnInterpolator(|_: &Value, end: &Value, _: usize| -> Result<Vec<Value>> {
            Ok(vec![end.clone()])
        });
        assert!(registry.register::<f64>(snap));
        assert_eq!(registry.len(), before);

        let frames = registry
            .try_get_for::<f64>()
            .unwrap()
            .interpolate(&Value::new(0.0_f64), &Value::new(9.0_f64), 10)
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].get::<f64>(), Some(9.0));
    }

    #[test]
    fn test_lookups_see_later_registrations_and_removals() {
        let registry = Arc::new(InterpolatorRegistry::new());
        assert!(registry.is_empty());

        registry.register::<Point>(LinearInterpolator::<Point>::new());
        assert!(registry.contains(TypeId::of::<Point>()));

        assert!(registry.remove::<Point>().is_some());
        assert!(registry.try_get_for::<Point>().is_none());
        assert!(registry.remove::<Point>().is_none());
    }

    #[test]
    fn test_clear_empties_registry() {
        let registry = InterpolatorRegistry::with_defaults();
        registry.clear();
        assert!(registry.is_empty());
    }
}
