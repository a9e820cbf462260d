// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type-erased property values.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A cheaply clonable, type-erased value.
///
/// Frame states hold values of many different property types side by side;
/// interpolators downcast them back to the concrete type they handle.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Value {
    /// Wrap a concrete value
    pub fn new<V: Any + Send + Sync>(value: V) -> Self {
        Self {
            inner: Arc::new(value),
            type_id: TypeId::of::<V>(),
            type_name: std::any::type_name::<V>(),
        }
    }

    /// Type id of the wrapped value
    pub fn value_type(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the wrapped value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check the wrapped type
    pub fn is<V: Any>(&self) -> bool {
        self.type_id == TypeId::of::<V>()
    }

    /// Borrow as a concrete type
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.inner.downcast_ref::<V>()
    }

    /// Clone out as a concrete type
    pub fn get<V: Any + Clone>(&self) -> Option<V> {
        self.downcast_ref::<V>().cloned()
    }

    /// Whether two values share the same allocation
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value").field("type", &self.type_name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcasts_to_the_wrapped_type() {
        let value = Value::new(2.5_f64);
        assert!(value.is::<f64>());
        assert!(!value.is::<f32>());
        assert_eq!(value.get::<f64>(), Some(2.5));
        assert_eq!(value.get::<f32>(), None);
        assert_eq!(value.value_type(), TypeId::of::<f64>());
        assert_eq!(value.type_name(), "f64");
    }

    #[test]
    fn test_clones_share_storage() {
        let value = Value::new(String::from("shared"));
        let copy = value.clone();
        assert!(value.ptr_eq(&copy));
        assert!(!value.ptr_eq(&Value::new(String::from("shared"))));
    }
}
