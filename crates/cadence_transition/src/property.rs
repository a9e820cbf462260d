// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property accessors.
//!
//! A property is an opaque `get`/`set` capability over a target, keyed by a
//! stable identity. Targets are shared (`Arc<T>`), so setters take `&T` and the
//! target uses interior mutability for its animated state.

use crate::error::{Result, TransitionError};
use cadence_interp::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Any type that can be the target of a transition
pub trait Animatable: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Animatable for T {}

/// Stable identity of a property: its name plus its value type
#[derive(Clone, Copy)]
pub struct PropertyKey {
    name: &'static str,
    value_type: TypeId,
    type_name: &'static str,
}

impl PropertyKey {
    /// Key for a property named `name` holding values of type `V`
    pub fn of<V: Any>(name: &'static str) -> Self {
        Self {
            name,
            value_type: TypeId::of::<V>(),
            type_name: std::any::type_name::<V>(),
        }
    }

    /// Property name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type id of the property's values
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    /// Type name of the property's values
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for PropertyKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value_type == other.value_type
    }
}

impl Eq for PropertyKey {}

impl Hash for PropertyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.value_type.hash(state);
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)
    }
}

/// Typed accessor for property `V` on target `T`
pub struct Property<T, V> {
    name: &'static str,
    get: fn(&T) -> V,
    set: fn(&T, V),
}

impl<T, V> Clone for Property<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Property<T, V> {}

impl<T, V> fmt::Debug for Property<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<T: Animatable, V: Clone + Send + Sync + 'static> Property<T, V> {
    /// Define a property from a getter and a setter
    pub const fn new(name: &'static str, get: fn(&T) -> V, set: fn(&T, V)) -> Self {
        Self { name, get, set }
    }

    /// Property name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Identity of this property
    pub fn key(&self) -> PropertyKey {
        PropertyKey::of::<V>(self.name)
    }

    /// Read the current value
    pub fn get(&self, target: &T) -> V {
        (self.get)(target)
    }

    /// Write a value
    pub fn set(&self, target: &T, value: V) {
        (self.set)(target, value);
    }
}

/// Type-erased accessor used by frame states and sequences
pub trait PropertyAccessor<T>: Send + Sync {
    /// Identity of the property
    fn key(&self) -> PropertyKey;

    /// Read the current value
    fn read(&self, target: &T) -> Value;

    /// Write a value, rejecting values of the wrong type
    fn write(&self, target: &T, value: &Value) -> Result<()>;
}

impl<T: Animatable, V: Clone + Send + Sync + 'static> PropertyAccessor<T> for Property<T, V> {
    fn key(&self) -> PropertyKey {
        Property::key(self)
    }

    fn read(&self, target: &T) -> Value {
        Value::new(self.get(target))
    }

    fn write(&self, target: &T, value: &Value) -> Result<()> {
        let typed = value.downcast_ref::<V>().ok_or(TransitionError::ValueType {
            property: self.name,
            expected: std::any::type_name::<V>(),
            found: value.type_name(),
        })?;
        self.set(target, typed.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Knob {
        angle: Mutex<f64>,
    }

    const ANGLE: Property<Knob, f64> =
        Property::new("angle", |k| *k.angle.lock(), |k, v| *k.angle.lock() = v);

    #[test]
    fn test_typed_access() {
        let knob = Knob { angle: Mutex::new(10.0) };
        assert_eq!(ANGLE.get(&knob), 10.0);
        ANGLE.set(&knob, 45.0);
        assert_eq!(*knob.angle.lock(), 45.0);
    }

    #[test]
    fn test_erased_write_checks_type() {
        let knob = Knob { angle: Mutex::new(0.0) };
        let accessor: &dyn PropertyAccessor<Knob> = &ANGLE;

        accessor.write(&knob, &Value::new(90.0_f64)).unwrap();
        assert_eq!(accessor.read(&knob).get::<f64>(), Some(90.0));

        let err = accessor.write(&knob, &Value::new(1_i32)).unwrap_err();
        assert!(matches!(err, TransitionError::ValueType { property: "angle", .. }));
        assert_eq!(*knob.angle.lock(), 90.0);
    }

    #[test]
    fn test_keys_include_value_type() {
        assert_eq!(ANGLE.key(), PropertyKey::of::<f64>("angle"));
        assert_ne!(ANGLE.key(), PropertyKey::of::<f32>("angle"));
        assert_eq!(format!("{:?}", ANGLE.key()), "angle: f64");
    }
}
