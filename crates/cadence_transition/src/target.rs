// SPDX-License-Identifier: MIT OR Apache-2.0
//! Weak target handles.
//!
//! Transitions never keep their target alive. Every dereference goes through
//! [`TargetRef::upgrade`], and a dead target turns playback into a no-op.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Identity of a target: the address of its shared allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

impl TargetId {
    /// Identity of a shared target
    pub fn of<T>(target: &Arc<T>) -> Self {
        Self(Arc::as_ptr(target) as *const () as usize)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Weak handle to a transition target
pub struct TargetRef<T> {
    weak: Weak<T>,
    id: TargetId,
}

impl<T> Clone for TargetRef<T> {
    fn clone(&self) -> Self {
        Self { weak: self.weak.clone(), id: self.id }
    }
}

impl<T> fmt::Debug for TargetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRef")
            .field("id", &self.id)
            .field("alive", &(self.weak.strong_count() > 0))
            .finish()
    }
}

impl<T: Send + Sync + 'static> TargetRef<T> {
    /// Weak handle to `target`
    pub fn new(target: &Arc<T>) -> Self {
        Self { weak: Arc::downgrade(target), id: TargetId::of(target) }
    }

    /// Target identity
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Whether the target still exists
    pub fn is_alive(&self) -> bool {
        self.weak.strong_count() > 0
    }

    /// Strong reference, if the target still exists
    pub fn upgrade(&self) -> Option<Arc<T>> {
        self.weak.upgrade()
    }

    /// Type-erased weak reference
    pub fn erased(&self) -> Weak<dyn Any + Send + Sync> {
        let weak: Weak<dyn Any + Send + Sync> = self.weak.clone();
        weak
    }

    /// Whether this handle points at `target`
    pub fn points_to(&self, target: &Arc<T>) -> bool {
        Weak::ptr_eq(&self.weak, &Arc::downgrade(target))
    }
}
