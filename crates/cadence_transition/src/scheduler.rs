// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-target transition scheduling.
//!
//! Every target has one exclusive track, holding at most one live run, and a
//! shared track of independent concurrent runs. Starting an exclusive run
//! cancels the previous one before the new run plays its first frame.
//!
//! Lock order: the entry table, then a unit's run slot. Lifecycle events of a
//! cancelled run always fire after both locks are released.

use crate::board::RunControl;
use crate::property::Animatable;
use crate::target::{TargetId, TargetRef};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Unique identifier for a transition unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    /// Create a new unique unit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// A slot on one of a target's tracks
pub struct TransitionUnit {
    id: UnitId,
    target: TargetId,
    exclusive: bool,
    current: Mutex<Option<Arc<RunControl>>>,
}

impl TransitionUnit {
    fn new(target: TargetId, exclusive: bool) -> Arc<Self> {
        Arc::new(Self { id: UnitId::new(), target, exclusive, current: Mutex::new(None) })
    }

    /// Unit identifier
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Target this unit belongs to
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Whether this is the target's exclusive unit
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Whether a run is installed and has not ended
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|control| !control.state().is_terminal())
    }

    /// Cancel the installed run, if any. Returns whether one was cancelled.
    pub fn exit(&self) -> bool {
        let control = self.current.lock().take();
        control.is_some_and(|control| control.cancel())
    }

    fn install(&self, control: Arc<RunControl>) -> Option<Arc<RunControl>> {
        self.current.lock().replace(control)
    }

    fn clear_if(&self, control: &Arc<RunControl>) {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, control)) {
            *current = None;
        }
    }

    fn is_idle(&self) -> bool {
        self.current.lock().is_none()
    }
}

impl fmt::Debug for TransitionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionUnit")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("exclusive", &self.exclusive)
            .field("running", &self.is_running())
            .finish()
    }
}

struct SchedulerEntry {
    target: Weak<dyn Any + Send + Sync>,
    exclusive: Arc<TransitionUnit>,
    shared: IndexMap<UnitId, Arc<TransitionUnit>>,
}

impl SchedulerEntry {
    fn new(target: Weak<dyn Any + Send + Sync>, id: TargetId) -> Self {
        Self { target, exclusive: TransitionUnit::new(id, true), shared: IndexMap::new() }
    }

    fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    fn is_idle(&self) -> bool {
        self.exclusive.is_idle() && self.shared.is_empty()
    }

    fn units(&self, include_shared: bool) -> Vec<Arc<TransitionUnit>> {
        let mut units = vec![self.exclusive.clone()];
        if include_shared {
            units.extend(self.shared.values().cloned());
        }
        units
    }
}

/// Registry of running transitions keyed by target
#[derive(Default)]
pub struct Scheduler {
    entries: Mutex<HashMap<TargetId, SchedulerEntry>>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit for `target` on the requested track.
    ///
    /// The exclusive unit is the same for every call while the target is
    /// tracked; every shared request gets a fresh unit.
    pub fn find_or_create<T: Animatable>(&self, target: &TargetRef<T>, exclusive: bool) -> Arc<TransitionUnit> {
        let mut entries = self.entries.lock();
        Self::unit_locked(&mut entries, target, exclusive)
    }

    fn unit_locked<T: Animatable>(
        entries: &mut HashMap<TargetId, SchedulerEntry>,
        target: &TargetRef<T>,
        exclusive: bool,
    ) -> Arc<TransitionUnit> {
        let id = target.id();
        // A dead entry under a live target's id means the address was reused
        if entries.get(&id).is_some_and(|entry| !entry.is_alive()) {
            tracing::trace!("Replacing stale scheduler entry for {}", id);
            entries.remove(&id);
        }
        let entry = entries.entry(id).or_insert_with(|| {
            tracing::trace!("Tracking target {}", id);
            SchedulerEntry::new(target.erased(), id)
        });

        if exclusive {
            return entry.exclusive.clone();
        }
        let unit = TransitionUnit::new(id, false);
        entry.shared.insert(unit.id, unit.clone());
        unit
    }

    /// Install `control` as the running transition of a unit.
    ///
    /// On the exclusive track the previous run is cancelled, with its
    /// `Canceled` and `Finally` events fired, before this returns.
    pub(crate) fn start<T: Animatable>(
        &self,
        target: &TargetRef<T>,
        exclusive: bool,
        control: Arc<RunControl>,
    ) -> Arc<TransitionUnit> {
        let (unit, previous) = {
            let mut entries = self.entries.lock();
            let unit = Self::unit_locked(&mut entries, target, exclusive);
            let previous = unit.install(control);
            (unit, previous)
        };

        if let Some(previous) = previous {
            tracing::debug!("Superseding exclusive transition on {}", target.id());
            previous.cancel();
        }
        tracing::debug!(
            "Started {} unit {:?} on {}",
            if exclusive { "exclusive" } else { "shared" },
            unit.id,
            target.id()
        );
        unit
    }

    /// Release a unit once its run has ended
    pub(crate) fn release(&self, unit: &Arc<TransitionUnit>, control: &Arc<RunControl>) {
        let mut entries = self.entries.lock();
        unit.clear_if(control);

        let Some(entry) = entries.get_mut(&unit.target) else {
            return;
        };
        if !unit.exclusive {
            entry.shared.shift_remove(&unit.id);
        }
        if entry.is_idle() {
            entries.remove(&unit.target);
            tracing::trace!("Target {} idle, entry released", unit.target);
        }
    }

    /// Cancel the exclusive run of a target and, optionally, its shared runs.
    ///
    /// Returns the number of runs cancelled.
    pub fn exit(&self, target: TargetId, include_shared: bool) -> usize {
        let units = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get(&target) else {
                return 0;
            };
            let units = entry.units(include_shared);
            if include_shared {
                entries.remove(&target);
            }
            units
        };

        let cancelled = units.iter().filter(|unit| unit.exit()).count();
        if cancelled > 0 {
            tracing::debug!("Exited {} transition(s) on {}", cancelled, target);
        }
        cancelled
    }

    /// Cancel every tracked run. Returns the number cancelled.
    pub fn exit_all(&self) -> usize {
        let units: Vec<_> = {
            let mut entries = self.entries.lock();
            entries.drain().flat_map(|(_, entry)| entry.units(true)).collect()
        };
        units.iter().filter(|unit| unit.exit()).count()
    }

    /// Forget targets that no longer exist. Returns the number removed.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_alive());
        before - entries.len()
    }

    /// Number of tracked targets
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no target is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether any run is live on `target`
    pub fn is_running(&self, target: TargetId) -> bool {
        let units = match self.entries.lock().get(&target) {
            Some(entry) => entry.units(true),
            None => return false,
        };
        units.iter().any(|unit| unit.is_running())
    }

    /// Number of shared units tracked for `target`
    pub fn shared_count(&self, target: TargetId) -> usize {
        self.entries.lock().get(&target).map_or(0, |entry| entry.shared.len())
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("targets", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardState;
    use crate::cancel::CancelToken;
    use crate::effect::TransitionEffect;
    use crate::testing::{EventLog, Widget};

    fn control(target: &TargetRef<Widget>, log: &EventLog, tag: &'static str) -> Arc<RunControl> {
        let mut effect = TransitionEffect::new();
        log.record(&mut effect, tag);
        RunControl::new(CancelToken::new(), target.id(), effect)
    }

    #[test]
    fn test_exclusive_unit_is_idempotent() {
        let scheduler = Scheduler::new();
        let widget = Widget::new();
        let target = TargetRef::new(&widget);

        let a = scheduler.find_or_create(&target, true);
        let b = scheduler.find_or_create(&target, true);
        assert_eq!(a.id(), b.id());
        assert!(a.is_exclusive());

        let c = scheduler.find_or_create(&target, false);
        let d = scheduler.find_or_create(&target, false);
        assert_ne!(c.id(), d.id());
        assert_eq!(scheduler.shared_count(target.id()), 2);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_exclusive_start_cancels_previous_first() {
        let scheduler = Scheduler::new();
        let widget = Widget::new();
        let target = TargetRef::new(&widget);
        let log = EventLog::default();

        let first = control(&target, &log, "a");
        scheduler.start(&target, true, first.clone());
        assert!(scheduler.is_running(target.id()));
        assert!(log.entries().is_empty());

        let second = control(&target, &log, "b");
        scheduler.start(&target, true, second.clone());

        assert_eq!(log.entries(), vec!["a:Canceled", "a:Finally"]);
        assert!(first.token().is_cancelled());
        assert_eq!(first.state(), BoardState::Finalized);
        assert!(!second.token().is_cancelled());
    }

    #[test]
    fn test_shared_runs_do_not_cancel_each_other() {
        let scheduler = Scheduler::new();
        let widget = Widget::new();
        let target = TargetRef::new(&widget);
        let log = EventLog::default();

        let a = control(&target, &log, "a");
        let b = control(&target, &log, "b");
        let unit_a = scheduler.start(&target, false, a.clone());
        scheduler.start(&target, false, b.clone());
        assert_eq!(scheduler.shared_count(target.id()), 2);
        assert!(log.entries().is_empty());

        scheduler.release(&unit_a, &a);
        assert_eq!(scheduler.shared_count(target.id()), 1);
    }

    #[test]
    fn test_release_drops_idle_entry() {
        let scheduler = Scheduler::new();
        let widget = Widget::new();
        let target = TargetRef::new(&widget);
        let log = EventLog::default();

        let run = control(&target, &log, "a");
        let unit = scheduler.start(&target, true, run.clone());
        scheduler.release(&unit, &run);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_stale_release_keeps_newer_run() {
        let scheduler = Scheduler::new();
        let widget = Widget::new();
        let target = TargetRef::new(&widget);
        let log = EventLog::default();

        let old = control(&target, &log, "a");
        let unit = scheduler.start(&target, true, old.clone());
        let new = control(&target, &log, "b");
        scheduler.start(&target, true, new);

        scheduler.release(&unit, &old);
        assert!(scheduler.is_running(target.id()));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_exit_counts_cancelled_runs() {
        let scheduler = Scheduler::new();
        let widget = Widget::new();
        let target = TargetRef::new(&widget);
        let log = EventLog::default();

        scheduler.start(&target, true, control(&target, &log, "a"));
        scheduler.start(&target, false, control(&target, &log, "b"));
        scheduler.start(&target, false, control(&target, &log, "c"));

        assert_eq!(scheduler.exit(target.id(), false), 1);
        assert_eq!(scheduler.shared_count(target.id()), 2);
        assert_eq!(scheduler.exit(target.id(), true), 2);
        assert!(scheduler.is_empty());
        assert_eq!(log.count("b:Finally"), 1);
        assert_eq!(log.count("c:Canceled"), 1);
    }

    #[test]
    fn test_exit_all_and_prune() {
        let scheduler = Scheduler::new();
        let log = EventLog::default();
        let kept = Widget::new();
        let gone = Widget::new();
        let kept_ref = TargetRef::new(&kept);
        let gone_ref = TargetRef::new(&gone);

        scheduler.find_or_create(&kept_ref, true);
        scheduler.find_or_create(&gone_ref, true);
        drop(gone);
        assert_eq!(scheduler.prune(), 1);
        assert_eq!(scheduler.len(), 1);

        scheduler.start(&kept_ref, true, control(&kept_ref, &log, "a"));
        assert_eq!(scheduler.exit_all(), 1);
        assert!(scheduler.is_empty());
    }
}
