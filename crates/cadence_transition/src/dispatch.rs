// SPDX-License-Identifier: MIT OR Apache-2.0
//! Home-thread dispatch.
//!
//! Property writes must land on one designated execution context (the UI or
//! "home" thread). A [`HomeDispatcher`] tells the engine whether the caller is
//! already there and queues work onto it otherwise.

use crate::error::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::{mpsc, oneshot};

/// Priority of a queued home-thread job. Later variants run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum DispatchPriority {
    /// Only when nothing else is queued
    Idle,
    /// Background work
    Background,
    /// Input handling
    Input,
    /// Rendering updates
    #[default]
    Render,
    /// Regular application work
    Normal,
    /// Ahead of everything else
    Send,
}

/// A unit of work queued onto the home thread
pub type HomeJob = Box<dyn FnOnce() + Send + 'static>;

/// Capability to reach the home thread
pub trait HomeDispatcher: Send + Sync + 'static {
    /// Whether the calling thread is the home thread
    fn is_home_thread(&self) -> bool;

    /// Queue a job onto the home thread.
    ///
    /// Returns immediately; the job runs later in priority order. Jobs posted
    /// after the host has shut down are dropped without running.
    fn run_on_home_thread(&self, job: HomeJob, priority: DispatchPriority);

    /// Whether the host still accepts work
    fn is_host_alive(&self) -> bool {
        true
    }
}

/// Dispatcher for hosts without thread affinity: every thread is home.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl HomeDispatcher for InlineDispatcher {
    fn is_home_thread(&self) -> bool {
        true
    }

    fn run_on_home_thread(&self, job: HomeJob, _priority: DispatchPriority) {
        job();
    }
}

struct QueuedJob {
    priority: DispatchPriority,
    seq: u64,
    run: HomeJob,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority first, then earlier sequence number
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A dedicated OS thread that runs queued jobs in priority order.
///
/// Jobs with a higher [`DispatchPriority`] run first; jobs of equal priority
/// run in the order they were posted. A panicking job is logged and does not
/// take the thread down.
pub struct HomeThread {
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
    alive: AtomicBool,
    seq: AtomicU64,
}

impl HomeThread {
    /// Spawn the home thread
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::unbounded_channel();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_queue(receiver))?;
        let thread_id = handle.thread().id();

        tracing::debug!("Home thread '{}' started", name);

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
            thread_id,
            alive: AtomicBool::new(true),
            seq: AtomicU64::new(0),
        })
    }

    /// Id of the home thread
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Stop accepting work and wait for queued jobs to finish.
    ///
    /// Called from the home thread itself the queue is closed without joining.
    pub fn shutdown(&self) {
        self.alive.store(false, AtomicOrdering::SeqCst);
        let sender = self.sender.lock().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if thread::current().id() != self.thread_id && handle.join().is_err() {
                tracing::error!("Home thread panicked during shutdown");
            }
        }
        tracing::debug!("Home thread stopped");
    }
}

impl HomeDispatcher for HomeThread {
    fn is_home_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn run_on_home_thread(&self, job: HomeJob, priority: DispatchPriority) {
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(QueuedJob { priority, seq, run: job }).is_err() {
                    tracing::warn!("Home thread queue closed, dropping job");
                }
            }
            None => tracing::trace!("Home thread shut down, dropping job"),
        }
    }

    fn is_host_alive(&self) -> bool {
        self.alive.load(AtomicOrdering::SeqCst)
    }
}

impl Drop for HomeThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for HomeThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeThread")
            .field("thread_id", &self.thread_id)
            .field("alive", &self.is_host_alive())
            .finish_non_exhaustive()
    }
}

/// Home thread loop
fn run_queue(mut receiver: mpsc::UnboundedReceiver<QueuedJob>) {
    let mut pending = BinaryHeap::new();

    while let Some(job) = receiver.blocking_recv() {
        pending.push(job);
        loop {
            while let Ok(job) = receiver.try_recv() {
                pending.push(job);
            }
            let Some(QueuedJob { priority, run, .. }) = pending.pop() else {
                break;
            };
            if catch_unwind(AssertUnwindSafe(run)).is_err() {
                tracing::error!("Home thread job panicked (priority {:?})", priority);
            }
        }
    }
}

/// Run `f` on the home thread and wait for its result.
///
/// Runs inline when already on the home thread. Returns `None` if the host
/// dropped the job without running it.
pub async fn read_on_home<R, F>(
    dispatcher: &dyn HomeDispatcher,
    priority: DispatchPriority,
    f: F,
) -> Option<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    if dispatcher.is_home_thread() {
        return Some(f());
    }
    if !dispatcher.is_host_alive() {
        return None;
    }

    let (tx, rx) = oneshot::channel();
    dispatcher.run_on_home_thread(
        Box::new(move || {
            let _ = tx.send(f());
        }),
        priority,
    );
    rx.await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_inline_runs_synchronously() {
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        InlineDispatcher.run_on_home_thread(Box::new(move || *counter.lock() += 1), DispatchPriority::Idle);
        assert_eq!(*hits.lock(), 1);
        assert!(InlineDispatcher.is_home_thread());
        assert!(InlineDispatcher.is_host_alive());
    }

    #[test]
    fn test_priority_order() {
        assert!(DispatchPriority::Send > DispatchPriority::Normal);
        assert!(DispatchPriority::Normal > DispatchPriority::Render);
        assert!(DispatchPriority::Render > DispatchPriority::Input);
        assert!(DispatchPriority::Background > DispatchPriority::Idle);
        assert_eq!(DispatchPriority::default(), DispatchPriority::Render);
    }

    #[test]
    fn test_home_thread_identity() {
        let home = Arc::new(HomeThread::spawn("cadence-home-test").unwrap());
        assert!(!home.is_home_thread());

        let (tx, rx) = std_mpsc::channel();
        let probe = home.clone();
        home.run_on_home_thread(
            Box::new(move || {
                let _ = tx.send((probe.is_home_thread(), thread::current().name().map(String::from)));
            }),
            DispatchPriority::Normal,
        );
        let (on_home, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(on_home);
        assert_eq!(name.as_deref(), Some("cadence-home-test"));
        home.shutdown();
    }

    #[test]
    fn test_home_thread_runs_by_priority() {
        let home = HomeThread::spawn("cadence-priority-test").unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (gate_tx, gate_rx) = std_mpsc::channel::<()>();
        let (done_tx, done_rx) = std_mpsc::channel::<()>();

        // Hold the thread busy so the remaining jobs queue up together
        home.run_on_home_thread(
            Box::new(move || {
                let _ = gate_rx.recv();
            }),
            DispatchPriority::Send,
        );
        for (label, priority) in [
            ("background", DispatchPriority::Background),
            ("send", DispatchPriority::Send),
            ("normal-1", DispatchPriority::Normal),
            ("normal-2", DispatchPriority::Normal),
        ] {
            let order = order.clone();
            home.run_on_home_thread(Box::new(move || order.lock().push(label)), priority);
        }
        home.run_on_home_thread(
            Box::new(move || {
                let _ = done_tx.send(());
            }),
            DispatchPriority::Idle,
        );

        gate_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*order.lock(), vec!["send", "normal-1", "normal-2", "background"]);
    }

    #[test]
    fn test_panicking_job_keeps_thread_alive() {
        let home = HomeThread::spawn("cadence-panic-test").unwrap();
        home.run_on_home_thread(Box::new(|| panic!("job failure")), DispatchPriority::Normal);

        let (tx, rx) = std_mpsc::channel();
        home.run_on_home_thread(
            Box::new(move || {
                let _ = tx.send(7);
            }),
            DispatchPriority::Normal,
        );
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
    }

    #[test]
    fn test_shutdown_marks_host_dead() {
        let home = HomeThread::spawn("cadence-shutdown-test").unwrap();
        assert!(home.is_host_alive());
        home.shutdown();
        assert!(!home.is_host_alive());

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        home.run_on_home_thread(Box::new(move || flag.store(true, AtomicOrdering::SeqCst)), DispatchPriority::Send);
        assert!(!ran.load(AtomicOrdering::SeqCst));
    }

    #[tokio::test]
    async fn test_read_on_home_round_trip() {
        let home = HomeThread::spawn("cadence-read-test").unwrap();
        let name = read_on_home(&home, DispatchPriority::Send, || {
            thread::current().name().map(String::from)
        })
        .await;
        assert_eq!(name.flatten().as_deref(), Some("cadence-read-test"));

        home.shutdown();
        let after = read_on_home(&home, DispatchPriority::Send, || 1).await;
        assert_eq!(after, None);
    }
}
