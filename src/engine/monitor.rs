// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Background supervision for one line's execution.
//!
//! The scheduler registers every node task in a [`TaskRegistry`]. Two monitor
//! threads read it:
//!
//! * [`StallMonitor`] wakes every poll interval and reports async tasks that
//!   have been running longer than the logging interval. Work dispatched to the
//!   blocking pool is skipped.
//! * [`CancellationMonitor`] starts once a line is cancelled. Blocking tools
//!   cannot be interrupted, so it waits a bounded time for the registry to
//!   drain and then exits the process through the configured hook.
//!
//! Both run on plain OS threads so a saturated runtime cannot silence them.

use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::CancellationOptions;
use crate::observability::messages::monitor::{
    AllTasksDoneAfterCancellation, CancellationMonitorStarted, LongRunningTask,
    StallMonitorStarted, TasksOutstandingAfterCancellation,
};
use crate::observability::messages::StructuredLog;

/// Registry key for one node task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Awaited on the runtime, including sync tools still waiting for a permit.
    Async,
    /// Handed to the blocking pool; only the worker closure can retire it.
    Blocking,
}

#[derive(Debug)]
struct TaskRecord {
    node_name: String,
    kind: TaskKind,
    started: Instant,
    last_logged: Option<Instant>,
    spawn_trace: Arc<Backtrace>,
}

/// A task that has run past the logging interval.
#[derive(Debug, Clone)]
pub struct StalledTask {
    pub node_name: String,
    pub elapsed: Duration,
    pub spawn_trace: Arc<Backtrace>,
}

/// Start times and last-report times of the node tasks of one line.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    next_key: AtomicU64,
    records: Mutex<HashMap<TaskKey, TaskRecord>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<TaskKey, TaskRecord>> {
        // A panic while holding the lock leaves the map consistent; keep going.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, node_name: &str) -> TaskKey {
        let key = TaskKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        self.records().insert(
            key,
            TaskRecord {
                node_name: node_name.to_string(),
                kind: TaskKind::Async,
                started: Instant::now(),
                last_logged: None,
                // Captured only when RUST_BACKTRACE/RUST_LIB_BACKTRACE ask for it.
                spawn_trace: Arc::new(Backtrace::capture()),
            },
        );
        key
    }

    /// Mark the task as running on the blocking pool. The returned guard
    /// retires the record when the worker closure finishes or is dropped.
    pub fn enter_blocking(self: &Arc<Self>, key: TaskKey) -> BlockingGuard {
        if let Some(record) = self.records().get_mut(&key) {
            record.kind = TaskKind::Blocking;
        }
        BlockingGuard {
            registry: Arc::clone(self),
            key,
        }
    }

    /// The scheduler observed the task finish. Blocking work keeps its record
    /// until its guard drops, since an aborted wrapper does not stop the thread.
    pub fn finish(&self, key: TaskKey) {
        let mut records = self.records();
        if matches!(records.get(&key), Some(record) if record.kind == TaskKind::Async) {
            records.remove(&key);
        }
    }

    pub fn kind(&self, key: TaskKey) -> Option<TaskKind> {
        self.records().get(&key).map(|r| r.kind)
    }

    pub fn all_done(&self) -> bool {
        self.records().is_empty()
    }

    pub fn outstanding(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records().values().map(|r| r.node_name.clone()).collect();
        names.sort();
        names
    }

    /// Async tasks running longer than `interval` whose last report (or start)
    /// is also older than `interval`. Returned tasks are marked as reported at `now`.
    pub fn scan_stalled(&self, now: Instant, interval: Duration) -> Vec<StalledTask> {
        let mut stalled = Vec::new();
        for record in self.records().values_mut() {
            if record.kind == TaskKind::Blocking {
                continue;
            }
            let elapsed = now.saturating_duration_since(record.started);
            if elapsed <= interval {
                continue;
            }
            let due = record
                .last_logged
                .map_or(true, |at| now.saturating_duration_since(at) > interval);
            if due {
                record.last_logged = Some(now);
                stalled.push(StalledTask {
                    node_name: record.node_name.clone(),
                    elapsed,
                    spawn_trace: Arc::clone(&record.spawn_trace),
                });
            }
        }
        stalled.sort_by(|a, b| a.node_name.cmp(&b.node_name));
        stalled
    }
}

/// Retires a blocking task's record on drop.
pub struct BlockingGuard {
    registry: Arc<TaskRegistry>,
    key: TaskKey,
}

impl Drop for BlockingGuard {
    fn drop(&mut self) {
        self.registry.records().remove(&self.key);
    }
}

/// One-shot flag telling the stall monitor the line is over.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    done: Mutex<bool>,
    changed: Condvar,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        let mut done = self.done.lock().unwrap_or_else(|p| p.into_inner());
        *done = true;
        self.changed.notify_all();
    }

    pub fn is_set(&self) -> bool {
        *self.done.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Wait up to `timeout`; returns whether the signal is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let done = self.done.lock().unwrap_or_else(|p| p.into_inner());
        let (done, _) = self
            .changed
            .wait_timeout_while(done, timeout, |done| !*done)
            .unwrap_or_else(|p| p.into_inner());
        *done
    }
}

/// Sets the signal when dropped so every exit path stops the monitor.
pub struct CompletionGuard(pub Arc<CompletionSignal>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.set();
    }
}

pub struct StallMonitor;

impl StallMonitor {
    /// Spawn the monitor thread. It exits once `signal` is set.
    pub fn spawn(
        registry: Arc<TaskRegistry>,
        signal: Arc<CompletionSignal>,
        interval: Duration,
        poll_interval: Duration,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("flowline-stall-monitor".to_string())
            .spawn(move || {
                StallMonitorStarted { interval }.log();
                while !signal.wait_timeout(poll_interval) {
                    for task in registry.scan_stalled(Instant::now(), interval) {
                        LongRunningTask {
                            node_name: &task.node_name,
                            elapsed: task.elapsed,
                            spawn_trace: &task.spawn_trace,
                        }
                        .log();
                    }
                }
            })
    }
}

pub struct CancellationMonitor;

impl CancellationMonitor {
    /// Spawn the post-cancellation watchdog. It always ends by calling the exit hook.
    pub fn spawn(
        registry: Arc<TaskRegistry>,
        options: CancellationOptions,
        poll_interval: Duration,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("flowline-cancellation-monitor".to_string())
            .spawn(move || {
                let max_wait = options.wait_after_cancellation;
                CancellationMonitorStarted { max_wait }.log();

                let started = Instant::now();
                loop {
                    if registry.all_done() {
                        AllTasksDoneAfterCancellation.log();
                        break;
                    }
                    if started.elapsed() > max_wait {
                        TasksOutstandingAfterCancellation {
                            max_wait,
                            remaining: &registry.outstanding(),
                        }
                        .log();
                        break;
                    }
                    thread::sleep(poll_interval);
                }

                thread::sleep(options.exit_delay);
                (options.exit_hook)(0);
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn scan_reports_each_stall_once_per_interval() {
        let registry = TaskRegistry::new();
        registry.register("slow");
        let interval = Duration::from_secs(10);
        let start = Instant::now();

        assert!(registry.scan_stalled(start + Duration::from_secs(5), interval).is_empty());

        let first = registry.scan_stalled(start + Duration::from_secs(11), interval);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].node_name, "slow");
        assert!(first[0].elapsed > interval);

        // Reported at 11s, so the next report is due after 21s.
        assert!(registry.scan_stalled(start + Duration::from_secs(15), interval).is_empty());
        assert_eq!(registry.scan_stalled(start + Duration::from_secs(22), interval).len(), 1);
    }

    #[test]
    fn blocking_tasks_are_not_scanned_and_outlive_finish() {
        let registry = Arc::new(TaskRegistry::new());
        let key = registry.register("blocking");
        let guard = registry.enter_blocking(key);
        assert_eq!(registry.kind(key), Some(TaskKind::Blocking));

        let later = Instant::now() + Duration::from_secs(100);
        assert!(registry.scan_stalled(later, Duration::from_secs(1)).is_empty());

        registry.finish(key);
        assert!(!registry.all_done());
        assert_eq!(registry.outstanding(), vec!["blocking".to_string()]);

        drop(guard);
        assert!(registry.all_done());
    }

    #[test]
    fn completion_guard_stops_stall_monitor() {
        let registry = Arc::new(TaskRegistry::new());
        let signal = Arc::new(CompletionSignal::new());
        let handle = StallMonitor::spawn(
            registry,
            Arc::clone(&signal),
            Duration::from_secs(60),
            Duration::from_secs(30),
        )
        .unwrap();

        drop(CompletionGuard(Arc::clone(&signal)));
        assert!(signal.is_set());
        // Woken by the condvar, not the 30s poll.
        handle.join().unwrap();
    }

    #[test]
    fn cancellation_monitor_exits_once_registry_drains() {
        let registry = Arc::new(TaskRegistry::new());
        let key = registry.register("tool");
        let guard = registry.enter_blocking(key);

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let options = CancellationOptions {
            wait_after_cancellation: Duration::from_secs(5),
            exit_delay: Duration::ZERO,
            force_exit: true,
            exit_hook: Arc::new(move |code| {
                let _ = tx.lock().unwrap().send(code);
            }),
        };
        CancellationMonitor::spawn(Arc::clone(&registry), options, Duration::from_millis(10)).unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(guard);
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(0));
    }

    #[test]
    fn cancellation_monitor_gives_up_after_max_wait() {
        let registry = Arc::new(TaskRegistry::new());
        let key = registry.register("stuck");
        let _guard = registry.enter_blocking(key);

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let options = CancellationOptions {
            wait_after_cancellation: Duration::from_millis(50),
            exit_delay: Duration::ZERO,
            force_exit: true,
            exit_hook: Arc::new(move |code| {
                let _ = tx.lock().unwrap().send(code);
            }),
        };
        CancellationMonitor::spawn(registry, options, Duration::from_millis(10)).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(0));
    }
}
