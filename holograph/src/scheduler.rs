//! Periodic task scheduling.
//!
//! All concurrency in this crate is host-scheduled callback invocation: the
//! engine never spawns threads of its own. Hosts with a native tick
//! scheduler implement [`Scheduler`] over it; hosts without one can pump a
//! [`TickScheduler`] from their main loop.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::time::Ticks;

/// Callback run by the scheduler at the configured cadence.
pub type TaskCallback = Box<dyn FnMut() + Send>;

/// Handle to a scheduled periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// The host's cooperative task scheduler.
pub trait Scheduler: Send + Sync {
    /// Run `callback` every `period` ticks, the first time after `delay`
    /// ticks.
    fn schedule_periodic(&self, delay: Ticks, period: Ticks, callback: TaskCallback)
        -> TaskHandle;

    /// Whether `handle` refers to a task that can still run.
    fn is_pending(&self, handle: &TaskHandle) -> bool;

    /// Stop the task. A task the scheduler has already dequeued for this
    /// tick but not yet run must not run afterwards.
    fn cancel(&self, handle: &TaskHandle);
}

struct ScheduledTask {
    next_run: u64,
    period: Ticks,
    callback: TaskCallback,
}

#[derive(Default)]
struct SchedulerState {
    now: u64,
    next_handle: u64,
    tasks: BTreeMap<u64, ScheduledTask>,
    /// Tasks pulled out of `tasks` for the tick currently being processed.
    dequeued: HashSet<u64>,
    /// Dequeued tasks that were canceled before they got to run.
    canceled: HashSet<u64>,
}

/// Tick-driven [`Scheduler`]. The host calls [`TickScheduler::tick`] from
/// its main loop, 20 times to a second.
#[derive(Default)]
pub struct TickScheduler {
    state: Mutex<SchedulerState>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    /// Advance one tick and run every task that has come due.
    ///
    /// Callbacks run with the scheduler unlocked, so a callback may freely
    /// schedule or cancel tasks, including the one it belongs to.
    pub fn tick(&self) {
        let due = {
            let mut state = self.state.lock().unwrap();
            state.now += 1;
            let now = state.now;
            let due_ids: Vec<u64> = state
                .tasks
                .iter()
                .filter(|(_, task)| task.next_run <= now)
                .map(|(id, _)| *id)
                .collect();
            let mut due = Vec::with_capacity(due_ids.len());
            for id in due_ids {
                let task = state.tasks.remove(&id).unwrap();
                state.dequeued.insert(id);
                due.push((id, task));
            }
            due
        };

        for (id, mut task) in due {
            let canceled_before_run = {
                let mut state = self.state.lock().unwrap();
                if state.canceled.remove(&id) {
                    state.dequeued.remove(&id);
                    true
                } else {
                    false
                }
            };
            if canceled_before_run {
                continue;
            }

            (task.callback)();

            let mut state = self.state.lock().unwrap();
            state.dequeued.remove(&id);
            if state.canceled.remove(&id) {
                continue;
            }
            task.next_run = state.now + u64::from(task.period.max(1));
            state.tasks.insert(id, task);
        }
    }

    /// Run `ticks` ticks back to back.
    pub fn run_for(&self, ticks: Ticks) {
        for _ in 0..ticks {
            self.tick();
        }
    }
}

impl Scheduler for TickScheduler {
    fn schedule_periodic(
        &self,
        delay: Ticks,
        period: Ticks,
        callback: TaskCallback,
    ) -> TaskHandle {
        let mut state = self.state.lock().unwrap();
        let id = state.next_handle;
        state.next_handle += 1;
        let next_run = state.now + u64::from(delay);
        state.tasks.insert(
            id,
            ScheduledTask {
                next_run,
                period,
                callback,
            },
        );
        TaskHandle(id)
    }

    fn is_pending(&self, handle: &TaskHandle) -> bool {
        let state = self.state.lock().unwrap();
        state.tasks.contains_key(&handle.0)
            || (state.dequeued.contains(&handle.0) && !state.canceled.contains(&handle.0))
    }

    fn cancel(&self, handle: &TaskHandle) {
        let mut state = self.state.lock().unwrap();
        if state.tasks.remove(&handle.0).is_some() {
            return;
        }
        if state.dequeued.contains(&handle.0) {
            state.canceled.insert(handle.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> TaskCallback {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_delay_and_period() {
        let scheduler = TickScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_periodic(2, 3, counting_task(&runs));

        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        scheduler.run_for(3);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_delay_runs_on_next_tick() {
        let scheduler = TickScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_periodic(0, 1, counting_task(&runs));

        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        scheduler.run_for(4);
        assert_eq!(runs.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_cancel_stops_task() {
        let scheduler = TickScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_periodic(0, 1, counting_task(&runs));

        scheduler.tick();
        assert!(scheduler.is_pending(&handle));
        scheduler.cancel(&handle);
        assert!(!scheduler.is_pending(&handle));
        scheduler.run_for(3);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_of_dequeued_task_suppresses_it() {
        let scheduler = Arc::new(TickScheduler::new());
        let runs = Arc::new(AtomicUsize::new(0));

        // first task cancels the second in the same tick, after both have
        // been dequeued
        let victim_slot: Arc<Mutex<Option<TaskHandle>>> = Default::default();
        {
            let scheduler = scheduler.clone();
            let victim_slot = victim_slot.clone();
            scheduler.clone().schedule_periodic(
                0,
                1,
                Box::new(move || {
                    if let Some(victim) = *victim_slot.lock().unwrap() {
                        scheduler.cancel(&victim);
                    }
                }),
            );
        }
        let victim = scheduler.schedule_periodic(0, 1, counting_task(&runs));
        *victim_slot.lock().unwrap() = Some(victim);

        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_pending(&victim));
        scheduler.run_for(3);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_may_schedule() {
        let scheduler = Arc::new(TickScheduler::new());
        let runs = Arc::new(AtomicUsize::new(0));
        {
            let scheduler2 = scheduler.clone();
            let runs = runs.clone();
            scheduler.schedule_periodic(
                0,
                10,
                Box::new(move || {
                    scheduler2.schedule_periodic(
                        0,
                        10,
                        Box::new({
                            let runs = runs.clone();
                            move || {
                                runs.fetch_add(1, Ordering::SeqCst);
                            }
                        }),
                    );
                }),
            );
        }

        // the task scheduled from inside a callback first runs next tick
        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
