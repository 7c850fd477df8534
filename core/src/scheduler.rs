//! Deterministic timer service shared by the world and the pure systems.
//!
//! Timers carry a caller-defined payload instead of a callback. Advancing the
//! scheduler drains every payload whose deadline elapsed, in deadline order,
//! so the owner decides how to react on the same logical thread.

use std::time::Duration;

/// Shortest period accepted for repeating timers.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Opaque token identifying a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Payload released by [`Scheduler::advance`] once its deadline elapsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    /// Handle returned when the timer was scheduled.
    pub handle: TimerHandle,
    /// Payload supplied when the timer was scheduled.
    pub payload: T,
}

#[derive(Clone, Debug)]
struct Entry<T> {
    handle: TimerHandle,
    due: Duration,
    period: Option<Duration>,
    payload: T,
}

/// Single-threaded timer queue driven by explicit time advancement.
#[derive(Clone, Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_handle: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Creates an empty scheduler whose clock starts at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 1,
            entries: Vec::new(),
        }
    }

    /// Schedules a one-shot timer that fires once `delay` elapsed.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimerHandle {
        self.insert(delay, None, payload)
    }

    /// Schedules a timer that fires every `period`, starting one period from now.
    ///
    /// Periods shorter than one millisecond are raised to one millisecond.
    pub fn schedule_repeating(&mut self, period: Duration, payload: T) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        self.insert(period, Some(period), payload)
    }

    /// Cancels a pending timer. Returns `false` when the handle already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.iter().position(|entry| entry.handle == handle) {
            Some(index) => {
                let _ = self.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Reports whether the timer is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Time left before the timer fires, or `None` when it is no longer pending.
    #[must_use]
    pub fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        self.entries
            .iter()
            .find(|entry| entry.handle == handle)
            .map(|entry| entry.due.saturating_sub(self.now))
    }

    /// Drops every pending timer without firing it.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no timer is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.entries.push(Entry {
            handle,
            due: self.now.saturating_add(delay),
            period,
            payload,
        });
        handle
    }
}

impl<T: Clone> Scheduler<T> {
    /// Advances the clock by `dt` and appends every elapsed timer to `out`.
    ///
    /// Timers fire ordered by deadline, ties broken by scheduling order. A
    /// repeating timer fires once per elapsed period.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Fired<T>>) {
        self.now = self.now.saturating_add(dt);

        loop {
            let now = self.now;
            let next = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.due <= now)
                .min_by_key(|(_, entry)| (entry.due, entry.handle))
                .map(|(index, _)| index);
            let Some(index) = next else {
                break;
            };

            match self.entries[index].period {
                Some(period) => {
                    let entry = &mut self.entries[index];
                    out.push(Fired {
                        handle: entry.handle,
                        payload: entry.payload.clone(),
                    });
                    entry.due = entry.due.saturating_add(period);
                }
                None => {
                    let entry = self.entries.swap_remove(index);
                    out.push(Fired {
                        handle: entry.handle,
                        payload: entry.payload,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>, dt: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        scheduler.advance(dt, &mut fired);
        fired.into_iter().map(|fired| fired.payload).collect()
    }

    #[test]
    fn one_shot_fires_once_after_delay() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(Duration::from_secs(2), "timeout");

        assert!(drain(&mut scheduler, Duration::from_millis(1_999)).is_empty());
        assert_eq!(
            scheduler.remaining(handle),
            Some(Duration::from_millis(1))
        );
        assert_eq!(drain(&mut scheduler, Duration::from_millis(1)), vec!["timeout"]);
        assert!(!scheduler.is_pending(handle));
        assert!(drain(&mut scheduler, Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        let _ = scheduler.schedule(Duration::from_secs(3), "late");
        let _ = scheduler.schedule(Duration::from_secs(1), "early");
        let _ = scheduler.schedule(Duration::from_secs(1), "early-second");

        assert_eq!(
            drain(&mut scheduler, Duration::from_secs(5)),
            vec!["early", "early-second", "late"]
        );
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(Duration::from_secs(1), "cancelled");

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert_eq!(scheduler.remaining(handle), None);
        assert!(drain(&mut scheduler, Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn repeating_timer_fires_once_per_period() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_repeating(Duration::from_millis(100), "hud");

        assert_eq!(drain(&mut scheduler, Duration::from_millis(350)).len(), 3);
        assert_eq!(
            scheduler.remaining(handle),
            Some(Duration::from_millis(50))
        );
        assert!(scheduler.cancel(handle));
        assert!(drain(&mut scheduler, Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn zero_period_is_raised_to_minimum() {
        let mut scheduler = Scheduler::new();
        let _ = scheduler.schedule_repeating(Duration::ZERO, "spin");

        assert_eq!(drain(&mut scheduler, Duration::from_millis(3)).len(), 3);
    }
}
