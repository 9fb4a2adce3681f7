//! Timer system for Casement.
//!
//! Provides one-shot and repeating timers plus a trailing-edge debouncer.
//! There is no background thread: the host pumps [`TimerManager::process_expired`]
//! (the toolkit does this from `Ui::pump`) and fires whatever came due.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    OneShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    next_fire: Instant,
    interval: Duration,
    kind: TimerKind,
    active: bool,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Manages all timers for a toolkit instance.
pub struct TimerManager {
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
        }
    }

    /// Start a one-shot timer that fires after `duration`.
    pub fn start_one_shot(&mut self, duration: Duration) -> TimerId {
        let next_fire = Instant::now() + duration;
        let id = self.timers.insert(TimerData {
            next_fire,
            interval: duration,
            kind: TimerKind::OneShot,
            active: true,
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time: next_fire,
        });
        id
    }

    /// Start a repeating timer that fires every `interval`.
    ///
    /// The first fire occurs after one full interval.
    pub fn start_repeating(&mut self, interval: Duration) -> TimerId {
        let next_fire = Instant::now() + interval;
        let id = self.timers.insert(TimerData {
            next_fire,
            interval,
            kind: TimerKind::Repeating,
            active: true,
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time: next_fire,
        });
        id
    }

    /// Stop and remove a timer.
    ///
    /// Returns `true` if the timer was found and removed.
    pub fn stop(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Check if a timer is currently active.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.get(id).is_some_and(|t| t.active)
    }

    /// Get the duration until the next timer fires, if any.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        // Drop stale queue entries for removed timers.
        while let Some(entry) = self.queue.peek() {
            if self.timers.get(entry.id).is_some_and(|t| t.active) {
                break;
            }
            self.queue.pop();
        }

        self.queue.peek().map(|entry| {
            entry.fire_time.saturating_duration_since(Instant::now())
        })
    }

    /// Collect all timers that have come due.
    ///
    /// One-shot timers are removed after firing; repeating timers are
    /// rescheduled.
    pub fn process_expired(&mut self) -> Vec<TimerId> {
        let now = Instant::now();
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.fire_time > now {
                break;
            }
            let entry = *entry;
            self.queue.pop();

            let Some(timer) = self.timers.get_mut(entry.id) else {
                continue;
            };
            if !timer.active || timer.next_fire > now {
                continue;
            }

            tracing::trace!(target: "casement_core::timer", id = ?entry.id, "timer fired");
            fired.push(entry.id);

            match timer.kind {
                TimerKind::OneShot => {
                    self.timers.remove(entry.id);
                }
                TimerKind::Repeating => {
                    timer.next_fire = now + timer.interval;
                    self.queue.push(TimerQueueEntry {
                        id: entry.id,
                        fire_time: timer.next_fire,
                    });
                }
            }
        }

        fired
    }

    /// Get the number of active timers.
    pub fn active_count(&self) -> usize {
        self.timers.iter().filter(|(_, t)| t.active).count()
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A trailing-edge debouncer.
///
/// Each [`trigger`](Debouncer::trigger) replaces the pending payload and
/// restarts the window; [`fire_due`](Debouncer::fire_due) yields the payload
/// only once the window has elapsed without a newer trigger. The toolkit
/// uses this to coalesce value-change notifications (an ~80 ms window) and,
/// with a zero-length window, to defer geometry reads until layout settles.
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given coalescing window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Create a zero-window debouncer: the payload is held until the next
    /// [`fire_due`](Debouncer::fire_due) call.
    pub fn deferred() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Record a new event, replacing any pending one and restarting the
    /// window. Only the last trigger within a window survives.
    pub fn trigger(&mut self, payload: T) {
        self.pending = Some((Instant::now() + self.window, payload));
    }

    /// Cancel the pending event, if any.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    /// Whether an event is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending payload if its window has elapsed.
    pub fn fire_due(&mut self) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= Instant::now() => {
                self.pending.take().map(|(_, payload)| payload)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn one_shot_fires_once() {
        let mut manager = TimerManager::new();
        let id = manager.start_one_shot(Duration::from_millis(10));

        assert!(manager.process_expired().is_empty());
        sleep(Duration::from_millis(20));
        assert_eq!(manager.process_expired(), vec![id]);
        assert!(!manager.is_active(id));
        assert!(manager.process_expired().is_empty());
    }

    #[test]
    fn repeating_timer_reschedules() {
        let mut manager = TimerManager::new();
        let id = manager.start_repeating(Duration::from_millis(5));

        sleep(Duration::from_millis(10));
        assert_eq!(manager.process_expired(), vec![id]);
        assert!(manager.is_active(id));

        sleep(Duration::from_millis(10));
        assert_eq!(manager.process_expired(), vec![id]);
        assert!(manager.stop(id));
        sleep(Duration::from_millis(10));
        assert!(manager.process_expired().is_empty());
    }

    #[test]
    fn stopped_timer_never_fires() {
        let mut manager = TimerManager::new();
        let id = manager.start_one_shot(Duration::from_millis(5));
        assert!(manager.stop(id));
        sleep(Duration::from_millis(10));
        assert!(manager.process_expired().is_empty());
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn debouncer_keeps_only_last_trigger() {
        let mut debounce = Debouncer::new(Duration::from_millis(20));
        debounce.trigger("first");
        debounce.trigger("second");

        assert!(debounce.fire_due().is_none());
        sleep(Duration::from_millis(30));
        assert_eq!(debounce.fire_due(), Some("second"));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn debouncer_restarts_window_on_trigger() {
        let mut debounce = Debouncer::new(Duration::from_millis(30));
        debounce.trigger(1);
        sleep(Duration::from_millis(20));
        debounce.trigger(2);
        // First window would have elapsed by now, but the second trigger
        // replaced it.
        sleep(Duration::from_millis(15));
        assert!(debounce.fire_due().is_none());
        sleep(Duration::from_millis(20));
        assert_eq!(debounce.fire_due(), Some(2));
    }

    #[test]
    fn deferred_debouncer_fires_on_next_pump() {
        let mut debounce = Debouncer::deferred();
        debounce.trigger("geometry");
        assert_eq!(debounce.fire_due(), Some("geometry"));
        assert_eq!(debounce.fire_due(), None);
    }
}
