//! Virtual clock and cooperative event scheduler
//!
//! The host game loop calls [`Scheduler::tick`] once per rendered frame with
//! the elapsed time. Each tick:
//!
//! 1. advances virtual time by `dt`
//! 2. invokes every per-tick listener with `dt`, in registration order
//! 3. fires every timed event that was due when step 3 began, earliest first
//!
//! Callbacks may call back into the scheduler (usually through a
//! [`SchedulerHandle`]) while a tick is running. Events they schedule never
//! fire within the same tick, and anything they unschedule is skipped for the
//! rest of it.
//!
//! # Ordering
//!
//! Events with equal fire times fire in the order they were scheduled.
//! Interval events are requeued according to the configured
//! [`IntervalPolicy`].

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::callback::Callback;
use crate::config::{IntervalPolicy, SchedulerConfig};
use crate::error::{CallbackFailure, CallbackKind, ErrorReporter, TracingReporter};

new_key_type! {
    /// Slot of a pending timed event
    struct EventId;
    /// Slot of a per-tick listener
    struct ListenerId;
}

/// A pending one-shot or interval event
struct Event {
    callback: Callback,
    fire_time: f64,
    repeat: Option<f64>,
    /// Sequence number of the queue entry currently allowed to fire this event
    seq: u64,
}

/// Entry in the fire-time queue
///
/// Entries are never removed from the heap when an event is unscheduled or
/// requeued; a popped entry only counts if its event still exists and still
/// carries the entry's sequence number.
#[derive(Clone, Copy, Debug)]
struct QueueEntry {
    fire_time: f64,
    seq: u64,
    id: EventId,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted: BinaryHeap is a max-heap and the earliest entry must be on top.
        other
            .fire_time
            .total_cmp(&self.fire_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// Values pulled out of the scheduler by `unschedule`
///
/// Held until the state borrow is released so that drop glue of user
/// closures can safely re-enter the scheduler.
#[derive(Default)]
struct Removed {
    matched: usize,
    pruned: usize,
    events: SmallVec<[Event; 4]>,
    listeners: SmallVec<[Callback; 4]>,
}

/// Internal state of the scheduler
struct SchedulerState {
    config: SchedulerConfig,
    time: f64,
    paused: bool,
    next_seq: u64,
    events: SlotMap<EventId, Event>,
    queue: BinaryHeap<QueueEntry>,
    listeners: SlotMap<ListenerId, Callback>,
    listener_order: Vec<ListenerId>,
    reporter: Rc<dyn ErrorReporter>,
}

impl SchedulerState {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            time: 0.0,
            paused: false,
            next_seq: 0,
            events: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            listeners: SlotMap::with_key(),
            listener_order: Vec::new(),
            reporter: Rc::new(TracingReporter),
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn push_event(&mut self, callback: Callback, delay: f64, repeat: Option<f64>) {
        let fire_time = self.time + delay;
        let seq = self.bump_seq();
        let id = self.events.insert(Event {
            callback,
            fire_time,
            repeat,
            seq,
        });
        self.queue.push(QueueEntry { fire_time, seq, id });
    }

    /// Put a fired interval event back on the queue
    fn requeue(&mut self, id: EventId) {
        let now = self.time;
        let policy = self.config.interval_policy;
        let seq = self.bump_seq();

        let Some(event) = self.events.get_mut(id) else {
            return;
        };
        let Some(interval) = event.repeat else {
            return;
        };

        event.fire_time = match policy {
            IntervalPolicy::FromNow => now + interval,
            IntervalPolicy::FromFireTime => event.fire_time + interval,
        };
        event.seq = seq;
        self.queue.push(QueueEntry {
            fire_time: event.fire_time,
            seq,
            id,
        });
    }

    /// Pop every live event due at the current time, in firing order
    fn drain_due(&mut self) -> SmallVec<[EventId; 8]> {
        let mut due = SmallVec::new();
        while self
            .queue
            .peek()
            .is_some_and(|entry| entry.fire_time <= self.time)
        {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            let current = self
                .events
                .get(entry.id)
                .is_some_and(|event| event.seq == entry.seq);
            if current {
                due.push(entry.id);
            }
        }
        due
    }

    fn remove_matching(&mut self, callback: &Callback) -> Removed {
        let mut removed = Removed::default();

        let doomed: SmallVec<[EventId; 8]> = self
            .events
            .iter()
            .filter(|(_, event)| !event.callback.is_alive() || event.callback == *callback)
            .map(|(id, _)| id)
            .collect();
        for id in doomed {
            if let Some(event) = self.events.remove(id) {
                if !event.callback.is_alive() {
                    removed.pruned += 1;
                } else {
                    removed.matched += 1;
                }
                removed.events.push(event);
            }
        }

        let doomed: SmallVec<[ListenerId; 8]> = self
            .listeners
            .iter()
            .filter(|(_, listener)| !listener.is_alive() || *listener == callback)
            .map(|(id, _)| id)
            .collect();
        for id in doomed {
            if let Some(listener) = self.listeners.remove(id) {
                if !listener.is_alive() {
                    removed.pruned += 1;
                } else {
                    removed.matched += 1;
                }
                removed.listeners.push(listener);
            }
        }
        if !removed.listeners.is_empty() {
            self.listener_order
                .retain(|id| self.listeners.contains_key(*id));
        }

        removed
    }

    fn remove_listener(&mut self, id: ListenerId) -> Option<Callback> {
        let listener = self.listeners.remove(id)?;
        self.listener_order.retain(|other| *other != id);
        Some(listener)
    }
}

/// The scheduler that owns virtual time
///
/// Cloning a `Scheduler` shares the same clock. Independent clocks (for
/// example a pausable game clock next to a UI clock) are separate
/// `Scheduler::new()` values.
///
/// # Example
///
/// ```ignore
/// let scheduler = Scheduler::new();
/// let blink = Callback::new(|_| {
///     toggle_cursor();
///     Ok(())
/// });
/// scheduler.schedule_interval(&blink, 0.5);
///
/// // host loop
/// scheduler.tick(frame_dt);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerState>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerState::new(config))),
        }
    }

    /// Replace the collaborator that receives callback failures
    ///
    /// Defaults to [`TracingReporter`].
    pub fn set_reporter<R>(&self, reporter: R)
    where
        R: ErrorReporter + 'static,
    {
        self.inner.borrow_mut().reporter = Rc::new(reporter);
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.borrow().config
    }

    /// Get a weak handle to this scheduler for passing to callbacks
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Current virtual time in seconds
    pub fn time(&self) -> f64 {
        self.inner.borrow().time
    }

    /// Fire `callback` once, `delay` seconds from now
    ///
    /// The same callback may be pending several times.
    pub fn schedule(&self, callback: &Callback, delay: f64) {
        self.inner
            .borrow_mut()
            .push_event(callback.clone(), delay, None);
    }

    /// Like [`schedule`](Self::schedule), but drops any other pending
    /// occurrence of `callback` first
    pub fn schedule_unique(&self, callback: &Callback, delay: f64) {
        self.unschedule(callback);
        self.schedule(callback, delay);
    }

    /// Fire `callback` every `interval` seconds, starting `interval` from now
    pub fn schedule_interval(&self, callback: &Callback, interval: f64) {
        self.inner
            .borrow_mut()
            .push_event(callback.clone(), interval, Some(interval));
    }

    /// Invoke `callback` with `dt` on every tick
    ///
    /// A listener added while a tick is running is first invoked on the
    /// following tick.
    pub fn each_tick(&self, callback: &Callback) {
        let mut state = self.inner.borrow_mut();
        let id = state.listeners.insert(callback.clone());
        state.listener_order.push(id);
    }

    /// Remove every pending event and per-tick listener for `callback`
    ///
    /// Returns how many were removed; unknown callbacks are a no-op. Dead
    /// callbacks met along the way are pruned and not counted.
    pub fn unschedule(&self, callback: &Callback) -> usize {
        let removed = self.inner.borrow_mut().remove_matching(callback);
        if removed.pruned > 0 {
            tracing::trace!(pruned = removed.pruned, "pruned dead callbacks");
        }
        removed.matched
    }

    /// Check whether `callback` has a pending event or listener
    pub fn is_scheduled(&self, callback: &Callback) -> bool {
        let state = self.inner.borrow();
        state.events.values().any(|event| event.callback == *callback)
            || state.listeners.values().any(|listener| listener == callback)
    }

    /// Number of pending timed events
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().events.len()
    }

    /// Number of registered per-tick listeners
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Stop time: ticks are ignored until [`resume`](Self::resume)
    pub fn pause(&self) {
        self.inner.borrow_mut().paused = true;
    }

    pub fn resume(&self) {
        self.inner.borrow_mut().paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.inner.borrow().paused
    }

    /// Advance virtual time by `dt` and run everything that is due
    pub fn tick(&self, dt: f64) {
        let listeners = {
            let mut state = self.inner.borrow_mut();
            if state.paused {
                return;
            }
            state.time += dt;
            state.listener_order.clone()
        };

        for id in listeners {
            // Skip listeners removed earlier in this tick.
            let listener = self.inner.borrow().listeners.get(id).cloned();
            let Some(listener) = listener else {
                continue;
            };
            match listener.invoke(dt) {
                Some(Ok(())) => {}
                Some(Err(error)) => self.fail(&listener, CallbackKind::EachTick, error),
                None => {
                    let dead = self.inner.borrow_mut().remove_listener(id);
                    tracing::trace!(callback = %listener.id(), "pruned dead listener");
                    drop(dead);
                }
            }
        }

        let due = self.inner.borrow_mut().drain_due();
        for id in due {
            let event = self
                .inner
                .borrow()
                .events
                .get(id)
                .map(|event| (event.callback.clone(), event.repeat.is_some()));
            let Some((callback, repeating)) = event else {
                continue;
            };
            let fired = if repeating {
                None
            } else {
                self.inner.borrow_mut().events.remove(id)
            };

            tracing::trace!(callback = %callback.id(), repeating, "firing event");
            match callback.invoke(dt) {
                Some(Ok(())) => {
                    if repeating {
                        self.inner.borrow_mut().requeue(id);
                    }
                }
                Some(Err(error)) => self.fail(&callback, CallbackKind::Timed, error),
                None => {
                    let dead = self.inner.borrow_mut().events.remove(id);
                    tracing::trace!(callback = %callback.id(), "pruned dead event");
                    drop(dead);
                }
            }
            drop(fired);
        }
    }

    /// Report a failed callback, then unschedule it
    fn fail(&self, callback: &Callback, kind: CallbackKind, error: anyhow::Error) {
        let (reporter, time) = {
            let state = self.inner.borrow();
            (Rc::clone(&state.reporter), state.time)
        };
        reporter.report(&CallbackFailure {
            callback: callback.id(),
            kind,
            time,
            error,
        });
        let removed = self.unschedule(callback);
        tracing::debug!(callback = %callback.id(), removed, "unscheduled failed callback");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("time", &state.time)
            .field("paused", &state.paused)
            .field("events", &state.events.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// A weak handle to a scheduler
///
/// Callbacks capture this instead of a [`Scheduler`] so that the scheduler
/// does not end up owning itself. Every operation is a no-op once the
/// scheduler has been dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerState>>,
}

impl SchedulerHandle {
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn time(&self) -> Option<f64> {
        self.upgrade().map(|scheduler| scheduler.time())
    }

    /// Returns `false` if the scheduler is gone
    pub fn schedule(&self, callback: &Callback, delay: f64) -> bool {
        self.upgrade()
            .map(|scheduler| scheduler.schedule(callback, delay))
            .is_some()
    }

    /// Returns `false` if the scheduler is gone
    pub fn schedule_unique(&self, callback: &Callback, delay: f64) -> bool {
        self.upgrade()
            .map(|scheduler| scheduler.schedule_unique(callback, delay))
            .is_some()
    }

    /// Returns `false` if the scheduler is gone
    pub fn schedule_interval(&self, callback: &Callback, interval: f64) -> bool {
        self.upgrade()
            .map(|scheduler| scheduler.schedule_interval(callback, interval))
            .is_some()
    }

    /// Returns `false` if the scheduler is gone
    pub fn each_tick(&self, callback: &Callback) -> bool {
        self.upgrade()
            .map(|scheduler| scheduler.each_tick(callback))
            .is_some()
    }

    pub fn unschedule(&self, callback: &Callback) -> usize {
        self.upgrade()
            .map(|scheduler| scheduler.unschedule(callback))
            .unwrap_or(0)
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
