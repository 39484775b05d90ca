//! Weak callback references
//!
//! A [`Callback`] is what the scheduler stores for every timed event and
//! per-tick listener. Scheduling a callback never keeps its owner alive: a
//! bound callback holds only a [`Weak`] pointer to its owner, and once the
//! owner is dropped the callback resolves to "dead" and the scheduler prunes
//! it on the next encounter.
//!
//! ```ignore
//! let spawner = Rc::new(RefCell::new(Spawner::default()));
//! let spawn = Callback::bound(&spawner, |s: &RefCell<Spawner>, _dt| {
//!     s.borrow_mut().spawn();
//!     Ok(())
//! });
//! scheduler.schedule_interval(&spawn, 2.0);
//!
//! drop(spawner); // `spawn` stops firing, nothing is raised
//! ```

use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Result returned by every callback. An `Err` is reported to the
/// scheduler's [`ErrorReporter`](crate::ErrorReporter) and the callback is
/// unscheduled.
pub type CallbackResult = anyhow::Result<()>;

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Callback`]
///
/// Allocated once per constructed callback and shared by its clones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    fn next() -> Self {
        Self(NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cb#{}", self.0)
    }
}

/// Type-erased invocation target behind a [`Callback`]
trait Invoke {
    fn invoke(&self, dt: f64) -> Option<CallbackResult>;
    fn is_alive(&self) -> bool;
}

/// Closure owned by the callback itself
struct Owned<F>(F);

impl<F> Invoke for Owned<F>
where
    F: Fn(f64) -> CallbackResult,
{
    fn invoke(&self, dt: f64) -> Option<CallbackResult> {
        Some((self.0)(dt))
    }

    fn is_alive(&self) -> bool {
        true
    }
}

/// Method bound to a weakly referenced owner
struct Bound<T: ?Sized, F> {
    owner: Weak<T>,
    method: F,
}

impl<T, F> Invoke for Bound<T, F>
where
    T: ?Sized,
    F: Fn(&T, f64) -> CallbackResult,
{
    fn invoke(&self, dt: f64) -> Option<CallbackResult> {
        let owner = self.owner.upgrade()?;
        Some((self.method)(&*owner, dt))
    }

    fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

/// Weak reference to a shared closure
struct Shared<F: ?Sized>(Weak<F>);

impl<F> Invoke for Shared<F>
where
    F: Fn(f64) -> CallbackResult + ?Sized,
{
    fn invoke(&self, dt: f64) -> Option<CallbackResult> {
        let function = self.0.upgrade()?;
        Some((*function)(dt))
    }

    fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// A callback the scheduler can hold without extending its owner's lifetime
///
/// Callbacks compare equal only to their own clones, which is how
/// [`Scheduler::unschedule`](crate::Scheduler::unschedule) finds every
/// pending occurrence of one.
#[derive(Clone)]
pub struct Callback {
    id: CallbackId,
    target: Rc<dyn Invoke>,
}

impl Callback {
    /// Create an owner-less callback
    ///
    /// The closure is owned by the callback, so it stays alive for as long as
    /// anything (including the scheduler) holds the callback.
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(f64) -> CallbackResult + 'static,
    {
        Self::from_target(Rc::new(Owned(function)))
    }

    /// Bind `method` to `owner` without keeping `owner` alive
    pub fn bound<T, F>(owner: &Rc<T>, method: F) -> Self
    where
        T: ?Sized + 'static,
        F: Fn(&T, f64) -> CallbackResult + 'static,
    {
        Self::bound_weak(Rc::downgrade(owner), method)
    }

    /// Bind `method` to an already-downgraded owner
    ///
    /// Useful inside `Rc::new_cyclic`, before the owning `Rc` exists.
    pub fn bound_weak<T, F>(owner: Weak<T>, method: F) -> Self
    where
        T: ?Sized + 'static,
        F: Fn(&T, f64) -> CallbackResult + 'static,
    {
        Self::from_target(Rc::new(Bound { owner, method }))
    }

    /// Weakly reference a shared closure
    pub fn weak<F>(function: &Rc<F>) -> Self
    where
        F: Fn(f64) -> CallbackResult + ?Sized + 'static,
    {
        Self::from_target(Rc::new(Shared(Rc::downgrade(function))))
    }

    fn from_target(target: Rc<dyn Invoke>) -> Self {
        Self {
            id: CallbackId::next(),
            target,
        }
    }

    /// Get this callback's identity
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Check whether the referent is still alive
    pub fn is_alive(&self) -> bool {
        self.target.is_alive()
    }

    /// Invoke the callback with the tick's elapsed time
    ///
    /// Returns `None` when the owner has been dropped.
    pub fn invoke(&self, dt: f64) -> Option<CallbackResult> {
        self.target.invoke(dt)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Callback {}

impl std::hash::Hash for Callback {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_owned_callback_is_always_alive() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let cb = Callback::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert!(cb.is_alive());
        assert!(cb.invoke(0.016).is_some());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_bound_callback_does_not_keep_owner_alive() {
        let owner = Rc::new(Cell::new(0.0f64));
        let cb = Callback::bound(&owner, |total: &Cell<f64>, dt| {
            total.set(total.get() + dt);
            Ok(())
        });

        assert_eq!(Rc::strong_count(&owner), 1);
        assert!(matches!(cb.invoke(0.5), Some(Ok(()))));
        assert_eq!(owner.get(), 0.5);

        drop(owner);
        assert!(!cb.is_alive());
        assert!(cb.invoke(0.5).is_none());
    }

    #[test]
    fn test_weak_closure_dies_with_its_rc() {
        let function: Rc<dyn Fn(f64) -> CallbackResult> = Rc::new(|_: f64| -> CallbackResult { Ok(()) });
        let cb = Callback::weak(&function);

        assert!(cb.is_alive());
        drop(function);
        assert!(cb.invoke(0.0).is_none());
    }

    #[test]
    fn test_identity_is_shared_by_clones_only() {
        let a = Callback::new(|_| Ok(()));
        let b = Callback::new(|_| Ok(()));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_errors_are_returned_not_raised() {
        let cb = Callback::new(|_| Err(anyhow::anyhow!("boom")));
        let result = cb.invoke(0.0).expect("owned callback is alive");
        assert_eq!(result.unwrap_err().to_string(), "boom");
    }
}
