//! Cadence Core Runtime
//!
//! The temporal core of a frame-driven game:
//!
//! - **Scheduler**: virtual clock with one-shot, interval, and per-tick callbacks
//! - **Weak Callbacks**: scheduling a callback never keeps its owner alive
//! - **Failure Isolation**: a failing callback is reported and unscheduled
//!   without disturbing the rest of the tick
//!
//! Everything runs synchronously inside [`Scheduler::tick`], which the host
//! game loop calls once per rendered frame.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use cadence_core::{Callback, Scheduler};
//!
//! struct Spawner {
//!     spawned: Cell<u32>,
//! }
//!
//! let scheduler = Scheduler::new();
//! let spawner = Rc::new(Spawner { spawned: Cell::new(0) });
//!
//! let spawn = Callback::bound(&spawner, |s: &Spawner, _dt| {
//!     s.spawned.set(s.spawned.get() + 1);
//!     Ok(())
//! });
//! scheduler.schedule_interval(&spawn, 0.5);
//!
//! for _ in 0..4 {
//!     scheduler.tick(0.25);
//! }
//! assert_eq!(spawner.spawned.get(), 2);
//!
//! // Dropping the owner silently retires its callbacks.
//! drop(spawner);
//! scheduler.tick(0.5);
//! assert_eq!(scheduler.pending_count(), 0);
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod scheduler;

pub use callback::{Callback, CallbackId, CallbackResult};
pub use config::{IntervalPolicy, SchedulerConfig};
pub use error::{CallbackFailure, CallbackKind, ErrorReporter, TracingReporter};
pub use scheduler::{Scheduler, SchedulerHandle};
