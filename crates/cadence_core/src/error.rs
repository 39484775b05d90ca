//! Callback failure reporting

use std::fmt;

use thiserror::Error;

use crate::callback::CallbackId;

/// Which scheduling mechanism invoked a failed callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackKind {
    /// A per-tick listener registered with `each_tick`
    EachTick,
    /// A one-shot or interval event
    Timed,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackKind::EachTick => f.write_str("each-tick"),
            CallbackKind::Timed => f.write_str("timed"),
        }
    }
}

/// A callback that returned an error while the scheduler was ticking
///
/// The scheduler reports the failure, then unschedules the callback so an
/// interval or per-tick callback cannot fail on every frame.
#[derive(Error, Debug)]
#[error("{kind} callback {callback} failed at t={time:.3}s: {error:#}")]
pub struct CallbackFailure {
    /// Identity of the failed callback
    pub callback: CallbackId,
    /// How the callback was scheduled
    pub kind: CallbackKind,
    /// Virtual time of the tick in which it failed
    pub time: f64,
    /// The error the callback returned
    pub error: anyhow::Error,
}

/// Receives callback failures from a [`Scheduler`](crate::Scheduler)
pub trait ErrorReporter {
    fn report(&self, failure: &CallbackFailure);
}

impl<F> ErrorReporter for F
where
    F: Fn(&CallbackFailure),
{
    fn report(&self, failure: &CallbackFailure) {
        self(failure)
    }
}

/// Default reporter: emits each failure as a `tracing` error event
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, failure: &CallbackFailure) {
        tracing::error!(
            callback = %failure.callback,
            kind = %failure.kind,
            time = failure.time,
            "{:#}",
            failure.error
        );
    }
}
