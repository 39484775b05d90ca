//! Scheduler configuration

/// How an interval event computes its next fire time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntervalPolicy {
    /// `now + interval`, measured from the tick that fired the event.
    ///
    /// A slow frame pushes every later occurrence back, so repeats drift.
    #[default]
    FromNow,
    /// `previous fire time + interval`; repeats stay on a fixed grid.
    FromFireTime,
}

/// Configuration for a [`Scheduler`](crate::Scheduler)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SchedulerConfig {
    pub interval_policy: IntervalPolicy,
}

impl SchedulerConfig {
    /// Intervals that stay on their original grid regardless of frame pacing
    pub fn drift_free() -> Self {
        Self {
            interval_policy: IntervalPolicy::FromFireTime,
        }
    }
}
