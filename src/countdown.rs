use crate::models::CycleId;
use crate::store::{elapsed_seconds, CycleStore};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No cycle is running, nothing is scheduled.
    Idle,
    /// Scheduled, but the next tick is not due yet.
    Waiting,
    Progress(i64),
    /// The cycle reached its length; carries the clamped elapsed seconds.
    Finished(i64),
}

#[derive(Debug, Clone)]
struct Anchor {
    cycle_id: CycleId,
    start_date: DateTime<Utc>,
    total_seconds: i64,
    next_due: DateTime<Utc>,
}

/// Periodic sampler for the active cycle.
///
/// Elapsed time is always recomputed from the cycle's start instant, so
/// missed or late ticks never make the count drift. The schedule follows
/// whichever cycle the store reports as active and is dropped as soon as
/// that cycle ends.
pub struct Countdown {
    interval: Duration,
    anchor: Option<Anchor>,
}

impl Countdown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            anchor: None,
        }
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.anchor.as_ref().map(|a| a.next_due)
    }

    pub fn cancel(&mut self) {
        if let Some(anchor) = self.anchor.take() {
            tracing::debug!(id = %anchor.cycle_id, "countdown cancelled");
        }
    }

    pub fn poll(&mut self, store: &mut CycleStore, now: DateTime<Utc>) -> Result<Tick> {
        self.follow_active(store, now);

        let Some(anchor) = self.anchor.as_mut() else {
            return Ok(Tick::Idle);
        };
        if now < anchor.next_due {
            return Ok(Tick::Waiting);
        }
        anchor.next_due = now + self.interval;

        let elapsed = elapsed_seconds(anchor.start_date, now);
        if elapsed >= anchor.total_seconds {
            let total = anchor.total_seconds;
            self.anchor = None;
            store.finish_active_cycle(now)?;
            store.set_seconds_passed(total);
            return Ok(Tick::Finished(total));
        }

        tracing::debug!(elapsed, "tick");
        store.set_seconds_passed(elapsed);
        Ok(Tick::Progress(elapsed))
    }

    /// Re-anchors on a newly started cycle and drops the schedule when the
    /// store no longer has the anchored cycle active.
    fn follow_active(&mut self, store: &CycleStore, now: DateTime<Utc>) {
        let Some(active) = store.active_cycle() else {
            self.cancel();
            return;
        };
        if self.anchor.as_ref().map(|a| &a.cycle_id) == Some(&active.id) {
            return;
        }

        tracing::debug!(id = %active.id, "countdown anchored");
        self.anchor = Some(Anchor {
            cycle_id: active.id.clone(),
            start_date: active.start_date,
            total_seconds: active.total_seconds(),
            next_due: now + self.interval,
        });
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
