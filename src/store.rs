use crate::models::{Cycle, CycleId, CyclesState, NewCycle};
use crate::reducer::{reduce, CycleAction};
use crate::storage::Storage;
use anyhow::Result;
use chrono::{DateTime, Utc};

/// What the presentation layer reads after every change.
#[derive(Debug, Clone, Copy)]
pub struct StoreView<'a> {
    pub cycles: &'a [Cycle],
    pub active_cycle: Option<&'a Cycle>,
    pub active_cycle_id: Option<&'a CycleId>,
    pub amount_seconds_passed: i64,
}

impl StoreView<'_> {
    pub fn remaining_seconds(&self) -> i64 {
        self.active_cycle
            .map(|c| (c.total_seconds() - self.amount_seconds_passed).max(0))
            .unwrap_or(0)
    }
}

/// Owns the cycle history and the active pointer, and writes a snapshot to
/// storage after every transition that changes them.
pub struct CycleStore {
    pub storage: Storage,
    state: CyclesState,
    amount_seconds_passed: i64,
}

impl CycleStore {
    pub fn new(storage: Storage, now: DateTime<Utc>) -> Self {
        let mut state = storage.load_or_default();

        if state.active_cycle_id.is_some()
            && state.active_cycle().map_or(true, |c| c.ended_at().is_some())
        {
            tracing::warn!("stored active cycle is missing or already ended, clearing it");
            state.active_cycle_id = None;
        }

        let amount_seconds_passed = state
            .active_cycle()
            .map(|c| elapsed_seconds(c.start_date, now).min(c.total_seconds()))
            .unwrap_or(0);

        Self {
            storage,
            state,
            amount_seconds_passed,
        }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.state.cycles
    }

    pub fn active_cycle(&self) -> Option<&Cycle> {
        self.state.active_cycle()
    }

    pub fn active_cycle_id(&self) -> Option<&CycleId> {
        self.state.active_cycle_id.as_ref()
    }

    pub fn amount_seconds_passed(&self) -> i64 {
        self.amount_seconds_passed
    }

    pub fn set_seconds_passed(&mut self, seconds: i64) {
        self.amount_seconds_passed = seconds;
    }

    pub fn view(&self) -> StoreView<'_> {
        StoreView {
            cycles: &self.state.cycles,
            active_cycle: self.state.active_cycle(),
            active_cycle_id: self.state.active_cycle_id.as_ref(),
            amount_seconds_passed: self.amount_seconds_passed,
        }
    }

    /// Starts a new cycle at `now`. Returns `None` when the input is invalid
    /// or another cycle is still running.
    pub fn create_cycle(
        &mut self,
        task: &str,
        minutes_amount: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<CycleId>> {
        let input = match NewCycle::parse(task, minutes_amount) {
            Ok(input) => input,
            Err(err) => {
                tracing::debug!(error = %err, "rejected new cycle");
                return Ok(None);
            }
        };
        if self.state.active_cycle_id.is_some() {
            tracing::debug!("a cycle is already running, ignoring create");
            return Ok(None);
        }

        let id = self.state.next_id(now);
        let cycle = Cycle::new_at(id.clone(), input, now);
        tracing::info!(id = %id, task = %cycle.task, minutes = cycle.minutes_amount, "cycle started");

        self.apply(CycleAction::Create(cycle))?;
        self.amount_seconds_passed = 0;
        Ok(Some(id))
    }

    /// Returns whether a running cycle was interrupted.
    pub fn interrupt_active_cycle(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let Some(id) = self.state.active_cycle_id.clone() else {
            return Ok(false);
        };
        tracing::info!(id = %id, "cycle interrupted");
        self.apply(CycleAction::Interrupt { at: now })?;
        Ok(true)
    }

    /// Returns whether a running cycle was marked finished.
    pub fn finish_active_cycle(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let Some(id) = self.state.active_cycle_id.clone() else {
            return Ok(false);
        };
        tracing::info!(id = %id, "cycle finished");
        self.apply(CycleAction::Finish { at: now })?;
        Ok(true)
    }

    /// Finishes the active cycle if its length already ran out, e.g. while
    /// nothing was ticking. Returns whether it did.
    pub fn finish_if_overdue(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let Some(total) = self
            .active_cycle()
            .filter(|c| elapsed_seconds(c.start_date, now) >= c.total_seconds())
            .map(|c| c.total_seconds())
        else {
            return Ok(false);
        };
        self.finish_active_cycle(now)?;
        self.amount_seconds_passed = total;
        Ok(true)
    }

    fn apply(&mut self, action: CycleAction) -> Result<()> {
        self.state = reduce(&self.state, action);
        self.storage.save(&self.state)
    }
}

/// Whole seconds from `start` to `now`, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_seconds().max(0)
}
