use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 90;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CycleId(pub String);

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Running,
    Interrupted,
    Finished,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: CycleId,
    pub task: String,
    pub minutes_amount: u32,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupted_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_date: Option<DateTime<Utc>>,
}

impl Cycle {
    pub fn new_at(id: CycleId, input: NewCycle, at: DateTime<Utc>) -> Self {
        Self {
            id,
            task: input.task,
            minutes_amount: input.minutes_amount,
            start_date: at,
            interrupted_date: None,
            finished_date: None,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        i64::from(self.minutes_amount) * 60
    }

    pub fn status(&self) -> CycleStatus {
        if self.finished_date.is_some() {
            CycleStatus::Finished
        } else if self.interrupted_date.is_some() {
            CycleStatus::Interrupted
        } else {
            CycleStatus::Running
        }
    }

    /// When the cycle stopped counting, whichever way it ended.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.finished_date.or(self.interrupted_date)
    }
}

/// The persisted unit: full cycle history plus the active pointer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CyclesState {
    pub cycles: Vec<Cycle>,
    pub active_cycle_id: Option<CycleId>,
}

impl CyclesState {
    pub fn active_cycle(&self) -> Option<&Cycle> {
        let id = self.active_cycle_id.as_ref()?;
        self.cycles.iter().find(|c| &c.id == id)
    }

    /// Millisecond timestamp of `at` as the id, bumped past any id already in use.
    pub fn next_id(&self, at: DateTime<Utc>) -> CycleId {
        let mut millis = at.timestamp_millis();
        loop {
            let id = CycleId(millis.to_string());
            if !self.cycles.iter().any(|c| c.id == id) {
                return id;
            }
            millis += 1;
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task name must not be empty")]
    EmptyTask,
    #[error("cycle length must be between 1 and 90 minutes, got {0}")]
    MinutesOutOfRange(u32),
}

/// Validated input for a new cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCycle {
    pub task: String,
    pub minutes_amount: u32,
}

impl NewCycle {
    pub fn parse(task: &str, minutes_amount: u32) -> Result<Self, ValidationError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(ValidationError::EmptyTask);
        }
        if !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes_amount) {
            return Err(ValidationError::MinutesOutOfRange(minutes_amount));
        }
        Ok(Self {
            task: task.to_string(),
            minutes_amount,
        })
    }
}
