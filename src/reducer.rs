use crate::models::{Cycle, CyclesState};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum CycleAction {
    Create(Cycle),
    Interrupt { at: DateTime<Utc> },
    Finish { at: DateTime<Utc> },
}

/// Applies `action` to `state` and returns the next snapshot.
///
/// Transitions that do not apply (creating while a cycle runs, stopping
/// while idle) return an unchanged copy of `state`.
pub fn reduce(state: &CyclesState, action: CycleAction) -> CyclesState {
    let mut next = state.clone();

    match action {
        CycleAction::Create(cycle) => {
            if state.active_cycle_id.is_some() {
                return next;
            }
            next.active_cycle_id = Some(cycle.id.clone());
            next.cycles.push(cycle);
        }
        CycleAction::Interrupt { at } => {
            if let Some(cycle) = take_active(&mut next) {
                cycle.interrupted_date = Some(at);
            }
        }
        CycleAction::Finish { at } => {
            if let Some(cycle) = take_active(&mut next) {
                cycle.finished_date = Some(at);
            }
        }
    }

    next
}

/// Clears the active pointer and hands back the cycle it pointed at.
/// A pointer to an already ended or missing cycle is dropped as well.
fn take_active(state: &mut CyclesState) -> Option<&mut Cycle> {
    let id = state.active_cycle_id.take()?;
    state
        .cycles
        .iter_mut()
        .find(|c| c.id == id && c.ended_at().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CycleId, CycleStatus, NewCycle};
    use chrono::TimeZone;

    fn new_cycle(id: &str, at: DateTime<Utc>) -> Cycle {
        Cycle::new_at(
            CycleId(id.to_string()),
            NewCycle::parse("Write spec", 25).unwrap(),
            at,
        )
    }

    #[test]
    fn test_create_sets_active() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let state = reduce(&CyclesState::default(), CycleAction::Create(new_cycle("1", t1)));

        assert_eq!(state.cycles.len(), 1);
        assert_eq!(state.active_cycle_id, Some(CycleId("1".to_string())));
        assert_eq!(state.active_cycle().unwrap().status(), CycleStatus::Running);
    }

    #[test]
    fn test_create_while_active_is_ignored() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let state = reduce(&CyclesState::default(), CycleAction::Create(new_cycle("1", t1)));
        let again = reduce(&state, CycleAction::Create(new_cycle("2", t1)));

        assert_eq!(again, state);
    }

    #[test]
    fn test_interrupt_then_finish() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let t2 = t1 + chrono::Duration::minutes(4);
        let state = reduce(&CyclesState::default(), CycleAction::Create(new_cycle("1", t1)));

        let interrupted = reduce(&state, CycleAction::Interrupt { at: t2 });
        assert!(interrupted.active_cycle_id.is_none());
        assert_eq!(interrupted.cycles[0].interrupted_date, Some(t2));
        assert!(interrupted.cycles[0].finished_date.is_none());

        // Both transitions are terminal; a later finish changes nothing.
        let finished = reduce(&interrupted, CycleAction::Finish { at: t2 });
        assert_eq!(finished, interrupted);
    }

    #[test]
    fn test_finish_marks_cycle() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let t2 = t1 + chrono::Duration::minutes(25);
        let state = reduce(&CyclesState::default(), CycleAction::Create(new_cycle("1", t1)));
        let state = reduce(&state, CycleAction::Finish { at: t2 });

        assert_eq!(state.cycles[0].status(), CycleStatus::Finished);
        assert_eq!(state.cycles[0].finished_date, Some(t2));
        assert!(state.active_cycle_id.is_none());
    }

    #[test]
    fn test_history_is_append_only() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut state = CyclesState::default();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            let at = t1 + chrono::Duration::minutes(30 * i as i64);
            state = reduce(&state, CycleAction::Create(new_cycle(id, at)));
            state = reduce(&state, CycleAction::Interrupt { at });
        }

        let ids: Vec<_> = state.cycles.iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_dangling_active_id_is_cleared() {
        let state = CyclesState {
            cycles: vec![],
            active_cycle_id: Some(CycleId("gone".to_string())),
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let next = reduce(&state, CycleAction::Interrupt { at });

        assert!(next.active_cycle_id.is_none());
        assert!(next.cycles.is_empty());
    }
}
