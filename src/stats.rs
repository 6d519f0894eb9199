use crate::models::{Cycle, CycleStatus};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use std::collections::BTreeMap;

#[derive(Default, Clone, Debug, PartialEq)]
pub struct SummaryStats {
    pub total_focus: Duration,
    pub finished_count: u32,
    pub interrupted_count: u32,
    pub longest_focus: Option<Duration>,
}

pub struct Stats {
    pub daily_stats: BTreeMap<NaiveDate, SummaryStats>,
    pub today_summary: SummaryStats,
    pub week_summary: SummaryStats,
    pub today: NaiveDate,
    pub week_start: NaiveDate,
}

/// Time a cycle actually counted down. Running cycles have none yet.
pub fn focused_time(cycle: &Cycle) -> Option<Duration> {
    let end = cycle.ended_at()?;
    let spent = (end - cycle.start_date).max(Duration::zero());
    Some(spent.min(Duration::seconds(cycle.total_seconds())))
}

fn add_cycle(summary: &mut SummaryStats, cycle: &Cycle) {
    let Some(spent) = focused_time(cycle) else {
        return;
    };
    match cycle.status() {
        CycleStatus::Finished => summary.finished_count += 1,
        CycleStatus::Interrupted => summary.interrupted_count += 1,
        CycleStatus::Running => return,
    }
    summary.total_focus += spent;
    summary.longest_focus = Some(summary.longest_focus.map_or(spent, |m| m.max(spent)));
}

pub fn calculate_summary(cycles: &[Cycle]) -> SummaryStats {
    let mut summary = SummaryStats::default();
    for cycle in cycles {
        add_cycle(&mut summary, cycle);
    }
    summary
}

pub fn calculate_stats(cycles: &[Cycle], now: DateTime<Utc>) -> Stats {
    let today = now.with_timezone(&Local).date_naive();

    // Find the start of the current week (Monday)
    let days_from_monday = today.weekday().num_days_from_monday();
    let week_start = today - Duration::days(days_from_monday as i64);
    let week_end = week_start + Duration::days(6);

    let mut daily_stats: BTreeMap<NaiveDate, SummaryStats> = BTreeMap::new();
    let mut today_summary = SummaryStats::default();
    let mut week_summary = SummaryStats::default();

    for cycle in cycles {
        let date = cycle.start_date.with_timezone(&Local).date_naive();

        add_cycle(daily_stats.entry(date).or_default(), cycle);
        if date == today {
            add_cycle(&mut today_summary, cycle);
        }
        if date >= week_start && date <= week_end {
            add_cycle(&mut week_summary, cycle);
        }
    }

    Stats {
        daily_stats,
        today_summary,
        week_summary,
        today,
        week_start,
    }
}
