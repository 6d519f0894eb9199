use crate::models::{Cycle, CycleStatus};
use crate::stats::{calculate_stats, calculate_summary};
use crate::store::CycleStore;
use crate::utils::{format_clock, format_duration};
use chrono::{DateTime, Local, Utc};
use std::fmt::Write;
use std::time::Duration as StdDuration;

pub fn status_label(status: CycleStatus) -> &'static str {
    match status {
        CycleStatus::Running => "running",
        CycleStatus::Interrupted => "interrupted",
        CycleStatus::Finished => "finished",
    }
}

/// "5m 12s ago", at whole-second precision.
pub fn started_ago(cycle: &Cycle, now: DateTime<Utc>) -> String {
    let secs = (now - cycle.start_date).num_seconds().max(0) as u64;
    format!("{} ago", humantime::format_duration(StdDuration::from_secs(secs)))
}

pub fn render_status(store: &CycleStore) -> String {
    let view = store.view();
    match view.active_cycle {
        Some(cycle) => format!(
            "{} ({} min): {} remaining",
            cycle.task,
            cycle.minutes_amount,
            format_clock(view.remaining_seconds())
        ),
        None => "idle".to_string(),
    }
}

pub fn render_history(cycles: &[Cycle], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    if cycles.is_empty() {
        out.push_str("No cycles recorded yet.\n");
        return out;
    }

    let _ = writeln!(out, "Pomo History");
    let _ = writeln!(out, "============");
    for cycle in cycles {
        let _ = writeln!(
            out,
            "{:<24} {:>3} min  {:<16} {}  ({})",
            cycle.task,
            cycle.minutes_amount,
            cycle
                .start_date
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M"),
            status_label(cycle.status()),
            started_ago(cycle, now),
        );
    }

    let stats = calculate_stats(cycles, now);
    for (date, summary) in stats.daily_stats.range(stats.week_start..) {
        let date_str = if *date == stats.today {
            format!("{} (Today)", date)
        } else {
            date.to_string()
        };
        let _ = writeln!(
            out,
            "\n{}: {} focused, {} finished, {} interrupted",
            date_str,
            format_duration(summary.total_focus.num_seconds()),
            summary.finished_count,
            summary.interrupted_count
        );
    }

    let all_time = calculate_summary(cycles);
    for (title, summary) in [
        ("Today", &stats.today_summary),
        ("This week", &stats.week_summary),
        ("All time", &all_time),
    ] {
        let _ = writeln!(out, "\n{}", title);
        let _ = writeln!(
            out,
            "  Focus Time:   {}",
            format_duration(summary.total_focus.num_seconds())
        );
        let _ = writeln!(out, "  Finished:     {}", summary.finished_count);
        let _ = writeln!(out, "  Interrupted:  {}", summary.interrupted_count);
        if let Some(longest) = summary.longest_focus {
            let _ = writeln!(
                out,
                "  Longest:      {}",
                format_duration(longest.num_seconds())
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CycleId, NewCycle};
    use crate::storage::{Storage, STATE_FILE};
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    #[test]
    fn test_started_ago() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let cycle = Cycle::new_at(
            CycleId("1".to_string()),
            NewCycle::parse("Read", 25).unwrap(),
            start,
        );
        assert_eq!(started_ago(&cycle, start + Duration::seconds(312)), "5m 12s ago");
    }

    #[test]
    fn test_render_history() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut cycle = Cycle::new_at(
            CycleId("1".to_string()),
            NewCycle::parse("Read", 25).unwrap(),
            start,
        );
        cycle.interrupted_date = Some(start + Duration::minutes(3));

        let out = render_history(&[cycle], start + Duration::minutes(10));
        assert!(out.contains("Read"));
        assert!(out.contains("interrupted"));
        assert!(out.contains("10m ago"));
        assert!(out.contains("All time\n  Focus Time:   3m\n  Finished:     0\n  Interrupted:  1"));
        assert_eq!(render_history(&[], start), "No cycles recorded yet.\n");
    }

    #[test]
    fn test_render_status() -> anyhow::Result<()> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let dir = tempdir()?;
        let mut store = CycleStore::new(Storage::from_path(dir.path().join(STATE_FILE)), start);
        assert_eq!(render_status(&store), "idle");

        store.create_cycle("Write spec", 25, start)?;
        store.set_seconds_passed(65);
        assert_eq!(render_status(&store), "Write spec (25 min): 23:55 remaining");
        Ok(())
    }
}
