use crate::countdown::{Countdown, Tick};
use crate::store::CycleStore;
use crate::utils::{format_clock, format_duration};
use anyhow::Result;
use chrono::Utc;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

/// Counts the active cycle down on stdout until it finishes. Ctrl-C
/// interrupts the cycle instead of leaving it running in the history.
pub fn run_headless(store: &mut CycleStore, countdown: &mut Countdown) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))?;

    run_countdown(store, countdown, &stop, &mut io::stdout())
}

/// Drives `countdown` until the active cycle ends or `stop` is raised, which
/// interrupts it.
pub fn run_countdown(
    store: &mut CycleStore,
    countdown: &mut Countdown,
    stop: &AtomicBool,
    out: &mut impl Write,
) -> Result<()> {
    let Some(cycle) = store.active_cycle() else {
        writeln!(out, "No cycle is running.")?;
        return Ok(());
    };
    writeln!(out, "{} ({} min)", cycle.task, cycle.minutes_amount)?;

    loop {
        if stop.load(Ordering::SeqCst) {
            countdown.cancel();
            if store.interrupt_active_cycle(Utc::now())? {
                writeln!(out, "\nCycle interrupted.")?;
            }
            return Ok(());
        }

        match countdown.poll(store, Utc::now())? {
            Tick::Idle => {
                writeln!(out, "\nNo cycle is running.")?;
                return Ok(());
            }
            Tick::Finished(total) => {
                writeln!(out, "\r{} remaining", format_clock(0))?;
                writeln!(out, "Cycle finished after {}.", format_duration(total))?;
                return Ok(());
            }
            Tick::Progress(_) => {
                write!(out, "\r{} remaining", format_clock(store.view().remaining_seconds()))?;
                out.flush()?;
            }
            Tick::Waiting => {}
        }

        // Short naps so Ctrl-C is noticed between ticks.
        let until_due = countdown
            .next_due()
            .and_then(|due| (due - Utc::now()).to_std().ok())
            .unwrap_or_default();
        std::thread::sleep(until_due.min(StdDuration::from_millis(100)));
    }
}
