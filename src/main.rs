mod config;
mod countdown;
mod headless;
mod models;
mod reducer;
mod report;
mod stats;
mod storage;
mod store;
mod tui;
mod utils;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use countdown::Countdown;
use fd_lock::RwLock;
use models::NewCycle;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use storage::Storage;
use store::CycleStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pomo")]
#[command(about = "A Pomodoro timer that keeps a history of focus cycles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the timer, optionally starting a cycle right away
    Start {
        /// Task to work on
        #[arg(short, long)]
        task: Option<String>,
        /// Cycle length in minutes (1-90)
        #[arg(short, long)]
        minutes: Option<u32>,
        /// Print the countdown instead of opening the interactive screen
        #[arg(long, requires = "task")]
        headless: bool,
    },
    /// Interrupt the running cycle
    Interrupt,
    /// Show the running cycle and its remaining time
    Status,
    /// Show all recorded cycles
    History,
}

fn init_logging() -> Result<()> {
    let log_file = File::options()
        .create(true)
        .append(true)
        .open(Storage::get_base_dir()?.join("pomo.log"))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    Ok(())
}

fn open_lock() -> Result<RwLock<File>> {
    let lock_path = Storage::get_base_dir()?.join("pomo.lock");
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(lock_path)?;
    Ok(RwLock::new(lock_file))
}

/// Opens the store for reading. When no other instance holds the lock, a
/// cycle whose time ran out while nothing was ticking is finished first.
fn open_settled(storage: Storage) -> Result<CycleStore> {
    let now = Utc::now();
    let mut store = CycleStore::new(storage, now);
    let mut lock = open_lock()?;
    if let Ok(_guard) = lock.try_write() {
        store.finish_if_overdue(now)?;
    }
    Ok(store)
}

/// Runs `f` while holding the single-writer lock on the cycle history.
fn with_lock<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    let mut lock = open_lock()?;
    let _guard = lock.try_write().map_err(|_| {
        anyhow::anyhow!("Another instance of pomo is running. Use it to change the current cycle.")
    })?;
    f()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    let config = config::load_config()?;
    let storage = Storage::new()?;

    match cli.command {
        Commands::Start {
            task,
            minutes,
            headless,
        } => with_lock(|| {
            let now = Utc::now();
            let mut store = CycleStore::new(storage, now);
            store.finish_if_overdue(now)?;
            let minutes = minutes.unwrap_or(config.default_minutes);

            if let Some(task) = task {
                if store.active_cycle().is_some() {
                    println!("A cycle is already running; not starting \"{}\".", task);
                } else {
                    let input = NewCycle::parse(&task, minutes)?;
                    store.create_cycle(&input.task, input.minutes_amount, Utc::now())?;
                }
            }

            let mut countdown = Countdown::new(config.tick_interval());
            if headless {
                headless::run_headless(&mut store, &mut countdown)?;
            } else {
                let mut app = tui::App::new(minutes);
                tui::run_tui(&mut store, &mut countdown, &mut app)?;
                println!("{}", report::render_status(&store));
            }
            Ok(())
        })?,
        Commands::Interrupt => with_lock(|| {
            let now = Utc::now();
            let mut store = CycleStore::new(storage, now);
            if store.finish_if_overdue(now)? {
                println!("The running cycle had already finished.");
            } else if store.interrupt_active_cycle(now)? {
                println!("Cycle interrupted.");
            } else {
                println!("No cycle is running.");
            }
            Ok(())
        })?,
        Commands::Status => {
            let store = open_settled(storage)?;
            println!("{}", report::render_status(&store));
        }
        Commands::History => {
            let store = open_settled(storage)?;
            print!("{}", report::render_history(store.view().cycles, Utc::now()));
        }
    }

    Ok(())
}
