use crate::countdown::{Countdown, Tick};
use crate::models::{CycleStatus, MAX_MINUTES, MIN_MINUTES};
use crate::report::{started_ago, status_label};
use crate::stats::calculate_stats;
use crate::store::CycleStore;
use crate::utils::{format_clock, format_duration};
use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration as StdDuration;

const MINUTES_STEP: u32 = 5;

/// New-cycle form plus the last message shown to the user.
pub struct App {
    pub task: String,
    pub minutes: u32,
    pub message: Option<String>,
    title: Option<String>,
}

impl App {
    pub fn new(default_minutes: u32) -> Self {
        Self {
            task: String::new(),
            minutes: default_minutes.clamp(MIN_MINUTES, MAX_MINUTES),
            message: None,
            title: None,
        }
    }

    pub fn can_start(&self, store: &CycleStore) -> bool {
        store.active_cycle().is_none() && !self.task.trim().is_empty()
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, store: &mut CycleStore, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return Ok(true);
        }

        let now = Utc::now();
        if store.active_cycle().is_some() {
            // The form is locked while a cycle runs.
            match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('i') | KeyCode::Char(' ') => {
                    if store.interrupt_active_cycle(now)? {
                        self.message = Some("Cycle interrupted".to_string());
                    }
                }
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Char(c) => self.task.push(c),
            KeyCode::Backspace => {
                self.task.pop();
            }
            KeyCode::Up => self.minutes = (self.minutes + MINUTES_STEP).min(MAX_MINUTES),
            KeyCode::Down => {
                self.minutes = self.minutes.saturating_sub(MINUTES_STEP).max(MIN_MINUTES)
            }
            KeyCode::Enter if self.can_start(store) => {
                if store.create_cycle(&self.task, self.minutes, now)?.is_some() {
                    self.task.clear();
                    self.message = None;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    pub fn on_tick(&mut self, tick: Tick) {
        if let Tick::Finished(_) = tick {
            self.message = Some("Cycle finished".to_string());
        }
    }

    /// Terminal title for the current state; `None` leaves it untouched.
    fn next_title(&mut self, store: &CycleStore) -> Option<String> {
        let title = if store.active_cycle().is_some() {
            format!("Pomo - {}", format_clock(store.view().remaining_seconds()))
        } else {
            "Pomo".to_string()
        };
        if self.title.as_deref() == Some(title.as_str()) {
            return None;
        }
        self.title = Some(title.clone());
        Some(title)
    }
}

pub fn run_tui(store: &mut CycleStore, countdown: &mut Countdown, app: &mut App) -> Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, store, countdown, app);
    countdown.cancel();

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "tui loop failed");
        println!("{:?}", err)
    }

    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: &mut CycleStore,
    countdown: &mut Countdown,
    app: &mut App,
) -> Result<()> {
    loop {
        if let Some(title) = app.next_title(store) {
            execute!(terminal.backend_mut(), SetTitle(title))?;
        }
        terminal.draw(|f| draw(f, store, app))?;

        if event::poll(StdDuration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(store, key)? {
                    return Ok(());
                }
            }
        }

        let tick = countdown.poll(store, Utc::now())?;
        app.on_tick(tick);
    }
}

pub fn draw(frame: &mut Frame, store: &CycleStore, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Countdown
            Constraint::Length(4), // Form
            Constraint::Min(0),    // History
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], store, app);
    draw_countdown(frame, chunks[1], store);
    draw_form(frame, chunks[2], store, app);
    draw_history(frame, chunks[3], store);
    draw_footer(frame, chunks[4], store);
}

fn draw_header(frame: &mut Frame, area: Rect, store: &CycleStore, app: &App) {
    let status_text = match store.active_cycle() {
        Some(cycle) => Span::styled(
            format!("FOCUS: {}", cycle.task),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            "IDLE",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    };

    let mut spans = vec![
        Span::styled(
            " Pomo ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        status_text,
    ];
    if let Some(message) = &app.message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Magenta)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_countdown(frame: &mut Frame, area: Rect, store: &CycleStore) {
    let view = store.view();
    let color = if view.active_cycle.is_some() {
        Color::Green
    } else {
        Color::DarkGray
    };
    let clock = Paragraph::new(vec![
        Line::raw(""),
        Line::from(Span::styled(
            format_clock(view.remaining_seconds()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(clock, area);
}

fn draw_form(frame: &mut Frame, area: Rect, store: &CycleStore, app: &App) {
    let locked = store.active_cycle().is_some();
    let field_style = if locked {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let task = if app.task.is_empty() && !locked {
        Span::styled("Name your task", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(app.task.clone(), field_style)
    };

    let lines = vec![
        Line::from(vec![Span::raw("  I will work on: "), task]),
        Line::from(vec![
            Span::raw("  for "),
            Span::styled(format!("{:02}", app.minutes), field_style),
            Span::raw(" minutes"),
        ]),
    ];
    let form = Paragraph::new(lines).block(Block::default().title(" NEW CYCLE ").borders(Borders::ALL));
    frame.render_widget(form, area);
}

fn draw_history(frame: &mut Frame, area: Rect, store: &CycleStore) {
    let now = Utc::now();
    let view = store.view();
    let stats = calculate_stats(view.cycles, now);

    let mut lines = vec![Line::raw(format!(
        "  Today: {} focused | {} finished | {} interrupted",
        format_duration(stats.today_summary.total_focus.num_seconds()),
        stats.today_summary.finished_count,
        stats.today_summary.interrupted_count,
    ))];

    // Newest first, as many as fit.
    let rows = area.height.saturating_sub(3) as usize;
    for cycle in view.cycles.iter().rev().take(rows) {
        let marker = if view.active_cycle_id == Some(&cycle.id) {
            "> "
        } else {
            "  "
        };
        let status = cycle.status();
        let color = match status {
            CycleStatus::Running => Color::Yellow,
            CycleStatus::Finished => Color::Green,
            CycleStatus::Interrupted => Color::Red,
        };
        lines.push(Line::from(vec![
            Span::raw(format!(
                "{}{:<24} {:>3} min  {:<16} ",
                marker,
                cycle.task,
                cycle.minutes_amount,
                started_ago(cycle, now)
            )),
            Span::styled(status_label(status), Style::default().fg(color)),
        ]));
    }

    let block = Block::default()
        .title(Span::styled(" HISTORY ", Style::default().add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, store: &CycleStore) {
    let text = if store.active_cycle().is_some() {
        "'i' or space to interrupt | 'q' or Esc to quit"
    } else {
        "Type a task | Up/Down minutes | Enter to start | Esc to quit"
    };
    let help = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Storage, STATE_FILE};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, CycleStore, App) {
        let dir = tempdir().unwrap();
        let storage = Storage::from_path(dir.path().join(STATE_FILE));
        (dir, CycleStore::new(storage, Utc::now()), App::new(25))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_task(app: &mut App, store: &mut CycleStore, text: &str) -> Result<()> {
        for c in text.chars() {
            app.handle_key(store, press(KeyCode::Char(c)))?;
        }
        Ok(())
    }

    #[test]
    fn test_start_requires_task() -> Result<()> {
        let (_dir, mut store, mut app) = setup();
        assert!(!app.can_start(&store));

        app.handle_key(&mut store, press(KeyCode::Enter))?;
        assert!(store.cycles().is_empty());
        Ok(())
    }

    #[test]
    fn test_start_and_reset_form() -> Result<()> {
        let (_dir, mut store, mut app) = setup();
        type_task(&mut app, &mut store, "Write")?;
        app.handle_key(&mut store, press(KeyCode::Backspace))?;
        app.handle_key(&mut store, press(KeyCode::Down))?;

        app.handle_key(&mut store, press(KeyCode::Enter))?;
        let cycle = store.active_cycle().unwrap();
        assert_eq!(cycle.task, "Writ");
        assert_eq!(cycle.minutes_amount, 20);
        assert!(app.task.is_empty());
        Ok(())
    }

    #[test]
    fn test_form_locked_while_running() -> Result<()> {
        let (_dir, mut store, mut app) = setup();
        type_task(&mut app, &mut store, "Read")?;
        app.handle_key(&mut store, press(KeyCode::Enter))?;

        app.handle_key(&mut store, press(KeyCode::Char('x')))?;
        app.handle_key(&mut store, press(KeyCode::Up))?;
        assert!(app.task.is_empty());
        assert_eq!(app.minutes, 25);

        app.handle_key(&mut store, press(KeyCode::Char('i')))?;
        assert!(store.active_cycle().is_none());
        assert!(store.cycles()[0].interrupted_date.is_some());
        Ok(())
    }

    #[test]
    fn test_minutes_clamped() -> Result<()> {
        let (_dir, mut store, mut app) = setup();
        for _ in 0..30 {
            app.handle_key(&mut store, press(KeyCode::Up))?;
        }
        assert_eq!(app.minutes, MAX_MINUTES);
        for _ in 0..30 {
            app.handle_key(&mut store, press(KeyCode::Down))?;
        }
        assert_eq!(app.minutes, MIN_MINUTES);
        Ok(())
    }

    #[test]
    fn test_quit_keys() -> Result<()> {
        let (_dir, mut store, mut app) = setup();
        assert!(!app.handle_key(&mut store, press(KeyCode::Char('q')))?);
        assert!(app.handle_key(&mut store, press(KeyCode::Esc))?);
        assert!(app.handle_key(
            &mut store,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        )?);
        Ok(())
    }

    #[test]
    fn test_title_follows_countdown() -> Result<()> {
        let (_dir, mut store, mut app) = setup();
        assert_eq!(app.next_title(&store).as_deref(), Some("Pomo"));
        assert_eq!(app.next_title(&store), None);

        type_task(&mut app, &mut store, "Read")?;
        app.handle_key(&mut store, press(KeyCode::Enter))?;
        assert_eq!(app.next_title(&store).as_deref(), Some("Pomo - 25:00"));
        Ok(())
    }
}
