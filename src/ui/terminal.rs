use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;
use crate::db::KeyValueStore;

/// How long to wait for input before redrawing, so notices can expire.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Spin up the terminal backend, enter the draw loop, and keep processing input
/// until the user quits.
pub fn run_app<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;

    let result = event_loop(&mut terminal, app);

    cleanup_terminal(&mut terminal)?;
    result
}

fn event_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App<S>,
) -> Result<()> {
    loop {
        app.tick(Instant::now());
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if !event::poll(POLL_INTERVAL).context("event polling failed")? {
            continue;
        }
        let Event::Key(key_event) = event::read().context("failed to read event")? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        if key_event.modifiers.contains(KeyModifiers::CONTROL) {
            match key_event.code {
                KeyCode::Char('c') => return Ok(()),
                KeyCode::Char('l') => {
                    app.clear_search();
                    continue;
                }
                _ => {}
            }
        }

        if app.handle_key(key_event.code) {
            return Ok(());
        }
    }
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}
