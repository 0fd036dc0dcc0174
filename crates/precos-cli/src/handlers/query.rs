use crate::ui::{self, App};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use precos_runtime::{AppEvent, Config, DataService, Dispatcher};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Interactive query session: query-entry screen, results screen.
pub fn handle(service: Arc<dyn DataService>, config: &Config) -> Result<()> {
    let (dispatcher, events) = Dispatcher::new(Arc::clone(&service))?;
    let mut app = App::new(config, dispatcher, service);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: Receiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Keyboard with a short timeout so fetch completions redraw
        // promptly even when the user is idle.
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        while let Ok(event) = events.try_recv() {
            app.on_event(event);
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
