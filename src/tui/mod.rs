pub mod app;
pub mod event;
pub mod layout;
pub mod page;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::app::{AppContext, Result, RilletError};
use crate::config::ConfigError;
use crate::fetcher::LoadEvent;
use crate::tracking;

use self::app::{Command, TuiApp};
use self::event::{AppEvent, EventHandler};
use self::page::Page;

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    if ctx.urls.is_empty() {
        return Err(RilletError::Config(ConfigError::NoUrls.to_string()));
    }

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &ctx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: &AppContext) -> Result<()> {
    let config = &ctx.config;
    let mut tui_app = TuiApp::new(config.home, config.reader.read_threshold);
    let event_handler = EventHandler::new(Duration::from_millis(100));

    let prefer_cache = ctx.loader.should_prefer_cache();
    tui_app.start_loading(ctx.urls.clone());
    let mut events = Some(ctx.loader.spawn_load(ctx.urls.clone(), prefer_cache));

    loop {
        drain_load_events(&mut tui_app, &mut events, ctx);

        terminal.draw(|frame| layout::render(frame, &mut tui_app, &config.colors, &config.keybindings))?;

        if tui_app.page() == Page::Reader {
            if let Err(e) = tui_app.check_read_threshold() {
                tui_app.set_status(format!("Failed to mark read: {}", e));
            }
        }

        if let AppEvent::Key(key) = event_handler.next()? {
            let command = handle_key(&mut tui_app, key, ctx);
            run_command(&mut tui_app, command, &mut events, ctx).await;
        }

        if tui_app.dirty {
            save_tracking(&mut tui_app, ctx);
        }

        if tui_app.should_quit {
            break;
        }
    }

    tracking::write_tracking(&tui_app.feeds, ctx.store.as_ref())
}

fn drain_load_events(
    tui_app: &mut TuiApp,
    events: &mut Option<mpsc::UnboundedReceiver<LoadEvent>>,
    ctx: &AppContext,
) {
    let Some(rx) = events.as_mut() else {
        return;
    };

    loop {
        match rx.try_recv() {
            Ok(event) => tui_app.on_load_event(event, ctx.store.as_ref()),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                *events = None;
                break;
            }
        }
    }
}

fn handle_key(tui_app: &mut TuiApp, key: KeyEvent, ctx: &AppContext) -> Command {
    if tui_app.prompt().is_some() {
        match key.code {
            KeyCode::Esc => tui_app.cancel_search(),
            KeyCode::Enter => tui_app.submit_search(),
            KeyCode::Backspace => tui_app.pop_prompt(),
            KeyCode::Char(c) => tui_app.push_prompt(c),
            _ => {}
        }
        return Command::None;
    }

    if tui_app.show_help {
        tui_app.show_help = false;
        return Command::None;
    }

    tui_app.status_message = None;
    let action = ctx.config.keybindings.get_action(&key);
    match tui_app.handle_action(action) {
        Ok(command) => command,
        Err(e) => {
            tui_app.set_status(e.to_string());
            Command::None
        }
    }
}

async fn run_command(
    tui_app: &mut TuiApp,
    command: Command,
    events: &mut Option<mpsc::UnboundedReceiver<LoadEvent>>,
    ctx: &AppContext,
) {
    match command {
        Command::None => {}
        Command::RefreshFeed(index) => {
            tui_app.set_status("Refreshing...");
            match ctx.loader.refresh_feed(&mut tui_app.feeds, index).await {
                Ok(()) => {
                    let feed = &tui_app.feeds[index];
                    let message = match &feed.error {
                        Some(e) => format!("{}: {}", feed.title, e),
                        None => format!("Refreshed {}", feed.display_title()),
                    };
                    tui_app.set_status(message);
                }
                Err(e) => tui_app.set_status(format!("Refresh failed: {}", e)),
            }
            tui_app.rebuild_list();
        }
        Command::RefreshAll => {
            save_tracking(tui_app, ctx);
            tui_app.start_loading(ctx.urls.clone());
            *events = Some(ctx.loader.spawn_load(ctx.urls.clone(), false));
        }
        Command::OpenLink(link) => {
            if let Err(e) = open::that(&link) {
                tracing::warn!("Failed to open {}: {}", link, e);
                tui_app.set_status(format!("Failed to open browser: {}", e));
            }
        }
    }
}

fn save_tracking(tui_app: &mut TuiApp, ctx: &AppContext) {
    // Retried on quit; the in-memory flags stay as they are.
    tui_app.dirty = false;
    if let Err(e) = tracking::write_tracking(&tui_app.feeds, ctx.store.as_ref()) {
        tracing::warn!("Failed to save read state: {}", e);
        tui_app.set_status(format!("Failed to save read state: {}", e));
    }
}
