//! Clinic TUI entry point.

use clinic_core::{SchemaRegistry, Transport};
use clinic_tui::api_client::RestClient;
use clinic_tui::config::TuiConfig;
use clinic_tui::error::TuiError;
use clinic_tui::events::TuiEvent;
use clinic_tui::persistence;
use clinic_tui::state::App;
use clinic_tui::telemetry::init_logging;
use clinic_tui::views::render_view;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    init_logging(&config)?;

    let registry = match &config.model_path {
        Some(path) => SchemaRegistry::from_path(path)?,
        None => SchemaRegistry::builtin()?,
    };
    tracing::info!(entities = registry.len(), "Schema registry loaded");

    let client = RestClient::new(&config)?;
    tracing::info!(base_url = client.base_url(), "REST client ready");
    let transport: Arc<dyn Transport> = Arc::new(client);

    let restored = match persistence::load(&config.persistence_path) {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring unreadable UI state");
            None
        }
    };

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let mut app = App::new(
        config,
        Arc::new(registry),
        transport,
        event_tx.clone(),
        restored.as_ref().map(|s| s.active_entity.as_str()),
    )?;

    spawn_input_reader(event_tx.clone());

    let tick_rate = Duration::from_millis(app.config.refresh_interval_ms);
    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {}
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event) {
                    break;
                }
            }
        }
    }

    if let Err(err) = persistence::save(&app.config.persistence_path, &app.persisted_state()) {
        tracing::warn!(error = %err, "Failed to save UI state");
    }
    tracing::info!("Exiting");

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let sent = match evt {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        sender.blocking_send(TuiEvent::Input(key))
                    }
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize { width, height })
                    }
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });
}

/// Returns true when the app should exit.
fn handle_event(app: &mut App, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Input(key) => return app.handle_key(key),
        TuiEvent::View { mount, event } => app.handle_view_event(mount, event),
        TuiEvent::Resize { width, height } => {
            tracing::debug!(width, height, "Terminal resized");
        }
    }
    false
}
