use anyhow::{Context, Result};
use aqi_dash::app::{Action, App};
use aqi_dash::client::DataClient;
use aqi_dash::config::AppConfig;
use aqi_dash::orchestrator::Orchestrator;
use aqi_dash::session::DashboardSession;
use aqi_dash::telemetry::{self, LogBuffer};
use aqi_dash::ui::{self, DashboardLayout};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

const LOG_CAPACITY: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "aqi-dash", version, about = "Terminal air quality dashboard")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides `server.base_url`
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Refresh interval in seconds, 0 fetches once
    #[arg(short, long)]
    refresh: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(endpoint) = cli.endpoint {
        config.server.base_url = endpoint;
    }
    if let Some(secs) = cli.refresh {
        config.refresh.interval_secs = secs;
    }

    let logs = LogBuffer::new(LOG_CAPACITY, Some(telemetry::init(&config.logging)?));

    let client = DataClient::new(&config.server.base_url, config.timeout())
        .context("building HTTP client")?;
    let endpoint = client.url().to_string();
    info!(%endpoint, interval = ?config.refresh_interval(), "starting dashboard");

    let session = DashboardSession::new(config.map.data_dir.as_deref(), config.map.marker_policy);
    let orchestrator = Orchestrator::new(Arc::new(client), config.refresh_interval());
    let mut app = App::new(session, orchestrator, logs, endpoint);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, layout: &DashboardLayout, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel zooms towards the cell under the cursor
        MouseEventKind::ScrollUp => {
            if let Some((col, row)) = layout.map_cell(mouse.column, mouse.row) {
                app.zoom_in_at(col, row);
            }
        }
        MouseEventKind::ScrollDown => {
            if let Some((col, row)) = layout.map_cell(mouse.column, mouse.row) {
                app.zoom_out_at(col, row);
            }
        }
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            if layout.map_cell(mouse.column, mouse.row).is_some() {
                app.last_mouse = Some((mouse.column, mouse.row));
            }
        }
        MouseEventKind::Drag(MouseButton::Left) if app.last_mouse.is_some() => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    app.on_ready();

    loop {
        let size = terminal.size()?;
        let layout = DashboardLayout::new(Rect::new(0, 0, size.width, size.height));
        let map = layout.map_inner();
        app.session.map.resize(map.width, map.height);

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = Action::from_key(key.code) {
                        app.dispatch(action);
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, &layout, mouse),
                // Picked up by the next layout pass
                Event::Resize(..) => {}
                _ => {}
            }
        }

        app.update(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
