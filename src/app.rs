use crate::map::Lod;
use crossterm::event::KeyCode;
use crate::orchestrator::Orchestrator;
use crate::session::DashboardSession;
use crate::telemetry::LogBuffer;
use std::time::Instant;

/// What a key press asks the dashboard to do
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Quit,
    Pan(i32, i32),
    ZoomIn,
    ZoomOut,
    SelectNext,
    Refresh,
    ResetView,
    ToggleBorders,
    ToggleLabels,
}

impl Action {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        let action = match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,

            // Pan with hjkl or arrow keys
            KeyCode::Left | KeyCode::Char('h') => Action::Pan(-10, 0),
            KeyCode::Right | KeyCode::Char('l') => Action::Pan(10, 0),
            KeyCode::Up | KeyCode::Char('k') => Action::Pan(0, -6),
            KeyCode::Down | KeyCode::Char('j') => Action::Pan(0, 6),

            KeyCode::Char('+') | KeyCode::Char('=') => Action::ZoomIn,
            KeyCode::Char('-') | KeyCode::Char('_') => Action::ZoomOut,

            KeyCode::Tab => Action::SelectNext,
            KeyCode::Char('r') | KeyCode::Char('R') => Action::Refresh,
            KeyCode::Char('0') => Action::ResetView,

            // Lowercase `l` pans, so labels only toggle on `L`
            KeyCode::Char('b') | KeyCode::Char('B') => Action::ToggleBorders,
            KeyCode::Char('L') => Action::ToggleLabels,

            _ => return None,
        };
        Some(action)
    }
}

/// Application state
pub struct App {
    pub session: DashboardSession,
    pub orchestrator: Orchestrator,
    pub logs: LogBuffer,
    /// Endpoint shown in the header
    pub endpoint: String,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
}

impl App {
    pub fn new(
        session: DashboardSession,
        orchestrator: Orchestrator,
        logs: LogBuffer,
        endpoint: String,
    ) -> Self {
        Self {
            session,
            orchestrator,
            logs,
            endpoint,
            should_quit: false,
            last_mouse: None,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit(),
            Action::Pan(dx, dy) => self.pan(dx, dy),
            Action::ZoomIn => self.zoom_in(),
            Action::ZoomOut => self.zoom_out(),
            Action::SelectNext => self.session.map.select_next(),
            Action::Refresh => self.refresh(),
            Action::ResetView => self.reset_view(),
            Action::ToggleBorders => self.session.map.renderer_mut().toggle_borders(),
            Action::ToggleLabels => self.session.map.renderer_mut().toggle_labels(),
        }
    }

    /// Once the map exists: start the first fetch
    pub fn on_ready(&mut self) {
        self.orchestrator.request_refresh();
    }

    /// Per-frame housekeeping: apply finished fetches, start due ones, pull logs
    pub fn update(&mut self, now: Instant) {
        self.orchestrator.poll(&mut self.session);
        self.orchestrator.tick(now);
        self.logs.drain();
    }

    pub fn refresh(&mut self) {
        if !self.orchestrator.request_refresh() {
            tracing::debug!("refresh ignored, fetch already in flight");
        }
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.session.map.viewport_mut().pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.session.map.viewport_mut().zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.session.map.viewport_mut().zoom_out();
    }

    /// Zoom in towards a map-relative cell
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.session.map.viewport_mut().zoom_in_at(px, py);
    }

    /// Zoom out from a map-relative cell
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.session.map.viewport_mut().zoom_out_at(px, py);
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Scale based on zoom: less sensitive when zoomed out
            let level = self.session.map.viewport().level;
            let scale = if level < 3.0 {
                2
            } else if level < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Back to the initial world view
    pub fn reset_view(&mut self) {
        let (lat, lon) = crate::map::MapView::DEFAULT_CENTER;
        self.session
            .map
            .set_view(lat, lon, crate::map::MapView::DEFAULT_LEVEL);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("z{:.1}", self.session.map.viewport().level)
    }

    /// Current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let vp = self.session.map.viewport();
        format!(
            "{:.1}°{}, {:.1}°{}",
            vp.center_lat.abs(),
            if vp.center_lat >= 0.0 { "N" } else { "S" },
            vp.center_lon.abs(),
            if vp.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_level(self.session.map.viewport().level).name()
    }

    /// Human readable age of the data on screen
    pub fn data_age(&self, now: Instant) -> String {
        match self.orchestrator.last_applied() {
            None if self.orchestrator.is_fetching() => "loading…".to_string(),
            None => "no data".to_string(),
            Some(at) => {
                let secs = now.duration_since(at).as_secs();
                if secs < 60 {
                    format!("updated {secs}s ago")
                } else {
                    format!("updated {}m ago", secs / 60)
                }
            }
        }
    }
}

/// Braille pixel at the top-left of a map-relative cell
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    (col as i32 * 2, row as i32 * 4)
}
