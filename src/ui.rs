use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::chart::PollutantChart;
use crate::color::{Rgb, BACKGROUND};
use crate::dashboard::{DisplaySlots, Slot};
use crate::map::MapLayers;
use crate::record::Pollutant;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Widget},
    Frame,
};
use std::time::Instant;

const LOG_LINES: u16 = 4;
const PLACEHOLDER: &str = "--";

/// Screen regions of the dashboard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardLayout {
    pub header: Rect,
    pub map: Rect,
    pub stats: Rect,
    pub chart: Rect,
    pub logs: Rect,
    pub status: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),            // Header
                Constraint::Min(8),               // Map + panels
                Constraint::Length(LOG_LINES + 2), // Diagnostics
                Constraint::Length(1),            // Status bar
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(14), Constraint::Min(6)])
            .split(columns[1]);

        Self {
            header: rows[0],
            map: columns[0],
            stats: side[0],
            chart: side[1],
            logs: rows[2],
            status: rows[3],
        }
    }

    /// Map drawing area inside its border
    pub fn map_inner(&self) -> Rect {
        self.map.inner(ratatui::layout::Margin::new(1, 1))
    }

    /// Map-relative cell under a terminal position, if it is on the map
    pub fn map_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let inner = self.map_inner();
        let inside = col >= inner.x
            && col < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let layout = DashboardLayout::new(frame.area());
    let now = Instant::now();

    frame.render_widget(
        Block::default().style(Style::default().bg(BACKGROUND.to_color())),
        frame.area(),
    );

    render_header(frame, app, layout.header, now);
    render_map(frame, app, layout.map);
    render_stats(frame, &app.session.slots, layout.stats);
    render_chart(frame, app.session.chart.chart(), layout.chart);
    render_logs(frame, app, layout.logs);
    render_status_bar(frame, app, layout.status);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
}

fn render_header(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    let header = Line::from(vec![
        Span::styled(
            " Air Quality Dashboard ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{} ", app.endpoint), Style::default().fg(Color::DarkGray)),
        Span::styled(app.data_age(now), Style::default().fg(Color::Yellow)),
        Span::styled(
            match app.orchestrator.interval() {
                Some(every) => format!(" (every {}s)", every.as_secs()),
                None => String::new(),
            },
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let map = &app.session.map;
    let block = panel("Map").title_bottom(Line::from(format!(" {} ", map.attribution())).right_aligned());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = map.viewport().clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = map.renderer().render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        map.markers(),
        map.selected(),
    );
    frame.render_widget(MapWidget { layers }, inner);

    if let Some(marker) = map.selected_marker() {
        let (px, py) = viewport.project(marker.lon, marker.lat);
        if viewport.is_visible(px, py) {
            render_popup(frame, &marker.popup, inner, (px / 2) as u16, (py / 4) as u16);
        }
    }
}

/// Braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas; cells without ink use `color`
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let cols = canvas.width().min(area.width as usize);
        let rows = canvas.height().min(area.height as usize);
        for (col, row, cell) in canvas.inked() {
            if col >= cols || row >= rows {
                continue;
            }
            let fg = cell.ink.map(Rgb::to_color).unwrap_or(color);
            buf[(area.x + col as u16, area.y + row as u16)]
                .set_char(cell.glyph())
                .set_fg(fg);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: coastlines, borders, markers, labels
        Self::render_layer(&self.layers.coastlines, Color::Rgb(71, 85, 105), area, buf);
        Self::render_layer(&self.layers.borders, Color::Rgb(51, 65, 85), area, buf);
        Self::render_layer(&self.layers.markers, Color::White, area, buf);

        let label_style = Style::default().fg(Color::Gray);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = area.width.saturating_sub(*lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + *lx + i as u16, area.y + *ly)]
                    .set_char(ch)
                    .set_style(label_style);
            }
        }
    }
}

fn render_popup(frame: &mut Frame, text: &str, bounds: Rect, col: u16, row: u16) {
    let lines: Vec<Line> = text
        .lines()
        .enumerate()
        .map(|(i, l)| {
            let style = if i == 0 {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::styled(l.to_string(), style)
        })
        .collect();
    let width = (text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4)
        .min(bounds.width);
    let height = (lines.len() as u16 + 2).min(bounds.height);

    // Prefer above-right of the marker, clamped into the map
    let x = (bounds.x + col + 1).min(bounds.x + bounds.width.saturating_sub(width));
    let y = (bounds.y + row)
        .saturating_sub(height)
        .max(bounds.y);
    let area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        ),
        area,
    );
}

fn slot_span<'a>(slots: &'a DisplaySlots, slot: Slot, style: Style) -> Span<'a> {
    match slots.get(slot) {
        Some(value) => {
            let style = match value.color {
                Some(color) => style.fg(color.to_color()),
                None => style,
            };
            Span::styled(value.text.as_str(), style)
        }
        None => Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
    }
}

fn render_stats(frame: &mut Frame, slots: &DisplaySlots, area: Rect) {
    let key = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("AQI ", key),
            slot_span(
                slots,
                Slot::AqiValue,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            slot_span(slots, Slot::AqiCategory, value),
        ]),
        Line::from(vec![
            Span::styled("band ", key),
            slot_span(slots, Slot::AqiBand, key),
        ]),
        Line::from(slot_span(slots, Slot::LocationLabel, Style::default().fg(Color::Cyan))),
        Line::from(""),
    ];

    for pollutant in Pollutant::ALL {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<6}", pollutant.label()), key),
            slot_span(slots, Slot::for_pollutant(pollutant), value),
        ]));
    }

    lines.push(Line::from(vec![
        Span::styled("at ", key),
        slot_span(slots, Slot::UpdatedAt, key),
        Span::styled("  via ", key),
        slot_span(slots, Slot::Source, key),
    ]));

    frame.render_widget(Paragraph::new(lines).block(panel("Latest reading")), area);
}

fn render_chart(frame: &mut Frame, chart: Option<&PollutantChart>, area: Rect) {
    let Some(chart) = chart else {
        frame.render_widget(
            Paragraph::new(Span::styled("waiting for data", Style::default().fg(Color::DarkGray)))
                .block(panel("Pollutants")),
            area,
        );
        return;
    };

    let bars: Vec<Bar> = chart
        .bars()
        .iter()
        .map(|bar| {
            let label_style = match bar.value {
                Some(_) => Style::default(),
                None => Style::default().fg(Color::DarkGray),
            };
            Bar::default()
                .value(bar_height(bar.value))
                .text_value(bar_text(bar.value))
                .label(Line::styled(bar.label, label_style))
                .style(Style::default().fg(bar.color.over(BACKGROUND, bar.alpha).to_color()))
                .value_style(Style::default().fg(chart.border.to_color()))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2);
    let bar_width = (inner_width / bars.len().max(1) as u16).saturating_sub(1).max(1);
    let max = bar_height(Some(chart.axis_max())).max(1);

    let widget = BarChart::default()
        .block(panel(chart.dataset_label))
        .data(BarGroup::default().bars(&bars))
        .max(max)
        .bar_gap(1)
        .bar_width(bar_width)
        .label_style(Style::default().fg(Color::Gray));

    frame.render_widget(widget, area);
}

/// BarChart takes integers; plot tenths so small concentrations still show.
/// A missing reading gets no bar at all.
fn bar_height(value: Option<f64>) -> u64 {
    value.map_or(0, |v| (v.max(0.0) * 10.0).round() as u64)
}

fn bar_text(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "—".to_string(),
    }
}

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .logs
        .tail(LOG_LINES as usize)
        .map(|l| Line::styled(l.to_string(), Style::default().fg(Color::Gray)))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(panel("Diagnostics")), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.session.map.renderer().settings;
    let toggle = |on: bool, label_on: &'static str, label_off: &'static str| {
        Span::styled(
            if on { label_on } else { label_off },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        toggle(settings.show_borders, "[b]order ", "[b]order "),
        toggle(settings.show_labels, "[L]abels ", "[L]abels "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!(" | {} markers", app.session.map.markers().len()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            " | hjkl:pan +/-:zoom tab:popup r:refresh 0:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
