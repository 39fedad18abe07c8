use crate::color::Rgb;
use crate::record::{Pollutant, PollutionRecord};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

pub const DATASET_LABEL: &str = "Concentration (µg/m³)";

/// CO readings are an order of magnitude above the other pollutants; the
/// chart shows them divided by this so all bars share one axis.
/// Display only: stat slots and records keep the raw value.
pub const CO_DISPLAY_DIVISOR: f64 = 100.0;

/// Bar fill alpha
pub const BAR_ALPHA: f64 = 0.6;

fn bar_color(pollutant: Pollutant) -> Rgb {
    match pollutant {
        Pollutant::Pm25 => Rgb(56, 189, 248),
        Pollutant::Pm10 => Rgb(129, 140, 248),
        Pollutant::No2 => Rgb(168, 85, 247),
        Pollutant::Co => Rgb(244, 114, 182),
        Pollutant::O3 => Rgb(251, 146, 60),
        Pollutant::So2 => Rgb(45, 212, 191),
    }
}

/// Value plotted for a pollutant; `None` for a missing reading
pub fn chart_value(record: &PollutionRecord, pollutant: Pollutant) -> Option<f64> {
    let raw = record.concentration(pollutant)?;
    Some(match pollutant {
        Pollutant::Co => raw / CO_DISPLAY_DIVISOR,
        _ => raw,
    })
}

/// Drawing surface a chart binds to. Counts the chart instances alive on it.
pub struct ChartCanvas {
    id: &'static str,
    live: Rc<Cell<usize>>,
    constructed: Cell<u64>,
}

impl ChartCanvas {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            live: Rc::new(Cell::new(0)),
            constructed: Cell::new(0),
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn live_instances(&self) -> usize {
        self.live.get()
    }

    /// Charts ever constructed on this canvas
    pub fn constructed(&self) -> u64 {
        self.constructed.get()
    }

    fn bind(&self) -> CanvasBinding {
        self.live.set(self.live.get() + 1);
        self.constructed.set(self.constructed.get() + 1);
        CanvasBinding {
            live: Rc::clone(&self.live),
        }
    }
}

/// Held by a chart while it owns drawing resources on a canvas
struct CanvasBinding {
    live: Rc<Cell<usize>>,
}

impl Drop for CanvasBinding {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartBar {
    pub label: &'static str,
    /// `None` draws an empty slot instead of a zero-height bar
    pub value: Option<f64>,
    pub color: Rgb,
    pub alpha: f64,
}

/// Bar chart of the six pollutant concentrations of one record
pub struct PollutantChart {
    bars: Vec<ChartBar>,
    pub dataset_label: &'static str,
    pub border: Rgb,
    pub border_width: u16,
    pub begin_at_zero: bool,
    pub show_legend: bool,
    _binding: CanvasBinding,
}

impl PollutantChart {
    fn new(canvas: &ChartCanvas, record: &PollutionRecord) -> Self {
        let bars = Pollutant::ALL
            .into_iter()
            .map(|p| ChartBar {
                label: p.label(),
                value: chart_value(record, p),
                color: bar_color(p),
                alpha: BAR_ALPHA,
            })
            .collect();

        Self {
            bars,
            dataset_label: DATASET_LABEL,
            border: Rgb::WHITE,
            border_width: 1,
            begin_at_zero: true,
            show_legend: false,
            _binding: canvas.bind(),
        }
    }

    pub fn bars(&self) -> &[ChartBar] {
        &self.bars
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.value).collect()
    }

    /// Largest plotted value, the top of a zero-based axis
    pub fn axis_max(&self) -> f64 {
        self.bars
            .iter()
            .filter_map(|b| b.value)
            .fold(0.0, f64::max)
    }

    /// Release the canvas
    pub fn destroy(self) {
        debug!("destroying previous pollutant chart");
    }
}

/// Owns the canvas and at most one chart bound to it
pub struct ChartView {
    canvas: ChartCanvas,
    chart: Option<PollutantChart>,
}

impl ChartView {
    pub fn new(canvas: ChartCanvas) -> Self {
        Self {
            canvas,
            chart: None,
        }
    }

    /// Replace the current chart with one for `record`
    pub fn render(&mut self, record: &PollutionRecord) {
        if let Some(previous) = self.chart.take() {
            previous.destroy();
        }
        let chart = PollutantChart::new(&self.canvas, record);
        debug!(canvas = self.canvas.id(), values = ?chart.values(), "pollutant chart built");
        self.chart = Some(chart);
    }

    pub fn chart(&self) -> Option<&PollutantChart> {
        self.chart.as_ref()
    }

    pub fn canvas(&self) -> &ChartCanvas {
        &self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PollutionRecord {
        PollutionRecord::sample("X", 10.0, 20.0, 42, "Good")
    }

    #[test]
    fn test_values_scale_only_co() {
        let mut view = ChartView::new(ChartCanvas::new("pollutantChart"));
        let mut record = record();
        record.co = Some(500.0);
        view.render(&record);

        let chart = view.chart().unwrap();
        assert_eq!(
            chart.values(),
            vec![Some(5.0), Some(10.0), Some(3.0), Some(5.0), Some(8.0), Some(1.0)]
        );
        assert_eq!(record.co, Some(500.0));
    }

    #[test]
    fn test_labels_and_options() {
        let mut view = ChartView::new(ChartCanvas::new("pollutantChart"));
        view.render(&record());

        let chart = view.chart().unwrap();
        let labels: Vec<_> = chart.bars().iter().map(|b| b.label).collect();
        assert_eq!(labels, ["PM2.5", "PM10", "NO₂", "CO", "O₃", "SO₂"]);
        assert_eq!(chart.bars()[0].color, Rgb(56, 189, 248));
        assert_eq!(chart.border, Rgb::WHITE);
        assert_eq!(chart.border_width, 1);
        assert!(chart.begin_at_zero);
        assert!(!chart.show_legend);
        assert_eq!(chart.dataset_label, "Concentration (µg/m³)");
        assert_eq!(chart.axis_max(), 10.0);
    }

    #[test]
    fn test_missing_readings_are_not_plotted_as_zero() {
        let mut view = ChartView::new(ChartCanvas::new("pollutantChart"));
        let mut record = record();
        record.pm25 = None;
        record.co = None;
        record.pm10 = Some(0.0);
        view.render(&record);

        let chart = view.chart().unwrap();
        assert_eq!(
            chart.values(),
            vec![None, Some(0.0), Some(3.0), None, Some(8.0), Some(1.0)]
        );
        assert_eq!(chart.axis_max(), 8.0);
    }

    #[test]
    fn test_all_missing_gives_flat_axis() {
        let mut view = ChartView::new(ChartCanvas::new("pollutantChart"));
        let mut record = record();
        for pollutant in Pollutant::ALL {
            match pollutant {
                Pollutant::Pm25 => record.pm25 = None,
                Pollutant::Pm10 => record.pm10 = None,
                Pollutant::No2 => record.no2 = None,
                Pollutant::Co => record.co = None,
                Pollutant::O3 => record.o3 = None,
                Pollutant::So2 => record.so2 = None,
            }
        }
        view.render(&record);

        let chart = view.chart().unwrap();
        assert!(chart.values().iter().all(Option::is_none));
        assert_eq!(chart.axis_max(), 0.0);
        assert_eq!(view.canvas().live_instances(), 1);
    }

    #[test]
    fn test_single_live_chart_after_many_renders() {
        let mut view = ChartView::new(ChartCanvas::new("pollutantChart"));
        assert_eq!(view.canvas().live_instances(), 0);

        for _ in 0..5 {
            view.render(&record());
            assert_eq!(view.canvas().live_instances(), 1);
        }
        assert_eq!(view.canvas().constructed(), 5);
    }

    #[test]
    fn test_dropping_view_releases_canvas() {
        let canvas = ChartCanvas::new("pollutantChart");
        let live = Rc::clone(&canvas.live);
        let mut view = ChartView::new(canvas);
        view.render(&record());
        drop(view);
        assert_eq!(live.get(), 0);
    }
}
