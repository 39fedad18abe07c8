use crate::chart::{ChartCanvas, ChartView};
use crate::dashboard::{self, DisplaySlots};
use crate::map::{MapView, MarkerPolicy};
use crate::record::PollutionRecord;
use std::path::Path;
use tracing::info;

/// Name of the chart canvas
pub const CHART_CANVAS: &str = "pollutantChart";

/// Result of applying one fetched cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Rendered { records: usize },
    /// Nothing fetched (empty payload or failure); prior state kept
    NoData,
}

/// Everything the dashboard draws: the stat slots, the one map, and the chart.
///
/// Lives on the UI thread for the whole run.
pub struct DashboardSession {
    pub slots: DisplaySlots,
    pub map: MapView,
    pub chart: ChartView,
}

impl DashboardSession {
    /// Initialize the map and an empty chart canvas
    pub fn new(basemap_dir: Option<&Path>, marker_policy: MarkerPolicy) -> Self {
        Self {
            slots: DisplaySlots::new(),
            map: MapView::initialize(basemap_dir, marker_policy),
            chart: ChartView::new(ChartCanvas::new(CHART_CANVAS)),
        }
    }

    /// Render one cycle's records, newest first. Empty input touches nothing.
    pub fn apply(&mut self, records: &[PollutionRecord]) -> CycleOutcome {
        let Some(latest) = records.first() else {
            info!("no records this cycle, keeping current view");
            return CycleOutcome::NoData;
        };

        dashboard::render(&mut self.slots, latest);
        self.map.render_markers(records);
        self.chart.render(latest);

        info!(
            records = records.len(),
            location = %latest.location,
            aqi = latest.aqi,
            "dashboard updated"
        );
        CycleOutcome::Rendered {
            records: records.len(),
        }
    }
}
