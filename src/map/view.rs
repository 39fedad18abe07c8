use crate::color::{color_for, Rgb};
use crate::map::basemap::load_basemap;
use crate::map::projection::Viewport;
use crate::map::renderer::MapRenderer;
use crate::record::PollutionRecord;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// What `render_markers` does with markers from earlier cycles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPolicy {
    /// Clear prior markers before placing the new set
    #[default]
    Replace,
    /// Keep every marker ever placed
    Accumulate,
}

/// Circle marker paint
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill: Rgb,
    pub fill_opacity: f64,
    pub border: Rgb,
    pub weight: f64,
    pub opacity: f64,
}

impl MarkerStyle {
    pub fn for_category(category: &str) -> Self {
        Self {
            radius: 10.0,
            fill: color_for(category),
            fill_opacity: 0.8,
            border: Rgb::WHITE,
            weight: 1.0,
            opacity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CircleMarker {
    pub lat: f64,
    pub lon: f64,
    pub style: MarkerStyle,
    /// Popup body, one line per entry
    pub popup: String,
    /// Short label drawn next to the marker
    pub label: String,
}

impl CircleMarker {
    pub fn for_record(record: &PollutionRecord) -> Self {
        Self {
            lat: record.latitude,
            lon: record.longitude,
            style: MarkerStyle::for_category(&record.category),
            popup: format!(
                "{}\nAQI: {}\n{}",
                record.location, record.aqi, record.category
            ),
            label: record.location.clone(),
        }
    }
}

/// The dashboard's single map instance
pub struct MapView {
    viewport: Viewport,
    renderer: MapRenderer,
    markers: Vec<CircleMarker>,
    policy: MarkerPolicy,
    selected: Option<usize>,
    attribution: &'static str,
}

impl MapView {
    /// Initial world view
    pub const DEFAULT_CENTER: (f64, f64) = (20.0, 0.0);
    pub const DEFAULT_LEVEL: f64 = 2.0;
    /// Level used when focusing the latest record
    pub const FOCUS_LEVEL: f64 = 5.0;

    /// Create the map centered on the world view, with the basemap loaded from
    /// `data_dir` (or the built-in outline).
    pub fn initialize(data_dir: Option<&Path>, policy: MarkerPolicy) -> Self {
        let mut renderer = MapRenderer::new();
        let attribution = load_basemap(&mut renderer, data_dir);
        let (lat, lon) = Self::DEFAULT_CENTER;

        Self {
            viewport: Viewport::new(lat, lon, Self::DEFAULT_LEVEL, 0, 0),
            renderer,
            markers: Vec::new(),
            policy,
            selected: None,
            attribution,
        }
    }

    /// Place one circle marker per record, then focus the first record
    pub fn render_markers(&mut self, records: &[PollutionRecord]) {
        if self.policy == MarkerPolicy::Replace {
            self.markers.clear();
            self.selected = None;
        }
        self.markers
            .extend(records.iter().map(CircleMarker::for_record));
        debug!(placed = records.len(), total = self.markers.len(), "map markers");

        if let Some(latest) = records.first() {
            self.set_view(latest.latitude, latest.longitude, Self::FOCUS_LEVEL);
        }
    }

    pub fn set_view(&mut self, lat: f64, lon: f64, level: f64) {
        self.viewport.set_view(lat, lon, level);
    }

    /// Match the canvas to the braille resolution of the map area
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.viewport.width = cols as usize * 2;
        self.viewport.height = rows as usize * 4;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn renderer(&self) -> &MapRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut MapRenderer {
        &mut self.renderer
    }

    pub fn markers(&self) -> &[CircleMarker] {
        &self.markers
    }

    pub fn attribution(&self) -> &'static str {
        self.attribution
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Cycle popup selection through the markers, ending with none
    pub fn select_next(&mut self) {
        self.selected = match self.selected {
            _ if self.markers.is_empty() => None,
            None => Some(0),
            Some(i) if i + 1 < self.markers.len() => Some(i + 1),
            Some(_) => None,
        };
    }

    pub fn selected_marker(&self) -> Option<&CircleMarker> {
        self.selected.and_then(|i| self.markers.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::category_color;
    use crate::record::Category;

    fn records() -> Vec<PollutionRecord> {
        vec![
            PollutionRecord::sample("X", 10.0, 20.0, 42, "Good"),
            PollutionRecord::sample("Y", -33.9, 151.2, 180, "Unhealthy"),
        ]
    }

    #[test]
    fn test_initialize_world_view() {
        let map = MapView::initialize(None, MarkerPolicy::Replace);
        let vp = map.viewport();
        assert_eq!((vp.center_lat, vp.center_lon), (20.0, 0.0));
        assert_eq!(vp.level, 2.0);
        assert!(map.markers().is_empty());
        assert!(map.renderer().has_data());
    }

    #[test]
    fn test_markers_and_recenter() {
        let mut map = MapView::initialize(None, MarkerPolicy::Replace);
        map.render_markers(&records());

        let markers = map.markers();
        assert_eq!(markers.len(), 2);
        assert_eq!((markers[0].lat, markers[0].lon), (10.0, 20.0));
        assert_eq!(markers[0].style.fill, category_color(Category::Good));
        assert_eq!(markers[0].style.border, Rgb::WHITE);
        assert_eq!(markers[0].style.fill_opacity, 0.8);
        assert_eq!(markers[0].style.radius, 10.0);
        assert_eq!(markers[1].popup, "Y\nAQI: 180\nUnhealthy");

        let vp = map.viewport();
        assert_eq!((vp.center_lat, vp.center_lon, vp.level), (10.0, 20.0, 5.0));
    }

    #[test]
    fn test_empty_records_keep_view() {
        let mut map = MapView::initialize(None, MarkerPolicy::Accumulate);
        map.render_markers(&[]);
        assert_eq!(map.viewport().level, MapView::DEFAULT_LEVEL);
    }

    #[test]
    fn test_replace_policy_clears_prior_markers() {
        let mut map = MapView::initialize(None, MarkerPolicy::Replace);
        map.render_markers(&records());
        map.render_markers(&records()[..1]);
        assert_eq!(map.markers().len(), 1);
    }

    #[test]
    fn test_accumulate_policy_keeps_prior_markers() {
        let mut map = MapView::initialize(None, MarkerPolicy::Accumulate);
        map.render_markers(&records());
        map.render_markers(&records());
        assert_eq!(map.markers().len(), 4);
    }

    #[test]
    fn test_unknown_category_marker_matches_fallback() {
        let mut map = MapView::initialize(None, MarkerPolicy::Replace);
        map.render_markers(&[PollutionRecord::sample("Z", 0.0, 0.0, 1, "Unknown")]);
        assert_eq!(map.markers()[0].style.fill, crate::color::FALLBACK);
    }

    #[test]
    fn test_select_next_cycles() {
        let mut map = MapView::initialize(None, MarkerPolicy::Replace);
        map.select_next();
        assert_eq!(map.selected(), None);

        map.render_markers(&records());
        map.select_next();
        assert_eq!(map.selected_marker().map(|m| m.label.as_str()), Some("X"));
        map.select_next();
        assert_eq!(map.selected(), Some(1));
        map.select_next();
        assert_eq!(map.selected(), None);
    }
}
