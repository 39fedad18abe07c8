use crate::braille::BrailleCanvas;
use crate::color::{Rgb, BACKGROUND};
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::projection::Viewport;
use crate::map::view::CircleMarker;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on slippy-map level
    pub fn from_level(level: f64) -> Self {
        if level < 3.0 {
            Lod::Low
        } else if level < 6.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_labels: true,
        }
    }
}

/// Braille layers and text overlays for one frame, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    /// Marker discs, inked with their flattened fill colors
    pub markers: BrailleCanvas,
    /// (col, row, text) location labels
    pub labels: Vec<(u16, u16, String)>,
}

/// Basemap store and frame renderer
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Most detailed coastlines available at or below `lod`
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let tiers = [
            (Lod::High, &self.coastlines_high),
            (Lod::Medium, &self.coastlines_medium),
            (Lod::Low, &self.coastlines_low),
        ];
        let rank = |l: Lod| l as u8;
        tiers
            .into_iter()
            .filter(|(tier, lines)| rank(*tier) <= rank(lod) && !lines.is_empty())
            .map(|(_, lines)| lines.as_slice())
            .next()
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            Lod::Low => &[],
            _ => &self.borders_medium,
        }
    }

    /// Render basemap and markers for a `width` x `height` character area
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        markers: &[CircleMarker],
        selected: Option<usize>,
    ) -> MapLayers {
        let lod = Lod::from_level(viewport.level);
        let mut layers = MapLayers {
            coastlines: BrailleCanvas::new(width, height),
            borders: BrailleCanvas::new(width, height),
            markers: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        };

        for line in self.coastlines(lod) {
            draw_linestring(&mut layers.coastlines, line, viewport);
        }

        if self.settings.show_borders {
            for line in self.borders(lod) {
                draw_linestring(&mut layers.borders, line, viewport);
            }
        }

        for (idx, marker) in markers.iter().enumerate() {
            let (px, py) = viewport.project(marker.lon, marker.lat);
            if !viewport.is_visible(px, py) {
                continue;
            }

            let radius = marker_radius_px(marker.style.radius);
            layers
                .markers
                .set_pen(Some(marker.style.fill.over(BACKGROUND, marker.style.fill_opacity)));
            draw_circle(&mut layers.markers, px, py, radius);

            if selected == Some(idx) && marker.style.weight > 0.0 {
                let border: Rgb = marker.style.border.over(BACKGROUND, marker.style.opacity);
                layers.markers.set_pen(Some(border));
                draw_ring(&mut layers.markers, px, py, radius);
            }

            if self.settings.show_labels {
                let char_x = (px / 2) as u16;
                let char_y = (py / 4) as u16;
                if let Some(label_x) = char_x.checked_add(2) {
                    layers.labels.push((label_x, char_y, marker.label.clone()));
                }
            }
        }

        layers
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Add border data at a specific LOD
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Medium | Lod::Low => self.borders_medium.push(line),
        }
    }

    /// Check if any coastline is loaded
    pub fn has_data(&self) -> bool {
        self.coastline_count() > 0
    }

    pub fn coastline_count(&self) -> usize {
        self.coastlines_low.len() + self.coastlines_medium.len() + self.coastlines_high.len()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker radius is given in screen units of a 256px-tile map; braille dots
/// are roughly four times coarser.
fn marker_radius_px(radius: f64) -> i32 {
    ((radius / 4.0).round() as i32).max(1)
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Skip antimeridian wraps, which would streak across the whole canvas
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}
