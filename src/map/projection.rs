use std::f64::consts::PI;

/// Closest and furthest slippy-map zoom levels the viewport accepts
pub const MIN_LEVEL: f64 = 1.0;
pub const MAX_LEVEL: f64 = 18.0;
const LEVEL_STEP: f64 = 0.5;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Slippy-map zoom level. Level 2 fits the whole world across the canvas width.
    pub level: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lat: f64, center_lon: f64, level: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            width,
            height,
        }
    }

    /// Move the view without touching the canvas size
    pub fn set_view(&mut self, lat: f64, lon: f64, level: f64) {
        self.center_lat = lat;
        self.center_lon = lon;
        self.level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    }

    /// Multiple of the canvas width the whole Mercator world spans
    pub fn world_widths(&self) -> f64 {
        2f64.powf(self.level - 2.0)
    }

    fn scale(&self) -> f64 {
        self.world_widths() * self.width as f64
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / self.scale().max(1.0);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.level = (self.level + LEVEL_STEP).min(MAX_LEVEL);
    }

    pub fn zoom_out(&mut self) {
        self.level = (self.level - LEVEL_STEP).max(MIN_LEVEL);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, LEVEL_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -LEVEL_STEP);
    }

    /// Change level while keeping the point under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.level = (self.level + delta).clamp(MIN_LEVEL, MAX_LEVEL);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = mercator(lon, lat);
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale();

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

/// Web Mercator, normalized to the unit square
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}
