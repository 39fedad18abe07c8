use crate::record::Category;
use std::fmt;

/// 24-bit display color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb::hex(0xffffff);

    /// Build from a `0xRRGGBB` literal
    pub const fn hex(value: u32) -> Self {
        Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Composite this color at `alpha` over an opaque background.
    /// Terminals have no alpha channel, so translucent fills are flattened here.
    pub fn over(self, background: Rgb, alpha: f64) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| (fg as f64 * a + bg as f64 * (1.0 - a)).round() as u8;
        Rgb(
            mix(self.0, background.0),
            mix(self.1, background.1),
            mix(self.2, background.2),
        )
    }

    pub fn to_color(self) -> ratatui::style::Color {
        ratatui::style::Color::Rgb(self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Dashboard background (dark basemap theme)
pub const BACKGROUND: Rgb = Rgb::hex(0x0f172a);

/// Color for labels outside the known categories.
/// Must stay distinct from every category color.
pub const FALLBACK: Rgb = Rgb::hex(0xcccccc);

pub fn category_color(category: Category) -> Rgb {
    match category {
        Category::Good => Rgb::hex(0x10b981),
        Category::Moderate => Rgb::hex(0xf59e0b),
        Category::UnhealthySensitive => Rgb::hex(0xf97316),
        Category::Unhealthy => Rgb::hex(0xef4444),
        Category::VeryUnhealthy => Rgb::hex(0xa855f7),
        Category::Hazardous => Rgb::hex(0x881337),
    }
}

/// Color for a category label as received from the backend.
///
/// Shared by the AQI readout and the map markers so both agree for the same record.
pub fn color_for(category: &str) -> Rgb {
    Category::parse(category)
        .map(category_color)
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_designed_colors() {
        assert_eq!(color_for("Good").to_string(), "#10b981");
        assert_eq!(color_for("Moderate").to_string(), "#f59e0b");
        assert_eq!(color_for("Unhealthy (Sensitive)").to_string(), "#f97316");
        assert_eq!(color_for("Unhealthy").to_string(), "#ef4444");
        assert_eq!(color_for("Very Unhealthy").to_string(), "#a855f7");
        assert_eq!(color_for("Hazardous").to_string(), "#881337");
    }

    #[test]
    fn test_unknown_labels_fall_back() {
        for label in ["", "Unknown", "good", "HAZARDOUS", "Unhealthy (sensitive)"] {
            assert_eq!(color_for(label), FALLBACK, "label {label:?}");
        }
    }

    #[test]
    fn test_fallback_distinct_from_categories() {
        for category in Category::ALL {
            assert_ne!(category_color(category), FALLBACK);
        }
    }

    #[test]
    fn test_over_blends_toward_background() {
        let black = Rgb(0, 0, 0);
        assert_eq!(Rgb::WHITE.over(black, 1.0), Rgb::WHITE);
        assert_eq!(Rgb::WHITE.over(black, 0.0), black);
        assert_eq!(Rgb(200, 100, 0).over(black, 0.5), Rgb(100, 50, 0));
    }
}
