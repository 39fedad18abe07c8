use crate::color::{color_for, Rgb};
use crate::record::{Category, Pollutant, PollutionRecord};
use std::collections::BTreeMap;
use tracing::trace;

/// Named text cells of the stats panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    AqiValue,
    AqiCategory,
    LocationLabel,
    Pm25,
    Pm10,
    No2,
    Co,
    O3,
    So2,
    UpdatedAt,
    Source,
    AqiBand,
}

impl Slot {
    pub fn id(self) -> &'static str {
        match self {
            Slot::AqiValue => "aqiValue",
            Slot::AqiCategory => "aqiCategory",
            Slot::LocationLabel => "locationLabel",
            Slot::Pm25 => "val-pm25",
            Slot::Pm10 => "val-pm10",
            Slot::No2 => "val-no2",
            Slot::Co => "val-co",
            Slot::O3 => "val-o3",
            Slot::So2 => "val-so2",
            Slot::UpdatedAt => "updatedAt",
            Slot::Source => "source",
            Slot::AqiBand => "aqiBand",
        }
    }

    pub fn for_pollutant(pollutant: Pollutant) -> Self {
        match pollutant {
            Pollutant::Pm25 => Slot::Pm25,
            Pollutant::Pm10 => Slot::Pm10,
            Pollutant::No2 => Slot::No2,
            Pollutant::Co => Slot::Co,
            Pollutant::O3 => Slot::O3,
            Pollutant::So2 => Slot::So2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotValue {
    pub text: String,
    /// Emphasis color, if the slot has one
    pub color: Option<Rgb>,
}

/// Current contents of every display slot.
/// Slots that were never written are absent and render as placeholders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplaySlots {
    values: BTreeMap<Slot, SlotValue>,
}

impl DisplaySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&SlotValue> {
        self.values.get(&slot)
    }

    pub fn text(&self, slot: Slot) -> Option<&str> {
        self.get(slot).map(|v| v.text.as_str())
    }

    pub fn color(&self, slot: Slot) -> Option<Rgb> {
        self.get(slot).and_then(|v| v.color)
    }

    pub fn set_text(&mut self, slot: Slot, text: impl Into<String>) {
        let text = text.into();
        trace!(slot = slot.id(), %text, "slot updated");
        self.values.entry(slot).or_default().text = text;
    }

    pub fn set_color(&mut self, slot: Slot, color: Rgb) {
        self.values.entry(slot).or_default().color = Some(color);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

const MISSING: &str = "—";

/// Format a concentration for its stat slot, e.g. `12.5 µg/m³`
pub fn format_concentration(value: f64) -> String {
    format!("{} µg/m³", unsigned_zero(value))
}

/// `-0.0` prints as `-0`; show it as `0`
fn unsigned_zero(value: f64) -> f64 {
    value + 0.0
}

/// Write the latest record into the stat slots
pub fn render(slots: &mut DisplaySlots, record: &PollutionRecord) {
    slots.set_text(Slot::AqiValue, record.aqi.to_string());
    slots.set_color(Slot::AqiValue, color_for(&record.category));
    slots.set_text(Slot::AqiCategory, record.category.clone());
    slots.set_text(
        Slot::LocationLabel,
        format!(
            "{} ({}, {})",
            record.location,
            unsigned_zero(record.latitude),
            unsigned_zero(record.longitude)
        ),
    );

    for pollutant in Pollutant::ALL {
        slots.set_text(
            Slot::for_pollutant(pollutant),
            record
                .concentration(pollutant)
                .map(format_concentration)
                .unwrap_or_else(|| MISSING.to_string()),
        );
    }

    slots.set_text(
        Slot::UpdatedAt,
        record.timestamp.as_deref().unwrap_or(MISSING),
    );
    let source = match (&record.location_source, record.accuracy) {
        (Some(source), Some(accuracy)) => format!("{source} (±{accuracy} m)"),
        (Some(source), None) => source.clone(),
        (None, _) => MISSING.to_string(),
    };
    slots.set_text(Slot::Source, source);
    slots.set_text(
        Slot::AqiBand,
        Category::from_aqi(record.aqi)
            .map(Category::label)
            .unwrap_or(MISSING),
    );
}
