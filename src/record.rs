use serde::Deserialize;

/// One pollution observation as served by `/api/data`.
///
/// Records arrive newest-first and are never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollutionRecord {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: i64,
    pub category: String,
    /// Concentrations are nullable columns in the backend; `None` is a
    /// missing reading, not a zero.
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub co: Option<f64>,
    #[serde(default)]
    pub o3: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub location_source: Option<String>,
    /// Reported GPS accuracy in metres
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// `YYYY-MM-DD HH:MM:SS`, UTC
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PollutionRecord {
    pub fn concentration(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
            Pollutant::Co => self.co,
            Pollutant::O3 => self.o3,
            Pollutant::So2 => self.so2,
        }
    }
}

#[cfg(test)]
impl PollutionRecord {
    /// Record with fixed concentrations `[5, 10, 3, 200, 8, 1]`
    pub(crate) fn sample(location: &str, latitude: f64, longitude: f64, aqi: i64, category: &str) -> Self {
        Self {
            location: location.to_string(),
            latitude,
            longitude,
            aqi,
            category: category.to_string(),
            pm25: Some(5.0),
            pm10: Some(10.0),
            no2: Some(3.0),
            co: Some(200.0),
            o3: Some(8.0),
            so2: Some(1.0),
            id: None,
            location_source: None,
            accuracy: None,
            timestamp: None,
        }
    }
}

/// The six pollutants reported per record, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    Co,
    O3,
    So2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::Co,
        Pollutant::O3,
        Pollutant::So2,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO₂",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O₃",
            Pollutant::So2 => "SO₂",
        }
    }
}

/// AQI severity band.
///
/// The backend sends the band as a free-form label; anything that does not
/// match one of these exactly is treated as unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Good,
        Category::Moderate,
        Category::UnhealthySensitive,
        Category::Unhealthy,
        Category::VeryUnhealthy,
        Category::Hazardous,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthySensitive => "Unhealthy (Sensitive)",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Band an AQI value falls in (US EPA breakpoints). Negative values have no band.
    pub fn from_aqi(aqi: i64) -> Option<Self> {
        match aqi {
            0..=50 => Some(Category::Good),
            51..=100 => Some(Category::Moderate),
            101..=150 => Some(Category::UnhealthySensitive),
            151..=200 => Some(Category::Unhealthy),
            201..=300 => Some(Category::VeryUnhealthy),
            301.. => Some(Category::Hazardous),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<PollutionRecord> {
        let mut bytes = json.as_bytes().to_vec();
        simd_json::serde::from_slice(&mut bytes).unwrap()
    }

    #[test]
    fn test_parse_backend_payload() {
        let records = parse(
            r#"[{"id": 7, "location": "Chennai", "latitude": 13.0827, "longitude": 80.2707,
                 "aqi": 142, "pm25": 55.1, "pm10": 80.0, "no2": 20.5, "co": 400.0,
                 "o3": 30.2, "so2": 4.1, "category": "Unhealthy (Sensitive)",
                 "location_source": "GPS", "accuracy": 12.5,
                 "timestamp": "2024-03-01 10:00:00"}]"#,
        );
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.location, "Chennai");
        assert_eq!(r.aqi, 142);
        assert_eq!(r.co, Some(400.0));
        assert_eq!(r.id, Some(7));
        assert_eq!(r.location_source.as_deref(), Some("GPS"));
        assert_eq!(r.timestamp.as_deref(), Some("2024-03-01 10:00:00"));
    }

    #[test]
    fn test_null_concentrations_stay_missing() {
        let records = parse(
            r#"[{"location": "X", "latitude": 1.0, "longitude": 2.0, "aqi": 10,
                 "category": "Good", "pm25": null, "pm10": 3.0, "no2": null,
                 "co": null, "o3": 1.0, "so2": null, "accuracy": null}]"#,
        );
        let r = &records[0];
        assert_eq!(r.pm25, None);
        assert_eq!(r.pm10, Some(3.0));
        assert_eq!(r.co, None);
        assert_eq!(r.concentration(Pollutant::So2), None);
        assert_eq!(r.concentration(Pollutant::O3), Some(1.0));
        assert_eq!(r.accuracy, None);
        assert_eq!(r.id, None);
    }

    #[test]
    fn test_category_parse_is_exact() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.label()), Some(category));
        }
        assert_eq!(Category::parse("good"), None);
        assert_eq!(Category::parse(""), None);
        assert_eq!(Category::parse("Unhealthy "), None);
    }

    #[test]
    fn test_from_aqi_band_edges() {
        assert_eq!(Category::from_aqi(0), Some(Category::Good));
        assert_eq!(Category::from_aqi(50), Some(Category::Good));
        assert_eq!(Category::from_aqi(51), Some(Category::Moderate));
        assert_eq!(Category::from_aqi(150), Some(Category::UnhealthySensitive));
        assert_eq!(Category::from_aqi(151), Some(Category::Unhealthy));
        assert_eq!(Category::from_aqi(300), Some(Category::VeryUnhealthy));
        assert_eq!(Category::from_aqi(301), Some(Category::Hazardous));
        assert_eq!(Category::from_aqi(-1), None);
    }
}
