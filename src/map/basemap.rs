use crate::map::renderer::{Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Attribution shown on the map frame
pub const NATURAL_EARTH_ATTRIBUTION: &str = "© Natural Earth";
pub const BUILTIN_ATTRIBUTION: &str = "outline: built-in";

/// Natural Earth coastline files, coarsest first
const COASTLINE_FILES: [(&str, Lod); 3] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

const BORDER_FILES: [(&str, Lod); 2] = [
    ("ne_50m_borders.json", Lod::Medium),
    ("ne_10m_borders.json", Lod::High),
];

/// Load the basemap layer into `renderer` and return its attribution.
///
/// Files that are missing are skipped, files that fail to parse are logged.
/// Without any coastline the built-in continent outline is used.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: Option<&Path>) -> &'static str {
    if let Some(dir) = data_dir {
        load_dir(renderer, dir);
    }

    if renderer.has_data() {
        NATURAL_EARTH_ATTRIBUTION
    } else {
        info!("no basemap data found, using built-in outline");
        add_builtin_outline(renderer);
        BUILTIN_ATTRIBUTION
    }
}

fn load_dir(renderer: &mut MapRenderer, dir: &Path) {
    for (filename, lod) in COASTLINE_FILES {
        let path = dir.join(filename);
        if path.exists() {
            match read_lines(&path) {
                Ok(lines) => {
                    info!(file = filename, lines = lines.len(), "loaded coastlines");
                    lines.into_iter().for_each(|l| renderer.add_coastline(l, lod));
                }
                Err(err) => warn!(file = filename, "skipping basemap file: {err:#}"),
            }
        }
    }

    for (filename, lod) in BORDER_FILES {
        let path = dir.join(filename);
        if path.exists() {
            match read_lines(&path) {
                Ok(lines) => {
                    info!(file = filename, lines = lines.len(), "loaded borders");
                    lines.into_iter().for_each(|l| renderer.add_border(l, lod));
                }
                Err(err) => warn!(file = filename, "skipping basemap file: {err:#}"),
            }
        }
    }
}

/// Read every line-like feature of a GeoJSON file as lon/lat polylines
pub fn read_lines(path: &Path) -> Result<Vec<Vec<(f64, f64)>>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut lines = Vec::new();
    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_lines(geometry, &mut lines);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => collect_lines(geometry, &mut lines),
    }
    Ok(lines)
}

fn collect_lines(geometry: &Geometry, out: &mut Vec<Vec<(f64, f64)>>) {
    let to_line = |coords: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        coords.iter().map(|c| (c[0], c[1])).collect()
    };

    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(to_line)),
        // Only exterior rings matter for an outline
        Value::Polygon(rings) => out.extend(rings.first().map(to_line)),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| rings.first().map(to_line)))
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, out);
            }
        }
        _ => {}
    }
}

/// Coarse continent outlines, lon/lat
const CONTINENTS: [&[(f64, f64)]; 7] = [
    // North America
    &[
        (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0),
        (-125.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0),
        (-97.0, 25.0), (-97.0, 28.0), (-82.0, 24.0), (-80.0, 25.0),
        (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0), (-67.0, 45.0),
        (-65.0, 47.0), (-55.0, 47.0), (-52.0, 47.0), (-55.0, 52.0),
        (-58.0, 55.0), (-64.0, 60.0), (-73.0, 62.0), (-80.0, 63.0),
        (-95.0, 62.0), (-110.0, 68.0), (-130.0, 70.0), (-145.0, 70.0),
        (-168.0, 65.0),
    ],
    // South America
    &[
        (-80.0, 10.0), (-75.0, 5.0), (-70.0, 5.0), (-60.0, 5.0),
        (-50.0, 0.0), (-35.0, -5.0), (-35.0, -10.0), (-38.0, -15.0),
        (-40.0, -22.0), (-48.0, -25.0), (-55.0, -34.0), (-58.0, -38.0),
        (-65.0, -42.0), (-68.0, -50.0), (-75.0, -52.0), (-75.0, -45.0),
        (-72.0, -40.0), (-72.0, -30.0), (-70.0, -20.0), (-70.0, -15.0),
        (-80.0, -5.0), (-80.0, 0.0), (-80.0, 10.0),
    ],
    // Europe
    &[
        (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (5.0, 43.0),
        (10.0, 44.0), (15.0, 45.0), (20.0, 40.0), (25.0, 37.0),
        (30.0, 40.0), (35.0, 42.0), (40.0, 43.0), (40.0, 55.0),
        (30.0, 60.0), (25.0, 65.0), (20.0, 70.0), (10.0, 71.0),
        (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
        (-5.0, 48.0), (-5.0, 43.0), (-10.0, 36.0),
    ],
    // Africa, west and south coast
    &[
        (-17.0, 15.0), (-15.0, 10.0), (-10.0, 5.0), (0.0, 5.0),
        (10.0, 5.0), (15.0, 0.0), (20.0, -5.0), (25.0, -10.0),
        (35.0, -20.0), (35.0, -25.0), (30.0, -30.0), (20.0, -35.0),
        (18.0, -35.0), (15.0, -30.0), (10.0, -15.0), (10.0, 0.0),
        (5.0, 5.0), (-5.0, 5.0), (-10.0, 10.0), (-17.0, 15.0),
    ],
    // Africa, north and east coast
    &[
        (-17.0, 15.0), (-17.0, 20.0), (-15.0, 28.0), (-5.0, 35.0),
        (10.0, 37.0), (20.0, 33.0), (25.0, 32.0), (35.0, 30.0),
        (35.0, 20.0), (42.0, 12.0), (50.0, 12.0), (45.0, 5.0),
        (35.0, -5.0), (35.0, -20.0),
    ],
    // Asia
    &[
        (35.0, 42.0), (40.0, 43.0), (50.0, 40.0), (55.0, 37.0),
        (60.0, 25.0), (65.0, 25.0), (70.0, 20.0), (75.0, 15.0),
        (80.0, 8.0), (80.0, 15.0), (88.0, 22.0), (92.0, 22.0),
        (95.0, 16.0), (100.0, 14.0), (105.0, 10.0), (110.0, 20.0),
        (115.0, 22.0), (120.0, 22.0), (122.0, 25.0), (125.0, 30.0),
        (130.0, 35.0), (135.0, 35.0), (140.0, 40.0), (145.0, 45.0),
        (145.0, 50.0), (140.0, 55.0), (135.0, 55.0), (130.0, 52.0),
        (130.0, 43.0), (120.0, 40.0), (110.0, 45.0), (90.0, 50.0),
        (70.0, 55.0), (60.0, 55.0), (50.0, 50.0), (40.0, 43.0),
    ],
    // Australia
    &[
        (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0),
        (145.0, -15.0), (150.0, -25.0), (153.0, -30.0), (150.0, -35.0),
        (145.0, -38.0), (140.0, -38.0), (135.0, -35.0), (130.0, -32.0),
        (125.0, -32.0), (115.0, -35.0), (115.0, -25.0), (115.0, -20.0),
    ],
];

fn add_builtin_outline(renderer: &mut MapRenderer) {
    for outline in CONTINENTS {
        renderer.add_coastline(outline.to_vec(), Lod::Low);
    }
}
