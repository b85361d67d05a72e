//! Map overlays as GeoJSON and as a standalone Leaflet page.
//!
//! Every feature carries its own `layer`, `color`, `radius` and `popup`
//! properties so the page script needs no knowledge of evaluation types.

use std::fs;
use std::path::Path;

use log::info;
use serde_json::{json, Value};

use crate::aggregate::GroupOutcome;
use crate::error::{EvalError, Result};
use crate::geo_utils::compute_bounds;
use crate::ingest::file_name;
use crate::timeline::TimelineSeries;
use crate::{Bounds, EvalConfig, GeoPoint, TimelineConfig};

const REFERENCE_PATH_COLOR: &str = "#2E282A";
const REFERENCE_POINT_COLOR: &str = "#000000";
const UNPAIRED_COLOR: &str = "#808080";

/// A GeoJSON feature collection together with the extent of its points.
#[derive(Debug, Clone)]
pub struct MapOverlay {
    pub features: Vec<Value>,
    pub bounds: Option<Bounds>,
}

impl MapOverlay {
    fn from_features(features: Vec<Value>, points: &[GeoPoint]) -> Self {
        Self {
            features,
            bounds: compute_bounds(points),
        }
    }

    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features,
        })
    }
}

/// Escape text for inclusion in HTML.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn point_feature(point: &GeoPoint, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": properties,
        // GeoJSON order is [lng, lat]
        "geometry": { "type": "Point", "coordinates": [point.longitude, point.latitude] },
    })
}

fn fix_popup(mode: &str, point: &GeoPoint, distance: Option<f64>, source: &str) -> String {
    let distance = match distance {
        Some(d) => format!("{:.2}m", d),
        None => "unpaired (fix count mismatch)".to_string(),
    };
    format!(
        "{}<br>{}<br>{}<br>{}<br>{}",
        escape_html(mode),
        point.latitude,
        point.longitude,
        distance,
        escape_html(source)
    )
}

/// Reference routes and evaluated fixes.
///
/// Unpaired fixes keep their mode layer but are drawn grey with no distance.
pub fn evaluation_overlay(config: &EvalConfig, outcomes: &[GroupOutcome]) -> MapOverlay {
    let mut features = Vec::new();
    let mut points = Vec::new();

    for route in &config.routes {
        let label = route.name.as_deref().unwrap_or(&route.id);
        let coords: Vec<[f64; 2]> = route
            .points
            .iter()
            .map(|p| [p.longitude, p.latitude])
            .collect();
        features.push(json!({
            "type": "Feature",
            "properties": {
                "kind": "reference_path",
                "layer": "Reference routes",
                "route": route.id,
                "color": REFERENCE_PATH_COLOR,
                "popup": escape_html(label),
            },
            "geometry": { "type": "LineString", "coordinates": coords },
        }));

        for (i, point) in route.points.iter().enumerate() {
            features.push(point_feature(
                point,
                json!({
                    "kind": "reference_point",
                    "layer": "Reference routes",
                    "route": route.id,
                    "index": i,
                    "color": REFERENCE_POINT_COLOR,
                    "radius": 4,
                    "fill": false,
                    "popup": format!("{} #{}", escape_html(label), i),
                }),
            ));
            points.push(*point);
        }
    }

    for outcome in outcomes {
        let color = config
            .mode(&outcome.mode)
            .map(|m| m.color.as_str())
            .unwrap_or(UNPAIRED_COLOR);
        let color = if outcome.is_paired() {
            color
        } else {
            UNPAIRED_COLOR
        };
        let source = file_name(&outcome.source);

        for (i, fix) in outcome.fixes.iter().enumerate() {
            features.push(point_feature(
                &fix.fix,
                json!({
                    "kind": "fix",
                    "layer": outcome.mode,
                    "route": outcome.route_id,
                    "mode": outcome.mode,
                    "source": source,
                    "index": i,
                    "distance": fix.distance,
                    "paired": fix.distance.is_some(),
                    "color": color,
                    "radius": 8,
                    "fill": true,
                    "popup": fix_popup(&outcome.mode, &fix.fix, fix.distance, &source),
                }),
            ));
            points.push(fix.fix);
        }
    }

    MapOverlay::from_features(features, &points)
}

/// Timeline snapshot positions, one layer per strategy.
pub fn timeline_overlay(config: &TimelineConfig, series: &[TimelineSeries]) -> MapOverlay {
    let mut features = Vec::new();
    let mut points = Vec::new();

    for s in series {
        let color = config
            .strategies
            .iter()
            .find(|m| m.label == s.strategy.label)
            .map_or(s.strategy.color.as_str(), |m| m.color.as_str());

        for sample in &s.samples {
            let popup = format!(
                "Accuracy: {}m<br>[lat: {}, lng: {}]<br>GPS-Fix: {}",
                sample.accuracy, sample.point.latitude, sample.point.longitude, sample.fix_delta
            );
            features.push(point_feature(
                &sample.point,
                json!({
                    "kind": "snapshot",
                    "layer": s.strategy.label,
                    "timestamp": sample.timestamp,
                    "elapsed_secs": sample.elapsed_secs,
                    "gps_fixes": sample.gps_fixes,
                    "fix_delta": sample.fix_delta,
                    "accuracy": sample.accuracy,
                    "color": color,
                    "radius": 4,
                    "fill": true,
                    "popup": popup,
                }),
            ));
            points.push(sample.point);
        }
    }

    MapOverlay::from_features(features, &points)
}

/// Write the overlay as a GeoJSON FeatureCollection.
pub fn write_geojson(path: &Path, overlay: &MapOverlay) -> Result<()> {
    let text = serde_json::to_string_pretty(&overlay.to_geojson()).map_err(|source| {
        EvalError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, text).map_err(|e| EvalError::io(path, e))?;
    info!(
        "[Render] GeoJSON written to {} ({} features)",
        path.display(),
        overlay.features.len()
    );
    Ok(())
}

/// Build a self-contained Leaflet page for the overlay.
pub fn leaflet_html(title: &str, overlay: &MapOverlay) -> Result<String> {
    let data = serde_json::to_string(&overlay.to_geojson())
        .map_err(|e| EvalError::Render(e.to_string()))?
        // Keep file names like "</script>" from closing the script element
        .replace("</", "<\\/");

    let fit = match overlay.bounds {
        Some(b) => format!(
            "map.fitBounds([[{}, {}], [{}, {}]], {{ padding: [20, 20] }});",
            b.min_lat, b.min_lng, b.max_lat, b.max_lng
        ),
        None => "map.setView([0, 0], 2);".to_string(),
    };

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const data = {data};
const map = L.map('map', {{ maxZoom: 20 }});
L.tileLayer('https://{{s}}.basemaps.cartocdn.com/light_all/{{z}}/{{x}}/{{y}}{{r}}.png', {{
  attribution: '&copy; OpenStreetMap contributors &copy; CARTO',
  maxZoom: 20
}}).addTo(map);
const layers = {{}};
for (const feature of data.features) {{
  const p = feature.properties;
  const layer = layers[p.layer] || (layers[p.layer] = L.layerGroup().addTo(map));
  const style = {{ color: p.color, fillColor: p.color, fill: p.fill, fillOpacity: 0.6, radius: p.radius }};
  L.geoJSON(feature, {{ style: () => style, pointToLayer: (f, latlng) => L.circleMarker(latlng, style) }})
    .bindPopup(p.popup)
    .addTo(layer);
}}
L.control.layers(null, layers).addTo(map);
map.on('click', (e) => L.popup().setLatLng(e.latlng)
  .setContent('Latitude: ' + e.latlng.lat.toFixed(5) + '<br>Longitude: ' + e.latlng.lng.toFixed(5))
  .openOn(map));
{fit}
</script>
</body>
</html>
"#,
        title = escape_html(title),
        data = data,
        fit = fit,
    ))
}

/// Write the overlay as a Leaflet HTML page.
pub fn write_leaflet_html(path: &Path, title: &str, overlay: &MapOverlay) -> Result<()> {
    let html = leaflet_html(title, overlay)?;
    fs::write(path, html).map_err(|e| EvalError::io(path, e))?;
    info!("[Render] Map written to {}", path.display());
    Ok(())
}
