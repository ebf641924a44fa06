//! Map rendering for normalized routes.
//!
//! Routes become a GeoJSON `FeatureCollection` styled with simplestyle
//! properties (`stroke`, `marker-color`, ...), which [`to_html`] can wrap in
//! a standalone Leaflet page.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::routes::NormalizedRoute;

/// Route colors, reused in order when there are more routes than colors.
pub const PALETTE: [&str; 4] = ["blue", "purple", "orange", "green"];
pub const LINE_WEIGHT: u32 = 5;
pub const LINE_OPACITY: f64 = 0.7;

/// Color of the `index`-th route (0-based).
pub fn route_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Builds the map layers, or `None` when there is nothing to draw: no routes,
/// or a first route without any points.
///
/// Origin and destination markers come from the first route; every route
/// gets its own colored line labelled `Route N`.
pub fn route_map(routes: &[NormalizedRoute]) -> Option<FeatureCollection> {
    let first = routes.first()?;

    let mut features = vec![
        marker(first.start()?, "Origin", "green"),
        marker(first.end()?, "Destination", "red"),
    ];

    for (i, route) in routes.iter().enumerate() {
        let coordinates = route.path.iter().map(|&(lat, lng)| vec![lng, lat]).collect();
        features.push(feature(
            Value::LineString(coordinates),
            json!({
                "name": format!("Route {}", i + 1),
                "stroke": route_color(i),
                "stroke-width": LINE_WEIGHT,
                "stroke-opacity": LINE_OPACITY,
                "distance": route.distance_text,
                "duration": route.duration_text,
                "congestion_estimate": route.congestion_estimate,
            }),
        ));
    }

    Some(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn marker((lat, lng): (f64, f64), title: &str, color: &str) -> Feature {
    feature(
        Value::Point(vec![lng, lat]),
        json!({ "title": title, "marker-color": color }),
    )
}

fn feature(geometry: Value, properties: serde_json::Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties,
        foreign_members: None,
    }
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>Route Map</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://cdn.jsdelivr.net/npm/leaflet-textpath@1.2.3/leaflet.textpath.min.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
const routes = __ROUTES__;
const map = L.map("map");
L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", {
  attribution: "&copy; OpenStreetMap contributors"
}).addTo(map);
const layer = L.geoJSON(routes, {
  style: f => ({ color: f.properties.stroke, weight: f.properties["stroke-width"], opacity: f.properties["stroke-opacity"] }),
  pointToLayer: (f, latlng) => L.circleMarker(latlng, { radius: 8, color: f.properties["marker-color"], fillOpacity: 0.9 }).bindPopup(f.properties.title),
  onEachFeature: (f, l) => {
    if (f.geometry.type === "LineString") {
      l.bindPopup(`${f.properties.name}: ${f.properties.distance}, ${f.properties.duration}`);
      l.setText(` ${f.properties.name} `, { repeat: true, offset: 7, attributes: { fill: f.properties.stroke, "font-weight": "bold", "font-size": "12" } });
    }
  }
}).addTo(map);
map.fitBounds(layer.getBounds(), { padding: [20, 20] });
</script>
</body>
</html>
"#;

/// Renders the collection as a self-contained Leaflet page.
pub fn to_html(collection: &FeatureCollection) -> serde_json::Result<String> {
    let routes = serde_json::to_string(collection)?;
    // Keep a literal "</script>" inside string values from closing the tag.
    let routes = routes.replace("</", "<\\/");
    Ok(HTML_TEMPLATE.replace("__ROUTES__", &routes))
}
