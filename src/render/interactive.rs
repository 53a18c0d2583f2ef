//! Leaflet web maps written as a single self-contained HTML page.

use std::collections::hash_map::DefaultHasher;
use std::fs::{create_dir_all, write};
use std::hash::{Hash, Hasher};
use std::path::Path;

use geo::{Centroid, Geometry};
use serde_json::json;
use tracing::info;

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::feature::{Feature, PropertyValue, SpatialTable};
use crate::render::colormap::Rgb;

pub const LAYER_NAME: &str = "USDA Forest Service Data";

/// Colours handed out to style column values by hash.
pub const PALETTE: [&str; 8] = ["#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf"];

const MARKER_RADIUS: u32 = 5;
const POPUP_MAX_WIDTH: u32 = 300;

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use geo::{Geometry, Point};

    use crate::crs::Crs;
    use crate::error::Error;
    use crate::feature::{Feature, SpatialTable};
    use crate::render::interactive::{color_for_value, escape_html, InteractiveMap, MapOptions, PALETTE};
    use crate::test::{campgrounds, harvest_units, with_input_and_output_paths};

    #[test]
    fn centres_on_the_mean_of_centroids() {
        let map = InteractiveMap::create_map(&campgrounds(), &MapOptions::default()).unwrap();

        let (lat, lon) = map.center();
        assert!((lat - 40.25).abs() < 1e-9);
        assert!((lon + 105.4).abs() < 1e-9);
        assert_eq!(2, map.overlay_count());
        assert!(map.html().contains("L.circleMarker([40.1, -105.2]"));
        assert!(map.html().contains("\"zoom\":6"));
    }

    #[test]
    fn projected_tables_are_mapped_in_degrees() {
        let map = InteractiveMap::create_map(&harvest_units(), &MapOptions::default()).unwrap();

        let (lat, lon) = map.center();
        // the Conus Albers origin sits at 23N 96W
        assert!((lat - 23.0).abs() < 0.1, "{}", lat);
        assert!((lon + 96.0).abs() < 0.1, "{}", lon);
        assert_eq!(3, map.html().matches("L.geoJSON(").count());
    }

    #[test]
    fn popups_list_fields_and_escape_values() {
        let table = SpatialTable::from_features(
            Crs::WGS84,
            vec![Feature::new(Geometry::Point(Point::new(-105.0, 40.0)))
                .with_property("name", "<Bear & Elk>")
                .with_property("sites", 4.0)],
        );
        let options = MapOptions {
            popup_fields: vec!["name".into(), "missing".into()],
            tooltip_fields: vec!["name".into(), "sites".into()],
            ..MapOptions::default()
        };

        let map = InteractiveMap::create_map(&table, &options).unwrap();

        // closing tags are escaped inside the script element
        assert!(map.html().contains("<b>name:<\\/b> &lt;Bear &amp; Elk&gt;<br>"));
        assert!(map.html().contains("&lt;Bear &amp; Elk&gt;<br><b>sites:<\\/b> 4"));
        assert!(!map.html().contains("missing"));
        assert!(map.html().contains("\"maxWidth\":300"));
    }

    #[test]
    fn style_column_picks_palette_colours() {
        let options = MapOptions { style_column: Some("kind".into()), ..MapOptions::default() };
        let map = InteractiveMap::create_map(&harvest_units(), &options).unwrap();

        let clearcut = color_for_value(&"Clearcut".into());
        let thinning = color_for_value(&"Thinning".into());
        assert!(PALETTE.contains(&clearcut));
        assert_eq!(clearcut, color_for_value(&"Clearcut".into()));

        let expected = if clearcut == thinning { 3 } else { 2 };
        assert_eq!(expected, map.html().matches(&format!("\"fillColor\":\"{}\"", clearcut)).count());
    }

    #[test]
    fn unknown_style_column_fails() {
        let options = MapOptions { style_column: Some("owner".into()), ..MapOptions::default() };
        assert!(matches!(
            InteractiveMap::create_map(&harvest_units(), &options),
            Err(Error::ColumnNotFound(c)) if c == "owner"
        ));
    }

    #[test]
    fn empty_tables_cannot_be_centred() {
        let empty = SpatialTable::new(Crs::WGS84, vec![]);
        assert!(matches!(InteractiveMap::create_map(&empty, &MapOptions::default()), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn unknown_tiles_fail() {
        let options = MapOptions { tiles: "Stamen Watercolor".into(), ..MapOptions::default() };
        assert!(matches!(InteractiveMap::create_map(&campgrounds(), &options), Err(Error::Unsupported(_))));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!("a &lt;b&gt; &quot;c&quot; &#x27;d&#x27;", escape_html("a <b> \"c\" 'd'"));
    }

    #[test]
    fn saves_into_missing_directories() {
        with_input_and_output_paths(|_, output_path| {
            let path = output_path.join("web").join("campgrounds.html");
            let map = InteractiveMap::create_map(&campgrounds(), &MapOptions::default()).unwrap();

            map.save(&path).unwrap();

            let html = read_to_string(&path).unwrap();
            assert!(html.starts_with("<!DOCTYPE html>"));
            assert!(html.contains("USDA Forest Service Data"));
            assert!(html.contains("L.control.layers"));
            assert!(html.contains("L.Control.MiniMap"));
            assert!(html.contains("L.control.fullscreen"));
        })
        .unwrap();
    }
}

#[derive(Clone, Debug)]
pub struct MapOptions {
    pub style_column: Option<String>,
    pub popup_fields: Vec<String>,
    pub tooltip_fields: Vec<String>,
    pub zoom_start: u8,
    /// `OpenStreetMap`, `CartoDB positron`, `CartoDB dark_matter` or a
    /// `{z}/{x}/{y}` URL template.
    pub tiles: String,
    /// Colour for every feature when there is no style column.
    pub color: Rgb,
    pub fill_opacity: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        MapOptions {
            style_column: None,
            popup_fields: vec![],
            tooltip_fields: vec![],
            zoom_start: 6,
            tiles: "OpenStreetMap".to_string(),
            color: Rgb::new(0, 0, 255),
            fill_opacity: 0.6,
        }
    }
}

struct TileLayer {
    url: String,
    attribution: &'static str,
}

fn tile_layer(tiles: &str) -> Result<TileLayer> {
    let osm = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
    let carto = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";

    match tiles {
        "OpenStreetMap" => Ok(TileLayer { url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".into(), attribution: osm }),
        "CartoDB positron" => Ok(TileLayer {
            url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png".into(),
            attribution: carto,
        }),
        "CartoDB dark_matter" => Ok(TileLayer {
            url: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png".into(),
            attribution: carto,
        }),
        custom if custom.contains("{z}") => Ok(TileLayer { url: custom.to_string(), attribution: "" }),
        other => Err(Error::Unsupported(format!("Unknown tile set '{}'", other))),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Palette colour for a value. Same value, same colour; different values
/// may share one.
pub fn color_for_value(value: &PropertyValue) -> &'static str {
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    PALETTE[(hasher.finish() % PALETTE.len() as u64) as usize]
}

fn popup_html(feature: &Feature, table: &SpatialTable, fields: &[String]) -> String {
    let rows: String = fields
        .iter()
        .filter(|f| table.has_column(f))
        .map(|f| format!("<b>{}:</b> {}<br>", escape_html(f), escape_html(&feature.get(f).to_string())))
        .collect();
    format!("<div style='width: 200px'>{}</div>", rows)
}

fn tooltip_html(feature: &Feature, table: &SpatialTable, fields: &[String]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let parts: Vec<String> = fields
        .iter()
        .filter(|f| table.has_column(f))
        .map(|f| format!("<b>{}:</b> {}", escape_html(f), escape_html(&feature.get(f).to_string())))
        .collect();
    Some(parts.join("<br>"))
}

/// JSON for embedding inside a `<script>` element.
fn script_json(value: &serde_json::Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn overlay_script(feature: &Feature, color: &str, fill_opacity: f64, popup: &str, tooltip: Option<&str>) -> Result<String> {
    let mut script = match &feature.geometry {
        Geometry::Point(p) => {
            let style = json!({
                "radius": MARKER_RADIUS,
                "color": color,
                "fill": true,
                "fillColor": color,
                "fillOpacity": fill_opacity,
            });
            format!("L.circleMarker([{}, {}], {})", p.y(), p.x(), script_json(&style)?)
        }
        geometry => {
            let geojson = geojson::Geometry::new(geojson::Value::from(geometry));
            let style = json!({ "fillColor": color, "color": "black", "weight": 1, "fillOpacity": fill_opacity });
            format!(
                "L.geoJSON({}, {{style: function () {{ return {}; }}}})",
                script_json(&serde_json::to_value(&geojson)?)?,
                script_json(&style)?
            )
        }
    };

    script.push_str(&format!(
        ".bindPopup({}, {})",
        script_json(&json!(popup))?,
        script_json(&json!({ "maxWidth": POPUP_MAX_WIDTH }))?
    ));
    if let Some(tooltip) = tooltip {
        script.push_str(&format!(".bindTooltip({})", script_json(&json!(tooltip))?));
    }
    script.push_str(".addTo(group);");
    Ok(script)
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/leaflet.fullscreen@3.0.2/Control.FullScreen.css" />
  <script src="https://cdn.jsdelivr.net/npm/leaflet.fullscreen@3.0.2/Control.FullScreen.min.js"></script>
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet-minimap/3.6.1/Control.MiniMap.min.css" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet-minimap/3.6.1/Control.MiniMap.min.js"></script>
  <style>
    html, body { height: 100%; margin: 0; }
    #map { width: 100%; height: 100%; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    const view = {{VIEW}};
    const tiles = {{TILES}};
    const map = L.map('map').setView(view.center, view.zoom);
    const base = L.tileLayer(tiles.url, { attribution: tiles.attribution, maxZoom: 19 }).addTo(map);
    const group = L.featureGroup().addTo(map);

{{OVERLAYS}}

    L.control.layers({ [tiles.name]: base }, { [view.layer]: group }).addTo(map);
    L.control.fullscreen({ position: 'topleft' }).addTo(map);
    new L.Control.MiniMap(L.tileLayer(tiles.url, { attribution: tiles.attribution }), { toggleDisplay: true }).addTo(map);
  </script>
</body>
</html>
"#;

/// A rendered Leaflet page.
pub struct InteractiveMap {
    html: String,
    center: (f64, f64),
    overlays: usize,
}

impl InteractiveMap {
    pub fn create_map(table: &SpatialTable, options: &MapOptions) -> Result<Self> {
        if let Some(column) = &options.style_column {
            table.require_column(column)?;
        }
        let tiles = tile_layer(&options.tiles)?;

        let table = if table.crs() == Crs::WGS84 { table.clone() } else { table.to_crs(Crs::WGS84)? };

        let centroids: Vec<_> = table.iter().filter_map(|f| f.geometry.centroid()).collect();
        if centroids.is_empty() {
            return Err(Error::EmptyInput("No features to map"));
        }
        let n = centroids.len() as f64;
        let center = (
            centroids.iter().map(|p| p.y()).sum::<f64>() / n,
            centroids.iter().map(|p| p.x()).sum::<f64>() / n,
        );

        let default_color = options.color.to_hex();
        let mut overlays = Vec::with_capacity(table.len());
        for feature in table.iter() {
            let color = match &options.style_column {
                Some(column) => color_for_value(feature.get(column)).to_string(),
                None => default_color.clone(),
            };
            let popup = popup_html(feature, &table, &options.popup_fields);
            let tooltip = tooltip_html(feature, &table, &options.tooltip_fields);
            overlays.push(format!(
                "    {}",
                overlay_script(feature, &color, options.fill_opacity, &popup, tooltip.as_deref())?
            ));
        }

        let view = json!({ "center": [center.0, center.1], "zoom": options.zoom_start, "layer": LAYER_NAME });
        let tile_json = json!({ "url": tiles.url, "attribution": tiles.attribution, "name": options.tiles });

        let html = PAGE_TEMPLATE
            .replace("{{TITLE}}", &escape_html(LAYER_NAME))
            .replace("{{VIEW}}", &script_json(&view)?)
            .replace("{{TILES}}", &script_json(&tile_json)?)
            .replace("{{OVERLAYS}}", &overlays.join("\n"));

        info!("Built web map with {} features", overlays.len());
        Ok(InteractiveMap { html, center, overlays: overlays.len() })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Latitude and longitude the map opens on.
    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, &self.html)?;
        info!("Map saved to {}", path.display());
        Ok(())
    }
}
