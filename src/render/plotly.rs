//! Plotly figures: choropleth maps over map tiles and time series lines.
//!
//! A figure is plain `data` + `layout` JSON, rendered by plotly.js from a CDN.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs::{create_dir_all, write};
use std::mem::discriminant;
use std::path::Path;

use geo::Centroid;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::feature::{PropertyValue, SpatialTable};
use crate::render::interactive::escape_html;
use crate::render::static_map::DEFAULT_TITLE;
use crate::transform::to_feature_collection;

pub const TIME_SERIES_TITLE: &str = "Time Series Analysis";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";
const MAP_ZOOM: u8 = 6;

/// plotly's default discrete colour sequence.
const DISCRETE_COLORS: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880", "#FF97FF", "#FECB52",
];


/// A plotly.js figure.
#[derive(Clone, Debug, Serialize)]
pub struct PlotlyFigure {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl PlotlyFigure {
    pub fn title(&self) -> Option<&str> {
        self.layout["title"]["text"].as_str()
    }

    pub fn to_html(&self) -> Result<String> {
        let title = escape_html(self.title().unwrap_or(""));
        let data = serde_json::to_string(&self.data)?.replace("</", "<\\/");
        let layout = serde_json::to_string(&self.layout)?.replace("</", "<\\/");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <script src="{plotly}"></script>
</head>
<body>
  <div id="figure" style="width: 100%; height: 100vh;"></div>
  <script>
    Plotly.newPlot('figure', {data}, {layout}, {{ responsive: true }});
  </script>
</body>
</html>
"#,
            plotly = PLOTLY_JS
        ))
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, self.to_html()?)?;
        info!("Figure saved to {}", path.display());
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct PlotlyMapOptions {
    pub color_column: Option<String>,
    pub hover_data: Vec<String>,
    pub title: String,
    pub map_style: String,
}

impl Default for PlotlyMapOptions {
    fn default() -> Self {
        PlotlyMapOptions {
            color_column: None,
            hover_data: vec![],
            title: DEFAULT_TITLE.to_string(),
            map_style: "open-street-map".to_string(),
        }
    }
}

fn hover_text(table: &SpatialTable, index: usize, fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("{}={}", f, table[index].get(f)))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn constant_scale(color: &str) -> Value {
    json!([[0, color], [1, color]])
}

fn trace(table: &SpatialTable, geojson: &Value, rows: &[usize], fields: &[String]) -> Value {
    json!({
        "type": "choroplethmapbox",
        "geojson": geojson,
        "featureidkey": "id",
        "locations": rows.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
        "text": rows.iter().map(|i| hover_text(table, *i, fields)).collect::<Vec<_>>(),
        "hoverinfo": if fields.is_empty() { "location" } else { "location+text" },
    })
}

/// Choropleth over map tiles. Numeric colour columns get a continuous
/// scale, anything else one trace per category.
pub fn choropleth_map(table: &SpatialTable, options: &PlotlyMapOptions) -> Result<PlotlyFigure> {
    if let Some(column) = &options.color_column {
        table.require_column(column)?;
    }
    for field in &options.hover_data {
        table.require_column(field)?;
    }

    let table = if table.crs() == Crs::WGS84 { table.clone() } else { table.to_crs(Crs::WGS84)? };
    let centroids: Vec<_> = table.iter().filter_map(|f| f.geometry.centroid()).collect();
    if centroids.is_empty() {
        return Err(Error::EmptyInput("No features to map"));
    }
    let n = centroids.len() as f64;
    let center = json!({
        "lat": centroids.iter().map(|p| p.y()).sum::<f64>() / n,
        "lon": centroids.iter().map(|p| p.x()).sum::<f64>() / n,
    });

    let mut collection = to_feature_collection(&table);
    for (i, feature) in collection.features.iter_mut().enumerate() {
        feature.id = Some(geojson::feature::Id::String(i.to_string()));
    }
    let geojson = serde_json::to_value(&collection)?;
    let all_rows: Vec<usize> = (0..table.len()).collect();

    let data = match &options.color_column {
        None => {
            let mut single = trace(&table, &geojson, &all_rows, &options.hover_data);
            single["z"] = json!(vec![1; table.len()]);
            single["colorscale"] = constant_scale(DISCRETE_COLORS[0]);
            single["showscale"] = json!(false);
            vec![single]
        }
        Some(column) if is_numeric(&table, column) => {
            let mut continuous = trace(&table, &geojson, &all_rows, &options.hover_data);
            continuous["z"] = json!(table.iter().map(|f| f.get(column).as_f64()).collect::<Vec<_>>());
            continuous["colorbar"] = json!({ "title": { "text": column } });
            vec![continuous]
        }
        Some(column) => {
            let mut categories: Vec<(String, Vec<usize>)> = Vec::new();
            for (i, feature) in table.iter().enumerate() {
                let key = feature.get(column).to_string();
                match categories.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, rows)) => rows.push(i),
                    None => categories.push((key, vec![i])),
                }
            }

            categories
                .iter()
                .enumerate()
                .map(|(c, (name, rows))| {
                    let mut category = trace(&table, &geojson, rows, &options.hover_data);
                    category["z"] = json!(vec![1; rows.len()]);
                    category["colorscale"] = constant_scale(DISCRETE_COLORS[c % DISCRETE_COLORS.len()]);
                    category["showscale"] = json!(false);
                    category["showlegend"] = json!(true);
                    category["name"] = json!(name);
                    category
                })
                .collect()
        }
    };

    let layout = json!({
        "title": { "text": options.title },
        "mapbox": { "style": options.map_style, "center": center, "zoom": MAP_ZOOM },
        "margin": { "r": 0, "t": 40, "l": 0, "b": 0 },
    });

    Ok(PlotlyFigure { data, layout })
}

fn is_numeric(table: &SpatialTable, column: &str) -> bool {
    let mut present = table.iter().map(|f| f.get(column)).filter(|v| !v.is_null()).peekable();
    present.peek().is_some() && present.all(|v| v.as_f64().is_some())
}

/// Line chart of `value_column` summed per distinct `date_column` value,
/// in date order. Rows without a date are left out.
/// Orders date values of one type: numbers by `total_cmp`, text and
/// booleans naturally.
struct DateKey(PropertyValue);

impl DateKey {
    fn rank(&self) -> u8 {
        match self.0 {
            PropertyValue::Null => 0,
            PropertyValue::Bool(_) => 1,
            PropertyValue::Number(_) => 2,
            PropertyValue::String(_) => 3,
        }
    }
}

impl Ord for DateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (PropertyValue::Number(a), PropertyValue::Number(b)) => a.total_cmp(b),
            (PropertyValue::String(a), PropertyValue::String(b)) => a.cmp(b),
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for DateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DateKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DateKey {}

pub fn time_series(
    table: &SpatialTable,
    date_column: &str,
    value_column: &str,
    title: Option<&str>,
    output_path: Option<&Path>,
) -> Result<PlotlyFigure> {
    table.require_column(date_column)?;
    table.require_column(value_column)?;

    let mut sums: BTreeMap<DateKey, f64> = BTreeMap::new();
    let mut kind = None;
    for feature in table.iter() {
        let date = feature.get(date_column);
        if date.is_null() {
            continue;
        }
        match kind {
            None => kind = Some(discriminant(date)),
            Some(k) if k != discriminant(date) => {
                return Err(Error::Unsupported(format!("Column '{}' mixes value types", date_column)));
            }
            Some(_) => {}
        }

        let value = match feature.get(value_column) {
            PropertyValue::Null => 0.0,
            PropertyValue::Number(n) => *n,
            other => {
                return Err(Error::Unsupported(format!(
                    "Column '{}' holds non-numeric value '{}'",
                    value_column, other
                )))
            }
        };

        *sums.entry(DateKey(date.clone())).or_insert(0.0) += value;
    }

    let x: Vec<Value> = sums.keys().map(|d| Value::from(&d.0)).collect();
    let y: Vec<f64> = sums.values().copied().collect();

    let figure = PlotlyFigure {
        data: vec![json!({ "type": "scatter", "mode": "lines+markers", "x": x, "y": y, "name": value_column })],
        layout: json!({
            "title": { "text": title.unwrap_or(TIME_SERIES_TITLE) },
            "xaxis": { "title": { "text": date_column } },
            "yaxis": { "title": { "text": value_column } },
            "hovermode": "x unified",
        }),
    };

    if let Some(path) = output_path {
        figure.write_html(path)?;
    }
    Ok(figure)
}
