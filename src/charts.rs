//! Chart and map descriptions for the dashboard
//!
//! Everything here is passthrough: one plotted point per sample, values
//! untouched. The page renders these descriptions with a charting and a
//! mapping library.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Coordinate, Parameter, WeatherSeries};

/// Initial zoom of the precipitation map
pub const MAP_ZOOM: u8 = 10;
/// Radius of the marker around the queried location, in metres
pub const MARKER_RADIUS_M: u32 = 1000;
/// Radius of each heat point, in pixels
pub const HEAT_RADIUS_PX: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: DateTime<Utc>,
    pub y: f64,
}

/// Line chart of one parameter over time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub parameter: Parameter,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleMarker {
    pub center: Coordinate,
    pub radius_m: u32,
    pub color: String,
    pub popup: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
}

/// Map overlay centered on the queried coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapOverlay {
    pub center: Coordinate,
    pub zoom: u8,
    pub marker: CircleMarker,
    pub heat_radius_px: u32,
    pub points: Vec<HeatPoint>,
}

/// Line chart for one parameter. A parameter missing from the series gives
/// an empty chart.
#[must_use]
pub fn line_chart(series: &WeatherSeries, parameter: Parameter) -> LineChart {
    let mut points: Vec<ChartPoint> = series
        .series(parameter)
        .map(|s| {
            s.points
                .iter()
                .map(|p| ChartPoint {
                    x: p.date,
                    y: p.value,
                })
                .collect()
        })
        .unwrap_or_default();
    // stable: equal timestamps keep their original order
    points.sort_by_key(|p| p.x);

    LineChart {
        parameter,
        title: format!("{} over time", parameter.label()),
        x_label: "date".to_string(),
        y_label: parameter.label().to_string(),
        points,
    }
}

/// One chart per parameter present in the series
#[must_use]
pub fn line_charts(series: &WeatherSeries) -> Vec<LineChart> {
    series
        .parameters
        .iter()
        .map(|s| line_chart(series, s.parameter))
        .collect()
}

/// Heat layer with one point per precipitation sample, weighted by its value
#[must_use]
pub fn heatmap(center: Coordinate, precipitation: &[f64]) -> HeatmapOverlay {
    let points = precipitation
        .iter()
        .map(|&weight| HeatPoint {
            latitude: center.latitude,
            longitude: center.longitude,
            weight,
        })
        .collect();

    HeatmapOverlay {
        center,
        zoom: MAP_ZOOM,
        marker: CircleMarker {
            center,
            radius_m: MARKER_RADIUS_M,
            color: "crimson".to_string(),
            popup: "Selected Location".to_string(),
        },
        heat_radius_px: HEAT_RADIUS_PX,
        points,
    }
}
