//! Rainfall prediction from a fixed precipitation threshold

use serde::Serialize;

use crate::models::WeatherSeries;

/// Hourly precipitation above which rain is expected, in mm
pub const RAIN_THRESHOLD_MM: f64 = 0.5;

/// `true` if any sample exceeds [`RAIN_THRESHOLD_MM`]. An empty slice is dry.
#[must_use]
pub fn rain_expected(precipitation: &[f64]) -> bool {
    precipitation.iter().any(|&value| value > RAIN_THRESHOLD_MM)
}

/// Rainfall verdict for one queried window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub rain_expected: bool,
    /// Hours above the threshold
    pub wet_hours: usize,
    pub total_hours: usize,
    /// `wet_hours / total_hours` as a rounded percentage, 0 for an empty window
    pub wet_share_percent: u8,
    /// Largest hourly precipitation seen, if any
    pub peak_precipitation_mm: Option<f64>,
}

impl PredictionResult {
    #[must_use]
    pub fn from_precipitation(precipitation: &[f64]) -> Self {
        let total_hours = precipitation.len();
        let wet_hours = precipitation
            .iter()
            .filter(|&&value| value > RAIN_THRESHOLD_MM)
            .count();
        let wet_share_percent = if total_hours == 0 {
            0
        } else {
            ((wet_hours as f64 / total_hours as f64) * 100.0).round() as u8
        };
        let peak_precipitation_mm = precipitation.iter().copied().reduce(f64::max);

        Self {
            rain_expected: rain_expected(precipitation),
            wet_hours,
            total_hours,
            wet_share_percent,
            peak_precipitation_mm,
        }
    }

    /// Prediction over the precipitation parameter of a series. A series
    /// without precipitation is treated as empty.
    #[must_use]
    pub fn from_series(series: &WeatherSeries) -> Self {
        Self::from_precipitation(&series.precipitation())
    }

    #[must_use]
    pub fn headline(&self) -> &'static str {
        if self.rain_expected { "Rain" } else { "No Rain" }
    }
}
