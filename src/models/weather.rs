//! Weather series model and display methods

use super::query::{Coordinate, Parameter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One timestamped value of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// Hourly values of one parameter, in the order the API returned them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSeries {
    pub parameter: Parameter,
    pub points: Vec<DataPoint>,
}

impl ParameterSeries {
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Time series returned for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    pub coordinate: Coordinate,
    pub parameters: Vec<ParameterSeries>,
}

/// All parameters at one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    /// Precipitation in mm during the preceding hour
    pub precipitation: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
}

impl WeatherSeries {
    #[must_use]
    pub fn new(coordinate: Coordinate, parameters: Vec<ParameterSeries>) -> Self {
        Self {
            coordinate,
            parameters,
        }
    }

    #[must_use]
    pub fn series(&self, parameter: Parameter) -> Option<&ParameterSeries> {
        self.parameters.iter().find(|s| s.parameter == parameter)
    }

    /// Values of one parameter, empty when it was not returned
    #[must_use]
    pub fn values(&self, parameter: Parameter) -> Vec<f64> {
        self.series(parameter)
            .map(ParameterSeries::values)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn precipitation(&self) -> Vec<f64> {
        self.values(Parameter::Precipitation)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.iter().all(|s| s.points.is_empty())
    }

    /// Samples merged across parameters, ordered by timestamp
    #[must_use]
    pub fn samples(&self) -> Vec<WeatherSample> {
        let mut by_time: BTreeMap<DateTime<Utc>, WeatherSample> = BTreeMap::new();

        for series in &self.parameters {
            for point in &series.points {
                let sample = by_time.entry(point.date).or_insert_with(|| WeatherSample {
                    timestamp: point.date,
                    temperature: None,
                    precipitation: None,
                    wind_speed: None,
                });
                match series.parameter {
                    Parameter::Temperature => sample.temperature = Some(point.value),
                    Parameter::Precipitation => sample.precipitation = Some(point.value),
                    Parameter::WindSpeed => sample.wind_speed = Some(point.value),
                }
            }
        }

        by_time.into_values().collect()
    }
}

impl WeatherSample {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        self.temperature
            .map_or_else(|| "-".to_string(), |t| format!("{t:.1}°C"))
    }

    /// Format precipitation with unit
    #[must_use]
    pub fn format_precipitation(&self) -> String {
        self.precipitation
            .map_or_else(|| "-".to_string(), |p| format!("{p:.1} mm"))
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        self.wind_speed
            .map_or_else(|| "-".to_string(), |w| format!("{w:.1} m/s"))
    }
}
