//! Meteomatics API response structures and conversion utilities

use crate::error::FetchError;
use crate::models::{Coordinate, DataPoint, Parameter, ParameterSeries, WeatherSeries};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// Time-series response from the Meteomatics API
#[derive(Debug, Deserialize)]
pub struct TimeSeriesResponse {
    pub status: Option<String>,
    pub data: Vec<ParameterBlock>,
}

/// Values for one requested parameter
#[derive(Debug, Deserialize)]
pub struct ParameterBlock {
    pub parameter: String,
    pub coordinates: Vec<CoordinateBlock>,
}

#[derive(Debug, Deserialize)]
pub struct CoordinateBlock {
    pub lat: f64,
    pub lon: f64,
    pub dates: Vec<DateValue>,
}

#[derive(Debug, Deserialize)]
pub struct DateValue {
    pub date: DateTime<Utc>,
    pub value: Option<f64>,
}

impl TimeSeriesResponse {
    /// Convert into a series for the queried coordinate.
    ///
    /// Only the first coordinate block of each parameter is used. Blocks
    /// for parameter codes we do not know are skipped.
    pub fn into_series(self, coordinate: Coordinate) -> Result<WeatherSeries, FetchError> {
        if let Some(status) = &self.status {
            if status != "OK" {
                return Err(FetchError::InvalidResponse {
                    message: format!("weather API reported status '{status}'"),
                });
            }
        }

        let mut parameters = Vec::with_capacity(self.data.len());
        for block in self.data {
            let Some(parameter) = Parameter::from_api_code(&block.parameter) else {
                debug!("Skipping unknown parameter '{}'", block.parameter);
                continue;
            };

            let first = block.coordinates.into_iter().next().ok_or_else(|| {
                FetchError::InvalidResponse {
                    message: format!("no coordinates for parameter '{parameter}'"),
                }
            })?;

            let total = first.dates.len();
            let points: Vec<DataPoint> = first
                .dates
                .into_iter()
                .filter_map(|entry| {
                    entry.value.map(|value| DataPoint {
                        date: entry.date,
                        value,
                    })
                })
                .collect();

            let dropped = total - points.len();
            if dropped > 0 {
                debug!("Dropped {dropped} of {total} null values for '{parameter}'");
            }

            parameters.push(ParameterSeries { parameter, points });
        }

        Ok(WeatherSeries::new(coordinate, parameters))
    }
}
