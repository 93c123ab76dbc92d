//! Weather query model: coordinate, date range and requested parameters

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A weather parameter the dashboard knows how to request and plot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Temperature 2 m above ground, °C
    Temperature,
    /// Precipitation during the last hour, mm
    Precipitation,
    /// Wind speed 10 m above ground, m/s
    WindSpeed,
}

impl Parameter {
    pub const ALL: [Parameter; 3] = [
        Parameter::Temperature,
        Parameter::Precipitation,
        Parameter::WindSpeed,
    ];

    /// Parameter code as understood by the weather API, unit included
    #[must_use]
    pub fn api_code(self) -> &'static str {
        match self {
            Parameter::Temperature => "t_2m:C",
            Parameter::Precipitation => "precip_1h:mm",
            Parameter::WindSpeed => "wind_speed_10m:ms",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature (°C)",
            Parameter::Precipitation => "Precipitation (mm)",
            Parameter::WindSpeed => "Wind speed (m/s)",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Temperature => "°C",
            Parameter::Precipitation => "mm",
            Parameter::WindSpeed => "m/s",
        }
    }

    #[must_use]
    pub fn from_api_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.api_code() == code)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_code())
    }
}

impl FromStr for Parameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(parameter) = Self::from_api_code(s) {
            return Ok(parameter);
        }
        match s.to_lowercase().as_str() {
            "temperature" | "t_2m" => Ok(Parameter::Temperature),
            "precipitation" | "precip_1h" => Ok(Parameter::Precipitation),
            "wind_speed" | "wind" | "wind_speed_10m" => Ok(Parameter::WindSpeed),
            _ => Err(format!("Unknown weather parameter '{s}'")),
        }
    }
}

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Immutable description of one weather request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    coordinate: Coordinate,
    start: NaiveDate,
    end: NaiveDate,
    parameters: Vec<Parameter>,
}

impl Query {
    /// Query for all known parameters
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, start: NaiveDate, end: NaiveDate) -> Self {
        Self::with_parameters(latitude, longitude, start, end, Parameter::ALL.to_vec())
    }

    #[must_use]
    pub fn with_parameters(
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        parameters: Vec<Parameter>,
    ) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
            start,
            end,
            parameters,
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Comma separated parameter codes, in request order
    #[must_use]
    pub fn parameter_codes(&self) -> String {
        self.parameters
            .iter()
            .map(|p| p.api_code())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Cache key covering every field of the query. Coordinates keep full
    /// precision, the same as in the request URL.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "weather:{}:{}:{}:{}:{}",
            self.coordinate.latitude,
            self.coordinate.longitude,
            self.start,
            self.end,
            self.parameter_codes()
        )
    }
}
