//! Data models for the `TerraGraph` application
//!
//! - Query: coordinate, date range and requested parameters
//! - Weather: time series returned by the weather API

pub mod query;
pub mod weather;

// Re-export all public types for convenient access
pub use query::{Coordinate, Parameter, Query};
pub use weather::{DataPoint, ParameterSeries, WeatherSample, WeatherSeries};
