//! `TerraGraph` - weather dashboard and tabular data explorer
//!
//! This library fetches hourly forecasts for a location, classifies rainfall,
//! prepares charts and a map overlay, asks a language model for a narrative,
//! and summarizes uploaded CSV or spreadsheet files.

pub mod advisory;
pub mod api;
pub mod cache;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod narrative;
pub mod prediction;
pub mod tabular;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::{CacheStats, CachedWeatherFetcher, QueryCache};
pub use config::TerraGraphConfig;
pub use dashboard::{Dashboard, LiveDashboard, QueryReport};
pub use error::{FetchError, TerraGraphError};
pub use models::{Coordinate, Parameter, Query, WeatherSeries};
pub use prediction::{PredictionResult, RAIN_THRESHOLD_MM, rain_expected};
pub use tabular::{Analysis, TabularDataset};
pub use weather::{MeteomaticsClient, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TerraGraphError>;
