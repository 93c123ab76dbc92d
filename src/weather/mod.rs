use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::error::FetchError;
use crate::models::{Query, WeatherSeries};
use crate::{Result, TerraGraphError};

pub mod meteomatics;

/// Something that can answer a weather query
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, query: &Query) -> std::result::Result<WeatherSeries, FetchError>;
}

/// Client for the Meteomatics time-series endpoint
pub struct MeteomaticsClient {
    client: Client,
    config: WeatherConfig,
}

impl MeteomaticsClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("TerraGraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TerraGraphError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Hourly time-series URL for a query. Credentials are sent as a header,
    /// never as part of the URL.
    #[must_use]
    pub fn request_url(&self, query: &Query) -> String {
        let coordinate = query.coordinate();
        format!(
            "{}/{}T00:00:00Z--{}T00:00:00Z:PT1H/{}/{},{}/json",
            self.config.base_url.trim_end_matches('/'),
            query.start(),
            query.end(),
            query.parameter_codes(),
            coordinate.latitude,
            coordinate.longitude
        )
    }
}

#[async_trait]
impl WeatherSource for MeteomaticsClient {
    #[instrument(skip(self, query), fields(query = %query.cache_key()))]
    async fn fetch(&self, query: &Query) -> std::result::Result<WeatherSeries, FetchError> {
        let url = self.request_url(query);
        debug!("Requesting weather data from: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| {
                warn!("Weather API request failed: {}", e);
                FetchError::Network {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Weather API returned an error: {}", body);
            return Err(FetchError::from_status(status.as_u16(), body));
        }

        let payload: meteomatics::TimeSeriesResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse weather response: {}", e);
            FetchError::InvalidResponse {
                message: e.to_string(),
            }
        })?;

        let series = payload.into_series(query.coordinate())?;

        info!(
            "Retrieved {} parameter series in {:.3}s",
            series.parameters.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerraGraphConfig;
    use chrono::NaiveDate;

    #[test]
    fn test_request_url() {
        let mut config = TerraGraphConfig::with_credentials("user", "pass", "key");
        config.weather.base_url = "https://api.meteomatics.com/".to_string();
        let client = MeteomaticsClient::new(&config.weather).unwrap();

        let query = Query::new(
            52.520551,
            13.461804,
            NaiveDate::from_ymd_opt(2024, 10, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 10, 12).unwrap(),
        );

        let url = client.request_url(&query);
        assert_eq!(
            url,
            "https://api.meteomatics.com/2024-10-05T00:00:00Z--2024-10-12T00:00:00Z:PT1H/t_2m:C,precip_1h:mm,wind_speed_10m:ms/52.520551,13.461804/json"
        );
        assert!(!url.contains("pass"));
    }
}
