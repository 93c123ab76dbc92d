//! Weather query pipeline
//!
//! One query is fetched once; prediction, charts, advisory and narrative are
//! all derived from that same series. Nothing here depends on the web layer.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::advisory::{Advisory, AdvisoryVoice, SpokenAdvisory};
use crate::cache::{CacheStats, CachedWeatherFetcher};
use crate::charts::{self, HeatmapOverlay, LineChart};
use crate::config::TerraGraphConfig;
use crate::error::FetchError;
use crate::models::{Query, WeatherSeries};
use crate::narrative::{ChatCompletion, ChatCompletionClient, Narrative, Summarizer};
use crate::prediction::PredictionResult;
use crate::weather::{MeteomaticsClient, WeatherSource};

/// Everything the rainfall prediction page shows for one query
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: Query,
    pub series: WeatherSeries,
    pub prediction: PredictionResult,
    pub charts: Vec<LineChart>,
    pub heatmap: HeatmapOverlay,
    pub advisory: Advisory,
    pub narrative: Narrative,
}

/// Dashboard wired to the live weather and chat-completion APIs
pub type LiveDashboard = Dashboard<CachedWeatherFetcher<MeteomaticsClient>, ChatCompletionClient>;

pub struct Dashboard<W, C> {
    weather: W,
    summarizer: Summarizer<C>,
    config: Arc<TerraGraphConfig>,
}

impl LiveDashboard {
    /// Build all clients from the configuration
    pub fn from_config(config: Arc<TerraGraphConfig>) -> crate::Result<Self> {
        let weather = CachedWeatherFetcher::new(MeteomaticsClient::new(&config.weather)?);
        let backend = ChatCompletionClient::new(&config.llm)?;
        Ok(Self::new(weather, backend, config))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.weather.stats()
    }
}

impl<W: WeatherSource, C: ChatCompletion> Dashboard<W, C> {
    pub fn new(weather: W, backend: C, config: Arc<TerraGraphConfig>) -> Self {
        let summarizer = Summarizer::new(backend, &config.llm);
        Self {
            weather,
            summarizer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TerraGraphConfig {
        &self.config
    }

    /// Fetch, classify, render and summarize one query.
    ///
    /// A failed fetch returns the error and nothing else; the summarizer
    /// never fails.
    #[instrument(skip(self, query), fields(query = %query.cache_key()))]
    pub async fn run_query(&self, query: &Query) -> Result<QueryReport, FetchError> {
        let series = self.weather.fetch(query).await.inspect_err(|e| {
            warn!("Weather fetch failed: {}", e);
        })?;

        let prediction = PredictionResult::from_series(&series);
        let precipitation = series.precipitation();
        let charts = charts::line_charts(&series);
        let heatmap = charts::heatmap(query.coordinate(), &precipitation);
        let advisory = Advisory::for_prediction(prediction.rain_expected);
        let narrative = self.summarizer.summarize(&series).await;

        info!(
            rain_expected = prediction.rain_expected,
            samples = precipitation.len(),
            "Query completed"
        );

        Ok(QueryReport {
            query: query.clone(),
            series,
            prediction,
            charts,
            heatmap,
            advisory,
            narrative,
        })
    }

    /// Translate and synthesize the advisory. `Ok(None)` when no key was
    /// supplied.
    pub async fn speak_advisory(
        &self,
        rain_expected: bool,
        api_key: Option<String>,
    ) -> crate::Result<Option<SpokenAdvisory>> {
        let Some(voice) = AdvisoryVoice::from_key(api_key, &self.config.translation)? else {
            return Ok(None);
        };
        let advisory = Advisory::for_prediction(rain_expected);
        voice.speak(&advisory).await.map(Some)
    }
}
