use std::sync::Arc;

use axum::{
    Router,
    extract::{Multipart, Query as QueryParams, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::dashboard::{LiveDashboard, QueryReport};
use crate::error::FetchError;
use crate::models::{Parameter, Query};
use crate::tabular::{self, Analysis, ChartKind, ChartRequest};
use crate::{TerraGraphError, VERSION};

pub type AppState = Arc<LiveDashboard>;

/// Days covered when no end date is given
const DEFAULT_WINDOW_DAYS: i64 = 7;

/// JSON error body with the status code it is sent with
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.code, "message": self.message })),
        )
            .into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let status = match err {
            FetchError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            FetchError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            code: err.code(),
            message: err.user_message(),
        }
    }
}

impl From<TerraGraphError> for ApiError {
    fn from(err: TerraGraphError) -> Self {
        match err {
            TerraGraphError::Fetch(fetch) => fetch.into(),
            TerraGraphError::Dataset { .. } => Self {
                status: StatusCode::BAD_REQUEST,
                code: "dataset",
                message: err.user_message(),
            },
            TerraGraphError::Translation { .. } => Self {
                status: StatusCode::BAD_GATEWAY,
                code: "translation",
                message: err.user_message(),
            },
            TerraGraphError::Config { .. } | TerraGraphError::Io { .. } => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message: err.user_message(),
            },
        }
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub latitude: f64,
    pub longitude: f64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Comma separated parameter codes or names
    pub parameters: Option<String>,
}

impl ForecastParams {
    fn into_query(self) -> Result<Query, ApiError> {
        let start = self.start.unwrap_or_else(|| Utc::now().date_naive());
        let end = self
            .end
            .unwrap_or_else(|| start + Duration::days(DEFAULT_WINDOW_DAYS));

        let parameters = match self.parameters.as_deref().map(str::trim) {
            Some(list) if !list.is_empty() => list
                .split(',')
                .map(str::parse::<Parameter>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(bad_request)?,
            _ => Parameter::ALL.to_vec(),
        };

        Ok(Query::with_parameters(
            self.latitude,
            self.longitude,
            start,
            end,
            parameters,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub rain_expected: bool,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forecast", get(get_forecast))
        .route("/datasets/analyze", post(analyze_dataset))
        .route("/advisory/speech", post(speak_advisory))
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: VERSION,
    })
}

async fn get_forecast(
    State(dashboard): State<AppState>,
    QueryParams(params): QueryParams<ForecastParams>,
) -> Result<Json<QueryReport>, ApiError> {
    let query = params.into_query()?;
    let report = dashboard.run_query(&query).await?;
    Ok(Json(report))
}

/// Multipart fields: `file` (required), `x` and `y` (chart axes, both or
/// neither), `chart` (scatter, line or bar) and `color_by`.
async fn analyze_dataset(mut multipart: Multipart) -> Result<Json<Analysis>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut x = None;
    let mut y = None;
    let mut kind = ChartKind::default();
    let mut color_by = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Invalid upload: {e}")))?;
            upload = Some((file_name, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| bad_request(format!("Invalid form field '{name}': {e}")))?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "x" => x = value,
            "y" => y = value,
            "chart" => {
                if let Some(value) = value {
                    kind = value.parse()?;
                }
            }
            "color_by" => color_by = value,
            _ => {}
        }
    }

    let (file_name, bytes) = upload.ok_or_else(|| bad_request("Missing 'file' field"))?;
    let dataset = tabular::load(&file_name, &bytes)?;

    let request = match (x, y) {
        (Some(x), Some(y)) => Some(ChartRequest::new(kind, x, y).color_by(color_by)),
        (None, None) => None,
        _ => return Err(bad_request("Choose both an x-axis and a y-axis column")),
    };

    Ok(Json(dataset.analyze(request.as_ref())?))
}

async fn speak_advisory(
    State(dashboard): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    let spoken = dashboard
        .speak_advisory(request.rain_expected, request.api_key)
        .await?;

    Ok(match spoken {
        Some(spoken) => (
            [(header::CONTENT_TYPE, spoken.content_type)],
            spoken.audio,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(parameters: Option<&str>) -> ForecastParams {
        ForecastParams {
            latitude: 52.5,
            longitude: 13.4,
            start: NaiveDate::from_ymd_opt(2024, 10, 5),
            end: None,
            parameters: parameters.map(str::to_string),
        }
    }

    #[test]
    fn test_default_window_and_parameters() {
        let query = params(None).into_query().unwrap();
        assert_eq!(query.end(), NaiveDate::from_ymd_opt(2024, 10, 12).unwrap());
        assert_eq!(query.parameters(), &Parameter::ALL);
    }

    #[test]
    fn test_explicit_parameters() {
        let query = params(Some("precip_1h:mm,temperature")).into_query().unwrap();
        assert_eq!(
            query.parameters(),
            &[Parameter::Precipitation, Parameter::Temperature]
        );
    }

    #[test]
    fn test_unknown_parameter_is_bad_request() {
        let err = params(Some("humidity")).into_query().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_fetch_error_status_mapping() {
        assert_eq!(ApiError::from(FetchError::NotFound).status, StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(FetchError::Unauthorized).status,
            StatusCode::BAD_GATEWAY
        );
        let dataset: ApiError = TerraGraphError::dataset("bad").into();
        assert_eq!(dataset.status, StatusCode::BAD_REQUEST);
    }
}
