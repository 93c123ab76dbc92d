//! Integration tests for the weather pipeline against a mock Meteomatics
//! and chat-completion server.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Value, json};
use terragraph::{FetchError, LiveDashboard, Parameter, Query, TerraGraphConfig};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASIC_AUTH: &str = "Basic ZmFybWVyOnNlY3JldA==";

fn config(server: &MockServer) -> TerraGraphConfig {
    let mut config = TerraGraphConfig::with_credentials("farmer", "secret", "gsk_test");
    config.weather.base_url = server.uri();
    config.llm.base_url = server.uri();
    config.llm.max_retries = 0;
    config
}

fn dashboard(server: &MockServer) -> LiveDashboard {
    LiveDashboard::from_config(Arc::new(config(server))).unwrap()
}

fn query() -> Query {
    Query::with_parameters(
        52.520551,
        13.461804,
        NaiveDate::from_ymd_opt(2024, 10, 5).unwrap(),
        NaiveDate::from_ymd_opt(2024, 10, 12).unwrap(),
        vec![Parameter::Precipitation],
    )
}

/// Meteomatics time-series body with one hourly value per entry
fn precipitation_body(values: &[f64]) -> Value {
    let dates: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(hour, value)| {
            json!({
                "date": format!("2024-10-05T{hour:02}:00:00Z"),
                "value": value
            })
        })
        .collect();

    json!({
        "version": "3.0",
        "user": "farmer",
        "dateGenerated": "2024-10-05T08:00:00Z",
        "status": "OK",
        "data": [{
            "parameter": "precip_1h:mm",
            "coordinates": [{ "lat": 52.520551, "lon": 13.461804, "dates": dates }]
        }]
    })
}

async fn mount_chat(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": reply } }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_query_builds_prediction_and_charts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/2024-10-05T00:00:00Z--2024-10-12T00:00:00Z:PT1H/precip_1h:mm/52.520551,13.461804/json",
        ))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(precipitation_body(&[
            0.0, 0.2, 0.6, 0.1,
        ])))
        .mount(&server)
        .await;
    mount_chat(&server, "Showers around 02:00.").await;

    let report = dashboard(&server).run_query(&query()).await.unwrap();

    assert!(report.prediction.rain_expected);
    assert_eq!(report.charts.len(), 1);
    assert_eq!(report.charts[0].points.len(), 4);
    assert_eq!(report.heatmap.points.len(), 4);
    assert_eq!(report.narrative.text, "Showers around 02:00.");
    assert!(report.narrative.generated);
}

#[tokio::test]
async fn test_dry_forecast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(precipitation_body(&[
            0.0, 0.1, 0.4,
        ])))
        .mount(&server)
        .await;
    mount_chat(&server, "Dry week ahead.").await;

    let report = dashboard(&server).run_query(&query()).await.unwrap();

    assert!(!report.prediction.rain_expected);
    assert!(!report.advisory.rain_expected);
}

#[tokio::test]
async fn test_identical_queries_hit_the_api_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(precipitation_body(&[0.7])))
        .expect(1)
        .mount(&server)
        .await;
    mount_chat(&server, "Rain.").await;

    let dashboard = dashboard(&server);
    let first = dashboard.run_query(&query()).await.unwrap();
    let second = dashboard.run_query(&query()).await.unwrap();

    assert_eq!(first.series, second.series);
    let stats = dashboard.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_unauthorized_and_not_found_are_distinct() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/2024-10-05"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/2024-11-05"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let unauthorized = dashboard.run_query(&query()).await.unwrap_err();
    let not_found = dashboard
        .run_query(&Query::new(
            52.520551,
            13.461804,
            NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 6).unwrap(),
        ))
        .await
        .unwrap_err();

    assert_eq!(unauthorized, FetchError::Unauthorized);
    assert_eq!(not_found, FetchError::NotFound);
    assert!(unauthorized.user_message().contains("credentials"));
    assert_ne!(unauthorized.user_message(), not_found.user_message());
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/json$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    for _ in 0..2 {
        let err = dashboard.run_query(&query()).await.unwrap_err();
        assert_eq!(err, FetchError::UnexpectedStatus { status: 500 });
        assert_eq!(err.user_message(), "An error occurred: 500");
    }
}

#[tokio::test]
async fn test_narrative_failure_keeps_the_forecast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(precipitation_body(&[1.2, 0.0])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = dashboard(&server).run_query(&query()).await.unwrap();

    assert!(report.prediction.rain_expected);
    assert!(!report.narrative.generated);
    assert!(report.narrative.text.contains("An error occurred during the AI analysis"));
}

#[tokio::test]
async fn test_blank_completion_becomes_an_apology() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(precipitation_body(&[0.0])))
        .mount(&server)
        .await;
    mount_chat(&server, "   ").await;

    let report = dashboard(&server).run_query(&query()).await.unwrap();

    assert!(!report.narrative.generated);
    assert!(report.narrative.text.contains("No completion in response"));
}
