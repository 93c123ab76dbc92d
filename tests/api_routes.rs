//! Route-level tests for the JSON API

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use terragraph::{LiveDashboard, TerraGraphConfig, web};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_is, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "terragraph-boundary";

fn app(server: &MockServer) -> axum::Router {
    let mut config = TerraGraphConfig::with_credentials("farmer", "secret", "gsk_test");
    config.weather.base_url = server.uri();
    config.llm.base_url = server.uri();
    config.llm.max_retries = 0;
    config.translation.base_url = server.uri();
    web::app(Arc::new(LiveDashboard::from_config(Arc::new(config)).unwrap()))
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart(file_name: &str, contents: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n"
    );
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::post("/api/datasets/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let response = app(&server)
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_forecast_unauthorized_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/json$"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(
            Request::get("/api/forecast?latitude=52.52&longitude=13.46&start=2024-10-05&end=2024-10-12")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert!(body["message"].as_str().unwrap().contains("credentials"));
}

#[tokio::test]
async fn test_forecast_missing_latitude_is_rejected() {
    let server = MockServer::start().await;
    let response = app(&server)
        .oneshot(Request::get("/api/forecast?longitude=13.46").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_csv_with_chart() {
    let server = MockServer::start().await;
    let request = multipart(
        "readings.csv",
        "x,y,site\n1,4,a\n2,5,b\n3,6,a\n",
        &[("x", "x"), ("y", "y"), ("chart", "line"), ("color_by", "site")],
    );

    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["row_count"], 3);
    assert_eq!(body["numeric_columns"], json!(["x", "y"]));
    assert_eq!(body["chart"]["title"], "y over x");
    assert_eq!(body["chart"]["traces"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"][1]["mean"], 5.0);
}

#[tokio::test]
async fn test_analyze_without_axes_has_no_chart() {
    let server = MockServer::start().await;
    let response = app(&server)
        .oneshot(multipart("readings.csv", "a,b\n1,x\n", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["chart"].is_null());
    assert_eq!(body["preview"]["rows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_analyze_rejects_unsupported_file() {
    let server = MockServer::start().await;
    let response = app(&server)
        .oneshot(multipart("notes.txt", "hello", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "dataset");
}

#[tokio::test]
async fn test_speech_without_key_is_no_content() {
    let server = MockServer::start().await;
    let response = app(&server)
        .oneshot(
            Request::post("/api/advisory/speech")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"rain_expected": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

fn speech_request(api_key: &str) -> Request<Body> {
    Request::post("/api/advisory/speech")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "rain_expected": false, "api_key": api_key }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_speech_returns_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/translate"))
        .and(header_is("Ocp-Apim-Subscription-Key", "ghana-key"))
        .and(body_partial_json(json!({ "lang": "en-tw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json("Osuo renntɔ"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tts/v1/tts"))
        .and(body_partial_json(json!({ "text": "Osuo renntɔ", "language": "tw" })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3, 4], "audio/mpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server).oneshot(speech_request("ghana-key")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let audio = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(audio.as_ref(), &[1u8, 2, 3, 4]);
}

#[tokio::test]
async fn test_speech_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/translate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let response = app(&server).oneshot(speech_request("wrong-key")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "translation");
}
