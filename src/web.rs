use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::dashboard::LiveDashboard;

/// API under `/api`, the dashboard page for everything else
pub fn app(dashboard: Arc<LiveDashboard>) -> Router {
    let server = &dashboard.config().server;
    let upload_limit = usize::try_from(server.max_upload_mb)
        .unwrap_or(usize::MAX)
        .saturating_mul(1024 * 1024);
    let static_dir = server.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(dashboard))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(dashboard: Arc<LiveDashboard>) -> Result<()> {
    let server = dashboard.config().server.clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    let app = app(dashboard);

    #[cfg(feature = "tls")]
    {
        if let (Some(cert), Some(key)) = (&server.tls_cert, &server.tls_key) {
            return serve_tls(app, addr, cert, key).await;
        }
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", server.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

#[cfg(feature = "tls")]
async fn serve_tls(
    app: Router,
    addr: SocketAddr,
    cert: &std::path::Path,
    key: &std::path::Path,
) -> Result<()> {
    let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {}", cert.display()))?;
    tracing::info!("Web server running at https://localhost:{}", addr.port());
    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .context("HTTPS server failed")
}
