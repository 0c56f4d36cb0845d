use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, products};

pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    // The frontend sends the credential cookie cross-origin, so the CORS
    // answer must name the origin and allow credentials.
    let origin = state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .context("CORS_ORIGIN is not a valid header value")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let router = Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(products::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        );

    Ok(router)
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "3000".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
