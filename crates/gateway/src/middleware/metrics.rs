//! Request metrics middleware

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use readforge_common::metrics::RequestMetrics;

/// Record count and latency of every routed request
///
/// Labels use the route template, not the raw path.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let metrics = RequestMetrics::start(&method, &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
