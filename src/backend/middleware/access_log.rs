/**
 * Access Log Middleware
 *
 * One line per request under the `access` tracing target: method, path,
 * status, latency and user agent. Enable with `RUST_LOG=access=info`.
 */

use std::time::Instant;

use axum::extract::Request;
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;

pub async fn access_log(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;

    tracing::info!(
        target: "access",
        "{} {} {} {}ms \"{}\"",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis(),
        user_agent
    );
    response
}
