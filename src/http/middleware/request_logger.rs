//! Request logging middleware.
//! Logs one event per completed request through the server's `LogSink`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::request::client_ip;
use crate::observability::{attr, LogSink};

/// Log `status`, `path`, `method` and `remoteIp` after the inner service responds.
pub async fn request_logger(
    State(log): State<Arc<dyn LogSink>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().to_string();
    let remote_ip = client_ip(&request);

    let response = next.run(request).await;

    log.info(
        "Request received.",
        &[
            attr("status", response.status().as_u16()),
            attr("path", path),
            attr("method", method),
            attr("remoteIp", remote_ip),
        ],
    );
    response
}
