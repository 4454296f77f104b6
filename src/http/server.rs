//! HTTP server work starter.
//!
//! # Responsibilities
//! - Bind the configured address and accept connections
//! - Apply read, write and idle timeouts
//! - Wire up the request logging middleware
//! - Drain in-flight requests when the supervisor asks it to stop
//!
//! # Connection Lifecycle
//! ```text
//! accept ──▶ serve (keep-alive) ──▶ closed
//!                 │
//!            drain requested
//!                 ▼
//!        finish in-flight request ──▶ closed
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::ConnectInfo, middleware, Router};
use futures_util::future::{self, BoxFuture};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::{TokioIo, TokioTimer};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

use crate::config::Settings;
use crate::error::BoxError;
use crate::http::middleware::request_logger;
use crate::http::router::Routes;
use crate::lifecycle::{BackgroundTask, DrainSignal, ErrorReporter, WorkStarter};
use crate::observability::{attr, Attr, LogSink, TracingSink};

/// Error type for the serve loop.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Failed to bind the listen address.
    #[error("listen tcp {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// Listener stopped accepting connections.
    #[error("accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// HTTP server supervised as one unit of work.
pub struct HttpServer {
    settings: Settings,
    routes: Routes,
    log: Arc<dyn LogSink>,
    task: Option<BackgroundTask>,
}

impl HttpServer {
    pub fn new(settings: Settings, routes: Routes) -> Self {
        Self {
            settings,
            routes,
            log: Arc::new(TracingSink::new()),
            task: None,
        }
    }

    /// Sink used by the request logging middleware.
    pub fn with_logger(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl WorkStarter for HttpServer {
    fn start(&mut self, errors: ErrorReporter) {
        let settings = self.settings.clone();
        let app = build_app(&settings, self.routes.clone(), self.log.clone());
        let task = self
            .task
            .get_or_insert_with(|| BackgroundTask::new(move |drain| serve(settings, app, drain)));
        task.start(errors);
    }

    fn shutdown(&mut self) -> BoxFuture<'_, Result<(), BoxError>> {
        match self.task.as_mut() {
            Some(task) => task.shutdown(),
            None => Box::pin(future::ready(Ok(()))),
        }
    }

    fn identity(&self) -> Vec<Attr> {
        vec![attr("address", self.settings.address())]
    }
}

/// Build the application: routes, timeouts, then request logging outermost.
#[allow(deprecated)]
pub fn build_app(settings: &Settings, routes: Routes, log: Arc<dyn LogSink>) -> Router {
    routes
        .into_router()
        .layer(RequestBodyTimeoutLayer::new(settings.read_timeout))
        .layer(TimeoutLayer::new(settings.write_timeout))
        .layer(middleware::from_fn_with_state(log, request_logger))
}

fn is_transient(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
    )
}

/// Accept loop. Returns once the drain finished or on a fatal listener error.
async fn serve(settings: Settings, app: Router, mut drain: DrainSignal) -> Result<(), BoxError> {
    let address = settings.address();
    let listener = TcpListener::bind(address.as_str())
        .await
        .map_err(|source| HttpError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::debug!(address = %address, "Listener bound");

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .keep_alive(true)
        .header_read_timeout(settings.idle_timeout);

    let (close_tx, close_rx) = watch::channel(false);
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(
                        builder.clone(),
                        stream,
                        peer,
                        app.clone(),
                        close_rx.clone(),
                    ));
                }
                Err(err) if is_transient(&err) => {
                    tracing::debug!(error = %err, "Transient accept error");
                }
                Err(err) => return Err(HttpError::Accept(err).into()),
            },
            Some(_) = connections.join_next() => {}
            _ = drain.requested() => break,
        }
    }

    drop(listener);
    close_tx.send_replace(true);
    tracing::debug!(connections = connections.len(), "Draining connections");
    while connections.join_next().await.is_some() {}
    Ok(())
}

async fn serve_connection(
    builder: http1::Builder,
    stream: TcpStream,
    peer: SocketAddr,
    app: Router,
    mut close: watch::Receiver<bool>,
) {
    let service = service_fn(move |mut request: hyper::Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(peer));
        app.clone().oneshot(request)
    });

    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut closing = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    tracing::debug!(peer = %peer, error = %err, "Connection error");
                }
                break;
            }
            _ = close.wait_for(|closed| *closed), if !closing => {
                closing = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{body::Body, http::Request, http::StatusCode, routing::get};

    use crate::config::Options;
    use crate::observability::{MemorySink, Value};

    fn settings(write_timeout_secs: u64) -> Settings {
        Settings::resolve(&[Options {
            host: "127.0.0.1".into(),
            write_timeout_secs,
            ..Options::default()
        }])
    }

    #[test]
    fn test_identity_is_address() {
        let server = HttpServer::new(settings(0), Routes::new());
        let identity = server.identity();
        assert_eq!(identity.len(), 1);
        assert_eq!(identity[0].key, "address");
        assert_eq!(identity[0].value, Value::from("127.0.0.1:8080"));
    }

    #[test]
    fn test_bind_error_message() {
        let err = HttpError::Bind {
            address: "127.0.0.1:80".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address already in use"),
        };
        assert_eq!(err.to_string(), "listen tcp 127.0.0.1:80: address already in use");
    }

    #[tokio::test]
    async fn test_app_logs_requests() {
        let log = MemorySink::new();
        let routes = Routes::new().handle("/health", get(|| async { "ok" }));
        let app = build_app(&settings(0), routes, Arc::new(log.clone()));

        let request = Request::builder().uri("/health/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            log.lines(),
            vec!["message=Request received.; status=200; path=/health/; method=GET; remoteIp=N/A"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_timeout_is_logged() {
        let log = MemorySink::new();
        let routes = Routes::new().handle(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "late"
            }),
        );
        let app = build_app(&settings(1), routes, Arc::new(log.clone()));

        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(log.records()[0].get("status"), Some(&Value::Uint(408)));
    }

    #[tokio::test]
    async fn test_shutdown_before_start_is_ok() {
        let mut server = HttpServer::new(settings(0), Routes::new());
        assert!(server.shutdown().await.is_ok());
    }
}
