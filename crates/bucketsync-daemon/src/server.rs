//! HTTP trigger endpoint
//!
//! Exposes the engine on a local address (`daemon.listen`, default
//! `127.0.0.1:8730`):
//!
//! - `POST /sync` runs one sync and answers with the run result as JSON,
//!   or `409 Conflict` when another run holds the guard. The run is a task
//!   of its own and finishes even if the client disconnects.
//! - `GET /health` answers `200` with whether a run is active.
//!
//! Everything else is `404`, or `405` for a known path with the wrong method.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use bucketsync_sync::engine::SyncEngine;

/// Pause after a failed accept, e.g. when the process is out of descriptors
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// HTTP server that lets local tools trigger a sync run
pub struct TriggerServer {
    engine: Arc<SyncEngine>,
    listener: TcpListener,
}

impl TriggerServer {
    /// Binds the listener for `endpoint`, e.g. `"127.0.0.1:8730"`
    pub async fn bind(engine: Arc<SyncEngine>, endpoint: &str) -> anyhow::Result<Self> {
        let addr: SocketAddr = endpoint
            .parse()
            .with_context(|| format!("Invalid listen address '{endpoint}'"))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind trigger endpoint on {addr}"))?;
        Ok(Self { engine, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves connections until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        info!(addr = %self.local_addr()?, "Trigger endpoint listening");

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    let Some((stream, peer)) = accepted(result) else {
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                        continue;
                    };
                    let io = TokioIo::new(stream);
                    let engine = Arc::clone(&self.engine);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let engine = Arc::clone(&engine);
                            async move { handle_request(req, &engine).await }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            error!(error = %e, %peer, "Trigger HTTP connection error");
                        }
                    });
                }
                _ = shutdown.cancelled() => {
                    info!("Trigger endpoint shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Accept failures only affect one connection; the listener keeps going
fn accepted<T>(result: std::io::Result<T>) -> Option<T> {
    match result {
        Ok(conn) => Some(conn),
        Err(e) => {
            error!(error = %e, "Failed to accept trigger connection");
            None
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    engine: &Arc<SyncEngine>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    Ok(route(req.method(), req.uri().path(), engine).await)
}

async fn route(method: &Method, path: &str, engine: &Arc<SyncEngine>) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::POST, "/sync") => trigger(Arc::clone(engine)).await,
        (&Method::GET, "/health") => json_response(
            StatusCode::OK,
            &serde_json::json!({ "status": "ok", "syncing": engine.guard().is_running() }),
        ),
        (_, "/sync" | "/health") => text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn trigger(engine: Arc<SyncEngine>) -> Response<Full<Bytes>> {
    info!("Sync requested over HTTP");
    let run = tokio::spawn(async move { engine.trigger_sync().await });
    let result = match run.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "HTTP-triggered sync task failed");
            return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Sync task failed");
        }
    };
    let status = if result.rejected {
        warn!("HTTP trigger rejected, a run is already active");
        StatusCode::CONFLICT
    } else {
        StatusCode::OK
    };
    match serde_json::to_value(&result) {
        Ok(body) => json_response(status, &body),
        Err(e) => text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to encode run result: {e}"),
        ),
    }
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}
