//! Metrics exposition server
//!
//! Serves the registry in the Prometheus text format over HTTP/1.
//! Rendering only reads atomics, so a scrape never waits on a probe.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::TEXT_FORMAT;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::MetricsRegistry;
use crate::error::{Error, Result};

/// Default exposition port
pub const DEFAULT_METRICS_PORT: u16 = 8000;

/// HTTP server exposing a [`MetricsRegistry`]
pub struct MetricsServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<MetricsRegistry>,
}

impl MetricsServer {
    /// Bind the listen socket. Fails if the address is already in use.
    pub async fn bind(addr: SocketAddr, registry: Arc<MetricsRegistry>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!("Metrics server listening on {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            registry,
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept scrapes until `shutdown` is cancelled
    #[instrument(skip_all, fields(addr = %self.local_addr))]
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Metrics server shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Metrics server accept error: {}", e);
                        continue;
                    }
                },
            };

            debug!("Scrape connection from {}", peer);

            let io = TokioIo::new(stream);
            let registry = Arc::clone(&self.registry);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let registry = Arc::clone(&registry);
                    async move { Ok::<_, Infallible>(route(&req, &registry)) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Metrics server connection error: {}", e);
                }
            });
        }
    }
}

/// Dispatch one request
fn route<B>(req: &Request<B>, registry: &MetricsRegistry) -> Response<Full<Bytes>> {
    match req.uri().path() {
        "/" | "/metrics" => match registry.encode() {
            Ok(body) => {
                let mut response = text_response(StatusCode::OK, body);
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
                response
            }
            Err(e) => {
                error!("Failed to encode metrics: {}", e);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics")
            }
        },
        "/healthz" => text_response(StatusCode::OK, "ok"),
        _ => text_response(StatusCode::NOT_FOUND, "not found"),
    }
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}
