//! HTTP reachability checker
//!
//! One call to [`Checker::check`] is one GET attempt: no retries. The
//! outcome is returned to the caller; nothing is written to metrics here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info, instrument};

use super::{ProbeOutcome, Target};
use crate::error::Result;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Performs a single probe of one target.
///
/// Implementations never fail: transport problems are reported as
/// [`ProbeResult::Failed`](super::ProbeResult::Failed).
#[async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, target: &Target) -> ProbeOutcome;
}

/// Probes targets with an HTTP GET
#[derive(Debug, Clone)]
pub struct HttpChecker {
    client: Client,
    timeout: Duration,
}

impl HttpChecker {
    /// Create a checker whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, timeout })
    }

    /// Create a checker bounded by [`DEFAULT_REQUEST_TIMEOUT`]
    pub fn with_default_timeout() -> Result<Self> {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send the request and drain the body, returning status and round trip.
    async fn probe(&self, target: &Target) -> reqwest::Result<(u16, Duration)> {
        let start = Instant::now();

        let response = self.client.get(target.as_str()).send().await?;
        let status = response.status().as_u16();
        response.bytes().await?;

        Ok((status, start.elapsed()))
    }
}


#[async_trait]
impl Checker for HttpChecker {
    #[instrument(skip(self), fields(url = %target))]
    async fn check(&self, target: &Target) -> ProbeOutcome {
        info!("Checking URL: {}", target);

        match self.probe(target).await {
            Ok((status, latency)) => {
                let outcome = ProbeOutcome::response(target.clone(), status, latency);
                info!(
                    "URL: {}, Status: {}, HTTP {}, Response time: {:.2}ms",
                    target,
                    u8::from(outcome.reachable()),
                    status,
                    outcome.latency_ms()
                );
                outcome
            }
            Err(e) => {
                error!("Error checking URL {}: {}", target, e);
                ProbeOutcome::failed(target.clone(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeResult;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(route: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string("body"))
            .mount(&server)
            .await;
        server
    }

    fn target(url: String) -> Target {
        Target::parse(url).unwrap()
    }

    /// Port that had a listener a moment ago and now refuses connections
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_checker_new() {
        let checker = HttpChecker::new(Duration::from_secs(3)).unwrap();
        assert_eq!(checker.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_checker_default_timeout() {
        let checker = HttpChecker::with_default_timeout().unwrap();
        assert_eq!(checker.timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_default_timeout_bounds_slow_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(13)))
            .mount(&server)
            .await;
        let checker = HttpChecker::with_default_timeout().unwrap();

        let started = Instant::now();
        let outcome = checker.check(&target(server.uri())).await;
        let elapsed = started.elapsed();

        assert_matches!(outcome.result, ProbeResult::Failed { .. });
        assert_eq!(outcome.latency_ms(), 0.0);
        assert!(elapsed >= Duration::from_secs(9), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(12), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_ok_status_is_up() {
        let server = server_with("/200", 200).await;
        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();

        let outcome = checker
            .check(&target(format!("{}/200", server.uri())))
            .await;

        assert!(outcome.reachable());
        assert_eq!(outcome.status(), Some(200));
        assert!(outcome.latency_ms() >= 0.0);
    }

    #[tokio::test]
    async fn test_error_status_is_down_with_latency() {
        let server = server_with("/503", 503).await;
        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();

        let outcome = checker
            .check(&target(format!("{}/503", server.uri())))
            .await;

        assert!(!outcome.reachable());
        assert_matches!(outcome.result, ProbeResult::Response { status: 503, .. });
        assert!(outcome.latency_ms() > 0.0);
    }

    #[tokio::test]
    async fn test_other_2xx_is_down() {
        let server = server_with("/204", 204).await;
        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();

        let outcome = checker
            .check(&target(format!("{}/204", server.uri())))
            .await;

        assert!(!outcome.reachable());
        assert_eq!(outcome.status(), Some(204));
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();
        let url = format!("http://127.0.0.1:{}/", closed_port());

        let outcome = checker.check(&target(url)).await;

        assert!(!outcome.reachable());
        assert_eq!(outcome.latency_ms(), 0.0);
        assert_matches!(outcome.result, ProbeResult::Failed { .. });
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        let checker = HttpChecker::new(Duration::from_millis(200)).unwrap();

        let started = Instant::now();
        let outcome = checker.check(&target(server.uri())).await;

        assert_matches!(outcome.result, ProbeResult::Failed { .. });
        assert_eq!(outcome.latency_ms(), 0.0);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_single_attempt_per_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();

        checker.check(&target(server.uri())).await;

        server.verify().await;
    }
}
