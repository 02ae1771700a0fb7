//! URL Probe Exporter
//!
//! Probes the configured URLs every interval and serves the results to
//! Prometheus.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use url_probe_exporter::metrics::DEFAULT_METRICS_PORT;
use url_probe_exporter::{
    Error, ExporterConfig, HttpChecker, MetricsRegistry, MetricsServer, Result, Scheduler, Target,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Probe HTTP endpoints and export reachability metrics for Prometheus
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    metrics_port: u16,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_HOST", default_value = "0.0.0.0")]
    metrics_host: IpAddr,

    /// Target URL to probe (repeatable; defaults to the built-in list)
    #[arg(long = "target", env = "TARGETS", value_delimiter = ',')]
    targets: Vec<String>,

    /// Seconds between the starts of consecutive passes
    #[arg(long, env = "CHECK_INTERVAL_SECONDS", default_value = "30")]
    interval_seconds: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value = "10")]
    timeout_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn to_config(&self) -> Result<ExporterConfig> {
        let targets = if self.targets.is_empty() {
            ExporterConfig::default_targets()?
        } else {
            self.targets
                .iter()
                .map(Target::parse)
                .collect::<Result<Vec<_>>>()?
        };

        let config = ExporterConfig {
            targets,
            check_interval: Duration::from_secs(self.interval_seconds),
            request_timeout: Duration::from_secs(self.timeout_seconds),
            metrics_addr: SocketAddr::new(self.metrics_host, self.metrics_port),
        };
        config.validate()?;

        Ok(config)
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = args.to_config()?;

    info!("Starting URL probe exporter");
    for target in &config.targets {
        info!("  Target: {}", target);
    }
    info!("  Check interval: {:?}", config.check_interval);
    info!("  Request timeout: {:?}", config.request_timeout);

    let registry = Arc::new(MetricsRegistry::new()?);
    let shutdown = CancellationToken::new();

    // Bind before starting anything else so a taken port fails fast
    let server = MetricsServer::bind(config.metrics_addr, Arc::clone(&registry)).await?;
    info!(
        "Prometheus metrics server started on port {}",
        server.local_addr().port()
    );
    let mut server_task = tokio::spawn(server.serve(shutdown.child_token()));

    let checker = Arc::new(HttpChecker::new(config.request_timeout)?);
    let scheduler = Scheduler::new(
        config.targets,
        config.check_interval,
        checker,
        Arc::clone(&registry),
    )?
    .spawn(shutdown.child_token());

    let result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(Error::from)?;
            info!("Service stopped");
            Ok(())
        }
        joined = &mut server_task => match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Metrics server error: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Metrics server task failed: {}", e);
                Err(Error::Internal(format!("metrics server task failed: {}", e)))
            }
        },
    };

    // In-flight checks are not drained
    scheduler.cancel();
    shutdown.cancel();

    result
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "hyper_util=warn", "reqwest=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // Declared defaults and env names, read from the command definition so
    // the process environment cannot leak in.
    #[test]
    fn test_args_declared_defaults() {
        let command = Args::command();
        let expected = [
            ("metrics_port", "METRICS_PORT", Some("8000")),
            ("metrics_host", "METRICS_HOST", Some("0.0.0.0")),
            ("targets", "TARGETS", None),
            ("interval_seconds", "CHECK_INTERVAL_SECONDS", Some("30")),
            ("timeout_seconds", "REQUEST_TIMEOUT_SECONDS", Some("10")),
            ("log_level", "LOG_LEVEL", Some("info")),
        ];

        for (id, env, default) in expected {
            let arg = command
                .get_arguments()
                .find(|a| a.get_id() == id)
                .unwrap_or_else(|| panic!("missing argument {}", id));

            assert_eq!(arg.get_env().and_then(|e| e.to_str()), Some(env), "{}", id);

            let defaults: Vec<&str> = arg
                .get_default_values()
                .iter()
                .filter_map(|v| v.to_str())
                .collect();
            match default {
                Some(value) => assert_eq!(defaults, vec![value], "{}", id),
                None => assert!(defaults.is_empty(), "{}", id),
            }
        }
    }

    #[test]
    fn test_empty_targets_use_builtin_list() {
        let args = Args {
            metrics_port: DEFAULT_METRICS_PORT,
            metrics_host: "0.0.0.0".parse().unwrap(),
            targets: vec![],
            interval_seconds: 30,
            timeout_seconds: 10,
            log_level: "info".into(),
            log_json: false,
        };
        let config = args.to_config().unwrap();

        assert_eq!(config.metrics_addr.port(), 8000);
        assert_eq!(config.targets, ExporterConfig::default_targets().unwrap());
        assert_eq!(config.check_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_args_targets() {
        let args = Args::try_parse_from([
            "url-probe-exporter",
            "--target",
            "https://a.example.com,https://b.example.com",
            "--metrics-port",
            "9100",
            "--interval-seconds",
            "30",
            "--timeout-seconds",
            "10",
        ])
        .unwrap();
        let config = args.to_config().unwrap();

        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[1].as_str(), "https://b.example.com");
        assert_eq!(config.metrics_addr.port(), 9100);
    }

    #[test]
    fn test_args_invalid_port() {
        let result = Args::try_parse_from(["url-probe-exporter", "--metrics-port", "eighty"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_invalid_target() {
        let args =
            Args::try_parse_from(["url-probe-exporter", "--target", "ftp://example.com"]).unwrap();

        assert!(matches!(args.to_config(), Err(Error::InvalidTarget { .. })));
    }
}
