//! Prometheus metrics exporter.

use std::net::SocketAddr;
use std::sync::Arc;

use prometheus::{Counter, CounterVec, Opts, Registry};
use tracing::{error, info};

use crate::config::LoadTier;
use crate::error::MetricsError;
use crate::projector::ProjectionReport;

/// Prometheus metrics for the synchronization engine.
pub struct Metrics {
    /// Registry for all metrics.
    registry: Registry,
    /// Total configuration loads by satisfying tier.
    pub config_loads_total: CounterVec,
    /// Total projector passes by projector and outcome.
    pub projections_total: CounterVec,
    /// Total field writes, misses and skips by projector.
    pub projection_fields_total: CounterVec,
    /// Total reconciliation passes.
    pub reconcile_passes_total: Counter,
}

impl Metrics {
    /// Creates a new metrics instance with all counters registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let config_loads_total = CounterVec::new(
            Opts::new("config_loads_total", "Total configuration loads"),
            &["tier"],
        )
        .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;

        let projections_total = CounterVec::new(
            Opts::new("projections_total", "Total projector passes"),
            &["projector", "outcome"],
        )
        .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;

        let projection_fields_total = CounterVec::new(
            Opts::new(
                "projection_fields_total",
                "Total field-level projection results",
            ),
            &["projector", "result"],
        )
        .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;

        let reconcile_passes_total =
            Counter::new("reconcile_passes_total", "Total reconciliation passes")
                .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;

        registry
            .register(Box::new(config_loads_total.clone()))
            .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;
        registry
            .register(Box::new(projections_total.clone()))
            .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;
        registry
            .register(Box::new(projection_fields_total.clone()))
            .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;
        registry
            .register(Box::new(reconcile_passes_total.clone()))
            .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;

        Ok(Self {
            registry,
            config_loads_total,
            projections_total,
            projection_fields_total,
            reconcile_passes_total,
        })
    }

    /// Records a configuration load and the tier that satisfied it.
    pub fn record_config_load(&self, tier: LoadTier) {
        self.config_loads_total
            .with_label_values(&[tier.to_string().as_str()])
            .inc();
    }

    /// Records one projector pass.
    pub fn record_projection(&self, projector: &str, report: &ProjectionReport) {
        let outcome = if report.changed() { "changed" } else { "clean" };
        self.projections_total
            .with_label_values(&[projector, outcome])
            .inc();

        self.projection_fields_total
            .with_label_values(&[projector, "written"])
            .inc_by(report.writes as f64);
        self.projection_fields_total
            .with_label_values(&[projector, "missed"])
            .inc_by(report.misses as f64);
        self.projection_fields_total
            .with_label_values(&[projector, "skipped"])
            .inc_by(report.skips as f64);
    }

    /// Records one reconciliation pass.
    pub fn record_reconcile_attempt(&self) {
        self.reconcile_passes_total.inc();
    }

    /// Returns the metrics in Prometheus text format.
    pub fn gather(&self) -> Result<String, MetricsError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::PrometheusFailed(e.to_string()))
    }
}

/// HTTP server for Prometheus metrics.
pub struct MetricsServer {
    metrics: Arc<Metrics>,
    port: u16,
}

impl MetricsServer {
    pub fn new(metrics: Arc<Metrics>, port: u16) -> Self {
        Self { metrics, port }
    }

    /// Starts the metrics HTTP server.
    pub async fn start(self) -> Result<(), MetricsError> {
        use http_body_util::Full;
        use hyper::body::Bytes;
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{body::Incoming, Request, Response};
        use hyper_util::rt::TokioIo;

        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;

        info!(port = self.port, "Starting Prometheus metrics server");

        let metrics = self.metrics.clone();

        loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| MetricsError::PrometheusFailed(e.to_string()))?;

            let io = TokioIo::new(stream);
            let metrics = metrics.clone();

            tokio::spawn(async move {
                let service = service_fn(|req: Request<Incoming>| {
                    let metrics = metrics.clone();
                    async move {
                        if req.uri().path() == "/metrics" {
                            let body = metrics.gather().unwrap_or_default();
                            Ok::<_, hyper::Error>(Response::new(Full::new(Bytes::from(body))))
                        } else {
                            let response = Response::builder()
                                .status(404)
                                .body(Full::new(Bytes::from("Not Found")));
                            match response {
                                Ok(response) => Ok(response),
                                Err(_) => Ok(Response::new(Full::new(Bytes::from("Not Found")))),
                            }
                        }
                    }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    error!(error = %e, "Error serving connection");
                }
            });
        }
    }
}
