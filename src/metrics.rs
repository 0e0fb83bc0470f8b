//! Prometheus instruments for each role.
//!
//! One registry per process role, mirroring what the role actually does;
//! exposition is the plain text format at `GET /metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

pub struct GatewayMetrics {
    pub registry: Registry,
    /// Per endpoint and status code.
    pub http_requests_total: IntCounterVec,
    /// Per endpoint.
    pub http_latency: HistogramVec,
    /// Current number of physical workers on the ring.
    pub worker_nodes_total: IntGauge,
    /// Per method, result (success/failure) and worker node.
    pub rpc_requests_total: IntCounterVec,
    /// Per method and worker node.
    pub rpc_latency: HistogramVec,
    /// Requests routed per worker node and type (routed/broadcast).
    pub geohash_requests_total: IntCounterVec,
}

pub struct WorkerMetrics {
    pub registry: Registry,
    /// Stored pings by geohash prefix (precision 3). TTL must be taken into
    /// account externally.
    pub pings_stored_total: IntCounterVec,
    /// Per method and result (success/failure).
    pub rpc_requests_total: IntCounterVec,
}

pub struct RegistryMetrics {
    pub registry: Registry,
    /// Currently registered gateways.
    pub registered_gateways: IntGauge,
}

static GATEWAY_METRICS: Lazy<GatewayMetrics> = Lazy::new(|| {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new(
            "gateway_http_requests_total",
            "Total count of HTTP requests per endpoint and status code",
        ),
        &["endpoint", "status"],
    )
    .expect("metric definition");
    let http_latency = HistogramVec::new(
        HistogramOpts::new(
            "gateway_http_request_duration_seconds",
            "HTTP request latency in seconds per endpoint",
        ),
        &["endpoint"],
    )
    .expect("metric definition");
    let worker_nodes_total = IntGauge::new(
        "gateway_worker_nodes_total",
        "Number of worker nodes",
    )
    .expect("metric definition");
    let rpc_requests_total = IntCounterVec::new(
        Opts::new(
            "gateway_rpc_requests_total",
            "Number of RPC calls per method, worker node and result (success/failure)",
        ),
        &["method", "result", "worker_node"],
    )
    .expect("metric definition");
    let rpc_latency = HistogramVec::new(
        HistogramOpts::new(
            "gateway_rpc_request_duration_seconds",
            "RPC request latency in seconds per worker node and method",
        ),
        &["method", "worker_node"],
    )
    .expect("metric definition");
    let geohash_requests_total = IntCounterVec::new(
        Opts::new(
            "gateway_geohash_requests_total",
            "Requests routed per worker node and type (routed/broadcast)",
        ),
        &["worker_node", "type"],
    )
    .expect("metric definition");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("metric registration");
    registry
        .register(Box::new(http_latency.clone()))
        .expect("metric registration");
    registry
        .register(Box::new(worker_nodes_total.clone()))
        .expect("metric registration");
    registry
        .register(Box::new(rpc_requests_total.clone()))
        .expect("metric registration");
    registry
        .register(Box::new(rpc_latency.clone()))
        .expect("metric registration");
    registry
        .register(Box::new(geohash_requests_total.clone()))
        .expect("metric registration");

    GatewayMetrics {
        registry,
        http_requests_total,
        http_latency,
        worker_nodes_total,
        rpc_requests_total,
        rpc_latency,
        geohash_requests_total,
    }
});

static WORKER_METRICS: Lazy<WorkerMetrics> = Lazy::new(|| {
    let registry = Registry::new();

    let pings_stored_total = IntCounterVec::new(
        Opts::new(
            "worker_pings_stored_total",
            "Total count of pings stored by geohash prefix (precision 3)",
        ),
        &["gh_prefix"],
    )
    .expect("metric definition");
    let rpc_requests_total = IntCounterVec::new(
        Opts::new(
            "worker_rpc_requests_total",
            "Total count of RPC requests by method and result (success/failure)",
        ),
        &["method", "result"],
    )
    .expect("metric definition");

    registry
        .register(Box::new(pings_stored_total.clone()))
        .expect("metric registration");
    registry
        .register(Box::new(rpc_requests_total.clone()))
        .expect("metric registration");

    WorkerMetrics {
        registry,
        pings_stored_total,
        rpc_requests_total,
    }
});

static REGISTRY_METRICS: Lazy<RegistryMetrics> = Lazy::new(|| {
    let registry = Registry::new();

    let registered_gateways = IntGauge::new(
        "registry_registered_gateways",
        "Number of currently registered gateways",
    )
    .expect("metric definition");

    registry
        .register(Box::new(registered_gateways.clone()))
        .expect("metric registration");

    RegistryMetrics {
        registry,
        registered_gateways,
    }
});

pub fn gateway_metrics() -> &'static GatewayMetrics {
    &GATEWAY_METRICS
}

pub fn worker_metrics() -> &'static WorkerMetrics {
    &WORKER_METRICS
}

pub fn registry_metrics() -> &'static RegistryMetrics {
    &REGISTRY_METRICS
}

/// Renders a registry in the Prometheus text exposition format.
pub fn render(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&registry.gather())
        .unwrap_or_default()
}

/// Observes one outbound RPC: counter by result, latency by method.
pub fn observe_gateway_rpc(method: &str, worker: &str, ok: bool, seconds: f64) {
    let result = if ok { "success" } else { "failure" };
    let m = gateway_metrics();
    m.rpc_requests_total
        .with_label_values(&[method, result, worker])
        .inc();
    m.rpc_latency
        .with_label_values(&[method, worker])
        .observe(seconds);
}
