use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total API requests served. Labels: op, status.
pub const REQUESTS_TOTAL: &str = "hotelier_requests_total";

/// Histogram: request latency in seconds. Labels: op.
pub const REQUEST_DURATION_SECONDS: &str = "hotelier_request_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: rooms currently in inventory.
pub const ROOMS: &str = "hotelier_rooms";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "hotelier_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "hotelier_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a routed method + path pattern to a short label for metrics.
pub fn op_label(method: &str, path: &str) -> &'static str {
    match (method, path) {
        ("POST", "/rooms/add") => "create_room",
        ("DELETE", "/rooms/delete/:room_id") => "delete_room",
        ("GET", "/rooms/list") => "list_rooms",
        ("POST", "/bookings/add") => "create_booking",
        ("DELETE", "/bookings/delete/:booking_id") => "delete_booking",
        ("GET", "/bookings/list") => "list_bookings",
        _ => "other",
    }
}
