//! Observability infrastructure - Metrics for experiment runs

mod metrics;

pub use metrics::{init_metrics, record_run, MetricsPublisher, PrometheusMetrics};
