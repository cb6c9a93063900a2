//! Metrics and Monitoring Adapters
//!
//! Provides the Prometheus registry rendered by the admin server's
//! `/metrics` endpoint.

pub mod prometheus;

pub use prometheus::MetricsRegistry;
