//! Pull-based observability for CEMS
//!
//! Metrics live in an in-memory Prometheus registry and are scraped over
//! HTTP from the metrics listener. Nothing is pushed.

pub mod metrics;

pub use metrics::Metrics;
