//! # HTTP Middleware
//!
//! - `metrics`: Prometheus request counters and latency histogram, exposed at
//!   `/metrics`.

pub mod metrics;
