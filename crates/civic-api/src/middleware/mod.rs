//! # Middleware
//!
//! - `metrics`: Prometheus request counters and latency histograms, plus
//!   the engine operations counter.

pub mod metrics;
