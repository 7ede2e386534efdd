//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! store, dispatcher, admin handlers, middleware produce:
//!     → logging.rs (tracing subscriber, structured events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every dispatch log line
//! - Metrics are recorded unconditionally; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
