//! Routing subsystem (the dispatcher).
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → dispatch.rs (fresh read of the route store)
//!     → matcher.rs (admin guard, normalization, first-match scan)
//!     → Stored status/headers/body, or 404 {"error":"Not found"}
//! ```
//!
//! # Design Decisions
//! - Never cached across requests; admin mutations are visible immediately
//! - Read-only consumer of the store
//! - Deterministic: registration order decides between duplicates

pub mod dispatch;
pub mod matcher;

pub use dispatch::dispatch;
pub use matcher::{find_route, is_admin_path, normalize, MatchOutcome, ADMIN_PREFIX};
