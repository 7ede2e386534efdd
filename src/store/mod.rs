//! Route store subsystem.
//!
//! # Data Flow
//! ```text
//! admin handlers / dispatcher
//!     → route_store.rs (lock, read, mutate, write)
//!     → persistence.rs (JSON document on disk)
//! ```
//!
//! # Design Decisions
//! - The backing file is the source of truth; every operation re-reads it
//! - Mutations run inside one write-locked read-modify-write cycle
//! - Documents are written to a temp file and renamed into place
//! - Opening the store never fails; unreadable state degrades to empty

pub mod persistence;
pub mod route;
pub mod route_store;

use thiserror::Error;

pub use persistence::{PersistenceError, RouteDocument, RouteFile};
pub use route::{NewRoute, RouteDefinition, RouteId, RoutePatch};
pub use route_store::RouteStore;

/// Errors surfaced by route store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No definition carries the requested id.
    #[error("route {0} not found")]
    NotFound(RouteId),

    /// A create or update payload was rejected.
    #[error("{0}")]
    Validation(String),

    /// The highest stored id leaves no room for another one.
    #[error("route id space exhausted after id {0}")]
    IdsExhausted(RouteId),

    /// The backing file could not be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
