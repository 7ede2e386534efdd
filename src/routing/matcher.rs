//! Route matching logic.
//!
//! # Responsibilities
//! - Refuse requests under the reserved admin prefix
//! - Match method exactly (case-sensitive)
//! - Match path against the raw request path or its normalized candidate
//!
//! # Design Decisions
//! - Linear scan in stored order; first match wins
//! - No wildcards, no path parameters, no body matching
//! - The raw path is compared as received, without percent-decoding

use crate::store::RouteDefinition;

/// Paths starting with this prefix belong to the admin interface.
pub const ADMIN_PREFIX: &str = "/admin";

/// Strip a single leading `/` from a request path.
pub fn normalize(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// True when `path` falls under the reserved admin prefix.
///
/// The prefix is matched on whole segments: `/admin` and `/admin/routes`
/// are reserved, `/administrator` is not. The leading `/` is optional.
pub fn is_admin_path(path: &str) -> bool {
    let bare = normalize(ADMIN_PREFIX);
    normalize(path)
        .strip_prefix(bare)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Outcome of matching one request against the registry.
#[derive(Debug, PartialEq)]
pub enum MatchOutcome<'a> {
    /// A definition answers this request.
    Matched(&'a RouteDefinition),
    /// No definition has this method + path.
    NoMatch,
    /// The path is reserved for the admin interface.
    Reserved,
}

/// Find the definition serving `method` + `path`.
pub fn find_route<'a>(
    routes: &'a [RouteDefinition],
    method: &str,
    path: &str,
) -> MatchOutcome<'a> {
    if is_admin_path(path) {
        return MatchOutcome::Reserved;
    }

    let normalized = normalize(path);
    routes
        .iter()
        .find(|route| route.method == method && (route.path == path || route.path == normalized))
        .map_or(MatchOutcome::NoMatch, MatchOutcome::Matched)
}
