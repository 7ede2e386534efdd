//! Route definitions and the payloads that create or modify them.

use std::collections::BTreeMap;

use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::store::StoreError;

/// Identifier assigned by the store.
pub type RouteId = u64;

/// Lowest and highest status codes accepted on write. Informational 1xx
/// codes would be sent as interim responses without the stored body.
const MIN_STATUS: u16 = 200;
const MAX_STATUS: u16 = 599;

/// A stored rule mapping a method + path pair to a canned response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub id: RouteId,

    /// HTTP verb, matched case-sensitively.
    pub method: String,

    /// Path as registered, with or without a leading `/`.
    pub path: String,

    /// Status code replayed to callers.
    pub status: u16,

    /// Body replayed to callers.
    #[serde(default)]
    pub response: Value,

    /// Headers applied verbatim to the replayed response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl RouteDefinition {
    /// Check the fields a definition must satisfy before it is persisted.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.method.trim().is_empty() {
            return Err(StoreError::validation("method must not be blank"));
        }
        if Method::from_bytes(self.method.as_bytes()).is_err() {
            return Err(StoreError::validation(format!(
                "method '{}' is not a valid HTTP method",
                self.method
            )));
        }
        if self.path.trim().is_empty() {
            return Err(StoreError::validation("path must not be blank"));
        }
        if !(MIN_STATUS..=MAX_STATUS).contains(&self.status) {
            return Err(StoreError::validation(format!(
                "status must be between {MIN_STATUS} and {MAX_STATUS} (1xx codes cannot carry a body), got {}",
                self.status
            )));
        }
        if let Some(headers) = &self.headers {
            for (name, value) in headers {
                if HeaderName::from_bytes(name.as_bytes()).is_err() {
                    return Err(StoreError::validation(format!(
                        "header name '{name}' is invalid"
                    )));
                }
                if HeaderValue::from_str(value).is_err() {
                    return Err(StoreError::validation(format!(
                        "header '{name}' has an invalid value"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Create payload. Any caller-supplied `id` is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRoute {
    pub method: Option<String>,
    pub path: Option<String>,
    pub status: Option<u16>,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

impl NewRoute {
    /// Build the definition the store will persist under `id`.
    pub fn into_definition(self, id: RouteId) -> Result<RouteDefinition, StoreError> {
        let mut missing = Vec::new();
        if self.method.is_none() {
            missing.push("method");
        }
        if self.path.is_none() {
            missing.push("path");
        }
        if self.status.is_none() {
            missing.push("status");
        }
        if !missing.is_empty() {
            return Err(StoreError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let route = RouteDefinition {
            id,
            method: self.method.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            response: self.response.unwrap_or(Value::Null),
            headers: self.headers,
        };
        route.validate()?;
        Ok(route)
    }
}

/// Update payload.
///
/// Merge policy: every field present in the payload replaces the stored
/// value, every absent field keeps it. `response: null` stores a JSON null,
/// `headers: null` clears the header map. The id is never taken from here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutePatch {
    pub method: Option<String>,
    pub path: Option<String>,
    pub status: Option<u16>,
    #[serde(default, deserialize_with = "present")]
    pub response: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub headers: Option<Option<BTreeMap<String, String>>>,
}

impl RoutePatch {
    /// Merge this patch onto `current`, producing the replacement definition.
    pub fn apply(self, current: &RouteDefinition) -> Result<RouteDefinition, StoreError> {
        let route = RouteDefinition {
            id: current.id,
            method: self.method.unwrap_or_else(|| current.method.clone()),
            path: self.path.unwrap_or_else(|| current.path.clone()),
            status: self.status.unwrap_or(current.status),
            response: self.response.unwrap_or_else(|| current.response.clone()),
            headers: self.headers.unwrap_or_else(|| current.headers.clone()),
        };
        route.validate()?;
        Ok(route)
    }
}

// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
