//! Description of a single CRM API call.

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;

/// One call against the CRM API, relative to the versioned API prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Path below `<api_domain>/crm/<version>/`, e.g. `Leads/123`.
    pub path: String,
    pub method: Method,
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<Value>,
    /// Flat query parameters, URL-encoded onto the target.
    pub query: Option<BTreeMap<String, String>>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            query: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.to_string());
        self
    }

    /// Add a query parameter when a value is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }
}
