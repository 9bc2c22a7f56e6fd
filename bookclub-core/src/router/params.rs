//! Per-request path parameters captured by the route table

use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// Placeholder values bound by the matched template, in template order.
///
/// Routes outside the table, and literal templates, see an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.0.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Like [`get`](Self::get) but a missing or empty value is a validation error.
    pub fn require(&self, name: &str) -> Result<&str, AppError> {
        self.get(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Validation(format!("missing path parameter '{}'", name)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S> FromRequestParts<S> for PathParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<PathParams>()
            .cloned()
            .unwrap_or_default())
    }
}
