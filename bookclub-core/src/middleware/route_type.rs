//! Response tagging by route category

use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ROUTE_TYPE_HEADER: HeaderName = HeaderName::from_static("x-route-type");

/// Category a route belongs to, echoed in `X-Route-Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteType {
    Api,
    Static,
    Ops,
}

impl RouteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Api => "api",
            RouteType::Static => "static",
            RouteType::Ops => "ops",
        }
    }

    /// Layer that stamps the header on every response of the wrapped route,
    /// including responses produced by inner middleware.
    pub fn layer(self) -> SetResponseHeaderLayer<HeaderValue> {
        SetResponseHeaderLayer::overriding(
            ROUTE_TYPE_HEADER,
            HeaderValue::from_static(self.as_str()),
        )
    }
}
