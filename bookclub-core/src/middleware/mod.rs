//! HTTP middleware for the bookclub backend
//!
//! - Session enforcement middleware and the `AuthMember` extractor
//! - Route-type response tagging
//! - Security headers middleware
//! - Request observability (request IDs + metrics)

pub mod metrics;
pub mod route_type;
pub mod security_headers;
pub mod session;

pub use metrics::ObservabilityLayer;
pub use route_type::RouteType;
pub use security_headers::security_headers_middleware;
pub use session::{require_session, AuthMember};
