//! Ordered route table with path-template dispatch
//!
//! Routes are tried strictly in registration order and the first match wins.
//! There is no specificity ranking: when two templates can match the same
//! path, whichever was registered first handles it. A request that matches
//! nothing goes to the not-found handler.
//!
//! The table is immutable once built and is served as a tower [`Service`],
//! usually mounted as the fallback service of an `axum::Router` so the usual
//! tower layers still wrap it.

pub mod params;
pub mod template;

pub use params::PathParams;
pub use template::{PathTemplate, TemplateError};

use crate::error::AppError;
use axum::{
    body::Body,
    http::{Method, Request},
    response::{IntoResponse, Response},
};
use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{util::BoxCloneSyncService, Service, ServiceExt};

/// Type-erased route handler
pub type BoxedHandler = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Label of the route that produced a response, attached to the response
/// extensions for metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

impl MatchedRoute {
    pub const UNMATCHED: &'static str = "unmatched";
}

#[derive(Debug, Clone)]
enum Pattern {
    Template(PathTemplate),
    Prefix(String),
}

/// One registered route
#[derive(Clone)]
pub struct Route {
    method: Option<Method>,
    pattern: Pattern,
    handler: BoxedHandler,
}

impl Route {
    /// Method filter; `None` accepts any method
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Template text, or `prefix*` for prefix routes
    pub fn label(&self) -> String {
        match &self.pattern {
            Pattern::Template(template) => template.as_str().to_string(),
            Pattern::Prefix(prefix) => format!("{}*", prefix),
        }
    }

    fn matches(&self, method: &Method, path: &str) -> Option<PathParams> {
        if let Some(expected) = &self.method {
            if expected != method {
                return None;
            }
        }
        match &self.pattern {
            Pattern::Template(template) => template.matches(path),
            Pattern::Prefix(prefix) => path.starts_with(prefix.as_str()).then(PathParams::default),
        }
    }
}

fn boxed<H>(handler: H) -> BoxedHandler
where
    H: Service<Request<Body>, Response = Response, Error = Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    H::Future: Send + 'static,
{
    BoxCloneSyncService::new(handler)
}

/// Builder and dispatcher for the application's routes
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    not_found: Option<BoxedHandler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route for `method` and `template`.
    ///
    /// Registration order is load-bearing. Dispatch returns the first route
    /// that matches, so a literal template such as `/sketches/new` must be
    /// registered before a placeholder template such as `/sketches/{slug}`
    /// that would also match it. Adding a placeholder route above an
    /// existing literal silently shadows the literal.
    pub fn register<H>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
    ) -> Result<&mut Self, TemplateError>
    where
        H: Service<Request<Body>, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        H::Future: Send + 'static,
    {
        let template = PathTemplate::parse(template)?;
        self.routes.push(Route {
            method: Some(method),
            pattern: Pattern::Template(template),
            handler: boxed(handler),
        });
        Ok(self)
    }

    /// Append a route that accepts any method and every path starting with
    /// `prefix`. The same ordering rules as [`register`](Self::register)
    /// apply.
    pub fn register_prefix<H>(&mut self, prefix: &str, handler: H) -> &mut Self
    where
        H: Service<Request<Body>, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        H::Future: Send + 'static,
    {
        self.routes.push(Route {
            method: None,
            pattern: Pattern::Prefix(prefix.to_string()),
            handler: boxed(handler),
        });
        self
    }

    /// Handler for requests no route matches. Without one a JSON 404 is sent.
    pub fn not_found<H>(&mut self, handler: H) -> &mut Self
    where
        H: Service<Request<Body>, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        H::Future: Send + 'static,
    {
        self.not_found = Some(boxed(handler));
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route matching `method` and `path`, with its captured parameters
    pub fn dispatch(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        self.routes
            .iter()
            .find_map(|route| route.matches(method, path).map(|params| (route, params)))
    }

    /// Freeze the table into a cloneable service
    pub fn into_service(self) -> RouteService {
        RouteService {
            table: Arc::new(self),
        }
    }
}

fn default_not_found() -> Response {
    AppError::NotFound("Not found".to_string()).into_response()
}

/// Shared, read-only route table served as a tower service
#[derive(Clone)]
pub struct RouteService {
    table: Arc<RouteTable>,
}

impl RouteService {
    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

impl Service<Request<Body>> for RouteService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let matched = self
            .table
            .dispatch(request.method(), request.uri().path())
            .map(|(route, params)| (route.handler.clone(), route.label(), params));

        let (handler, label) = match matched {
            Some((handler, label, params)) => {
                request.extensions_mut().insert(params);
                (Some(handler), label)
            }
            None => (
                self.table.not_found.clone(),
                MatchedRoute::UNMATCHED.to_string(),
            ),
        };

        Box::pin(async move {
            let mut response = match handler {
                Some(handler) => handler.oneshot(request).await?,
                None => default_not_found(),
            };
            response.extensions_mut().insert(MatchedRoute(label));
            Ok(response)
        })
    }
}
