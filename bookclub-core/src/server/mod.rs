//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::middleware::{
    require_session, security_headers_middleware, ObservabilityLayer, RouteType,
};
use crate::migration;
use crate::repository::{
    member::MemberRepositoryImpl, session::SessionRepositoryImpl, sketch::SketchRepositoryImpl,
    DbPool,
};
use crate::router::{BoxedHandler, RouteTable};
use crate::service::{IdentityService, MemberService, SessionService, SketchService};
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    body::Body,
    handler::Handler,
    http::{Method, Request, Uri},
    response::{IntoResponse, Response},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::mysql::MySqlPoolOptions;
use std::{convert::Infallible, sync::Arc};
use tokio::net::TcpListener;
use tower::{util::BoxCloneSyncService, Layer, Service, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{fs::ServeFileSystemResponseBody, ServeDir},
    trace::TraceLayer,
};
use tracing::{error, info};

/// Mount point of the static asset tree
pub const ASSETS_PREFIX: &str = "/assets/";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: DbPool,
    pub session_service: Arc<SessionService<SessionRepositoryImpl>>,
    pub member_service: Arc<MemberService<MemberRepositoryImpl>>,
    pub identity_service: Arc<IdentityService<MemberRepositoryImpl, SessionRepositoryImpl>>,
    pub sketch_service: Arc<SketchService<SketchRepositoryImpl, MemberRepositoryImpl>>,
}

impl AppState {
    /// Wire the production repositories and services around one pool
    pub fn new(config: Config, db_pool: DbPool) -> Self {
        let member_repo = Arc::new(MemberRepositoryImpl::new(db_pool.inner().clone()));
        let session_repo = Arc::new(SessionRepositoryImpl::new(db_pool.inner().clone()));
        let sketch_repo = Arc::new(SketchRepositoryImpl::new(db_pool.inner().clone()));

        let session_service = Arc::new(SessionService::new(
            session_repo,
            chrono::Duration::seconds(config.session.ttl_secs),
        ));
        let member_service = Arc::new(MemberService::new(member_repo.clone()));
        let identity_service = Arc::new(IdentityService::new(
            member_repo.clone(),
            session_service.clone(),
        ));
        let sketch_service = Arc::new(SketchService::new(sketch_repo, member_repo));

        Self {
            config: Arc::new(config),
            db_pool,
            session_service,
            member_service,
            identity_service,
            sketch_service,
        }
    }
}

/// Implement HasServices trait for production AppState
impl HasServices for AppState {
    type MemberRepo = MemberRepositoryImpl;
    type SessionRepo = SessionRepositoryImpl;
    type SketchRepo = SketchRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn session_service(&self) -> &SessionService<Self::SessionRepo> {
        &self.session_service
    }

    fn member_service(&self) -> &MemberService<Self::MemberRepo> {
        &self.member_service
    }

    fn identity_service(&self) -> &IdentityService<Self::MemberRepo, Self::SessionRepo> {
        &self.identity_service
    }

    fn sketch_service(&self) -> &SketchService<Self::SketchRepo, Self::MemberRepo> {
        &self.sketch_service
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.db_pool.inner())
            .await
            .is_ok()
    }
}

pub async fn run(config: Config, metrics_handle: Option<PrometheusHandle>) -> Result<()> {
    if config.database.run_migrations {
        migration::run_migrations(&config).await?;
    }

    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;
    let db_pool = DbPool::new(pool);
    info!("Connected to database");

    let http_addr = config.http_addr();
    let state = AppState::new(config, db_pool.clone());
    let app = build_router(state, metrics_handle)?;

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    info!("Database pool closed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Stamp a route's responses with its category
fn tagged<Svc>(kind: RouteType, service: Svc) -> BoxedHandler
where
    Svc: Service<Request<Body>, Response = Response, Error = Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    Svc::Future: Send + 'static,
{
    BoxCloneSyncService::new(kind.layer().layer(service))
}

/// API handler reachable without a session
fn public<H, T, S>(state: &S, handler: H) -> BoxedHandler
where
    H: Handler<T, S>,
    T: 'static,
    S: HasServices,
{
    tagged(RouteType::Api, handler.with_state(state.clone()))
}

/// API handler behind the session middleware. Route tagging wraps the
/// middleware so its 401 responses are tagged too.
fn protected<H, T, S>(state: &S, handler: H) -> BoxedHandler
where
    H: Handler<T, S>,
    T: 'static,
    S: HasServices,
{
    tagged(
        RouteType::Api,
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_session::<S>,
            ))
            .service(handler.with_state(state.clone())),
    )
}

/// Rewrite `/assets/css/site.css` to `/css/site.css` for the file service
fn strip_assets_prefix(mut request: Request<Body>) -> Request<Body> {
    let rest = request
        .uri()
        .path()
        .strip_prefix(ASSETS_PREFIX.trim_end_matches('/'))
        .unwrap_or("/")
        .to_string();
    if let Ok(uri) = Uri::try_from(rest) {
        *request.uri_mut() = uri;
    }
    request
}

fn static_assets(dir: &str) -> BoxedHandler {
    tagged(
        RouteType::Static,
        ServiceBuilder::new()
            .map_response(|response: Response<ServeFileSystemResponseBody>| {
                response.into_response()
            })
            .map_request(strip_assets_prefix)
            .service(ServeDir::new(dir)),
    )
}

/// Register every route.
///
/// Order matters: the table dispatches to the first matching template, so
/// literal segments (`/api/members/me`) must come before any placeholder
/// template at the same position.
pub fn route_table<S: HasServices>(
    state: &S,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<RouteTable> {
    use api::{auth, health, member, preferences, sketch};

    let mut table = RouteTable::new();
    table
        // Operations
        .register(Method::GET, "/health", tagged(RouteType::Ops, health::health.with_state(())))?
        .register(
            Method::GET,
            "/ready",
            tagged(RouteType::Ops, health::ready::<S>.with_state(state.clone())),
        )?
        .register(
            Method::GET,
            "/metrics",
            tagged(
                RouteType::Ops,
                api::metrics::metrics_handler.with_state(Arc::new(metrics_handle)),
            ),
        )?
        // Auth
        .register(Method::POST, "/api/auth/register", public(state, auth::register::<S>))?
        .register(Method::POST, "/api/auth/sign-in", public(state, auth::sign_in::<S>))?
        .register(Method::POST, "/api/auth/sign-out", protected(state, auth::sign_out::<S>))?
        .register(Method::POST, "/api/auth/logout", public(state, auth::logout::<S>))?
        .register(Method::GET, "/api/auth/sign-out", public(state, auth::sign_out_redirect::<S>))?
        // Preferences
        .register(Method::POST, "/api/preferences/theme", public(state, preferences::set_theme))?
        .register(Method::POST, "/api/preferences/locale", public(state, preferences::set_locale))?
        // Members
        .register(Method::GET, "/api/members", public(state, member::list_members::<S>))?
        .register(Method::GET, "/api/members/me", protected(state, member::me::<S>))?
        .register(Method::PATCH, "/api/members/me", protected(state, member::change_password::<S>))?
        // Sketches
        .register(
            Method::GET,
            "/api/sketches/{member_name}",
            public(state, sketch::list_sketches::<S>),
        )?
        .register(
            Method::GET,
            "/api/sketches/{member_name}/{sketch_slug}",
            public(state, sketch::get_source::<S>),
        )?
        .register(
            Method::POST,
            "/api/sketches/{member_name}/{sketch_slug}",
            protected(state, sketch::create_sketch::<S>),
        )?
        .register(
            Method::PUT,
            "/api/sketches/{member_name}/{sketch_slug}",
            protected(state, sketch::update_source::<S>),
        )?
        .register(
            Method::PATCH,
            "/api/sketches/{member_name}/{sketch_slug}",
            protected(state, sketch::update_metadata::<S>),
        )?
        .register(
            Method::DELETE,
            "/api/sketches/{member_name}/{sketch_slug}",
            protected(state, sketch::delete_sketch::<S>),
        )?;

    table.register_prefix(ASSETS_PREFIX, static_assets(&state.config().static_assets_dir));

    Ok(table)
}

/// Build the HTTP router with generic state type
///
/// Generic over the state so tests can drive the production route table
/// with in-memory repositories.
pub fn build_router<S: HasServices>(
    state: S,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<Router> {
    let table = route_table(&state, metrics_handle)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .fallback_service(table.into_service())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}
