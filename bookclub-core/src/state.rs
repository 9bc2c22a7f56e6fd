//! Application state traits for dependency injection
//!
//! Handlers are generic over [`HasServices`] so the same code runs against
//! the production `AppState` and the in-memory state used by tests.

use crate::config::Config;
use crate::repository::{MemberRepository, SessionRepository, SketchRepository};
use crate::service::{IdentityService, MemberService, SessionService, SketchService};

/// Trait for application state that provides access to all services.
pub trait HasServices: Clone + Send + Sync + 'static {
    /// The member repository type
    type MemberRepo: MemberRepository;
    /// The session repository type
    type SessionRepo: SessionRepository;
    /// The sketch repository type
    type SketchRepo: SketchRepository;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the session store adapter
    fn session_service(&self) -> &SessionService<Self::SessionRepo>;

    /// Get the member service
    fn member_service(&self) -> &MemberService<Self::MemberRepo>;

    /// Get the identity and ownership service
    fn identity_service(&self) -> &IdentityService<Self::MemberRepo, Self::SessionRepo>;

    /// Get the sketch service
    fn sketch_service(&self) -> &SketchService<Self::SketchRepo, Self::MemberRepo>;

    /// Check whether the backing store is reachable
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
