//! Business logic layer

pub mod identity;
pub mod member;
pub mod password;
pub mod session;
pub mod sketch;
pub mod slug;

pub use identity::IdentityService;
pub use member::MemberService;
pub use session::{SessionError, SessionService};
pub use sketch::SketchService;
