// web-server/src/middleware/mod.rs
pub mod guard;
pub mod identity;
pub mod session;

pub use guard::{require_permission, require_project_owner, AuthGuard};
pub use identity::{current_user, AuthUser, CurrentUser, Identity};
pub use session::{csrf_token, secure_cookie, CsrfToken, SessionCsrf};
