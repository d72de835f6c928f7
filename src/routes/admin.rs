use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the 'admin' role.
/// Registration is the only admin surface: new accounts can only be created by
/// an existing administrator.
///
/// Access Control:
/// The handler authenticates the caller through the `AuthUser` extractor and
/// then explicitly checks for the admin role before any handler logic runs.
/// The two checks are ordered (the role check presumes a resolved user), so a
/// missing/invalid token fails with its own status before the role is consulted.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/register
        // Creates a new (non-admin) user account and returns a token for it.
        .route("/api/auth/register", post(handlers::register_user))
}
