use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer: all blog mutation endpoints.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module, so unauthenticated
/// requests are rejected before any handler body runs. Note that update and
/// delete intentionally perform **no ownership or role check** beyond the
/// authentication itself: any logged-in user may mutate any blog.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/blogs
        // Submits a new blog post. The author field is taken from the body and
        // only validated for identifier shape.
        .route("/api/blogs", post(handlers::create_blog))
        // PUT/DELETE /api/blogs/{id}
        // Partial update and removal. Absent update fields keep their stored values.
        .route(
            "/api/blogs/{id}",
            put(handlers::update_blog).delete(handlers::delete_blog),
        )
}
