use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): the login gateway and read-only blog access.
///
/// Listing and fetching blogs deliberately require no token; only mutation is
/// gated, and that gating lives in the authenticated router module.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login
        // Exchanges email/password credentials for a signed bearer token.
        .route("/api/auth/login", post(handlers::login_user))
        // GET /api/blogs
        // Lists every stored blog post.
        .route("/api/blogs", get(handlers::list_blogs))
        // GET /api/blogs/{id}
        // Retrieves a single blog post, or 404 with "Blog not found".
        .route("/api/blogs/{id}", get(handlers::get_blog))
}
