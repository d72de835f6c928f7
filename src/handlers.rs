use crate::{
    AppState,
    auth::{AuthUser, issue_token},
    models::{
        ApiMessage, AuthResponse, Blog, CreateBlogRequest, CreateUserRequest, LoginUserRequest,
        UpdateBlogRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;
use validator::Validate;

// --- User Handlers ---

/// register_user
///
/// [Admin Route] Creates a new user account. Only an authenticated admin may call
/// this; the admin gate runs after the extractor has resolved the caller, so an
/// authenticated non-admin receives the dedicated 403 message.
///
/// *Flow*: admin check → body validation (400 with the violation list) →
/// duplicate-email check (400 "User already exists") → insert with the password
/// hashed inside the repository → 201 with a token issued for the *new* user.
/// An insert that fails anyway (e.g. a registration race losing to the unique
/// index) is a 400 "Invalid user data".
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Validation failure or duplicate user"),
        (status = 401, description = "Token failed"),
        (status = 403, description = "No token / not an admin")
    )
)]
pub async fn register_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Response {
    if let Err(rejection) = auth_user.require_admin() {
        return rejection.into_response();
    }

    if let Err(errors) = payload.validate() {
        tracing::error!("Validation error: {:?}", errors);
        return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
    }

    if state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .is_some()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::new("User already exists")),
        )
            .into_response();
    }

    match state.repo.create_user(payload).await {
        Some(user) => match issue_token(user.id, &state.config.jwt_secret) {
            Ok(token) => (
                StatusCode::CREATED,
                Json(AuthResponse {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                    token,
                }),
            )
                .into_response(),
            Err(e) => {
                tracing::error!("token issue error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiMessage::new("Failed to issue token")),
                )
                    .into_response()
            }
        },
        None => (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::new("Invalid user data")),
        )
            .into_response(),
    }
}

/// login_user
///
/// [Public Route] Exchanges email/password credentials for a bearer token.
/// A missing user and a wrong password intentionally collapse into the same
/// 401 response so the endpoint does not reveal which one failed.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginUserRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginUserRequest>,
) -> Response {
    if let Err(errors) = payload.validate() {
        tracing::error!("Validation error: {:?}", errors);
        return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
    }

    let user = state.repo.find_user_by_email(&payload.email).await;

    match user {
        Some(user) if state.repo.verify_password(&user, &payload.password) => {
            match issue_token(user.id, &state.config.jwt_secret) {
                Ok(token) => Json(AuthResponse {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                    token,
                })
                .into_response(),
                Err(e) => {
                    tracing::error!("token issue error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiMessage::new("Failed to issue token")),
                    )
                        .into_response()
                }
            }
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::new("Invalid email or password")),
        )
            .into_response(),
    }
}

// --- Blog Handlers ---

/// create_blog
///
/// [Authenticated Route] Persists a new blog post. The author field comes from
/// the body and is only shape-validated; it is not required to match the caller.
#[utoipa::path(
    post,
    path = "/api/blogs",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog created", body = Blog),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Token failed"),
        (status = 403, description = "No token")
    )
)]
pub async fn create_blog(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateBlogRequest>,
) -> Response {
    if let Err(errors) = payload.validate() {
        tracing::error!("Validation error: {:?}", errors);
        return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
    }

    match state.repo.create_blog(payload).await {
        Some(blog) => (StatusCode::CREATED, Json(blog)).into_response(),
        None => {
            // Persistence faults have no structured mapping on this path.
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::new("Failed to create blog")),
            )
                .into_response()
        }
    }
}

/// list_blogs
///
/// [Public Route] Returns every stored blog post. No auth check by design.
#[utoipa::path(
    get,
    path = "/api/blogs",
    responses((status = 200, description = "All blogs", body = [Blog]))
)]
pub async fn list_blogs(State(state): State<AppState>) -> Json<Vec<Blog>> {
    Json(state.repo.list_blogs().await)
}

/// get_blog
///
/// [Public Route] Retrieves a single blog post by id.
#[utoipa::path(
    get,
    path = "/api/blogs/{id}",
    params(("id" = Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Found", body = Blog),
        (status = 404, description = "Blog not found")
    )
)]
pub async fn get_blog(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.repo.get_blog(id).await {
        Some(blog) => Json(blog).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::new("Blog not found")),
        )
            .into_response(),
    }
}

/// update_blog
///
/// [Authenticated Route] Partially updates a blog post. Fields absent from the
/// body keep their stored values (COALESCE in the repository).
///
/// *Authorization*: any authenticated user may update any blog; there is no
/// ownership or role check on this path.
#[utoipa::path(
    put,
    path = "/api/blogs/{id}",
    params(("id" = Uuid, Path, description = "Blog ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Updated", body = Blog),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Blog not found")
    )
)]
pub async fn update_blog(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Response {
    if let Err(errors) = payload.validate() {
        tracing::error!("Validation error: {:?}", errors);
        return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
    }

    match state.repo.update_blog(id, payload).await {
        Some(blog) => Json(blog).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::new("Blog not found")),
        )
            .into_response(),
    }
}

/// delete_blog
///
/// [Authenticated Route] Removes a blog post by id.
///
/// *Authorization*: any authenticated user may delete any blog; there is no
/// ownership or role check on this path.
#[utoipa::path(
    delete,
    path = "/api/blogs/{id}",
    params(("id" = Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog removed"),
        (status = 404, description = "Blog not found")
    )
)]
pub async fn delete_blog(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.repo.delete_blog(id).await {
        Json(ApiMessage::new("Blog removed")).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::new("Blog not found")),
        )
            .into_response()
    }
}
