use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The coarse authorization tag carried by every user record: 'admin' or 'user'.
/// Stored as text in the `users` table and compared during the admin gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl From<String> for Role {
    /// Unknown values degrade to the least-privileged role.
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// User
///
/// Represents the user's canonical identity record stored in the `users` table.
/// The password field holds the bcrypt hash, never the plaintext, and is excluded
/// from every JSON response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    // Unique display identifier.
    pub username: String,
    // The user's primary login identifier. Unique.
    pub email: String,
    /// bcrypt hash of the password. `skip_serializing` keeps it out of responses.
    #[serde(skip_serializing, default)]
    pub password: String,
    // The RBAC field: 'admin' or 'user'.
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Blog
///
/// Represents a blog post record from the `blogs` table.
/// `author` references `users.id` but is format-validated only; no referential
/// integrity is enforced at write time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// validate_author_id
///
/// Field-level check that an incoming author value is shaped like a store-assigned
/// identifier (UUID). Existence of the referenced user is deliberately not checked.
fn validate_author_id(author: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(author)
        .map(|_| ())
        .map_err(|_| ValidationError::new("author_id"))
}

/// CreateUserRequest
///
/// Input payload for the admin-only registration endpoint (POST /api/auth/register).
/// The plaintext password is hashed by the repository before persistence and is
/// never stored or logged as-is. The role is not accepted from the body; new
/// accounts always start as `Role::User`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 30, message = "username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, max = 20, message = "password must be 6-20 characters"))]
    pub password: String,
}

/// LoginUserRequest
///
/// Input payload for POST /api/auth/login. The password has no length bound here;
/// it only has to be present.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct LoginUserRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// CreateBlogRequest
///
/// Input payload for submitting a new blog post (POST /api/blogs).
/// `author` arrives as a string and is only checked for identifier shape.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct CreateBlogRequest {
    #[validate(length(min = 3, max = 100, message = "title must be 3-100 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 5000, message = "content must be 10-5000 characters"))]
    pub content: String,
    #[validate(custom(function = validate_author_id, message = "author must be a valid user id"))]
    pub author: String,
}

/// UpdateBlogRequest
///
/// Partial update payload for PUT /api/blogs/{id}.
///
/// Every field is optional: absent (or JSON null) fields skip validation and keep
/// the stored value, while present fields must still satisfy the create-time bounds.
/// Uses `#[serde(skip_serializing_if = "Option::is_none")]` so only provided fields
/// appear when the payload is re-serialized.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct UpdateBlogRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 100, message = "title must be 3-100 characters"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 10, max = 5000, message = "content must be 10-5000 characters"))]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = validate_author_id, message = "author must be a valid user id"))]
    pub author: Option<String>,
}

// --- Response Schemas (Output) ---

/// AuthResponse
///
/// Output schema shared by registration (201) and login (200): the public identity
/// fields plus a freshly issued bearer token for the subject user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct AuthResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// ApiMessage
///
/// Minimal `{"message": "..."}` response body used by every structured failure
/// path and by the delete confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_request_accepts_valid_input() {
        let req = CreateUserRequest {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_user_request_rejects_out_of_bound_fields() {
        let short_username = CreateUserRequest {
            username: "ab".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(short_username.validate().is_err());

        let bad_email = CreateUserRequest {
            username: "testuser".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = CreateUserRequest {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());

        let long_password = CreateUserRequest {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "p".repeat(21),
        };
        assert!(long_password.validate().is_err());
    }

    #[test]
    fn login_request_requires_well_formed_email_and_any_password() {
        let ok = LoginUserRequest {
            email: "test@example.com".to_string(),
            password: "x".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty_password = LoginUserRequest {
            email: "test@example.com".to_string(),
            password: String::new(),
        };
        assert!(empty_password.validate().is_err());
    }

    #[test]
    fn create_blog_request_checks_bounds_and_author_shape() {
        let author = Uuid::new_v4().to_string();

        let ok = CreateBlogRequest {
            title: "A Title".to_string(),
            content: "Content long enough".to_string(),
            author: author.clone(),
        };
        assert!(ok.validate().is_ok());

        let short_content = CreateBlogRequest {
            title: "A Title".to_string(),
            content: "short".to_string(),
            author: author.clone(),
        };
        assert!(short_content.validate().is_err());

        let bad_author = CreateBlogRequest {
            title: "A Title".to_string(),
            content: "Content long enough".to_string(),
            author: "not-a-uuid".to_string(),
        };
        assert!(bad_author.validate().is_err());
    }

    #[test]
    fn update_blog_request_skips_absent_fields_but_validates_present_ones() {
        // Nothing provided: nothing to violate.
        let empty = UpdateBlogRequest::default();
        assert!(empty.validate().is_ok());

        let title_only = UpdateBlogRequest {
            title: Some("New Title".to_string()),
            ..Default::default()
        };
        assert!(title_only.validate().is_ok());

        // A present-but-empty string still has to meet the create-time bounds.
        let empty_title = UpdateBlogRequest {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(empty_title.validate().is_err());

        let bad_author = UpdateBlogRequest {
            author: Some("42".to_string()),
            ..Default::default()
        };
        assert!(bad_author.validate().is_err());
    }

    #[test]
    fn role_decodes_from_stored_text() {
        assert_eq!(Role::from("admin".to_string()), Role::Admin);
        assert_eq!(Role::from("user".to_string()), Role::User);
        assert_eq!(Role::from("something-else".to_string()), Role::User);
    }

    #[test]
    fn user_serialization_never_exposes_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "$2b$12$secret-hash".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("secret-hash"));
    }
}
