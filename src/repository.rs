use crate::models::{Blog, CreateBlogRequest, CreateUserRequest, Role, UpdateBlogRequest, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations: the credential
/// store (users, password hashing and comparison) and the blog store. Handlers
/// interact with the data layer through this trait without knowing the concrete
/// implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---

    /// Inserts a new user with `Role::User`. The plaintext password is
    /// irreversibly bcrypt-hashed before persistence. Returns `None` when the
    /// insert fails (a unique-index violation on username or email included),
    /// which is the actual safety net under concurrent registration.
    async fn create_user(&self, req: CreateUserRequest) -> Option<User>;
    async fn find_user_by_email(&self, email: &str) -> Option<User>;
    /// Resolves a token subject back to a stored user during authentication.
    async fn find_user_by_id(&self, id: Uuid) -> Option<User>;

    /// Compares a plaintext candidate against the stored bcrypt hash. Failure to
    /// parse the stored hash counts as a mismatch.
    fn verify_password(&self, user: &User, candidate: &str) -> bool {
        bcrypt::verify(candidate, &user.password).unwrap_or(false)
    }

    // --- Blog Store ---

    async fn create_blog(&self, req: CreateBlogRequest) -> Option<Blog>;
    async fn list_blogs(&self) -> Vec<Blog>;
    async fn get_blog(&self, id: Uuid) -> Option<Blog>;
    /// Partial update: `None` fields keep the stored value (COALESCE). Returns
    /// `None` if no row matches the id.
    async fn update_blog(&self, id: Uuid, req: UpdateBlogRequest) -> Option<Blog>;
    /// Returns true only if a row was actually removed.
    async fn delete_blog(&self, id: Uuid) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
/// Queries use the runtime-checked sqlx API; row mapping comes from the `FromRow`
/// derives on the models.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// create_user
    ///
    /// Hash-before-persist: the plaintext never reaches the database. A failed
    /// insert (duplicate username/email included) is logged and degrades to `None`.
    async fn create_user(&self, req: CreateUserRequest) -> Option<User> {
        let password_hash = match bcrypt::hash(&req.password, bcrypt::DEFAULT_COST) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!("password hash error: {:?}", e);
                return None;
            }
        };

        let new_id = Uuid::new_v4();
        match sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING id, username, email, password, role, created_at, updated_at
            "#,
        )
        .bind(new_id)
        .bind(&req.username)
        .bind(&req.email)
        .bind(&password_hash)
        .bind(Role::User.as_str())
        .fetch_one(&self.pool)
        .await
        {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!("create_user error: {:?}", e);
                None
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, role, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user_by_email error: {:?}", e);
            None
        })
    }

    async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, role, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user_by_id error: {:?}", e);
            None
        })
    }

    /// create_blog
    ///
    /// The author value has already been shape-validated; it is stored as given
    /// without checking that the referenced user exists.
    async fn create_blog(&self, req: CreateBlogRequest) -> Option<Blog> {
        let author = match Uuid::parse_str(&req.author) {
            Ok(author) => author,
            Err(e) => {
                tracing::error!("create_blog author parse error: {:?}", e);
                return None;
            }
        };

        let new_id = Uuid::new_v4();
        match sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (id, title, content, author, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, title, content, author, created_at, updated_at
            "#,
        )
        .bind(new_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(author)
        .fetch_one(&self.pool)
        .await
        {
            Ok(blog) => Some(blog),
            Err(e) => {
                tracing::error!("create_blog error: {:?}", e);
                None
            }
        }
    }

    async fn list_blogs(&self) -> Vec<Blog> {
        match sqlx::query_as::<_, Blog>(
            "SELECT id, title, content, author, created_at, updated_at FROM blogs ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(blogs) => blogs,
            Err(e) => {
                tracing::error!("list_blogs error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_blog(&self, id: Uuid) -> Option<Blog> {
        sqlx::query_as::<_, Blog>(
            "SELECT id, title, content, author, created_at, updated_at FROM blogs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_blog error: {:?}", e);
            None
        })
    }

    /// update_blog
    ///
    /// Uses the PostgreSQL `COALESCE` function to handle the `Option<T>` fields,
    /// only updating a column when the corresponding field is `Some`. A missing
    /// row falls out as `None` (mapped to 404 by the handler).
    async fn update_blog(&self, id: Uuid, req: UpdateBlogRequest) -> Option<Blog> {
        let author = match req.author.as_deref().map(Uuid::parse_str) {
            Some(Ok(author)) => Some(author),
            Some(Err(e)) => {
                tracing::error!("update_blog author parse error: {:?}", e);
                return None;
            }
            None => None,
        };

        sqlx::query_as::<_, Blog>(
            r#"
            UPDATE blogs
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                author = COALESCE($4, author),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, content, author, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.content)
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_blog error: {:?}", e);
            None
        })
    }

    async fn delete_blog(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_blog error: {:?}", e);
                false
            }
        }
    }
}

// --- Mock Implementation (For Tests) ---

/// MockRepository
///
/// An in-memory implementation of `Repository` used exclusively for unit and
/// integration testing. It mirrors the production semantics that matter to the
/// handlers (unique username/email, hash-before-persist, COALESCE-style partial
/// updates) without requiring a running Postgres instance.
#[derive(Default)]
pub struct MockRepository {
    users: Mutex<Vec<User>>,
    blogs: Mutex<Vec<Blog>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// seed_user
    ///
    /// Test analogue of direct store insertion for bootstrapping: creates a user
    /// with an arbitrary role (registration itself only ever produces `Role::User`).
    pub fn seed_user(&self, username: &str, email: &str, password: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password: bcrypt::hash(password, bcrypt::DEFAULT_COST).expect("bcrypt hash"),
            role,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn create_user(&self, req: CreateUserRequest) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        // The in-memory stand-in for the UNIQUE indexes.
        if users
            .iter()
            .any(|u| u.username == req.username || u.email == req.email)
        {
            return None;
        }

        let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST).ok()?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: req.username,
            email: req.email,
            password: password_hash,
            role: Role::User,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Some(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    async fn create_blog(&self, req: CreateBlogRequest) -> Option<Blog> {
        let author = Uuid::parse_str(&req.author).ok()?;
        let now = Utc::now();
        let blog = Blog {
            id: Uuid::new_v4(),
            title: req.title,
            content: req.content,
            author,
            created_at: now,
            updated_at: now,
        };
        self.blogs.lock().unwrap().push(blog.clone());
        Some(blog)
    }

    async fn list_blogs(&self) -> Vec<Blog> {
        self.blogs.lock().unwrap().clone()
    }

    async fn get_blog(&self, id: Uuid) -> Option<Blog> {
        self.blogs
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    async fn update_blog(&self, id: Uuid, req: UpdateBlogRequest) -> Option<Blog> {
        let author = match req.author.as_deref().map(Uuid::parse_str) {
            Some(Ok(author)) => Some(author),
            Some(Err(_)) => return None,
            None => None,
        };

        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs.iter_mut().find(|b| b.id == id)?;
        if let Some(title) = req.title {
            blog.title = title;
        }
        if let Some(content) = req.content {
            blog.content = content;
        }
        if let Some(author) = author {
            blog.author = author;
        }
        blog.updated_at = Utc::now();
        Some(blog.clone())
    }

    async fn delete_blog(&self, id: Uuid) -> bool {
        let mut blogs = self.blogs.lock().unwrap();
        let before = blogs.len();
        blogs.retain(|b| b.id != id);
        blogs.len() < before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn create_user_hashes_the_password_and_defaults_the_role() {
        let repo = MockRepository::new();
        let user = repo
            .create_user(create_request("testuser", "test@example.com"))
            .await
            .unwrap();

        assert_eq!(user.role, Role::User);
        assert_ne!(user.password, "password123");
        assert!(repo.verify_password(&user, "password123"));
        assert!(!repo.verify_password(&user, "wrongpassword"));
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() {
        let repo = MockRepository::new();
        repo.create_user(create_request("testuser", "test@example.com"))
            .await
            .unwrap();

        let dup_email = repo
            .create_user(create_request("otheruser", "test@example.com"))
            .await;
        assert!(dup_email.is_none());

        let dup_username = repo
            .create_user(create_request("testuser", "other@example.com"))
            .await;
        assert!(dup_username.is_none());
    }

    #[tokio::test]
    async fn update_blog_keeps_fields_that_are_not_provided() {
        let repo = MockRepository::new();
        let author = Uuid::new_v4();
        let blog = repo
            .create_blog(CreateBlogRequest {
                title: "Original Title".to_string(),
                content: "Original content body".to_string(),
                author: author.to_string(),
            })
            .await
            .unwrap();

        let updated = repo
            .update_blog(
                blog.id,
                UpdateBlogRequest {
                    title: Some("New Title".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New Title");
        assert_eq!(updated.content, "Original content body");
        assert_eq!(updated.author, author);
    }

    #[tokio::test]
    async fn delete_blog_reports_whether_a_row_was_removed() {
        let repo = MockRepository::new();
        let blog = repo
            .create_blog(CreateBlogRequest {
                title: "A Title".to_string(),
                content: "Content long enough".to_string(),
                author: Uuid::new_v4().to_string(),
            })
            .await
            .unwrap();

        assert!(repo.delete_blog(blog.id).await);
        assert!(!repo.delete_blog(blog.id).await);
        assert!(repo.get_blog(blog.id).await.is_none());
    }
}
