use async_trait::async_trait;
use sqlx::PgPool;

use crate::{db::StoreError, users::repo_types::User};

/// Persistence capability the user service depends on.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. A clash with an existing username (any case) is
    /// reported as `StoreError::UniqueViolation`.
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// Case-insensitive lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn count_blogs(&self, user_id: i64) -> Result<i64, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "insert user"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "find user by id"))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "find user by username"))
    }

    async fn count_blogs(&self, user_id: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(id) FROM blogs WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "count blogs for user"))
    }
}
