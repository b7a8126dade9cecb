use async_trait::async_trait;
use sqlx::PgPool;

use crate::{blogs::repo_types::Blog, db::StoreError};

/// Persistence capability the blog service depends on. Every listing is
/// ordered newest first.
#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn create(&self, user_id: i64, title: &str, content: &str) -> Result<Blog, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Blog>, StoreError>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Blog>, StoreError>;
    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Blog>, StoreError>;
    /// Case-insensitive substring match on title or content.
    async fn search(&self, query: &str) -> Result<Vec<Blog>, StoreError>;
    /// Updates only when `user_id` owns the row; `None` otherwise.
    async fn update_owned(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Blog>, StoreError>;
    /// Deletes only when `user_id` owns the row; returns rows affected.
    async fn delete_owned(&self, id: i64, user_id: i64) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgBlogStore {
    db: PgPool,
}

impl PgBlogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// `%query%` with LIKE metacharacters escaped.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl BlogStore for PgBlogStore {
    async fn create(&self, user_id: i64, title: &str, content: &str) -> Result<Blog, StoreError> {
        sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (user_id, title, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, content, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "insert blog"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Blog>, StoreError> {
        sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM blogs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "find blog by id"))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Blog>, StoreError> {
        sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM blogs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "list blogs by user"))
    }

    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Blog>, StoreError> {
        sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM blogs
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "list blogs"))
    }

    async fn search(&self, query: &str) -> Result<Vec<Blog>, StoreError> {
        sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM blogs
            WHERE title ILIKE $1 ESCAPE '\' OR content ILIKE $1 ESCAPE '\'
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(like_pattern(query))
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "search blogs"))
    }

    async fn update_owned(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Blog>, StoreError> {
        sqlx::query_as::<_, Blog>(
            r#"
            UPDATE blogs
            SET title = $1, content = $2, updated_at = NOW()
            WHERE id = $3 AND user_id = $4
            RETURNING id, user_id, title, content, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "update blog"))
    }

    async fn delete_owned(&self, id: i64, user_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM blogs WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "delete blog"))?;
        Ok(result.rows_affected())
    }
}
