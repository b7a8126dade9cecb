use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    blogs::{repo::BlogStore, repo_types::Blog},
    db::StoreError,
    error::AppError,
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn BlogStore>,
}

impl BlogService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: i64, title: &str, content: &str) -> Result<Blog, AppError> {
        let (title, content) = require_fields(title, content)?;
        match self.store.create(user_id, title, content).await {
            Ok(blog) => {
                info!(blog_id = blog.id, user_id, "blog created");
                Ok(blog)
            }
            Err(StoreError::ForeignKeyViolation(detail)) => {
                warn!(user_id, %detail, "blog owner does not exist");
                Err(AppError::Unauthorized("User not found".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Blog, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog not found".into()))
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Blog>, AppError> {
        Ok(self.store.list_by_user(user_id).await?)
    }

    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Blog>, AppError> {
        if limit < 1 {
            return Err(AppError::Validation("Invalid limit parameter".into()));
        }
        if offset < 0 {
            return Err(AppError::Validation("Invalid offset parameter".into()));
        }
        Ok(self.store.list_all(limit.min(MAX_PAGE_SIZE), offset).await?)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Blog>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Search query is required".into()));
        }
        Ok(self.store.search(query).await?)
    }

    /// Only the owner may update. A missing blog and someone else's blog
    /// both yield `NotFoundOrForbidden`.
    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Blog, AppError> {
        let (title, content) = require_fields(title, content)?;
        match self.store.update_owned(id, user_id, title, content).await? {
            Some(blog) => {
                info!(blog_id = id, user_id, "blog updated");
                Ok(blog)
            }
            None => {
                warn!(blog_id = id, user_id, "update matched no owned blog");
                Err(AppError::NotFoundOrForbidden)
            }
        }
    }

    /// Same ownership rule as `update`.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), AppError> {
        let affected = self.store.delete_owned(id, user_id).await?;
        if affected == 0 {
            warn!(blog_id = id, user_id, "delete matched no owned blog");
            return Err(AppError::NotFoundOrForbidden);
        }
        info!(blog_id = id, user_id, "blog deleted");
        Ok(())
    }
}

fn require_fields<'a>(title: &'a str, content: &'a str) -> Result<(&'a str, &'a str), AppError> {
    let (title, content) = (title.trim(), content.trim());
    if title.is_empty() || content.is_empty() {
        return Err(AppError::Validation(
            "Title and content cannot be empty".into(),
        ));
    }
    Ok((title, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::MemoryStore, users::services::UserService};

    struct Fixture {
        store: MemoryStore,
        users: UserService,
        blogs: BlogService,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        Fixture {
            users: UserService::new(Arc::new(store.clone())),
            blogs: BlogService::new(Arc::new(store.clone())),
            store,
        }
    }

    #[tokio::test]
    async fn blank_fields_never_reach_the_store() {
        let f = fixture();
        for (title, content) in [("", "body"), ("title", ""), ("  \t", "body"), ("title", "\n ")] {
            let err = f.blogs.create(1, title, content).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            let err = f.blogs.update(1, 1, title, content).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(f.store.calls(), 0);
    }

    #[tokio::test]
    async fn create_for_vanished_owner_is_unauthorized() {
        let f = fixture();
        let err = f.blogs.create(999, "T", "C").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "User not found"));
        assert_eq!(f.store.blog_rows(), 0);
    }

    #[tokio::test]
    async fn create_records_owner() {
        let f = fixture();
        let alice = f.users.register("alice", "pw").await.unwrap();
        let blog = f.blogs.create(alice.id, " T ", "C").await.unwrap();
        assert_eq!(blog.user_id, alice.id);
        assert_eq!(blog.title, "T");
        assert_eq!(f.blogs.get(blog.id).await.unwrap(), blog);
    }

    #[tokio::test]
    async fn create_for_unknown_owner_is_not_found() {
        let f = fixture();
        let err = f.blogs.create(404, "T", "C").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_owner_gated() {
        let f = fixture();
        let alice = f.users.register("alice", "pw").await.unwrap();
        let bob = f.users.register("bob", "pw").await.unwrap();
        let blog = f.blogs.create(bob.id, "T", "C").await.unwrap();

        let err = f.blogs.delete(blog.id, alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundOrForbidden));
        assert_eq!(f.store.blog_rows(), 1);

        f.blogs.delete(blog.id, bob.id).await.unwrap();
        assert_eq!(f.store.blog_rows(), 0);

        let err = f.blogs.delete(blog.id, bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundOrForbidden));
    }

    #[tokio::test]
    async fn update_is_owner_gated() {
        let f = fixture();
        let alice = f.users.register("alice", "pw").await.unwrap();
        let bob = f.users.register("bob", "pw").await.unwrap();
        let blog = f.blogs.create(alice.id, "T", "C").await.unwrap();

        let err = f.blogs.update(blog.id, bob.id, "X", "Y").await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundOrForbidden));

        let updated = f.blogs.update(blog.id, alice.id, "X", "Y").await.unwrap();
        assert_eq!(updated.title, "X");
        assert_eq!(updated.content, "Y");
        assert!(updated.updated_at >= blog.updated_at);
    }

    #[tokio::test]
    async fn list_all_validates_and_pages() {
        let f = fixture();
        let alice = f.users.register("alice", "pw").await.unwrap();
        for i in 0..3 {
            f.blogs.create(alice.id, &format!("T{i}"), "C").await.unwrap();
        }

        assert!(matches!(
            f.blogs.list_all(0, 0).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            f.blogs.list_all(10, -1).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let page = f.blogs.list_all(2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "T2");
        let rest = f.blogs.list_all(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "T0");
    }

    #[tokio::test]
    async fn search_requires_query_and_matches_case_insensitively() {
        let f = fixture();
        let alice = f.users.register("alice", "pw").await.unwrap();
        f.blogs.create(alice.id, "Learning Rust", "ownership").await.unwrap();
        f.blogs.create(alice.id, "Gardening", "tomatoes and RUST on tools").await.unwrap();
        f.blogs.create(alice.id, "Cooking", "pasta").await.unwrap();

        assert!(matches!(
            f.blogs.search("   ").await.unwrap_err(),
            AppError::Validation(_)
        ));
        let hits = f.blogs.search("rust").await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
