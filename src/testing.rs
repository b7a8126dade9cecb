//! In-memory stand-ins for the Postgres stores, used by unit and router tests.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    blogs::{repo::BlogStore, repo_types::Blog},
    db::StoreError,
    users::{repo::UserStore, repo_types::User},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    blogs: Vec<Blog>,
    next_user_id: i64,
    next_blog_id: i64,
}

/// Both stores over one set of tables, so blog counts and the owner
/// foreign key behave like the real schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    calls: Arc<AtomicUsize>,
    stale_username_lookup: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store methods invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes username lookups miss, as if a concurrent registration had not
    /// committed yet when the pre-check ran.
    pub fn simulate_registration_race(&self) {
        self.stale_username_lookup.store(true, Ordering::SeqCst);
    }

    pub fn blog_rows(&self) -> usize {
        self.tables.lock().unwrap().blogs.len()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn newest_first(mut blogs: Vec<Blog>) -> Vec<Blog> {
    blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    blogs
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.touch();
        let mut t = self.tables.lock().unwrap();
        let lower = username.to_lowercase();
        if t.users.iter().any(|u| u.username.to_lowercase() == lower) {
            return Err(StoreError::UniqueViolation(
                "duplicate key value violates unique constraint \"users_username_lower_idx\"".into(),
            ));
        }
        t.next_user_id += 1;
        let user = User {
            id: t.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.touch();
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.touch();
        if self.stale_username_lookup.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let t = self.tables.lock().unwrap();
        let lower = username.to_lowercase();
        Ok(t.users
            .iter()
            .find(|u| u.username.to_lowercase() == lower)
            .cloned())
    }

    async fn count_blogs(&self, user_id: i64) -> Result<i64, StoreError> {
        self.touch();
        let t = self.tables.lock().unwrap();
        Ok(t.blogs.iter().filter(|b| b.user_id == user_id).count() as i64)
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn create(&self, user_id: i64, title: &str, content: &str) -> Result<Blog, StoreError> {
        self.touch();
        let mut t = self.tables.lock().unwrap();
        if !t.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::ForeignKeyViolation(
                "insert or update on table \"blogs\" violates foreign key constraint".into(),
            ));
        }
        t.next_blog_id += 1;
        let now = OffsetDateTime::now_utc();
        let blog = Blog {
            id: t.next_blog_id,
            user_id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.blogs.push(blog.clone());
        Ok(blog)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Blog>, StoreError> {
        self.touch();
        let t = self.tables.lock().unwrap();
        Ok(t.blogs.iter().find(|b| b.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Blog>, StoreError> {
        self.touch();
        let t = self.tables.lock().unwrap();
        let rows = t.blogs.iter().filter(|b| b.user_id == user_id).cloned().collect();
        Ok(newest_first(rows))
    }

    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Blog>, StoreError> {
        self.touch();
        let t = self.tables.lock().unwrap();
        Ok(newest_first(t.blogs.clone())
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Blog>, StoreError> {
        self.touch();
        let t = self.tables.lock().unwrap();
        let needle = query.to_lowercase();
        let rows = t
            .blogs
            .iter()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn update_owned(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Blog>, StoreError> {
        self.touch();
        let mut t = self.tables.lock().unwrap();
        let Some(blog) = t
            .blogs
            .iter_mut()
            .find(|b| b.id == id && b.user_id == user_id)
        else {
            return Ok(None);
        };
        blog.title = title.to_string();
        blog.content = content.to_string();
        blog.updated_at = OffsetDateTime::now_utc();
        Ok(Some(blog.clone()))
    }

    async fn delete_owned(&self, id: i64, user_id: i64) -> Result<u64, StoreError> {
        self.touch();
        let mut t = self.tables.lock().unwrap();
        let before = t.blogs.len();
        t.blogs.retain(|b| !(b.id == id && b.user_id == user_id));
        Ok((before - t.blogs.len()) as u64)
    }
}
