use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::password::{hash_password, verify_password},
    db::StoreError,
    error::AppError,
    users::{
        repo::UserStore,
        repo_types::{PublicUser, UserProfile},
    },
};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Creates an account. The username lookup is only a fast path: the
    /// datastore's unique index decides, and losing that race is reported
    /// as `UsernameTaken` too.
    pub async fn register(&self, username: &str, password: &str) -> Result<PublicUser, AppError> {
        let username = username.trim();
        require_credentials(username, password)?;

        if self.store.find_by_username(username).await?.is_some() {
            warn!(%username, "username already taken");
            return Err(AppError::UsernameTaken);
        }

        let password = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("join password hashing task")?
            .context("hash password")?;

        let user = match self.store.create(username, &hash).await {
            Ok(u) => u,
            Err(StoreError::UniqueViolation(detail)) => {
                warn!(%username, %detail, "username claimed concurrently");
                return Err(AppError::UsernameTaken);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user.into())
    }

    /// Unknown username and wrong password fail identically.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<PublicUser, AppError> {
        let username = username.trim();
        require_credentials(username, password)?;

        let Some(user) = self.store.find_by_username(username).await? else {
            warn!(%username, "login unknown username");
            return Err(AppError::InvalidCredentials);
        };

        let password = password.to_owned();
        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("join password verification task")?
            .context("verify password")?;

        if !ok {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = user.id, "user logged in");
        Ok(user.into())
    }

    pub async fn get_profile(&self, id: i64) -> Result<UserProfile, AppError> {
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        let blog_count = self.store.count_blogs(id).await?;
        Ok(UserProfile {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
            blog_count,
        })
    }
}

fn require_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password cannot be empty".into(),
        ));
    }
    Ok(())
}
