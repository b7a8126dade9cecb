use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::AppConfig, error::AppError};

/// Failure from a repository call. Services branch on the constraint
/// variants; everything else is an opaque datastore failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Wraps a sqlx error, keeping constraint violations distinguishable.
    pub fn from_sqlx(err: sqlx::Error, op: &'static str) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(db_err.message().to_string());
            }
        }
        StoreError::Other(anyhow::Error::new(err).context(op))
    }
}

/// Default translation for paths where a constraint violation is not an
/// expected outcome; services match on the variants first when it is.
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Other(inner) => AppError::Internal(inner),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_opaque_with_context() {
        let err = StoreError::from_sqlx(sqlx::Error::RowNotFound, "load blog");
        match err {
            StoreError::Other(e) => assert_eq!(e.to_string(), "load blog"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
