use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Blog post row. Serialized as-is in responses.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Blog {
    pub id: i64,
    pub user_id: i64, // owner, users.id
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
