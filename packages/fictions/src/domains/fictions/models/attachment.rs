use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{AttachmentId, FictionId, StoreResult};

/// File attached to a fiction. Bytes live in file storage under `file_key`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: AttachmentId,
    pub fiction_id: FictionId,
    pub title: String,
    pub content_type: String,
    pub file_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub fiction_id: FictionId,
    pub title: String,
    pub content_type: String,
    pub file_key: String,
}

impl Attachment {
    pub async fn insert(new: &NewAttachment, pool: &PgPool) -> StoreResult<Self> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (fiction_id, title, content_type, file_key)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.fiction_id)
        .bind(&new.title)
        .bind(&new.content_type)
        .bind(&new.file_key)
        .fetch_one(pool)
        .await?;
        Ok(attachment)
    }

    pub async fn find_by_fiction(fiction_id: FictionId, pool: &PgPool) -> StoreResult<Vec<Self>> {
        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT * FROM attachments WHERE fiction_id = $1 ORDER BY id",
        )
        .bind(fiction_id)
        .fetch_all(pool)
        .await?;
        Ok(attachments)
    }
}
