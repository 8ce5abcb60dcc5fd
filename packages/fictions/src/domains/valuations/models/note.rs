use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{FictionId, NoteId, StoreResult, UserId};

/// Private note left by an admin or valuator on a fiction.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: NoteId,
    pub fiction_id: FictionId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Note Queries
// =============================================================================

impl Note {
    /// Inserts the note and bumps `notes_count` on the fiction.
    pub async fn create(
        fiction_id: FictionId,
        author_id: UserId,
        body: &str,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        let mut tx = pool.begin().await?;

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO fiction_notes (fiction_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(fiction_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE fictions SET notes_count = notes_count + 1 WHERE id = $1")
            .bind(fiction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(note)
    }

    pub async fn find_by_fiction(fiction_id: FictionId, pool: &PgPool) -> StoreResult<Vec<Self>> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT * FROM fiction_notes WHERE fiction_id = $1 ORDER BY created_at, id",
        )
        .bind(fiction_id)
        .fetch_all(pool)
        .await?;
        Ok(notes)
    }
}
