use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ComponentId, FictionId, StoreError, StoreResult, UserId, VoteId};

/// A citizen's support for a fiction. One per (fiction, author).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: VoteId,
    pub fiction_id: FictionId,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Vote Queries
// =============================================================================

impl Vote {
    /// Inserts the vote and bumps the fiction's counter cache in one
    /// transaction. A duplicate vote is a `Conflict`.
    pub async fn create(fiction_id: FictionId, author_id: UserId, pool: &PgPool) -> StoreResult<Self> {
        let mut tx = pool.begin().await?;

        let vote = sqlx::query_as::<_, Vote>(
            r#"
            INSERT INTO fiction_votes (fiction_id, author_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(fiction_id)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::from_unique(e, "vote"))?;

        sqlx::query("UPDATE fictions SET vote_count = vote_count + 1 WHERE id = $1")
            .bind(fiction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(vote)
    }

    /// Returns whether a vote was removed.
    pub async fn delete(fiction_id: FictionId, author_id: UserId, pool: &PgPool) -> StoreResult<bool> {
        let mut tx = pool.begin().await?;

        let removed = sqlx::query("DELETE FROM fiction_votes WHERE fiction_id = $1 AND author_id = $2")
            .bind(fiction_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed > 0 {
            sqlx::query("UPDATE fictions SET vote_count = GREATEST(vote_count - 1, 0) WHERE id = $1")
                .bind(fiction_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(removed > 0)
    }

    /// Votes the author cast on any fiction of the component.
    pub async fn count_by_author_in_component(
        component_id: ComponentId,
        author_id: UserId,
        pool: &PgPool,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM fiction_votes v
            INNER JOIN fictions f ON f.id = v.fiction_id
            WHERE f.component_id = $1 AND v.author_id = $2
            "#,
        )
        .bind(component_id)
        .bind(author_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn exists(fiction_id: FictionId, author_id: UserId, pool: &PgPool) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM fiction_votes WHERE fiction_id = $1 AND author_id = $2)",
        )
        .bind(fiction_id)
        .bind(author_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }
}
