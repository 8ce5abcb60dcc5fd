use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{EndorsementId, FictionId, StoreError, StoreResult, UserGroupId, UserId};

/// Public backing of a fiction, optionally on behalf of a user group.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Endorsement {
    pub id: EndorsementId,
    pub fiction_id: FictionId,
    pub author_id: UserId,
    pub user_group_id: Option<UserGroupId>,
    pub created_at: DateTime<Utc>,
}

impl Endorsement {
    pub async fn create(
        fiction_id: FictionId,
        author_id: UserId,
        user_group_id: Option<UserGroupId>,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        let mut tx = pool.begin().await?;

        let endorsement = sqlx::query_as::<_, Endorsement>(
            r#"
            INSERT INTO fiction_endorsements (fiction_id, author_id, user_group_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(fiction_id)
        .bind(author_id)
        .bind(user_group_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::from_unique(e, "endorsement"))?;

        sqlx::query("UPDATE fictions SET endorsement_count = endorsement_count + 1 WHERE id = $1")
            .bind(fiction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(endorsement)
    }

    pub async fn delete(fiction_id: FictionId, author_id: UserId, pool: &PgPool) -> StoreResult<bool> {
        let mut tx = pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM fiction_endorsements WHERE fiction_id = $1 AND author_id = $2",
        )
        .bind(fiction_id)
        .bind(author_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed > 0 {
            sqlx::query(
                "UPDATE fictions SET endorsement_count = GREATEST(endorsement_count - $2, 0) WHERE id = $1",
            )
            .bind(fiction_id)
            .bind(removed as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed > 0)
    }
}
