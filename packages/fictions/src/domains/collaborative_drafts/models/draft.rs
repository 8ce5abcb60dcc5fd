use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{
    CollaborativeDraftId, ComponentId, FictionId, ParseEnumError, StoreError, StoreResult, UserId,
};

/// Pre-publication text several users write together.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollaborativeDraft {
    pub id: CollaborativeDraftId,
    pub component_id: ComponentId,
    pub title: String,
    pub body: String,
    pub state: DraftState,
    pub published_at: Option<DateTime<Utc>>,
    /// Fiction the draft was promoted to.
    pub fiction_id: Option<FictionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    #[default]
    Open,
    Withdrawn,
    Published,
}

impl std::fmt::Display for DraftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftState::Open => write!(f, "open"),
            DraftState::Withdrawn => write!(f, "withdrawn"),
            DraftState::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for DraftState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DraftState::Open),
            "withdrawn" => Ok(DraftState::Withdrawn),
            "published" => Ok(DraftState::Published),
            _ => Err(ParseEnumError::new("draft state", s)),
        }
    }
}

crate::text_column!(DraftState);

impl CollaborativeDraft {
    pub fn is_open(&self) -> bool {
        self.state == DraftState::Open
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl CollaborativeDraft {
    /// Inserts the draft with `creator` as its first coauthor.
    pub async fn create(
        component_id: ComponentId,
        title: &str,
        body: &str,
        creator: UserId,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        let mut tx = pool.begin().await?;

        let draft = sqlx::query_as::<_, CollaborativeDraft>(
            r#"
            INSERT INTO collaborative_drafts (component_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(component_id)
        .bind(title)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO collaborative_draft_coauthors (draft_id, user_id, position) VALUES ($1, $2, 0)",
        )
        .bind(draft.id)
        .bind(creator)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(draft)
    }

    pub async fn find_by_id(id: CollaborativeDraftId, pool: &PgPool) -> StoreResult<Option<Self>> {
        let draft = sqlx::query_as::<_, CollaborativeDraft>(
            "SELECT * FROM collaborative_drafts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(draft)
    }

    pub async fn save(&self, pool: &PgPool) -> StoreResult<Self> {
        sqlx::query_as::<_, CollaborativeDraft>(
            r#"
            UPDATE collaborative_drafts SET
                title = $2, body = $3, state = $4, published_at = $5, fiction_id = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.body)
        .bind(self.state)
        .bind(self.published_at)
        .bind(self.fiction_id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("collaborative draft"))
    }

    /// Coauthors in the order they joined; the first is the creator.
    pub async fn coauthors(id: CollaborativeDraftId, pool: &PgPool) -> StoreResult<Vec<UserId>> {
        let users = sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM collaborative_draft_coauthors WHERE draft_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    pub async fn add_coauthor(
        id: CollaborativeDraftId,
        user_id: UserId,
        pool: &PgPool,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO collaborative_draft_coauthors (draft_id, user_id, position)
            SELECT $1, $2, COALESCE(MAX(position) + 1, 0)
            FROM collaborative_draft_coauthors WHERE draft_id = $1
            ON CONFLICT (draft_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn requesters(id: CollaborativeDraftId, pool: &PgPool) -> StoreResult<Vec<UserId>> {
        let users = sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM collaborative_draft_access_requests WHERE draft_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    /// A repeated request is a `Conflict`.
    pub async fn add_requester(
        id: CollaborativeDraftId,
        user_id: UserId,
        pool: &PgPool,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO collaborative_draft_access_requests (draft_id, user_id) VALUES ($1, $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::from_unique(e, "access request"))?;
        Ok(())
    }

    pub async fn remove_requester(
        id: CollaborativeDraftId,
        user_id: UserId,
        pool: &PgPool,
    ) -> StoreResult<bool> {
        let removed = sqlx::query(
            "DELETE FROM collaborative_draft_access_requests WHERE draft_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
        Ok(removed > 0)
    }
}
