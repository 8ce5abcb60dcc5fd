use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{AmendmentId, FictionId, ParseEnumError, StoreError, StoreResult, UserId};

/// Pairs an amendable fiction with the emendation proposing to replace it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Amendment {
    pub id: AmendmentId,
    pub amendable_id: FictionId,
    pub emendation_id: FictionId,
    pub amender_id: UserId,
    pub state: AmendmentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmendmentState {
    Draft,
    #[default]
    Evaluating,
    Accepted,
    Rejected,
    Withdrawn,
}

impl std::fmt::Display for AmendmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AmendmentState::Draft => "draft",
            AmendmentState::Evaluating => "evaluating",
            AmendmentState::Accepted => "accepted",
            AmendmentState::Rejected => "rejected",
            AmendmentState::Withdrawn => "withdrawn",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for AmendmentState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AmendmentState::Draft),
            "evaluating" => Ok(AmendmentState::Evaluating),
            "accepted" => Ok(AmendmentState::Accepted),
            "rejected" => Ok(AmendmentState::Rejected),
            "withdrawn" => Ok(AmendmentState::Withdrawn),
            _ => Err(ParseEnumError::new("amendment state", s)),
        }
    }
}

crate::text_column!(AmendmentState);

// =============================================================================
// SQL Queries
// =============================================================================

impl Amendment {
    pub async fn create(
        amendable_id: FictionId,
        emendation_id: FictionId,
        amender_id: UserId,
        state: AmendmentState,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        let amendment = sqlx::query_as::<_, Amendment>(
            r#"
            INSERT INTO amendments (amendable_id, emendation_id, amender_id, state)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(amendable_id)
        .bind(emendation_id)
        .bind(amender_id)
        .bind(state)
        .fetch_one(pool)
        .await?;
        Ok(amendment)
    }

    pub async fn find_by_id(id: AmendmentId, pool: &PgPool) -> StoreResult<Option<Self>> {
        let amendment = sqlx::query_as::<_, Amendment>("SELECT * FROM amendments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(amendment)
    }

    pub async fn find_by_emendation(
        emendation_id: FictionId,
        pool: &PgPool,
    ) -> StoreResult<Option<Self>> {
        let amendment = sqlx::query_as::<_, Amendment>(
            "SELECT * FROM amendments WHERE emendation_id = $1",
        )
        .bind(emendation_id)
        .fetch_optional(pool)
        .await?;
        Ok(amendment)
    }

    pub async fn find_by_amendable(amendable_id: FictionId, pool: &PgPool) -> StoreResult<Vec<Self>> {
        let amendments = sqlx::query_as::<_, Amendment>(
            "SELECT * FROM amendments WHERE amendable_id = $1 ORDER BY id",
        )
        .bind(amendable_id)
        .fetch_all(pool)
        .await?;
        Ok(amendments)
    }

    pub async fn update_state(
        id: AmendmentId,
        state: AmendmentState,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        sqlx::query_as::<_, Amendment>(
            "UPDATE amendments SET state = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(state)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("amendment"))
    }
}
