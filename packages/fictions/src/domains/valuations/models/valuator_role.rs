use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{FictionId, StoreResult, UserId, ValuationAssignmentId, ValuatorRoleId};

/// Valuator role a user holds in a participatory space.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValuatorRole {
    pub id: ValuatorRoleId,
    pub user_id: UserId,
    pub space_slug: String,
    pub created_at: DateTime<Utc>,
}

/// Links a fiction to a valuator role. Unique per pair.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValuationAssignment {
    pub id: ValuationAssignmentId,
    pub fiction_id: FictionId,
    pub valuator_role_id: ValuatorRoleId,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ValuatorRole Queries
// =============================================================================

impl ValuatorRole {
    pub async fn create(user_id: UserId, space_slug: &str, pool: &PgPool) -> StoreResult<Self> {
        let role = sqlx::query_as::<_, ValuatorRole>(
            r#"
            INSERT INTO valuator_roles (user_id, space_slug)
            VALUES ($1, $2)
            ON CONFLICT (user_id, space_slug) DO UPDATE SET space_slug = EXCLUDED.space_slug
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(space_slug)
        .fetch_one(pool)
        .await?;
        Ok(role)
    }

    pub async fn find_by_id(id: ValuatorRoleId, pool: &PgPool) -> StoreResult<Option<Self>> {
        let role = sqlx::query_as::<_, ValuatorRole>("SELECT * FROM valuator_roles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(role)
    }

    pub async fn find_for_user(
        user_id: UserId,
        space_slug: &str,
        pool: &PgPool,
    ) -> StoreResult<Option<Self>> {
        let role = sqlx::query_as::<_, ValuatorRole>(
            "SELECT * FROM valuator_roles WHERE user_id = $1 AND space_slug = $2",
        )
        .bind(user_id)
        .bind(space_slug)
        .fetch_optional(pool)
        .await?;
        Ok(role)
    }
}

// =============================================================================
// ValuationAssignment Queries
// =============================================================================

impl ValuationAssignment {
    /// `None` when the pair was already assigned.
    pub async fn create(
        fiction_id: FictionId,
        valuator_role_id: ValuatorRoleId,
        pool: &PgPool,
    ) -> StoreResult<Option<Self>> {
        let assignment = sqlx::query_as::<_, ValuationAssignment>(
            r#"
            INSERT INTO valuation_assignments (fiction_id, valuator_role_id)
            VALUES ($1, $2)
            ON CONFLICT (fiction_id, valuator_role_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(fiction_id)
        .bind(valuator_role_id)
        .fetch_optional(pool)
        .await?;
        Ok(assignment)
    }

    pub async fn delete(
        fiction_id: FictionId,
        valuator_role_id: ValuatorRoleId,
        pool: &PgPool,
    ) -> StoreResult<bool> {
        let removed = sqlx::query(
            "DELETE FROM valuation_assignments WHERE fiction_id = $1 AND valuator_role_id = $2",
        )
        .bind(fiction_id)
        .bind(valuator_role_id)
        .execute(pool)
        .await?
        .rows_affected();
        Ok(removed > 0)
    }

    pub async fn exists(
        fiction_id: FictionId,
        valuator_role_id: ValuatorRoleId,
        pool: &PgPool,
    ) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM valuation_assignments
                WHERE fiction_id = $1 AND valuator_role_id = $2
            )
            "#,
        )
        .bind(fiction_id)
        .bind(valuator_role_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn roles_for_fiction(
        fiction_id: FictionId,
        pool: &PgPool,
    ) -> StoreResult<Vec<ValuatorRoleId>> {
        let roles = sqlx::query_scalar::<_, ValuatorRoleId>(
            "SELECT valuator_role_id FROM valuation_assignments WHERE fiction_id = $1 ORDER BY id",
        )
        .bind(fiction_id)
        .fetch_all(pool)
        .await?;
        Ok(roles)
    }
}
