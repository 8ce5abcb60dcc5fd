use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::common::{FictionId, ParseEnumError, StoreResult, UserId, VersionId};

/// Attribute name -> `[old, new]`.
pub type Changeset = BTreeMap<String, (JsonValue, JsonValue)>;

/// One entry of a fiction's change history.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Version {
    pub id: VersionId,
    pub fiction_id: FictionId,
    pub event: VersionEvent,
    pub changeset: Json<Changeset>,
    /// User responsible for the change (none for system changes).
    pub whodunnit: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionEvent {
    Create,
    Update,
}

impl std::fmt::Display for VersionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionEvent::Create => write!(f, "create"),
            VersionEvent::Update => write!(f, "update"),
        }
    }
}

impl std::str::FromStr for VersionEvent {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(VersionEvent::Create),
            "update" => Ok(VersionEvent::Update),
            _ => Err(ParseEnumError::new("version event", s)),
        }
    }
}

crate::text_column!(VersionEvent);

/// A version about to be recorded.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub fiction_id: FictionId,
    pub event: VersionEvent,
    pub changeset: Changeset,
    pub whodunnit: Option<UserId>,
}

impl Version {
    pub async fn insert(new: &NewVersion, pool: &PgPool) -> StoreResult<Self> {
        let version = sqlx::query_as::<_, Version>(
            r#"
            INSERT INTO fiction_versions (fiction_id, event, changeset, whodunnit)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.fiction_id)
        .bind(new.event)
        .bind(Json(&new.changeset))
        .bind(new.whodunnit)
        .fetch_one(pool)
        .await?;
        Ok(version)
    }

    /// History in creation order.
    pub async fn find_by_fiction(fiction_id: FictionId, pool: &PgPool) -> StoreResult<Vec<Self>> {
        let versions = sqlx::query_as::<_, Version>(
            "SELECT * FROM fiction_versions WHERE fiction_id = $1 ORDER BY created_at, id",
        )
        .bind(fiction_id)
        .fetch_all(pool)
        .await?;
        Ok(versions)
    }
}
