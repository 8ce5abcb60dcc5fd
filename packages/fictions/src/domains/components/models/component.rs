use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::common::{ComponentId, StoreResult};

/// Host component hosting a set of fictions, with its settings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Component {
    pub id: ComponentId,
    /// Participatory space the component belongs to (valuator roles are
    /// granted per space).
    pub space_slug: String,
    pub name: String,
    pub settings: Json<ComponentSettings>,
    pub step_settings: Json<StepSettings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Global settings of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentSettings {
    /// Votes each participant may cast across the component. `None` or `0`
    /// means no limit is configured.
    pub vote_limit: Option<u32>,
    /// Published fictions each participant may author.
    pub fiction_limit: Option<u32>,
    /// Maximum body length.
    pub fiction_length: u32,
    /// Minutes after publication during which authors may still edit.
    pub fiction_edit_time_minutes: u32,
    pub amendments_enabled: bool,
    pub official_fictions_enabled: bool,
    pub collaborative_drafts_enabled: bool,
    pub fiction_answering_enabled: bool,
    pub publish_answers_immediately: bool,
    /// Action name -> authorization handlers the actor must hold.
    pub permissions: BTreeMap<String, Vec<String>>,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            vote_limit: None,
            fiction_limit: None,
            fiction_length: 500,
            fiction_edit_time_minutes: 5,
            amendments_enabled: false,
            official_fictions_enabled: true,
            collaborative_drafts_enabled: false,
            fiction_answering_enabled: true,
            publish_answers_immediately: true,
            permissions: BTreeMap::new(),
        }
    }
}

impl ComponentSettings {
    /// The configured limit when it is positive.
    pub fn effective_vote_limit(&self) -> Option<u32> {
        self.vote_limit.filter(|limit| *limit > 0)
    }

    pub fn effective_fiction_limit(&self) -> Option<u32> {
        self.fiction_limit.filter(|limit| *limit > 0)
    }

    /// Authorization handlers required for an action (empty when the action
    /// is unrestricted).
    pub fn required_handlers(&self, action: &str) -> &[String] {
        self.permissions
            .get(action)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Settings of the component's current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepSettings {
    pub creation_enabled: bool,
    pub votes_enabled: bool,
    pub votes_blocked: bool,
    pub votes_hidden: bool,
    pub endorsements_enabled: bool,
    pub endorsements_blocked: bool,
    pub amendment_creation_enabled: bool,
    pub fiction_answering_enabled: bool,
    pub publish_answers_immediately: bool,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            creation_enabled: false,
            votes_enabled: false,
            votes_blocked: false,
            votes_hidden: false,
            endorsements_enabled: false,
            endorsements_blocked: false,
            amendment_creation_enabled: true,
            fiction_answering_enabled: true,
            publish_answers_immediately: true,
        }
    }
}

impl StepSettings {
    pub fn voting_enabled(&self) -> bool {
        self.votes_enabled && !self.votes_blocked
    }

    pub fn endorsing_enabled(&self) -> bool {
        self.endorsements_enabled && !self.endorsements_blocked
    }
}

impl Component {
    /// Answering needs both the component and the current step to allow it.
    pub fn answering_enabled(&self) -> bool {
        self.settings.fiction_answering_enabled && self.step_settings.fiction_answering_enabled
    }

    pub fn publish_answers_immediately(&self) -> bool {
        self.settings.publish_answers_immediately && self.step_settings.publish_answers_immediately
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Component {
    pub async fn find_by_id(id: ComponentId, pool: &PgPool) -> StoreResult<Option<Self>> {
        let component = sqlx::query_as::<_, Component>("SELECT * FROM components WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(component)
    }

    pub async fn create(
        space_slug: &str,
        name: &str,
        settings: &ComponentSettings,
        step_settings: &StepSettings,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        let component = sqlx::query_as::<_, Component>(
            r#"
            INSERT INTO components (space_slug, name, settings, step_settings)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(space_slug)
        .bind(name)
        .bind(Json(settings))
        .bind(Json(step_settings))
        .fetch_one(pool)
        .await?;
        Ok(component)
    }

    pub async fn update_step_settings(
        id: ComponentId,
        step_settings: &StepSettings,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        let component = sqlx::query_as::<_, Component>(
            "UPDATE components SET step_settings = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(step_settings))
        .fetch_one(pool)
        .await?;
        Ok(component)
    }
}
