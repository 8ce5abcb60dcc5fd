use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, QueryBuilder};
use typed_builder::TypedBuilder;

use crate::common::{
    CategoryId, CollaborativeDraftId, ComponentId, FictionId, MeetingId, ParseEnumError,
    ScopeId, StoreError, StoreResult, UserId,
};
use crate::domains::fictions::models::coauthorship::Coauthorship;
use crate::domains::fictions::models::version::Changeset;
use crate::domains::fictions::queries::FictionQuery;

/// Link name recorded when a fiction is copied from another one.
pub const COPIED_FROM_COMPONENT: &str = "copied_from_component";

/// A citizen proposal.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fiction {
    pub id: FictionId,
    pub component_id: ComponentId,

    // Content
    pub title: String,
    pub body: String,
    pub address: Option<String>,

    // Answer. `internal_state` is what admins see; citizens see `state()`.
    pub internal_state: FictionState,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
    pub state_published_at: Option<DateTime<Utc>>,

    pub published_at: Option<DateTime<Utc>>,
    pub reference: Option<String>,

    pub category_id: Option<CategoryId>,
    pub scope_id: Option<ScopeId>,

    // Origin
    pub collaborative_draft_id: Option<CollaborativeDraftId>,
    pub meeting_id: Option<MeetingId>,

    // Counter caches
    pub vote_count: i32,
    pub endorsement_count: i32,
    pub notes_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FictionState {
    #[default]
    NotAnswered,
    Evaluating,
    Accepted,
    Rejected,
    Withdrawn,
}

impl FictionState {
    pub fn as_str(self) -> &'static str {
        match self {
            FictionState::NotAnswered => "not_answered",
            FictionState::Evaluating => "evaluating",
            FictionState::Accepted => "accepted",
            FictionState::Rejected => "rejected",
            FictionState::Withdrawn => "withdrawn",
        }
    }

    /// States an admin answer may set.
    pub fn is_answer(self) -> bool {
        matches!(
            self,
            FictionState::Evaluating | FictionState::Accepted | FictionState::Rejected
        )
    }
}

impl std::fmt::Display for FictionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FictionState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_answered" => Ok(FictionState::NotAnswered),
            "evaluating" => Ok(FictionState::Evaluating),
            "accepted" => Ok(FictionState::Accepted),
            "rejected" => Ok(FictionState::Rejected),
            "withdrawn" => Ok(FictionState::Withdrawn),
            _ => Err(ParseEnumError::new("fiction state", s)),
        }
    }
}

crate::text_column!(FictionState);

/// Attributes of a fiction about to be inserted.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewFiction {
    pub component_id: ComponentId,
    pub title: String,
    pub body: String,
    #[builder(default)]
    pub address: Option<String>,
    #[builder(default)]
    pub category_id: Option<CategoryId>,
    #[builder(default)]
    pub scope_id: Option<ScopeId>,
    #[builder(default)]
    pub collaborative_draft_id: Option<CollaborativeDraftId>,
    #[builder(default)]
    pub meeting_id: Option<MeetingId>,
    /// Set for fictions published on creation (official, promoted drafts,
    /// emendations, copies made by admin bulk actions).
    #[builder(default)]
    pub published_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Domain rules
// =============================================================================

impl Fiction {
    /// State visible to citizens: the verdict stays hidden until it is
    /// published; withdrawal is always visible.
    pub fn state(&self) -> FictionState {
        match self.internal_state {
            FictionState::Withdrawn => FictionState::Withdrawn,
            state if self.state_published_at.is_some() => state,
            _ => FictionState::NotAnswered,
        }
    }

    /// Answer text visible to citizens.
    pub fn visible_answer(&self) -> Option<&str> {
        if self.state_published_at.is_some() {
            self.answer.as_deref()
        } else {
            None
        }
    }

    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn is_withdrawn(&self) -> bool {
        self.internal_state == FictionState::Withdrawn
    }

    pub fn is_answered(&self) -> bool {
        self.answered_at.is_some()
    }

    /// Answered but the verdict is not public yet.
    pub fn awaiting_answer_publication(&self) -> bool {
        self.is_answered() && self.state_published_at.is_none()
    }

    pub fn has_supports(&self) -> bool {
        self.vote_count > 0
    }

    /// Changes between `before` and `self` over the attributes that are
    /// tracked in the version history.
    pub fn changes_from(&self, before: &Fiction) -> Changeset {
        let mut changes = BTreeMap::new();
        let mut track = |name: &str, old: JsonValue, new: JsonValue| {
            if old != new {
                changes.insert(name.to_string(), (old, new));
            }
        };

        track("title", before.title.clone().into(), self.title.clone().into());
        track("body", before.body.clone().into(), self.body.clone().into());
        track("address", json(&before.address), json(&self.address));
        track(
            "state",
            before.internal_state.as_str().into(),
            self.internal_state.as_str().into(),
        );
        track("answer", json(&before.answer), json(&self.answer));
        track("answered_at", json(&before.answered_at), json(&self.answered_at));
        track(
            "state_published_at",
            json(&before.state_published_at),
            json(&self.state_published_at),
        );
        track("published_at", json(&before.published_at), json(&self.published_at));
        track("category_id", json(&before.category_id), json(&self.category_id));
        track("scope_id", json(&before.scope_id), json(&self.scope_id));

        changes
    }

    /// Changeset of a freshly created fiction (every tracked attribute from
    /// null).
    pub fn creation_changes(&self) -> Changeset {
        let mut blank = self.clone();
        blank.title = String::new();
        blank.body = String::new();
        blank.address = None;
        blank.answer = None;
        blank.answered_at = None;
        blank.state_published_at = None;
        blank.published_at = None;
        blank.category_id = None;
        blank.scope_id = None;
        let mut changes = self.changes_from(&blank);
        for key in ["title", "body"] {
            if let Some(change) = changes.get_mut(key) {
                change.0 = JsonValue::Null;
            }
        }
        changes
    }
}

fn json<T: Serialize>(value: &T) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Fiction {
    pub async fn find_by_id(id: FictionId, pool: &PgPool) -> StoreResult<Option<Self>> {
        let fiction = sqlx::query_as::<_, Fiction>("SELECT * FROM fictions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(fiction)
    }

    pub async fn find_by_ids(ids: &[FictionId], pool: &PgPool) -> StoreResult<Vec<Self>> {
        let fictions = sqlx::query_as::<_, Fiction>(
            "SELECT * FROM fictions WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(fictions)
    }

    /// Published fictions of a component, filtered and sorted.
    pub async fn find_published(
        component_id: ComponentId,
        query: &FictionQuery,
        pool: &PgPool,
    ) -> StoreResult<Vec<Self>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM fictions");
        push_published_filter(&mut builder, component_id, query);
        builder.push(format!(
            " ORDER BY {} {} NULLS LAST, id {}",
            query.order.field.column(),
            query.order.direction.as_sql(),
            query.order.direction.as_sql()
        ));
        builder.push(" LIMIT ").push_bind(query.limit);
        builder.push(" OFFSET ").push_bind(query.offset);

        let fictions = builder
            .build_query_as::<Fiction>()
            .fetch_all(pool)
            .await?;
        Ok(fictions)
    }

    pub async fn count_published(
        component_id: ComponentId,
        query: &FictionQuery,
        pool: &PgPool,
    ) -> StoreResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM fictions");
        push_published_filter(&mut builder, component_id, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Trigram similarity over title and body (requires `pg_trgm`).
    pub async fn find_similar(
        component_id: ComponentId,
        title: &str,
        body: &str,
        threshold: f64,
        limit: i64,
        pool: &PgPool,
    ) -> StoreResult<Vec<Self>> {
        let fictions = sqlx::query_as::<_, Fiction>(
            r#"
            SELECT * FROM fictions
            WHERE component_id = $1
              AND published_at IS NOT NULL
              AND internal_state <> 'withdrawn'
              AND (similarity(title, $2) >= $4 OR similarity(body, $3) >= $4)
            ORDER BY GREATEST(similarity(title, $2), similarity(body, $3)) DESC, id
            LIMIT $5
            "#,
        )
        .bind(component_id)
        .bind(title)
        .bind(body)
        .bind(threshold as f32)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(fictions)
    }

    /// Published, non-withdrawn fictions of `origin` in the given states that
    /// have not been copied into `target` yet.
    pub async fn find_importable(
        origin: ComponentId,
        target: ComponentId,
        states: &[FictionState],
        pool: &PgPool,
    ) -> StoreResult<Vec<Self>> {
        let states: Vec<String> = states.iter().map(|s| s.to_string()).collect();
        let fictions = sqlx::query_as::<_, Fiction>(
            r#"
            SELECT f.* FROM fictions f
            WHERE f.component_id = $1
              AND f.published_at IS NOT NULL
              AND f.internal_state <> 'withdrawn'
              AND f.internal_state = ANY($3)
              AND NOT EXISTS (
                  SELECT 1 FROM fiction_links l
                  INNER JOIN fictions copy ON copy.id = l.from_id
                  WHERE l.to_id = f.id AND l.name = $4 AND copy.component_id = $2
              )
            ORDER BY f.id
            "#,
        )
        .bind(origin)
        .bind(target)
        .bind(&states)
        .bind(COPIED_FROM_COMPONENT)
        .fetch_all(pool)
        .await?;
        Ok(fictions)
    }

    /// Published, non-withdrawn fictions a user coauthors in a component.
    pub async fn count_published_by_author(
        component_id: ComponentId,
        author_id: UserId,
        pool: &PgPool,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT f.id) FROM fictions f
            INNER JOIN coauthorships c ON c.fiction_id = f.id
            WHERE f.component_id = $1
              AND c.author_kind = 'user' AND c.author_id = $2
              AND f.published_at IS NOT NULL
              AND f.internal_state <> 'withdrawn'
            "#,
        )
        .bind(component_id)
        .bind(author_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn insert(
        new: &NewFiction,
        coauthors: &[Coauthorship],
        pool: &PgPool,
    ) -> StoreResult<Self> {
        let mut tx = pool.begin().await?;

        let fiction = sqlx::query_as::<_, Fiction>(
            r#"
            INSERT INTO fictions (
                component_id, title, body, address, category_id, scope_id,
                collaborative_draft_id, meeting_id, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.component_id)
        .bind(&new.title)
        .bind(&new.body)
        .bind(&new.address)
        .bind(new.category_id)
        .bind(new.scope_id)
        .bind(new.collaborative_draft_id)
        .bind(new.meeting_id)
        .bind(new.published_at)
        .fetch_one(&mut *tx)
        .await?;

        for (position, coauthorship) in coauthors.iter().enumerate() {
            Coauthorship::insert(fiction.id, coauthorship, position as i32, &mut tx).await?;
        }

        tx.commit().await?;
        Ok(fiction)
    }

    /// Persists every mutable column of `self`.
    pub async fn save(&self, pool: &PgPool) -> StoreResult<Self> {
        sqlx::query_as::<_, Fiction>(
            r#"
            UPDATE fictions SET
                component_id = $2, title = $3, body = $4, address = $5,
                internal_state = $6, answer = $7, answered_at = $8,
                state_published_at = $9, published_at = $10, reference = $11,
                category_id = $12, scope_id = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.component_id)
        .bind(&self.title)
        .bind(&self.body)
        .bind(&self.address)
        .bind(self.internal_state)
        .bind(&self.answer)
        .bind(self.answered_at)
        .bind(self.state_published_at)
        .bind(self.published_at)
        .bind(&self.reference)
        .bind(self.category_id)
        .bind(self.scope_id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("fiction"))
    }

    pub async fn delete(id: FictionId, pool: &PgPool) -> StoreResult<()> {
        sqlx::query("DELETE FROM fictions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn link(
        from_id: FictionId,
        to_id: FictionId,
        name: &str,
        pool: &PgPool,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fiction_links (from_id, to_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(from_id)
        .bind(to_id)
        .bind(name)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fictions `from_id` links to under `name`.
    pub async fn linked(
        from_id: FictionId,
        name: &str,
        pool: &PgPool,
    ) -> StoreResult<Vec<FictionId>> {
        let ids = sqlx::query_scalar::<_, FictionId>(
            "SELECT to_id FROM fiction_links WHERE from_id = $1 AND name = $2 ORDER BY to_id",
        )
        .bind(from_id)
        .bind(name)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }
}

fn push_published_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    component_id: ComponentId,
    query: &FictionQuery,
) {
    builder
        .push(" WHERE component_id = ")
        .push_bind(component_id)
        .push(" AND published_at IS NOT NULL");
    if let Some(since) = query.published_since {
        builder.push(" AND published_at >= ").push_bind(since);
    }
    if let Some(before) = query.published_before {
        builder.push(" AND published_at <= ").push_bind(before);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn fiction() -> Fiction {
        let now = Utc::now();
        Fiction {
            id: FictionId::new(1),
            component_id: ComponentId::new(1),
            title: "Plant more trees in the park".to_string(),
            body: "The park needs more shade during summer.".to_string(),
            address: None,
            internal_state: FictionState::NotAnswered,
            answer: None,
            answered_at: None,
            state_published_at: None,
            published_at: Some(now),
            reference: None,
            category_id: None,
            scope_id: None,
            collaborative_draft_id: None,
            meeting_id: None,
            vote_count: 0,
            endorsement_count: 0,
            notes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_state_hidden_until_published() {
        let mut f = fiction();
        f.internal_state = FictionState::Accepted;
        f.answer = Some("Approved by the council".to_string());
        f.answered_at = Some(Utc::now());

        assert_eq!(f.state(), FictionState::NotAnswered);
        assert_eq!(f.visible_answer(), None);
        assert!(f.awaiting_answer_publication());

        f.state_published_at = Some(Utc::now());
        assert_eq!(f.state(), FictionState::Accepted);
        assert_eq!(f.visible_answer(), Some("Approved by the council"));
    }

    #[test]
    fn test_withdrawn_always_visible() {
        let mut f = fiction();
        f.internal_state = FictionState::Withdrawn;
        assert_eq!(f.state(), FictionState::Withdrawn);
    }

    #[test]
    fn test_changes_from_tracks_only_modified_attributes() {
        let before = fiction();
        let mut after = before.clone();
        after.internal_state = FictionState::Rejected;
        after.vote_count = 10;

        let changes = after.changes_from(&before);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes.get("state"),
            Some(&(JsonValue::from("not_answered"), JsonValue::from("rejected")))
        );
    }

    #[test]
    fn test_creation_changes_start_from_null() {
        let f = fiction();
        let changes = f.creation_changes();
        assert_eq!(changes["title"].0, JsonValue::Null);
        assert_eq!(changes["title"].1, JsonValue::from(f.title.clone()));
        assert!(changes.contains_key("published_at"));
        assert!(!changes.contains_key("state"));
    }

    #[test]
    fn test_state_parses_from_text() {
        assert_eq!("evaluating".parse::<FictionState>(), Ok(FictionState::Evaluating));
        assert!("maybe".parse::<FictionState>().is_err());
    }
}
