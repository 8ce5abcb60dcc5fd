use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{CategoryId, ComponentId, FictionId, MeetingId, ScopeId, UserGroupId};
use crate::domains::fictions::models::{Author, Fiction, FictionState};

/// Form submitted to create or edit a fiction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FictionInput {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub scope_id: Option<ScopeId>,
    /// Group the citizen writes on behalf of.
    #[serde(default)]
    pub user_group_id: Option<UserGroupId>,
    /// Official fictions only: meeting the fiction comes from.
    #[serde(default)]
    pub meeting_id: Option<MeetingId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub state: FictionState,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeInput {
    pub fiction_ids: Vec<FictionId>,
    pub target_component_id: ComponentId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitInput {
    pub fiction_ids: Vec<FictionId>,
    pub target_component_id: ComponentId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportInput {
    pub origin_component_id: ComponentId,
    pub states: Vec<FictionState>,
    #[serde(default)]
    pub keep_authors: bool,
}

/// API representation of a fiction as citizens see it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FictionData {
    pub id: FictionId,
    pub component_id: ComponentId,
    pub title: String,
    pub body: String,
    pub address: Option<String>,

    // Visible answer
    pub state: FictionState,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,

    pub published_at: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub category_id: Option<CategoryId>,
    pub scope_id: Option<ScopeId>,

    /// `None` while the step hides votes.
    pub vote_count: Option<i32>,
    pub endorsement_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FictionData {
    pub fn new(fiction: Fiction, votes_hidden: bool) -> Self {
        let state = fiction.state();
        let answer = fiction.visible_answer().map(str::to_string);
        let answered_at = fiction.state_published_at.and(fiction.answered_at);
        Self {
            id: fiction.id,
            component_id: fiction.component_id,
            title: fiction.title,
            body: fiction.body,
            address: fiction.address,
            state,
            answer,
            answered_at,
            published_at: fiction.published_at,
            reference: fiction.reference,
            category_id: fiction.category_id,
            scope_id: fiction.scope_id,
            vote_count: (!votes_hidden).then_some(fiction.vote_count),
            endorsement_count: fiction.endorsement_count,
            created_at: fiction.created_at,
            updated_at: fiction.updated_at,
        }
    }
}

impl From<Fiction> for FictionData {
    fn from(fiction: Fiction) -> Self {
        Self::new(fiction, false)
    }
}

/// One exported fiction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportRow {
    pub id: FictionId,
    pub reference: Option<String>,
    pub title: String,
    pub body: String,
    pub state: FictionState,
    pub answer: Option<String>,
    pub category_id: Option<CategoryId>,
    pub scope_id: Option<ScopeId>,
    pub vote_count: i32,
    pub endorsement_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub authors: Vec<Author>,
}

impl ExportRow {
    pub fn new(fiction: Fiction, authors: Vec<Author>) -> Self {
        Self {
            state: fiction.state(),
            answer: fiction.visible_answer().map(str::to_string),
            id: fiction.id,
            reference: fiction.reference,
            title: fiction.title,
            body: fiction.body,
            category_id: fiction.category_id,
            scope_id: fiction.scope_id,
            vote_count: fiction.vote_count,
            endorsement_count: fiction.endorsement_count,
            published_at: fiction.published_at,
            authors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::fictions::models::fiction::tests::fiction;

    #[test]
    fn test_hidden_votes_and_pending_answer() {
        let mut f = fiction();
        f.vote_count = 4;
        f.internal_state = FictionState::Accepted;
        f.answer = Some("Yes".to_string());
        f.answered_at = Some(Utc::now());

        let data = FictionData::new(f, true);
        assert_eq!(data.vote_count, None);
        assert_eq!(data.state, FictionState::NotAnswered);
        assert_eq!(data.answer, None);
        assert_eq!(data.answered_at, None);
    }

    #[test]
    fn test_input_defaults_optional_fields() {
        let input: FictionInput =
            serde_json::from_str(r#"{"title": "A title long enough", "body": "And a body long enough"}"#)
                .unwrap();
        assert_eq!(input.address, None);
        assert_eq!(input.user_group_id, None);
    }
}
