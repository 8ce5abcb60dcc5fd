use chrono::{DateTime, Duration, Utc};

use super::{admin, public, Actor, PermissionRequest, PermissionScope};
use crate::common::entity_ids::{CollaborativeDraftId, FictionId, UserId, ValuatorRoleId};
use crate::domains::amendments::models::AmendmentState;
use crate::domains::collaborative_drafts::models::DraftState;
use crate::domains::components::models::{ComponentSettings, StepSettings};

/// Outcome of a permission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    /// The rule set has no opinion; callers deny by default.
    Abstain,
}

impl Decision {
    pub fn allow_if(condition: bool) -> Self {
        if condition {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Facts about the fiction an action targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FictionFacts {
    pub id: FictionId,
    /// User coauthors, in authorship order.
    pub author_ids: Vec<UserId>,
    /// First coauthor when it is a user.
    pub creator_id: Option<UserId>,
    pub official: bool,
    pub official_meeting: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub withdrawn: bool,
    /// The answer's verdict is visible (state published).
    pub answer_published: bool,
    pub vote_count: i32,
    pub endorsement_count: i32,
    pub copied_from_other_component: bool,
}

impl FictionFacts {
    pub fn authored_by(&self, user: UserId) -> bool {
        self.author_ids.contains(&user)
    }

    pub fn created_by(&self, user: UserId) -> bool {
        self.creator_id == Some(user)
    }

    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }

    fn within_edit_time(&self, minutes: u32, now: DateTime<Utc>) -> bool {
        match self.published_at {
            None => true,
            Some(published_at) => now <= published_at + Duration::minutes(i64::from(minutes)),
        }
    }
}

/// Facts about a collaborative draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftFacts {
    pub id: CollaborativeDraftId,
    pub state: DraftState,
    /// First entry is the creator.
    pub coauthor_ids: Vec<UserId>,
    pub requester_ids: Vec<UserId>,
}

impl DraftFacts {
    pub fn is_open(&self) -> bool {
        self.state == DraftState::Open
    }

    pub fn created_by(&self, user: UserId) -> bool {
        self.coauthor_ids.first() == Some(&user)
    }

    pub fn is_coauthor(&self, user: UserId) -> bool {
        self.coauthor_ids.contains(&user)
    }

    pub fn is_requester(&self, user: UserId) -> bool {
        self.requester_ids.contains(&user)
    }
}

/// Facts about an amendment and the two fictions it joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmendmentFacts {
    pub state: AmendmentState,
    pub amendable_author_ids: Vec<UserId>,
    pub emendation_author_ids: Vec<UserId>,
}

/// Explicit input of the evaluator besides actor and action.
#[derive(Debug, Clone)]
pub struct PermissionContext {
    pub component_settings: Option<ComponentSettings>,
    pub step_settings: Option<StepSettings>,
    pub fiction: Option<FictionFacts>,
    pub draft: Option<DraftFacts>,
    pub amendment: Option<AmendmentFacts>,
    /// Votes the actor already cast across the component.
    pub votes_cast_in_component: u32,
    /// The actor's valuator role is assigned to `fiction`.
    pub valuator_assigned: bool,
    /// Role an unassignment targets.
    pub target_valuator_role: Option<ValuatorRoleId>,
    pub now: DateTime<Utc>,
}

impl PermissionContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            component_settings: None,
            step_settings: None,
            fiction: None,
            draft: None,
            amendment: None,
            votes_cast_in_component: 0,
            valuator_assigned: false,
            target_valuator_role: None,
            now,
        }
    }

    pub fn with_settings(mut self, component: ComponentSettings, step: StepSettings) -> Self {
        self.component_settings = Some(component);
        self.step_settings = Some(step);
        self
    }

    pub fn with_fiction(mut self, fiction: FictionFacts) -> Self {
        self.fiction = Some(fiction);
        self
    }

    pub fn with_draft(mut self, draft: DraftFacts) -> Self {
        self.draft = Some(draft);
        self
    }

    pub fn with_amendment(mut self, amendment: AmendmentFacts) -> Self {
        self.amendment = Some(amendment);
        self
    }

    pub fn with_votes_cast(mut self, votes: u32) -> Self {
        self.votes_cast_in_component = votes;
        self
    }

    pub fn with_valuator_assigned(mut self, assigned: bool) -> Self {
        self.valuator_assigned = assigned;
        self
    }

    pub fn with_target_valuator_role(mut self, role: ValuatorRoleId) -> Self {
        self.target_valuator_role = Some(role);
        self
    }

    pub(super) fn settings(&self) -> Option<(&ComponentSettings, &StepSettings)> {
        Some((self.component_settings.as_ref()?, self.step_settings.as_ref()?))
    }

    /// Actor holds every handler the component requires for `action`.
    pub(super) fn authorized(&self, actor: &Actor, action: &str) -> bool {
        match &self.component_settings {
            Some(settings) => actor.holds_all(settings.required_handlers(action)),
            None => false,
        }
    }

    /// Fiction can be edited by `user` right now.
    pub(super) fn editable_by(&self, fiction: &FictionFacts, user: UserId) -> bool {
        if fiction.withdrawn || !fiction.created_by(user) {
            return false;
        }
        if fiction.is_draft() {
            return true;
        }
        let Some(settings) = &self.component_settings else {
            return false;
        };
        !fiction.answer_published
            && fiction.within_edit_time(settings.fiction_edit_time_minutes, self.now)
            && !fiction.copied_from_other_component
    }
}

/// Votes the actor may still cast in the component.
///
/// With no positive limit configured this is always 1.
pub fn remaining_votes(settings: &ComponentSettings, votes_cast: u32) -> u32 {
    match settings.effective_vote_limit() {
        None => 1,
        Some(limit) => limit.saturating_sub(votes_cast),
    }
}

/// Pure permission evaluation.
pub fn evaluate(request: &PermissionRequest<'_>) -> Decision {
    let Some(actor) = request.actor else {
        return Decision::Abstain;
    };

    match request.action.scope {
        PermissionScope::Public => public::evaluate(actor, request.action, request.context),
        PermissionScope::Admin => admin::evaluate(actor, request.action, request.context),
        PermissionScope::Other => Decision::Abstain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_votes_defaults_to_one_without_limit() {
        let settings = ComponentSettings::default();
        assert_eq!(remaining_votes(&settings, 0), 1);
        assert_eq!(remaining_votes(&settings, 12), 1);
    }

    #[test]
    fn test_remaining_votes_subtracts_cast_votes() {
        let settings = ComponentSettings {
            vote_limit: Some(2),
            ..Default::default()
        };
        assert_eq!(remaining_votes(&settings, 0), 2);
        assert_eq!(remaining_votes(&settings, 1), 1);
        assert_eq!(remaining_votes(&settings, 2), 0);
        assert_eq!(remaining_votes(&settings, 5), 0);
    }

    #[test]
    fn test_edit_window_closes() {
        let now = Utc::now();
        let facts = FictionFacts {
            id: FictionId::new(1),
            author_ids: vec![UserId::new(1)],
            creator_id: Some(UserId::new(1)),
            official: false,
            official_meeting: false,
            published_at: Some(now - Duration::minutes(10)),
            withdrawn: false,
            answer_published: false,
            vote_count: 0,
            endorsement_count: 0,
            copied_from_other_component: false,
        };
        assert!(!facts.within_edit_time(5, now));
        assert!(facts.within_edit_time(15, now));
    }
}
