//! Builds `PermissionContext`s from the stores.
//!
//! All I/O an authorization decision needs happens here, before the pure
//! evaluator runs.

use chrono::Utc;

use crate::common::auth::{Actor, AmendmentFacts, DraftFacts, FictionFacts, PermissionContext};
use crate::common::StoreResult;
use crate::domains::amendments::models::Amendment;
use crate::domains::collaborative_drafts::models::CollaborativeDraft;
use crate::domains::components::models::Component;
use crate::domains::fictions::models::coauthorship::{
    creator, is_official, is_official_meeting, user_authors,
};
use crate::domains::fictions::models::{Fiction, COPIED_FROM_COMPONENT};
use crate::kernel::traits::*;

pub struct PermissionContextLoader<'a> {
    store: &'a dyn Store,
}

impl<'a> PermissionContextLoader<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Attaches the valuator role the user holds in the component's space.
    pub async fn resolve_actor(&self, actor: &Actor, component: &Component) -> StoreResult<Actor> {
        let role = self
            .store
            .find_valuator_role(actor.user_id, &component.space_slug)
            .await?;
        Ok(actor.clone().with_valuator_role(role.map(|r| r.id)))
    }

    /// Settings plus the actor's vote count in the component.
    pub async fn for_component(
        &self,
        component: &Component,
        actor: Option<&Actor>,
    ) -> StoreResult<PermissionContext> {
        let votes = match actor {
            Some(actor) => {
                self.store
                    .count_votes_in_component(component.id, actor.user_id)
                    .await?
            }
            None => 0,
        };
        Ok(PermissionContext::new(Utc::now())
            .with_settings(
                component.settings.0.clone(),
                component.step_settings.0.clone(),
            )
            .with_votes_cast(u32::try_from(votes).unwrap_or(u32::MAX)))
    }

    pub async fn for_fiction(
        &self,
        component: &Component,
        fiction: &Fiction,
        actor: Option<&Actor>,
    ) -> StoreResult<PermissionContext> {
        let mut ctx = self.for_component(component, actor).await?;
        ctx = ctx.with_fiction(self.fiction_facts(fiction).await?);
        if let Some(role) = actor.and_then(|a| a.valuator_role) {
            ctx = ctx.with_valuator_assigned(self.store.is_assigned(fiction.id, role).await?);
        }
        Ok(ctx)
    }

    pub async fn for_draft(
        &self,
        component: &Component,
        draft: &CollaborativeDraft,
        actor: Option<&Actor>,
    ) -> StoreResult<PermissionContext> {
        let ctx = self.for_component(component, actor).await?;
        Ok(ctx.with_draft(self.draft_facts(draft).await?))
    }

    pub async fn for_amendment(&self, amendment: &Amendment) -> StoreResult<PermissionContext> {
        let amendable = self.store.coauthorships(amendment.amendable_id).await?;
        let emendation = self.store.coauthorships(amendment.emendation_id).await?;
        Ok(
            PermissionContext::new(Utc::now()).with_amendment(AmendmentFacts {
                state: amendment.state,
                amendable_author_ids: user_authors(&amendable),
                emendation_author_ids: user_authors(&emendation),
            }),
        )
    }

    pub async fn fiction_facts(&self, fiction: &Fiction) -> StoreResult<FictionFacts> {
        let coauthorships = self.store.coauthorships(fiction.id).await?;
        let origins = self
            .store
            .linked_fictions(fiction.id, COPIED_FROM_COMPONENT)
            .await?;
        let copied_from_other_component = if origins.is_empty() {
            false
        } else {
            self.store
                .find_fictions(&origins)
                .await?
                .iter()
                .any(|origin| origin.component_id != fiction.component_id)
        };

        Ok(FictionFacts {
            id: fiction.id,
            author_ids: user_authors(&coauthorships),
            creator_id: creator(&coauthorships),
            official: is_official(&coauthorships),
            official_meeting: is_official_meeting(&coauthorships),
            published_at: fiction.published_at,
            withdrawn: fiction.is_withdrawn(),
            answer_published: fiction.state_published_at.is_some(),
            vote_count: fiction.vote_count,
            endorsement_count: fiction.endorsement_count,
            copied_from_other_component,
        })
    }

    pub async fn draft_facts(&self, draft: &CollaborativeDraft) -> StoreResult<DraftFacts> {
        Ok(DraftFacts {
            id: draft.id,
            state: draft.state,
            coauthor_ids: self.store.draft_coauthors(draft.id).await?,
            requester_ids: self.store.draft_requesters(draft.id).await?,
        })
    }
}
