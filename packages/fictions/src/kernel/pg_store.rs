//! Postgres-backed store. SQL lives in the models; this type only routes
//! trait calls to them.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::{
    AmendmentId, CollaborativeDraftId, ComponentId, FictionId, StoreResult, UserGroupId, UserId,
    ValuatorRoleId,
};
use crate::domains::amendments::models::{Amendment, AmendmentState};
use crate::domains::collaborative_drafts::models::CollaborativeDraft;
use crate::domains::components::models::{Component, ComponentSettings, StepSettings};
use crate::domains::fictions::models::{
    Attachment, Coauthorship, Fiction, FictionState, NewAttachment, NewFiction, NewVersion,
    Version,
};
use crate::domains::fictions::queries::FictionQuery;
use crate::domains::valuations::models::{Note, ValuationAssignment, ValuatorRole};
use crate::domains::votes::models::{Endorsement, Vote};
use crate::kernel::traits::*;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Components are provisioned by the host platform.
    pub async fn create_component(
        &self,
        space_slug: &str,
        name: &str,
        settings: &ComponentSettings,
        step_settings: &StepSettings,
    ) -> StoreResult<Component> {
        Component::create(space_slug, name, settings, step_settings, &self.pool).await
    }

    /// Valuator roles are granted by the host platform.
    pub async fn create_valuator_role(
        &self,
        user_id: UserId,
        space_slug: &str,
    ) -> StoreResult<ValuatorRole> {
        ValuatorRole::create(user_id, space_slug, &self.pool).await
    }
}

#[async_trait]
impl BaseComponentStore for PgStore {
    async fn find_component(&self, id: ComponentId) -> StoreResult<Option<Component>> {
        Component::find_by_id(id, &self.pool).await
    }

    async fn update_step_settings(
        &self,
        id: ComponentId,
        step_settings: &StepSettings,
    ) -> StoreResult<Component> {
        Component::update_step_settings(id, step_settings, &self.pool).await
    }
}

#[async_trait]
impl BaseFictionStore for PgStore {
    async fn find_fiction(&self, id: FictionId) -> StoreResult<Option<Fiction>> {
        Fiction::find_by_id(id, &self.pool).await
    }

    async fn find_fictions(&self, ids: &[FictionId]) -> StoreResult<Vec<Fiction>> {
        Fiction::find_by_ids(ids, &self.pool).await
    }

    async fn find_published(
        &self,
        component_id: ComponentId,
        query: &FictionQuery,
    ) -> StoreResult<Vec<Fiction>> {
        Fiction::find_published(component_id, query, &self.pool).await
    }

    async fn count_published(
        &self,
        component_id: ComponentId,
        query: &FictionQuery,
    ) -> StoreResult<i64> {
        Fiction::count_published(component_id, query, &self.pool).await
    }

    async fn find_similar(
        &self,
        component_id: ComponentId,
        title: &str,
        body: &str,
        threshold: f64,
        limit: i64,
    ) -> StoreResult<Vec<Fiction>> {
        Fiction::find_similar(component_id, title, body, threshold, limit, &self.pool).await
    }

    async fn find_importable(
        &self,
        origin: ComponentId,
        target: ComponentId,
        states: &[FictionState],
    ) -> StoreResult<Vec<Fiction>> {
        Fiction::find_importable(origin, target, states, &self.pool).await
    }

    async fn count_published_by_author(
        &self,
        component_id: ComponentId,
        author_id: UserId,
    ) -> StoreResult<i64> {
        Fiction::count_published_by_author(component_id, author_id, &self.pool).await
    }

    async fn insert_fiction(
        &self,
        new: &NewFiction,
        coauthors: &[Coauthorship],
    ) -> StoreResult<Fiction> {
        Fiction::insert(new, coauthors, &self.pool).await
    }

    async fn save_fiction(&self, fiction: &Fiction) -> StoreResult<Fiction> {
        fiction.save(&self.pool).await
    }

    async fn delete_fiction(&self, id: FictionId) -> StoreResult<()> {
        Fiction::delete(id, &self.pool).await
    }

    async fn coauthorships(&self, id: FictionId) -> StoreResult<Vec<Coauthorship>> {
        Coauthorship::find_by_fiction(id, &self.pool).await
    }

    async fn link_fictions(&self, from: FictionId, to: FictionId, name: &str) -> StoreResult<()> {
        Fiction::link(from, to, name, &self.pool).await
    }

    async fn linked_fictions(&self, from: FictionId, name: &str) -> StoreResult<Vec<FictionId>> {
        Fiction::linked(from, name, &self.pool).await
    }

    async fn record_version(&self, version: &NewVersion) -> StoreResult<Version> {
        Version::insert(version, &self.pool).await
    }

    async fn versions(&self, id: FictionId) -> StoreResult<Vec<Version>> {
        Version::find_by_fiction(id, &self.pool).await
    }

    async fn attachments(&self, id: FictionId) -> StoreResult<Vec<Attachment>> {
        Attachment::find_by_fiction(id, &self.pool).await
    }

    async fn insert_attachment(&self, attachment: &NewAttachment) -> StoreResult<Attachment> {
        Attachment::insert(attachment, &self.pool).await
    }
}

#[async_trait]
impl BaseVoteStore for PgStore {
    async fn insert_vote(&self, fiction_id: FictionId, author_id: UserId) -> StoreResult<Vote> {
        Vote::create(fiction_id, author_id, &self.pool).await
    }

    async fn delete_vote(&self, fiction_id: FictionId, author_id: UserId) -> StoreResult<bool> {
        Vote::delete(fiction_id, author_id, &self.pool).await
    }

    async fn count_votes_in_component(
        &self,
        component_id: ComponentId,
        author_id: UserId,
    ) -> StoreResult<i64> {
        Vote::count_by_author_in_component(component_id, author_id, &self.pool).await
    }

    async fn insert_endorsement(
        &self,
        fiction_id: FictionId,
        author_id: UserId,
        user_group_id: Option<UserGroupId>,
    ) -> StoreResult<Endorsement> {
        Endorsement::create(fiction_id, author_id, user_group_id, &self.pool).await
    }

    async fn delete_endorsement(
        &self,
        fiction_id: FictionId,
        author_id: UserId,
    ) -> StoreResult<bool> {
        Endorsement::delete(fiction_id, author_id, &self.pool).await
    }
}

#[async_trait]
impl BaseValuationStore for PgStore {
    async fn find_valuator_role(
        &self,
        user_id: UserId,
        space_slug: &str,
    ) -> StoreResult<Option<ValuatorRole>> {
        ValuatorRole::find_for_user(user_id, space_slug, &self.pool).await
    }

    async fn find_valuator_role_by_id(
        &self,
        id: ValuatorRoleId,
    ) -> StoreResult<Option<ValuatorRole>> {
        ValuatorRole::find_by_id(id, &self.pool).await
    }

    async fn assign_valuator(
        &self,
        fiction_id: FictionId,
        role_id: ValuatorRoleId,
    ) -> StoreResult<Option<ValuationAssignment>> {
        ValuationAssignment::create(fiction_id, role_id, &self.pool).await
    }

    async fn unassign_valuator(
        &self,
        fiction_id: FictionId,
        role_id: ValuatorRoleId,
    ) -> StoreResult<bool> {
        ValuationAssignment::delete(fiction_id, role_id, &self.pool).await
    }

    async fn is_assigned(&self, fiction_id: FictionId, role_id: ValuatorRoleId) -> StoreResult<bool> {
        ValuationAssignment::exists(fiction_id, role_id, &self.pool).await
    }

    async fn valuator_roles_for(&self, fiction_id: FictionId) -> StoreResult<Vec<ValuatorRoleId>> {
        ValuationAssignment::roles_for_fiction(fiction_id, &self.pool).await
    }

    async fn insert_note(
        &self,
        fiction_id: FictionId,
        author_id: UserId,
        body: &str,
    ) -> StoreResult<Note> {
        Note::create(fiction_id, author_id, body, &self.pool).await
    }

    async fn notes(&self, fiction_id: FictionId) -> StoreResult<Vec<Note>> {
        Note::find_by_fiction(fiction_id, &self.pool).await
    }
}

#[async_trait]
impl BaseDraftStore for PgStore {
    async fn find_draft(&self, id: CollaborativeDraftId) -> StoreResult<Option<CollaborativeDraft>> {
        CollaborativeDraft::find_by_id(id, &self.pool).await
    }

    async fn insert_draft(
        &self,
        component_id: ComponentId,
        title: &str,
        body: &str,
        creator: UserId,
    ) -> StoreResult<CollaborativeDraft> {
        CollaborativeDraft::create(component_id, title, body, creator, &self.pool).await
    }

    async fn save_draft(&self, draft: &CollaborativeDraft) -> StoreResult<CollaborativeDraft> {
        draft.save(&self.pool).await
    }

    async fn draft_coauthors(&self, id: CollaborativeDraftId) -> StoreResult<Vec<UserId>> {
        CollaborativeDraft::coauthors(id, &self.pool).await
    }

    async fn add_draft_coauthor(&self, id: CollaborativeDraftId, user_id: UserId) -> StoreResult<()> {
        CollaborativeDraft::add_coauthor(id, user_id, &self.pool).await
    }

    async fn draft_requesters(&self, id: CollaborativeDraftId) -> StoreResult<Vec<UserId>> {
        CollaborativeDraft::requesters(id, &self.pool).await
    }

    async fn add_access_request(&self, id: CollaborativeDraftId, user_id: UserId) -> StoreResult<()> {
        CollaborativeDraft::add_requester(id, user_id, &self.pool).await
    }

    async fn remove_access_request(
        &self,
        id: CollaborativeDraftId,
        user_id: UserId,
    ) -> StoreResult<bool> {
        CollaborativeDraft::remove_requester(id, user_id, &self.pool).await
    }
}

#[async_trait]
impl BaseAmendmentStore for PgStore {
    async fn insert_amendment(
        &self,
        amendable_id: FictionId,
        emendation_id: FictionId,
        amender_id: UserId,
        state: AmendmentState,
    ) -> StoreResult<Amendment> {
        Amendment::create(amendable_id, emendation_id, amender_id, state, &self.pool).await
    }

    async fn find_amendment(&self, id: AmendmentId) -> StoreResult<Option<Amendment>> {
        Amendment::find_by_id(id, &self.pool).await
    }

    async fn find_amendment_by_emendation(
        &self,
        emendation_id: FictionId,
    ) -> StoreResult<Option<Amendment>> {
        Amendment::find_by_emendation(emendation_id, &self.pool).await
    }

    async fn amendments_for(&self, amendable_id: FictionId) -> StoreResult<Vec<Amendment>> {
        Amendment::find_by_amendable(amendable_id, &self.pool).await
    }

    async fn update_amendment_state(
        &self,
        id: AmendmentId,
        state: AmendmentState,
    ) -> StoreResult<Amendment> {
        Amendment::update_state(id, state, &self.pool).await
    }
}
