// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business rules live in the domain actions that call these traits.
//
// Naming convention: Base* for trait names (e.g., BaseFictionStore)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{
    AmendmentId, CollaborativeDraftId, ComponentId, FictionId, StoreResult, UserGroupId, UserId,
    ValuatorRoleId,
};
use crate::domains::amendments::models::{Amendment, AmendmentState};
use crate::domains::collaborative_drafts::models::CollaborativeDraft;
use crate::domains::components::models::{Component, StepSettings};
use crate::domains::fictions::models::{
    Attachment, Coauthorship, Fiction, FictionState, NewAttachment, NewFiction, NewVersion,
    Version,
};
use crate::domains::fictions::queries::FictionQuery;
use crate::domains::valuations::models::{Note, ValuationAssignment, ValuatorRole};
use crate::domains::votes::models::{Endorsement, Vote};

// =============================================================================
// Component Store
// =============================================================================

#[async_trait]
pub trait BaseComponentStore: Send + Sync {
    async fn find_component(&self, id: ComponentId) -> StoreResult<Option<Component>>;

    async fn update_step_settings(
        &self,
        id: ComponentId,
        step_settings: &StepSettings,
    ) -> StoreResult<Component>;
}

// =============================================================================
// Fiction Store
// =============================================================================

#[async_trait]
pub trait BaseFictionStore: Send + Sync {
    async fn find_fiction(&self, id: FictionId) -> StoreResult<Option<Fiction>>;

    /// Existing fictions among `ids`, ordered by id.
    async fn find_fictions(&self, ids: &[FictionId]) -> StoreResult<Vec<Fiction>>;

    async fn find_published(
        &self,
        component_id: ComponentId,
        query: &FictionQuery,
    ) -> StoreResult<Vec<Fiction>>;

    async fn count_published(
        &self,
        component_id: ComponentId,
        query: &FictionQuery,
    ) -> StoreResult<i64>;

    async fn find_similar(
        &self,
        component_id: ComponentId,
        title: &str,
        body: &str,
        threshold: f64,
        limit: i64,
    ) -> StoreResult<Vec<Fiction>>;

    async fn find_importable(
        &self,
        origin: ComponentId,
        target: ComponentId,
        states: &[FictionState],
    ) -> StoreResult<Vec<Fiction>>;

    async fn count_published_by_author(
        &self,
        component_id: ComponentId,
        author_id: UserId,
    ) -> StoreResult<i64>;

    async fn insert_fiction(
        &self,
        new: &NewFiction,
        coauthors: &[Coauthorship],
    ) -> StoreResult<Fiction>;

    async fn save_fiction(&self, fiction: &Fiction) -> StoreResult<Fiction>;

    async fn delete_fiction(&self, id: FictionId) -> StoreResult<()>;

    async fn coauthorships(&self, id: FictionId) -> StoreResult<Vec<Coauthorship>>;

    async fn link_fictions(&self, from: FictionId, to: FictionId, name: &str) -> StoreResult<()>;

    async fn linked_fictions(&self, from: FictionId, name: &str) -> StoreResult<Vec<FictionId>>;

    async fn record_version(&self, version: &NewVersion) -> StoreResult<Version>;

    async fn versions(&self, id: FictionId) -> StoreResult<Vec<Version>>;

    async fn attachments(&self, id: FictionId) -> StoreResult<Vec<Attachment>>;

    async fn insert_attachment(&self, attachment: &NewAttachment) -> StoreResult<Attachment>;
}

// =============================================================================
// Vote Store
// =============================================================================

#[async_trait]
pub trait BaseVoteStore: Send + Sync {
    /// A second vote by the same author is `StoreError::Conflict`.
    async fn insert_vote(&self, fiction_id: FictionId, author_id: UserId) -> StoreResult<Vote>;

    async fn delete_vote(&self, fiction_id: FictionId, author_id: UserId) -> StoreResult<bool>;

    async fn count_votes_in_component(
        &self,
        component_id: ComponentId,
        author_id: UserId,
    ) -> StoreResult<i64>;

    async fn insert_endorsement(
        &self,
        fiction_id: FictionId,
        author_id: UserId,
        user_group_id: Option<UserGroupId>,
    ) -> StoreResult<Endorsement>;

    async fn delete_endorsement(&self, fiction_id: FictionId, author_id: UserId)
        -> StoreResult<bool>;
}

// =============================================================================
// Valuation Store
// =============================================================================

#[async_trait]
pub trait BaseValuationStore: Send + Sync {
    async fn find_valuator_role(
        &self,
        user_id: UserId,
        space_slug: &str,
    ) -> StoreResult<Option<ValuatorRole>>;

    async fn find_valuator_role_by_id(&self, id: ValuatorRoleId)
        -> StoreResult<Option<ValuatorRole>>;

    /// `None` when the pair was already assigned.
    async fn assign_valuator(
        &self,
        fiction_id: FictionId,
        role_id: ValuatorRoleId,
    ) -> StoreResult<Option<ValuationAssignment>>;

    async fn unassign_valuator(&self, fiction_id: FictionId, role_id: ValuatorRoleId)
        -> StoreResult<bool>;

    async fn is_assigned(&self, fiction_id: FictionId, role_id: ValuatorRoleId) -> StoreResult<bool>;

    async fn valuator_roles_for(&self, fiction_id: FictionId) -> StoreResult<Vec<ValuatorRoleId>>;

    async fn insert_note(&self, fiction_id: FictionId, author_id: UserId, body: &str)
        -> StoreResult<Note>;

    async fn notes(&self, fiction_id: FictionId) -> StoreResult<Vec<Note>>;
}

// =============================================================================
// Collaborative Draft Store
// =============================================================================

#[async_trait]
pub trait BaseDraftStore: Send + Sync {
    async fn find_draft(&self, id: CollaborativeDraftId) -> StoreResult<Option<CollaborativeDraft>>;

    async fn insert_draft(
        &self,
        component_id: ComponentId,
        title: &str,
        body: &str,
        creator: UserId,
    ) -> StoreResult<CollaborativeDraft>;

    async fn save_draft(&self, draft: &CollaborativeDraft) -> StoreResult<CollaborativeDraft>;

    async fn draft_coauthors(&self, id: CollaborativeDraftId) -> StoreResult<Vec<UserId>>;

    async fn add_draft_coauthor(&self, id: CollaborativeDraftId, user_id: UserId) -> StoreResult<()>;

    async fn draft_requesters(&self, id: CollaborativeDraftId) -> StoreResult<Vec<UserId>>;

    /// A repeated request is `StoreError::Conflict`.
    async fn add_access_request(&self, id: CollaborativeDraftId, user_id: UserId) -> StoreResult<()>;

    async fn remove_access_request(&self, id: CollaborativeDraftId, user_id: UserId)
        -> StoreResult<bool>;
}

// =============================================================================
// Amendment Store
// =============================================================================

#[async_trait]
pub trait BaseAmendmentStore: Send + Sync {
    async fn insert_amendment(
        &self,
        amendable_id: FictionId,
        emendation_id: FictionId,
        amender_id: UserId,
        state: AmendmentState,
    ) -> StoreResult<Amendment>;

    async fn find_amendment(&self, id: AmendmentId) -> StoreResult<Option<Amendment>>;

    async fn find_amendment_by_emendation(
        &self,
        emendation_id: FictionId,
    ) -> StoreResult<Option<Amendment>>;

    async fn amendments_for(&self, amendable_id: FictionId) -> StoreResult<Vec<Amendment>>;

    async fn update_amendment_state(
        &self,
        id: AmendmentId,
        state: AmendmentState,
    ) -> StoreResult<Amendment>;
}

/// Every repository the component needs.
pub trait Store:
    BaseComponentStore
    + BaseFictionStore
    + BaseVoteStore
    + BaseValuationStore
    + BaseDraftStore
    + BaseAmendmentStore
{
}

impl<T> Store for T where
    T: BaseComponentStore
        + BaseFictionStore
        + BaseVoteStore
        + BaseValuationStore
        + BaseDraftStore
        + BaseAmendmentStore
{
}

// =============================================================================
// File Storage Trait (Infrastructure - attachment bytes)
// =============================================================================

#[async_trait]
pub trait BaseFileStorage: Send + Sync {
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;
}
