//! Collaborative draft routes under `/components/:component_id/drafts`.

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Serialize;

use super::api::{present_one, ApiError, ApiResult, RequireActor};
use crate::common::{ActionError, CollaborativeDraftId, ComponentId, UserId};
use crate::domains::collaborative_drafts::actions::{self as draft_actions, DraftInput};
use crate::domains::collaborative_drafts::CollaborativeDraft;
use crate::domains::fictions::FictionData;
use crate::kernel::traits::*;
use crate::server::app::AxumAppState;

#[derive(Debug, Serialize)]
pub struct DraftView {
    #[serde(flatten)]
    pub draft: CollaborativeDraft,
    pub coauthor_ids: Vec<UserId>,
    pub requester_ids: Vec<UserId>,
}

#[derive(Debug, Serialize)]
pub struct PublishedDraft {
    pub draft: CollaborativeDraft,
    pub fiction: FictionData,
}

/// GET /components/:component_id/drafts/:draft_id
pub async fn show_draft(
    Extension(state): Extension<AxumAppState>,
    Path((component_id, draft_id)): Path<(ComponentId, CollaborativeDraftId)>,
) -> ApiResult<DraftView> {
    let store = &state.server_deps.store;
    let draft = store
        .find_draft(draft_id)
        .await?
        .filter(|d| d.component_id == component_id)
        .ok_or(ApiError(ActionError::NotFound("Collaborative draft")))?;

    Ok(Json(DraftView {
        coauthor_ids: store.draft_coauthors(draft.id).await?,
        requester_ids: store.draft_requesters(draft.id).await?,
        draft,
    }))
}

/// POST /components/:component_id/drafts
pub async fn create_draft(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<DraftInput>,
) -> ApiResult<CollaborativeDraft> {
    let draft =
        draft_actions::create_draft(component_id, input, &actor, &state.server_deps).await?;
    Ok(Json(draft))
}

/// PUT /components/:component_id/drafts/:draft_id
pub async fn edit_draft(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, draft_id)): Path<(ComponentId, CollaborativeDraftId)>,
    Json(input): Json<DraftInput>,
) -> ApiResult<CollaborativeDraft> {
    let draft =
        draft_actions::edit_draft(component_id, draft_id, input, &actor, &state.server_deps)
            .await?;
    Ok(Json(draft))
}

/// POST /components/:component_id/drafts/:draft_id/withdraw
pub async fn withdraw_draft(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, draft_id)): Path<(ComponentId, CollaborativeDraftId)>,
) -> ApiResult<CollaborativeDraft> {
    let draft =
        draft_actions::withdraw_draft(component_id, draft_id, &actor, &state.server_deps).await?;
    Ok(Json(draft))
}

/// POST /components/:component_id/drafts/:draft_id/publish
pub async fn publish_draft(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, draft_id)): Path<(ComponentId, CollaborativeDraftId)>,
) -> ApiResult<PublishedDraft> {
    let deps = &state.server_deps;
    let (draft, fiction) =
        draft_actions::publish_draft(component_id, draft_id, &actor, deps).await?;
    let Json(fiction) = present_one(component_id, fiction, deps).await?;
    Ok(Json(PublishedDraft { draft, fiction }))
}

/// POST /components/:component_id/drafts/:draft_id/access_requests
pub async fn request_access(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, draft_id)): Path<(ComponentId, CollaborativeDraftId)>,
) -> ApiResult<CollaborativeDraft> {
    let draft =
        draft_actions::request_access(component_id, draft_id, &actor, &state.server_deps).await?;
    Ok(Json(draft))
}

/// POST /components/:component_id/drafts/:draft_id/access_requests/:requester_id/accept
pub async fn accept_access_request(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, draft_id, requester_id)): Path<(ComponentId, CollaborativeDraftId, UserId)>,
) -> ApiResult<CollaborativeDraft> {
    let draft = draft_actions::accept_access_request(
        component_id,
        draft_id,
        requester_id,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(draft))
}

/// POST /components/:component_id/drafts/:draft_id/access_requests/:requester_id/reject
pub async fn reject_access_request(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, draft_id, requester_id)): Path<(ComponentId, CollaborativeDraftId, UserId)>,
) -> ApiResult<CollaborativeDraft> {
    let draft = draft_actions::reject_access_request(
        component_id,
        draft_id,
        requester_id,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(draft))
}
