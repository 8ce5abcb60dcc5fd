//! Citizen routes under `/components/:component_id/fictions`.

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::api::{present, present_one, ApiError, ApiResult, RequireActor};
use crate::common::{ActionError, ComponentId, FictionId, SortDirection, UserGroupId};
use crate::domains::fictions::actions as fiction_actions;
use crate::domains::fictions::actions::support::load_component;
use crate::domains::fictions::data::{FictionData, FictionInput};
use crate::domains::fictions::queries::{
    find_published_in_component, FictionOrder, FictionOrderField, FictionQuery,
};
use crate::domains::fictions::versions::{render_versions, VersionDiff};
use crate::domains::votes::actions as vote_actions;
use crate::kernel::traits::*;
use crate::server::app::AxumAppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub published_since: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    pub order_field: Option<FictionOrderField>,
    pub order_direction: Option<SortDirection>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListParams> for FictionQuery {
    fn from(params: ListParams) -> Self {
        let defaults = FictionQuery::default();
        FictionQuery {
            published_since: params.published_since,
            published_before: params.published_before,
            order: FictionOrder {
                field: params.order_field.unwrap_or_default(),
                direction: params.order_direction.unwrap_or_default(),
            },
            limit: params.limit.unwrap_or(defaults.limit),
            offset: params.offset.unwrap_or(defaults.offset),
        }
        .normalized()
    }
}

#[derive(Debug, Serialize)]
pub struct FictionList {
    pub fictions: Vec<FictionData>,
    pub total_count: i64,
    pub has_next_page: bool,
}

/// GET /components/:component_id/fictions
pub async fn list_fictions(
    Extension(state): Extension<AxumAppState>,
    Path(component_id): Path<ComponentId>,
    Query(params): Query<ListParams>,
) -> ApiResult<FictionList> {
    let deps = &state.server_deps;
    let component = load_component(component_id, deps).await?;
    let query = FictionQuery::from(params);

    let fictions = deps.store.find_published(component.id, &query).await?;
    let total_count = deps.store.count_published(component.id, &query).await?;
    let has_next_page = query.offset + (fictions.len() as i64) < total_count;

    Ok(Json(FictionList {
        fictions: present(component.id, fictions, deps).await?,
        total_count,
        has_next_page,
    }))
}

/// GET /components/:component_id/fictions/:fiction_id
pub async fn show_fiction(
    Extension(state): Extension<AxumAppState>,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction = find_published_in_component(deps.store(), component_id, fiction_id)
        .await?
        .ok_or(ApiError(ActionError::NotFound("Fiction")))?;
    present_one(component_id, fiction, deps).await
}

/// GET /components/:component_id/fictions/:fiction_id/versions
pub async fn fiction_versions(
    Extension(state): Extension<AxumAppState>,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
) -> ApiResult<Vec<VersionDiff>> {
    let deps = &state.server_deps;
    let fiction = find_published_in_component(deps.store(), component_id, fiction_id)
        .await?
        .ok_or(ApiError(ActionError::NotFound("Fiction")))?;
    let versions = deps.store.versions(fiction.id).await?;
    Ok(Json(render_versions(&versions)))
}

#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// GET /components/:component_id/similar_fictions?title=..&body=..
pub async fn similar_fictions(
    Extension(state): Extension<AxumAppState>,
    Path(component_id): Path<ComponentId>,
    Query(params): Query<SimilarParams>,
) -> ApiResult<Vec<FictionData>> {
    let deps = &state.server_deps;
    let component = load_component(component_id, deps).await?;
    let similar = deps
        .store
        .find_similar(
            component.id,
            &params.title,
            &params.body,
            deps.config.similarity_threshold,
            deps.config.similarity_limit,
        )
        .await?;
    Ok(Json(present(component.id, similar, deps).await?))
}

/// POST /components/:component_id/fictions
pub async fn create_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<FictionInput>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction = fiction_actions::create_fiction(component_id, input, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}

/// PUT /components/:component_id/fictions/:fiction_id
pub async fn edit_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
    Json(input): Json<FictionInput>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction =
        fiction_actions::edit_fiction(component_id, fiction_id, input, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}

/// POST /components/:component_id/fictions/:fiction_id/publish
pub async fn publish_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction = fiction_actions::publish_fiction(component_id, fiction_id, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}

/// POST /components/:component_id/fictions/:fiction_id/withdraw
pub async fn withdraw_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction =
        fiction_actions::withdraw_fiction(component_id, fiction_id, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}

/// POST /components/:component_id/fictions/:fiction_id/votes
pub async fn vote_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction = vote_actions::vote_fiction(component_id, fiction_id, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}

/// DELETE /components/:component_id/fictions/:fiction_id/votes
pub async fn unvote_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction = vote_actions::unvote_fiction(component_id, fiction_id, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}

#[derive(Debug, Default, Deserialize)]
pub struct EndorseParams {
    #[serde(default)]
    pub user_group_id: Option<UserGroupId>,
}

/// POST /components/:component_id/fictions/:fiction_id/endorsements
pub async fn endorse_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
    params: Option<Json<EndorseParams>>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let user_group_id = params.and_then(|Json(p)| p.user_group_id);
    let fiction =
        vote_actions::endorse_fiction(component_id, fiction_id, user_group_id, &actor, deps)
            .await?;
    present_one(component_id, fiction, deps).await
}

/// DELETE /components/:component_id/fictions/:fiction_id/endorsements
pub async fn unendorse_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction =
        vote_actions::unendorse_fiction(component_id, fiction_id, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}
