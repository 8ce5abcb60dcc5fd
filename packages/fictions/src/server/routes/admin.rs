//! Admin routes under `/admin/components/:component_id`.
//!
//! Vote counts are never hidden here.

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;

use super::api::{ApiResult, RequireActor};
use crate::common::{CategoryId, ComponentId, FictionId, ScopeId, ValuatorRoleId};
use crate::domains::components::actions as component_actions;
use crate::domains::components::{Component, StepSettings};
use crate::domains::fictions::actions as fiction_actions;
use crate::domains::fictions::data::{
    AnswerInput, ExportRow, FictionData, FictionInput, ImportInput, MergeInput, SplitInput,
};
use crate::domains::fictions::Fiction;
use crate::domains::valuations::actions as valuation_actions;
use crate::domains::valuations::Note;
use crate::server::app::AxumAppState;

fn admin_view(fictions: Vec<Fiction>) -> Vec<FictionData> {
    fictions.into_iter().map(FictionData::from).collect()
}

#[derive(Debug, Deserialize)]
pub struct FictionIdsInput {
    pub fiction_ids: Vec<FictionId>,
}

#[derive(Debug, Deserialize)]
pub struct NoteInput {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentInput {
    pub fiction_ids: Vec<FictionId>,
    pub valuator_role_id: ValuatorRoleId,
}

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub fiction_ids: Vec<FictionId>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Deserialize)]
pub struct ScopeInput {
    pub fiction_ids: Vec<FictionId>,
    #[serde(default)]
    pub scope_id: Option<ScopeId>,
}

/// POST /admin/components/:component_id/fictions
pub async fn create_official_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<FictionInput>,
) -> ApiResult<FictionData> {
    let fiction =
        fiction_actions::create_official_fiction(component_id, input, &actor, &state.server_deps)
            .await?;
    Ok(Json(fiction.into()))
}

/// PUT /admin/components/:component_id/fictions/:fiction_id
pub async fn edit_official_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
    Json(input): Json<FictionInput>,
) -> ApiResult<FictionData> {
    let fiction = fiction_actions::edit_official_fiction(
        component_id,
        fiction_id,
        input,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(fiction.into()))
}

/// POST /admin/components/:component_id/fictions/:fiction_id/answer
pub async fn answer_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
    Json(input): Json<AnswerInput>,
) -> ApiResult<FictionData> {
    let fiction =
        fiction_actions::answer_fiction(component_id, fiction_id, input, &actor, &state.server_deps)
            .await?;
    Ok(Json(fiction.into()))
}

/// POST /admin/components/:component_id/fictions/:fiction_id/notes
pub async fn create_note(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
    Json(input): Json<NoteInput>,
) -> ApiResult<Note> {
    let note = valuation_actions::create_note(
        component_id,
        fiction_id,
        &input.body,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(note))
}

/// POST /admin/components/:component_id/publish_answers
pub async fn publish_answers(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<FictionIdsInput>,
) -> ApiResult<Vec<FictionData>> {
    let fictions = fiction_actions::publish_answers(
        component_id,
        &input.fiction_ids,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(admin_view(fictions)))
}

/// POST /admin/components/:component_id/valuation_assignments
pub async fn assign_valuator(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<AssignmentInput>,
) -> ApiResult<Vec<FictionId>> {
    let assigned = valuation_actions::assign_valuator(
        component_id,
        &input.fiction_ids,
        input.valuator_role_id,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(assigned))
}

/// DELETE /admin/components/:component_id/valuation_assignments
pub async fn unassign_valuator(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<AssignmentInput>,
) -> ApiResult<Vec<FictionId>> {
    let unassigned = valuation_actions::unassign_valuator(
        component_id,
        &input.fiction_ids,
        input.valuator_role_id,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(unassigned))
}

/// POST /admin/components/:component_id/category
pub async fn update_category(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Vec<FictionData>> {
    let fictions = fiction_actions::update_category(
        component_id,
        &input.fiction_ids,
        input.category_id,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(admin_view(fictions)))
}

/// POST /admin/components/:component_id/scope
pub async fn update_scope(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<ScopeInput>,
) -> ApiResult<Vec<FictionData>> {
    let fictions = fiction_actions::update_scope(
        component_id,
        &input.fiction_ids,
        input.scope_id,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(admin_view(fictions)))
}

/// POST /admin/components/:component_id/merge
pub async fn merge_fictions(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<MergeInput>,
) -> ApiResult<FictionData> {
    let merged =
        fiction_actions::merge_fictions(component_id, input, &actor, &state.server_deps).await?;
    Ok(Json(merged.into()))
}

/// POST /admin/components/:component_id/split
pub async fn split_fictions(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<SplitInput>,
) -> ApiResult<Vec<FictionData>> {
    let fictions =
        fiction_actions::split_fictions(component_id, input, &actor, &state.server_deps).await?;
    Ok(Json(admin_view(fictions)))
}

/// POST /admin/components/:component_id/import
pub async fn import_fictions(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(input): Json<ImportInput>,
) -> ApiResult<Vec<FictionData>> {
    let fictions =
        fiction_actions::import_fictions(component_id, input, &actor, &state.server_deps).await?;
    Ok(Json(admin_view(fictions)))
}

/// GET /admin/components/:component_id/export
pub async fn export_fictions(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
) -> ApiResult<Vec<ExportRow>> {
    let rows = fiction_actions::export_fictions(component_id, &actor, &state.server_deps).await?;
    Ok(Json(rows))
}

/// PUT /admin/components/:component_id/step_settings
pub async fn update_step_settings(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path(component_id): Path<ComponentId>,
    Json(settings): Json<StepSettings>,
) -> ApiResult<Component> {
    let component = component_actions::update_step_settings(
        component_id,
        settings,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(component))
}
