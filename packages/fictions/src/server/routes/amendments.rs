//! Amendment routes: citizens propose emendations, authors review them.

use axum::{
    extract::{Extension, Path},
    Json,
};

use super::api::{present_one, ApiResult, RequireActor};
use crate::common::{AmendmentId, ComponentId, FictionId};
use crate::domains::amendments::actions::{self as amendment_actions, EmendationInput};
use crate::domains::amendments::Amendment;
use crate::domains::fictions::FictionData;
use crate::server::app::AxumAppState;

/// POST /components/:component_id/fictions/:fiction_id/amendments
pub async fn amend_fiction(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, fiction_id)): Path<(ComponentId, FictionId)>,
    Json(input): Json<EmendationInput>,
) -> ApiResult<Amendment> {
    let amendment = amendment_actions::amend_fiction(
        component_id,
        fiction_id,
        input,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(amendment))
}

/// POST /components/:component_id/amendments/:amendment_id/accept
pub async fn accept_amendment(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, amendment_id)): Path<(ComponentId, AmendmentId)>,
) -> ApiResult<Amendment> {
    let amendment =
        amendment_actions::accept_amendment(component_id, amendment_id, &actor, &state.server_deps)
            .await?;
    Ok(Json(amendment))
}

/// POST /components/:component_id/amendments/:amendment_id/reject
pub async fn reject_amendment(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, amendment_id)): Path<(ComponentId, AmendmentId)>,
) -> ApiResult<Amendment> {
    let amendment =
        amendment_actions::reject_amendment(component_id, amendment_id, &actor, &state.server_deps)
            .await?;
    Ok(Json(amendment))
}

/// POST /components/:component_id/amendments/:amendment_id/withdraw
pub async fn withdraw_amendment(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, amendment_id)): Path<(ComponentId, AmendmentId)>,
) -> ApiResult<Amendment> {
    let amendment = amendment_actions::withdraw_amendment(
        component_id,
        amendment_id,
        &actor,
        &state.server_deps,
    )
    .await?;
    Ok(Json(amendment))
}

/// POST /components/:component_id/amendments/:amendment_id/promote
pub async fn promote_emendation(
    Extension(state): Extension<AxumAppState>,
    RequireActor(actor): RequireActor,
    Path((component_id, amendment_id)): Path<(ComponentId, AmendmentId)>,
) -> ApiResult<FictionData> {
    let deps = &state.server_deps;
    let fiction =
        amendment_actions::promote_emendation(component_id, amendment_id, &actor, deps).await?;
    present_one(component_id, fiction, deps).await
}
