//! Lookups and persistence steps shared by fiction actions.

use crate::common::{ActionError, ComponentId, FictionId, UserId};
use crate::domains::components::models::Component;
use crate::domains::fictions::models::{Fiction, NewVersion, VersionEvent};
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

pub async fn load_component(
    component_id: ComponentId,
    deps: &ServerDeps,
) -> Result<Component, ActionError> {
    deps.store
        .find_component(component_id)
        .await?
        .ok_or(ActionError::NotFound("Component"))
}

/// A fiction of `component`; fictions of other components are not found.
pub async fn load_fiction(
    component: &Component,
    fiction_id: FictionId,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    deps.store
        .find_fiction(fiction_id)
        .await?
        .filter(|f| f.component_id == component.id)
        .ok_or(ActionError::NotFound("Fiction"))
}

/// Every id must name a fiction of `component`.
pub async fn load_fictions(
    component: &Component,
    ids: &[FictionId],
    deps: &ServerDeps,
) -> Result<Vec<Fiction>, ActionError> {
    let fictions = deps.store.find_fictions(ids).await?;
    let all_found = ids
        .iter()
        .all(|id| fictions.iter().any(|f| f.id == *id && f.component_id == component.id));
    if !all_found {
        return Err(ActionError::NotFound("Fiction"));
    }
    Ok(fictions)
}

/// Saves `after` and records an `update` version when tracked attributes
/// changed.
pub async fn save_tracked(
    before: &Fiction,
    after: &Fiction,
    whodunnit: Option<UserId>,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    let saved = deps.store.save_fiction(after).await?;
    let changeset = saved.changes_from(before);
    if !changeset.is_empty() {
        deps.store
            .record_version(&NewVersion {
                fiction_id: saved.id,
                event: VersionEvent::Update,
                changeset,
                whodunnit,
            })
            .await?;
    }
    Ok(saved)
}
