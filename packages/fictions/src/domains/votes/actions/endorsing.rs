use tracing::{debug, info};

use super::voting::{reload, supportable};
use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId, StoreError, UserGroupId};
use crate::domains::fictions::actions::support::{load_component, load_fiction};
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::models::Fiction;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Endorse a fiction, optionally on behalf of one of the actor's groups.
pub async fn endorse_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    user_group_id: Option<UserGroupId>,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Endorsing fiction");

    let (component, fiction) = supportable(component_id, fiction_id, deps).await?;
    let ctx = deps
        .permissions()
        .for_fiction(&component, &fiction, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(Action::Endorse, Subject::Fiction))
        .on(&ctx)
        .check()?;

    match deps
        .store
        .insert_endorsement(fiction.id, actor.user_id, user_group_id)
        .await
    {
        Ok(_) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ActionError::invalid("base", "has already been endorsed"));
        }
        Err(e) => return Err(e.into()),
    }

    deps.notifier.notify(FictionEvent::FictionEndorsed {
        component_id: component.id,
        fiction_id: fiction.id,
        endorser_id: actor.user_id,
    });
    reload(fiction.id, deps).await
}

pub async fn unendorse_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Removing endorsement");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    let ctx = deps
        .permissions()
        .for_fiction(&component, &fiction, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(Action::Unendorse, Subject::Fiction))
        .on(&ctx)
        .check()?;

    if !deps.store.delete_endorsement(fiction.id, actor.user_id).await? {
        debug!(fiction_id = %fiction.id, "no endorsement to remove");
    }
    reload(fiction.id, deps).await
}
