use tracing::{debug, info};

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId, ValuatorRoleId};
use crate::domains::components::models::Component;
use crate::domains::fictions::actions::support::{load_component, load_fictions};
use crate::domains::fictions::events::FictionEvent;
use crate::domains::valuations::models::ValuatorRole;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// The role must exist and belong to the component's space.
async fn load_role(
    component: &Component,
    role_id: ValuatorRoleId,
    deps: &ServerDeps,
) -> Result<ValuatorRole, ActionError> {
    deps.store
        .find_valuator_role_by_id(role_id)
        .await?
        .filter(|role| role.space_slug == component.space_slug)
        .ok_or_else(|| ActionError::invalid("valuator_role_id", "is invalid"))
}

/// Assign fictions to a valuator role. Returns the fictions that were not
/// assigned before.
pub async fn assign_valuator(
    component_id: ComponentId,
    fiction_ids: &[FictionId],
    valuator_role_id: ValuatorRoleId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<FictionId>, ActionError> {
    info!(
        component_id = %component_id,
        valuator_role_id = %valuator_role_id,
        count = fiction_ids.len(),
        "Assigning fictions to valuator"
    );

    let component = load_component(component_id, deps).await?;
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, &component).await?;
    let ctx = loader.for_component(&component, Some(&actor)).await?;
    actor
        .can(PermissionAction::admin(Action::AssignToValuator, Subject::Fictions))
        .on(&ctx)
        .check()?;

    let role = load_role(&component, valuator_role_id, deps).await?;
    let mut assigned = Vec::new();
    for fiction in load_fictions(&component, fiction_ids, deps).await? {
        match deps.store.assign_valuator(fiction.id, role.id).await? {
            Some(_) => assigned.push(fiction.id),
            None => debug!(fiction_id = %fiction.id, "already assigned"),
        }
    }

    if !assigned.is_empty() {
        deps.notifier.notify(FictionEvent::ValuatorAssigned {
            component_id: component.id,
            fiction_ids: assigned.clone(),
            valuator_role_id: role.id,
        });
    }
    Ok(assigned)
}

/// Remove assignments. Valuators may only remove their own.
pub async fn unassign_valuator(
    component_id: ComponentId,
    fiction_ids: &[FictionId],
    valuator_role_id: ValuatorRoleId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<FictionId>, ActionError> {
    info!(
        component_id = %component_id,
        valuator_role_id = %valuator_role_id,
        count = fiction_ids.len(),
        "Unassigning fictions from valuator"
    );

    let component = load_component(component_id, deps).await?;
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, &component).await?;
    let ctx = loader
        .for_component(&component, Some(&actor))
        .await?
        .with_target_valuator_role(valuator_role_id);
    actor
        .can(PermissionAction::admin(Action::UnassignFromValuator, Subject::Fictions))
        .on(&ctx)
        .check()?;

    let role = load_role(&component, valuator_role_id, deps).await?;
    let mut unassigned = Vec::new();
    for fiction in load_fictions(&component, fiction_ids, deps).await? {
        if deps.store.unassign_valuator(fiction.id, role.id).await? {
            unassigned.push(fiction.id);
        }
    }

    if !unassigned.is_empty() {
        deps.notifier.notify(FictionEvent::ValuatorUnassigned {
            component_id: component.id,
            fiction_ids: unassigned.clone(),
            valuator_role_id: role.id,
        });
    }
    Ok(unassigned)
}
