//! Reviewing amendments: the amendable's authors accept or reject, the
//! amender withdraws or promotes a rejected emendation.

use chrono::Utc;
use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, AmendmentId, ComponentId};
use crate::domains::amendments::models::{Amendment, AmendmentState};
use crate::domains::components::models::Component;
use crate::domains::fictions::actions::support::{load_component, load_fiction, save_tracked};
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::factory::{Authors, CopyOptions, FictionFactory};
use crate::domains::fictions::models::{Fiction, FictionState};
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Link from an emendation to the fiction it was promoted into.
pub const PROMOTED: &str = "promoted";

struct Loaded {
    component: Component,
    amendment: Amendment,
    amendable: Fiction,
    emendation: Fiction,
}

async fn load(
    component_id: ComponentId,
    amendment_id: AmendmentId,
    deps: &ServerDeps,
) -> Result<Loaded, ActionError> {
    let component = load_component(component_id, deps).await?;
    let amendment = deps
        .store
        .find_amendment(amendment_id)
        .await?
        .ok_or(ActionError::NotFound("Amendment"))?;
    let amendable = load_fiction(&component, amendment.amendable_id, deps).await?;
    let emendation = load_fiction(&component, amendment.emendation_id, deps).await?;
    Ok(Loaded {
        component,
        amendment,
        amendable,
        emendation,
    })
}

async fn authorize(
    loaded: &Loaded,
    action: Action,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<(), ActionError> {
    let ctx = deps.permissions().for_amendment(&loaded.amendment).await?;
    actor
        .can(PermissionAction::public(action, Subject::Amendment))
        .on(&ctx)
        .check()?;
    Ok(())
}

/// Take the emendation's text into the amendable fiction.
pub async fn accept_amendment(
    component_id: ComponentId,
    amendment_id: AmendmentId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Amendment, ActionError> {
    info!(amendment_id = %amendment_id, user_id = %actor.user_id, "Accepting amendment");

    let loaded = load(component_id, amendment_id, deps).await?;
    authorize(&loaded, Action::Accept, actor, deps).await?;

    let mut amended = loaded.amendable.clone();
    amended.title = loaded.emendation.title.clone();
    amended.body = loaded.emendation.body.clone();
    save_tracked(&loaded.amendable, &amended, Some(actor.user_id), deps).await?;

    let amendment = deps
        .store
        .update_amendment_state(loaded.amendment.id, AmendmentState::Accepted)
        .await?;

    deps.notifier.notify(FictionEvent::AmendmentAccepted {
        component_id: loaded.component.id,
        amendment_id: amendment.id,
        amendable_id: loaded.amendable.id,
    });
    Ok(amendment)
}

pub async fn reject_amendment(
    component_id: ComponentId,
    amendment_id: AmendmentId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Amendment, ActionError> {
    info!(amendment_id = %amendment_id, user_id = %actor.user_id, "Rejecting amendment");

    let loaded = load(component_id, amendment_id, deps).await?;
    authorize(&loaded, Action::Reject, actor, deps).await?;

    let amendment = deps
        .store
        .update_amendment_state(loaded.amendment.id, AmendmentState::Rejected)
        .await?;

    deps.notifier.notify(FictionEvent::AmendmentRejected {
        component_id: loaded.component.id,
        amendment_id: amendment.id,
        amendable_id: loaded.amendable.id,
    });
    Ok(amendment)
}

/// The amender takes the emendation back; the emendation is withdrawn with
/// it.
pub async fn withdraw_amendment(
    component_id: ComponentId,
    amendment_id: AmendmentId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Amendment, ActionError> {
    info!(amendment_id = %amendment_id, user_id = %actor.user_id, "Withdrawing amendment");

    let loaded = load(component_id, amendment_id, deps).await?;
    authorize(&loaded, Action::Withdraw, actor, deps).await?;

    let mut withdrawn = loaded.emendation.clone();
    withdrawn.internal_state = FictionState::Withdrawn;
    save_tracked(&loaded.emendation, &withdrawn, Some(actor.user_id), deps).await?;

    Ok(deps
        .store
        .update_amendment_state(loaded.amendment.id, AmendmentState::Withdrawn)
        .await?)
}

/// Turn a rejected emendation into a fiction of its own. An emendation is
/// promoted at most once.
pub async fn promote_emendation(
    component_id: ComponentId,
    amendment_id: AmendmentId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(amendment_id = %amendment_id, user_id = %actor.user_id, "Promoting emendation");

    let loaded = load(component_id, amendment_id, deps).await?;
    authorize(&loaded, Action::Promote, actor, deps).await?;

    let already = deps
        .store
        .linked_fictions(loaded.emendation.id, PROMOTED)
        .await?;
    if !already.is_empty() {
        return Err(ActionError::invalid("base", "has already been promoted"));
    }

    let mut options = CopyOptions::new(Authors::Copy)
        .without_link()
        .by(Some(actor.user_id));
    options.overrides.published_at = Some(Utc::now());
    let promoted = FictionFactory::new(deps)
        .copy(&loaded.emendation, options)
        .await?;
    deps.store
        .link_fictions(loaded.emendation.id, promoted.id, PROMOTED)
        .await?;

    deps.notifier.notify(FictionEvent::EmendationPromoted {
        component_id: loaded.component.id,
        amendment_id: loaded.amendment.id,
        fiction_id: promoted.id,
    });
    Ok(promoted)
}
