//! Citizen fiction actions - create, publish, edit, withdraw
//!
//! Each action loads its context, asks the evaluator, validates, persists
//! through the store, records a version and dispatches events.

use chrono::Utc;
use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId, ValidationErrors};
use crate::domains::components::models::Component;
use crate::domains::fictions::actions::support::{load_component, load_fiction, save_tracked};
use crate::domains::fictions::data::FictionInput;
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::factory::FictionFactory;
use crate::domains::fictions::mentions::{mentioned_ids, MentionParser};
use crate::domains::fictions::models::coauthorship::user_authors;
use crate::domains::fictions::models::{Coauthorship, Fiction, FictionState, NewFiction};
use crate::domains::fictions::validation::validate_fiction;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Create a fiction draft authored by the actor.
pub async fn create_fiction(
    component_id: ComponentId,
    input: FictionInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(component_id = %component_id, user_id = %actor.user_id, "Creating fiction");

    let component = load_component(component_id, deps).await?;
    let ctx = deps.permissions().for_component(&component, Some(actor)).await?;
    actor
        .can(PermissionAction::public(Action::Create, Subject::Fiction))
        .on(&ctx)
        .check()?;

    validate_fiction(&component.settings, &input.title, &input.body).into_result()?;
    ensure_below_fiction_limit(&component, actor, deps).await?;

    let body = MentionParser::new(deps.store(), &deps.config)
        .rewrite(&input.body)
        .await?
        .text;

    let new = NewFiction::builder()
        .component_id(component.id)
        .title(input.title.trim())
        .body(body)
        .address(input.address)
        .category_id(input.category_id)
        .scope_id(input.scope_id)
        .build();
    let author = Coauthorship {
        user_group_id: input.user_group_id,
        ..Coauthorship::user(actor.user_id)
    };

    let fiction = FictionFactory::new(deps)
        .create(&new, &[author], Some(actor.user_id))
        .await?;

    info!(fiction_id = %fiction.id, "Fiction draft created");
    Ok(fiction)
}

/// Publish a draft. Only its authors may, and only once.
pub async fn publish_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Publishing fiction");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;

    let coauthors = deps.store.coauthorships(fiction.id).await?;
    let author_ids = user_authors(&coauthors);
    if !author_ids.contains(&actor.user_id) {
        return Err(ActionError::NotAuthorized);
    }
    if fiction.is_published() {
        return Err(ActionError::invalid("base", "is already published"));
    }
    ensure_below_fiction_limit(&component, actor, deps).await?;

    let mut published = fiction.clone();
    published.published_at = Some(Utc::now());
    let published = save_tracked(&fiction, &published, Some(actor.user_id), deps).await?;

    deps.notifier.notify(FictionEvent::FictionPublished {
        component_id: component.id,
        fiction_id: published.id,
        author_ids,
    });
    notify_mentions(&published, deps);

    info!(fiction_id = %published.id, "Fiction published");
    Ok(published)
}

pub async fn edit_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    input: FictionInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Editing fiction");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    let ctx = deps
        .permissions()
        .for_fiction(&component, &fiction, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(Action::Edit, Subject::Fiction))
        .on(&ctx)
        .check()?;

    validate_fiction(&component.settings, &input.title, &input.body).into_result()?;

    let body = MentionParser::new(deps.store(), &deps.config)
        .rewrite(&input.body)
        .await?
        .text;

    let mut edited = fiction.clone();
    edited.title = input.title.trim().to_string();
    edited.body = body;
    edited.address = input.address;
    edited.category_id = input.category_id;
    edited.scope_id = input.scope_id;

    let edited = save_tracked(&fiction, &edited, Some(actor.user_id), deps).await?;
    if edited.is_published() {
        notify_mentions(&edited, deps);
    }
    Ok(edited)
}

/// Withdraw a fiction. Fictions that already have votes stay.
pub async fn withdraw_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Withdrawing fiction");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    let ctx = deps
        .permissions()
        .for_fiction(&component, &fiction, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(Action::Withdraw, Subject::Fiction))
        .on(&ctx)
        .check()?;

    if fiction.has_supports() {
        return Err(ActionError::invalid("base", "has_supports"));
    }
    if fiction.is_withdrawn() {
        return Ok(fiction);
    }

    let mut withdrawn = fiction.clone();
    withdrawn.internal_state = FictionState::Withdrawn;
    let withdrawn = save_tracked(&fiction, &withdrawn, Some(actor.user_id), deps).await?;

    deps.notifier.notify(FictionEvent::FictionWithdrawn {
        component_id: component.id,
        fiction_id: withdrawn.id,
    });
    Ok(withdrawn)
}

/// Published, non-withdrawn fictions the actor may still author.
pub(crate) async fn ensure_below_fiction_limit(
    component: &Component,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<(), ActionError> {
    let Some(limit) = component.settings.effective_fiction_limit() else {
        return Ok(());
    };
    let authored = deps
        .store
        .count_published_by_author(component.id, actor.user_id)
        .await?;
    if authored >= i64::from(limit) {
        let mut errors = ValidationErrors::new();
        errors.add("base", format!("fiction limit reached ({} per participant)", limit));
        return Err(ActionError::Invalid(errors));
    }
    Ok(())
}

/// One `FictionMentioned` per fiction referenced in the body.
pub(crate) fn notify_mentions(fiction: &Fiction, deps: &ServerDeps) {
    for mentioned in mentioned_ids(&deps.config.app_name, &fiction.body) {
        if mentioned == fiction.id {
            continue;
        }
        deps.notifier.notify(FictionEvent::FictionMentioned {
            component_id: fiction.component_id,
            fiction_id: fiction.id,
            mentioned_fiction_id: mentioned,
        });
    }
}
