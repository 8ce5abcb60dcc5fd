//! Draft lifecycle - create, edit, withdraw, publish

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, CollaborativeDraftId, ComponentId};
use crate::domains::collaborative_drafts::models::{CollaborativeDraft, DraftState};
use crate::domains::components::models::Component;
use crate::domains::fictions::actions::notify_mentions;
use crate::domains::fictions::actions::support::load_component;
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::factory::FictionFactory;
use crate::domains::fictions::mentions::MentionParser;
use crate::domains::fictions::models::{Coauthorship, Fiction, NewFiction};
use crate::domains::fictions::validation::validate_fiction;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftInput {
    pub title: String,
    pub body: String,
}

/// A draft of `component`; drafts of other components are not found.
pub(super) async fn load_draft(
    component: &Component,
    draft_id: CollaborativeDraftId,
    deps: &ServerDeps,
) -> Result<CollaborativeDraft, ActionError> {
    deps.store
        .find_draft(draft_id)
        .await?
        .filter(|d| d.component_id == component.id)
        .ok_or(ActionError::NotFound("CollaborativeDraft"))
}

/// Evaluator check for an action on an existing draft.
pub(super) async fn authorize(
    component: &Component,
    draft: &CollaborativeDraft,
    action: Action,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<(), ActionError> {
    let ctx = deps
        .permissions()
        .for_draft(component, draft, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(action, Subject::CollaborativeDraft))
        .on(&ctx)
        .check()?;
    Ok(())
}

pub async fn create_draft(
    component_id: ComponentId,
    input: DraftInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<CollaborativeDraft, ActionError> {
    info!(component_id = %component_id, user_id = %actor.user_id, "Creating collaborative draft");

    let component = load_component(component_id, deps).await?;
    let ctx = deps.permissions().for_component(&component, Some(actor)).await?;
    actor
        .can(PermissionAction::public(Action::Create, Subject::CollaborativeDraft))
        .on(&ctx)
        .check()?;

    validate_fiction(&component.settings, &input.title, &input.body).into_result()?;
    let body = MentionParser::new(deps.store(), &deps.config)
        .rewrite(&input.body)
        .await?
        .text;

    let draft = deps
        .store
        .insert_draft(component.id, input.title.trim(), &body, actor.user_id)
        .await?;
    info!(draft_id = %draft.id, "Collaborative draft created");
    Ok(draft)
}

/// Any coauthor may edit an open draft.
pub async fn edit_draft(
    component_id: ComponentId,
    draft_id: CollaborativeDraftId,
    input: DraftInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<CollaborativeDraft, ActionError> {
    info!(draft_id = %draft_id, user_id = %actor.user_id, "Editing collaborative draft");

    let component = load_component(component_id, deps).await?;
    let draft = load_draft(&component, draft_id, deps).await?;
    authorize(&component, &draft, Action::Edit, actor, deps).await?;

    validate_fiction(&component.settings, &input.title, &input.body).into_result()?;
    let body = MentionParser::new(deps.store(), &deps.config)
        .rewrite(&input.body)
        .await?
        .text;

    let mut edited = draft;
    edited.title = input.title.trim().to_string();
    edited.body = body;
    Ok(deps.store.save_draft(&edited).await?)
}

pub async fn withdraw_draft(
    component_id: ComponentId,
    draft_id: CollaborativeDraftId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<CollaborativeDraft, ActionError> {
    info!(draft_id = %draft_id, user_id = %actor.user_id, "Withdrawing collaborative draft");

    let component = load_component(component_id, deps).await?;
    let draft = load_draft(&component, draft_id, deps).await?;
    authorize(&component, &draft, Action::Withdraw, actor, deps).await?;

    let mut withdrawn = draft;
    withdrawn.state = DraftState::Withdrawn;
    let withdrawn = deps.store.save_draft(&withdrawn).await?;

    deps.notifier.notify(FictionEvent::DraftWithdrawn {
        component_id: component.id,
        draft_id: withdrawn.id,
    });
    Ok(withdrawn)
}

/// Promote the draft to a published fiction authored by every coauthor, in
/// the order they joined.
pub async fn publish_draft(
    component_id: ComponentId,
    draft_id: CollaborativeDraftId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<(CollaborativeDraft, Fiction), ActionError> {
    info!(draft_id = %draft_id, user_id = %actor.user_id, "Publishing collaborative draft");

    let component = load_component(component_id, deps).await?;
    let draft = load_draft(&component, draft_id, deps).await?;
    authorize(&component, &draft, Action::Publish, actor, deps).await?;

    let coauthor_ids = deps.store.draft_coauthors(draft.id).await?;
    let coauthors: Vec<Coauthorship> = coauthor_ids
        .iter()
        .copied()
        .map(Coauthorship::user)
        .collect();

    let now = Utc::now();
    let new = NewFiction::builder()
        .component_id(component.id)
        .title(draft.title.clone())
        .body(draft.body.clone())
        .collaborative_draft_id(draft.id)
        .published_at(now)
        .build();
    let fiction = FictionFactory::new(deps)
        .create(&new, &coauthors, Some(actor.user_id))
        .await?;

    let mut published = draft;
    published.state = DraftState::Published;
    published.published_at = Some(now);
    published.fiction_id = Some(fiction.id);
    let published = deps.store.save_draft(&published).await?;

    deps.notifier.notify(FictionEvent::DraftPublished {
        component_id: component.id,
        draft_id: published.id,
        fiction_id: fiction.id,
    });
    deps.notifier.notify(FictionEvent::FictionPublished {
        component_id: component.id,
        fiction_id: fiction.id,
        author_ids: coauthor_ids,
    });
    notify_mentions(&fiction, deps);

    info!(draft_id = %published.id, fiction_id = %fiction.id, "Collaborative draft published");
    Ok((published, fiction))
}
