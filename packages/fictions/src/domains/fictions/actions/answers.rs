//! Answering fictions and publishing answers.

use chrono::Utc;
use tracing::{debug, info};

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId, ValidationErrors};
use crate::domains::fictions::actions::support::{
    load_component, load_fiction, load_fictions, save_tracked,
};
use crate::domains::fictions::data::AnswerInput;
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::models::{Fiction, FictionState};
use crate::kernel::ServerDeps;

/// Answer a fiction. The verdict is public right away only when both the
/// component and the step publish answers immediately.
pub async fn answer_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    input: AnswerInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, state = %input.state, "Answering fiction");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, &component).await?;
    let ctx = loader.for_fiction(&component, &fiction, Some(&actor)).await?;
    actor
        .can(PermissionAction::admin(Action::Create, Subject::FictionAnswer))
        .on(&ctx)
        .check()?;

    let answer = input
        .answer
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    let mut errors = ValidationErrors::new();
    if !input.state.is_answer() {
        errors.add("state", "is not included in the list");
    }
    if input.state == FictionState::Rejected && answer.is_none() {
        errors.add("answer", "can't be blank");
    }
    errors.into_result()?;

    let now = Utc::now();
    let publish = component.publish_answers_immediately();
    let mut answered = fiction.clone();
    answered.internal_state = input.state;
    answered.answer = answer;
    answered.answered_at = Some(now);
    answered.state_published_at = publish.then_some(now);

    let answered = save_tracked(&fiction, &answered, Some(actor.user_id), deps).await?;

    deps.notifier.notify(FictionEvent::FictionAnswered {
        component_id: component.id,
        fiction_id: answered.id,
        state: answered.internal_state,
        published: publish,
    });
    Ok(answered)
}

/// Publish pending answers. Fictions without an unpublished answer are
/// skipped.
pub async fn publish_answers(
    component_id: ComponentId,
    fiction_ids: &[FictionId],
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<Fiction>, ActionError> {
    info!(component_id = %component_id, count = fiction_ids.len(), "Publishing answers");

    let component = load_component(component_id, deps).await?;
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, &component).await?;
    let ctx = loader.for_component(&component, Some(&actor)).await?;
    actor
        .can(PermissionAction::admin(Action::PublishAnswers, Subject::Fictions))
        .on(&ctx)
        .check()?;

    let mut published = Vec::new();
    for fiction in load_fictions(&component, fiction_ids, deps).await? {
        if !fiction.awaiting_answer_publication() {
            debug!(fiction_id = %fiction.id, "no pending answer, skipping");
            continue;
        }
        let mut updated = fiction.clone();
        updated.state_published_at = Some(Utc::now());
        let updated = save_tracked(&fiction, &updated, Some(actor.user_id), deps).await?;

        deps.notifier.notify(FictionEvent::FictionAnswerPublished {
            component_id: component.id,
            fiction_id: updated.id,
            state: updated.internal_state,
        });
        published.push(updated);
    }

    Ok(published)
}
