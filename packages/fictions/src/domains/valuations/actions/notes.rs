use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId};
use crate::domains::fictions::actions::support::{load_component, load_fiction};
use crate::domains::fictions::events::FictionEvent;
use crate::domains::valuations::models::Note;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Leave a private note on a fiction. Admins may note any fiction,
/// valuators only the ones assigned to them.
pub async fn create_note(
    component_id: ComponentId,
    fiction_id: FictionId,
    body: &str,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Note, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Creating note");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, &component).await?;
    let ctx = loader.for_fiction(&component, &fiction, Some(&actor)).await?;
    actor
        .can(PermissionAction::admin(Action::Create, Subject::FictionNote))
        .on(&ctx)
        .check()?;

    let body = body.trim();
    if body.is_empty() {
        return Err(ActionError::invalid("body", "can't be blank"));
    }

    let note = deps.store.insert_note(fiction.id, actor.user_id, body).await?;

    deps.notifier.notify(FictionEvent::NoteCreated {
        component_id: component.id,
        fiction_id: fiction.id,
        note_id: note.id,
        author_id: actor.user_id,
    });
    Ok(note)
}
