//! Official fictions - authored by the organization or a meeting

use chrono::Utc;
use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId};
use crate::domains::fictions::actions::lifecycle::notify_mentions;
use crate::domains::fictions::actions::support::{load_component, load_fiction, save_tracked};
use crate::domains::fictions::data::FictionInput;
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::factory::FictionFactory;
use crate::domains::fictions::mentions::MentionParser;
use crate::domains::fictions::models::{Author, Coauthorship, Fiction, NewFiction};
use crate::domains::fictions::validation::validate_fiction;
use crate::kernel::ServerDeps;

/// Create a published fiction on behalf of the organization, or of a meeting
/// when `meeting_id` is given.
pub async fn create_official_fiction(
    component_id: ComponentId,
    input: FictionInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(component_id = %component_id, user_id = %actor.user_id, "Creating official fiction");

    let component = load_component(component_id, deps).await?;
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, &component).await?;
    let ctx = loader.for_component(&component, Some(&actor)).await?;
    actor
        .can(PermissionAction::admin(Action::Create, Subject::Fiction))
        .on(&ctx)
        .check()?;

    validate_fiction(&component.settings, &input.title, &input.body).into_result()?;

    let body = MentionParser::new(deps.store(), &deps.config)
        .rewrite(&input.body)
        .await?
        .text;
    let author = match input.meeting_id {
        Some(meeting_id) => Author::Meeting(meeting_id),
        None => Author::Organization,
    };

    let new = NewFiction::builder()
        .component_id(component.id)
        .title(input.title.trim())
        .body(body)
        .address(input.address)
        .category_id(input.category_id)
        .scope_id(input.scope_id)
        .meeting_id(input.meeting_id)
        .published_at(Utc::now())
        .build();
    let fiction = FictionFactory::new(deps)
        .create(&new, &[Coauthorship::new(author)], Some(actor.user_id))
        .await?;

    deps.notifier.notify(FictionEvent::FictionPublished {
        component_id: component.id,
        fiction_id: fiction.id,
        author_ids: Vec::new(),
    });
    notify_mentions(&fiction, deps);

    info!(fiction_id = %fiction.id, "Official fiction created");
    Ok(fiction)
}

/// Edit an official fiction that nobody has voted yet.
pub async fn edit_official_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    input: FictionInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Editing official fiction");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, &component).await?;
    let ctx = loader.for_fiction(&component, &fiction, Some(&actor)).await?;
    actor
        .can(PermissionAction::admin(Action::Edit, Subject::Fiction))
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

    save_tracked(&fiction, &edited, Some(actor.user_id), deps).await
}
