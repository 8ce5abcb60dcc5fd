//! Admin bulk actions - merge, split, import, export, recategorize

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{
    ActionError, CategoryId, ComponentId, FictionId, ScopeId, ValidationErrors,
};
use crate::domains::components::models::Component;
use crate::domains::fictions::actions::support::{load_component, load_fictions, save_tracked};
use crate::domains::fictions::data::{ExportRow, ImportInput, MergeInput, SplitInput};
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::factory::{Authors, CopyOptions, FictionFactory};
use crate::domains::fictions::models::coauthorship::{is_official, is_official_meeting};
use crate::domains::fictions::models::{Author, Coauthorship, Fiction, COPIED_FROM_COMPONENT};
use crate::domains::fictions::queries::{FictionQuery, MAX_LIMIT};
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Admin check for a bulk action on the component's fictions.
async fn authorize(
    component: &Component,
    action: Action,
    subject: Subject,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Actor, ActionError> {
    let loader = deps.permissions();
    let actor = loader.resolve_actor(actor, component).await?;
    let ctx = loader.for_component(component, Some(&actor)).await?;
    actor
        .can(PermissionAction::admin(action, subject))
        .on(&ctx)
        .check()?;
    Ok(actor)
}

/// Each fiction may be selected once, and at least `min` must be.
fn check_selection(ids: &[FictionId], min: usize, message: &str) -> Result<(), ActionError> {
    let unique: HashSet<FictionId> = ids.iter().copied().collect();
    if unique.len() != ids.len() {
        return Err(ActionError::invalid("fiction_ids", "contains duplicates"));
    }
    if ids.len() < min {
        return Err(ActionError::invalid("fiction_ids", message));
    }
    Ok(())
}

/// Target must live in the same space. Inside the same component only
/// official fictions without supports may be moved around.
async fn validate_move(
    origin: &Component,
    target: &Component,
    fictions: &[Fiction],
    errors: &mut ValidationErrors,
    deps: &ServerDeps,
) -> Result<(), ActionError> {
    if origin.space_slug != target.space_slug {
        errors.add("target_component_id", "must belong to the same space");
    }
    if origin.id == target.id {
        for fiction in fictions {
            let coauthors = deps.store.coauthorships(fiction.id).await?;
            let official = is_official(&coauthors) || is_official_meeting(&coauthors);
            if !official || fiction.vote_count > 0 || fiction.endorsement_count > 0 {
                errors.add(
                    "fiction_ids",
                    format!("fiction {} must be official and have no supports", fiction.id),
                );
            }
        }
    }
    Ok(())
}

/// What a copy should link back to: the original, or, when the original is
/// about to be deleted, whatever the original was copied from.
async fn link_targets(
    original: &Fiction,
    same_component: bool,
    deps: &ServerDeps,
) -> Result<Vec<FictionId>, ActionError> {
    if same_component {
        Ok(deps
            .store
            .linked_fictions(original.id, COPIED_FROM_COMPONENT)
            .await?)
    } else {
        Ok(vec![original.id])
    }
}

fn official_copy(target: ComponentId, whodunnit: &Actor) -> CopyOptions {
    CopyOptions::new(Authors::Assign(Coauthorship::new(Author::Organization)))
        .into_component(target)
        .without_link()
        .by(Some(whodunnit.user_id))
}

/// Merge two or more fictions into a single official fiction.
pub async fn merge_fictions(
    component_id: ComponentId,
    input: MergeInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(component_id = %component_id, count = input.fiction_ids.len(), "Merging fictions");

    let component = load_component(component_id, deps).await?;
    let actor = authorize(&component, Action::Merge, Subject::Fictions, actor, deps).await?;

    check_selection(&input.fiction_ids, 2, "select at least two fictions")?;
    let mut errors = ValidationErrors::new();
    let target = load_component(input.target_component_id, deps).await?;
    let fictions = load_fictions(&component, &input.fiction_ids, deps).await?;
    validate_move(&component, &target, &fictions, &mut errors, deps).await?;
    errors.into_result()?;

    let same_component = component.id == target.id;
    let mut options = official_copy(target.id, &actor);
    options.overrides.published_at = Some(Utc::now());
    let merged = FictionFactory::new(deps).copy(&fictions[0], options).await?;

    for original in &fictions {
        for linked in link_targets(original, same_component, deps).await? {
            deps.store
                .link_fictions(merged.id, linked, COPIED_FROM_COMPONENT)
                .await?;
        }
    }
    if same_component {
        for original in &fictions {
            deps.store.delete_fiction(original.id).await?;
        }
    }

    deps.notifier.notify(FictionEvent::FictionsMerged {
        component_id: target.id,
        merged_fiction_id: merged.id,
        original_ids: input.fiction_ids,
    });
    info!(fiction_id = %merged.id, "Fictions merged");
    Ok(merged)
}

/// Split fictions into official copies. Moving to another component makes
/// two copies of each; splitting in place makes one and drops the original.
pub async fn split_fictions(
    component_id: ComponentId,
    input: SplitInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<Fiction>, ActionError> {
    info!(component_id = %component_id, count = input.fiction_ids.len(), "Splitting fictions");

    let component = load_component(component_id, deps).await?;
    let actor = authorize(&component, Action::Split, Subject::Fictions, actor, deps).await?;

    check_selection(&input.fiction_ids, 1, "select at least one fiction")?;
    let mut errors = ValidationErrors::new();
    let target = load_component(input.target_component_id, deps).await?;
    let fictions = load_fictions(&component, &input.fiction_ids, deps).await?;
    validate_move(&component, &target, &fictions, &mut errors, deps).await?;
    errors.into_result()?;

    let same_component = component.id == target.id;
    let copies_per_original = if same_component { 1 } else { 2 };
    let factory = FictionFactory::new(deps);

    let mut created = Vec::new();
    for original in &fictions {
        let targets = link_targets(original, same_component, deps).await?;
        for _ in 0..copies_per_original {
            let mut options = official_copy(target.id, &actor);
            options.overrides.published_at = Some(Utc::now());
            let copy = factory.copy(original, options).await?;
            for linked in &targets {
                deps.store
                    .link_fictions(copy.id, *linked, COPIED_FROM_COMPONENT)
                    .await?;
            }
            created.push(copy);
        }
    }
    if same_component {
        for original in &fictions {
            deps.store.delete_fiction(original.id).await?;
        }
    }

    deps.notifier.notify(FictionEvent::FictionsSplit {
        component_id: target.id,
        original_ids: input.fiction_ids,
        new_fiction_ids: created.iter().map(|f| f.id).collect(),
    });
    Ok(created)
}

/// Copy published fictions of another component of the same space into this
/// one. Fictions imported before are skipped.
pub async fn import_fictions(
    component_id: ComponentId,
    input: ImportInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<Fiction>, ActionError> {
    info!(
        component_id = %component_id,
        origin_component_id = %input.origin_component_id,
        "Importing fictions"
    );

    let component = load_component(component_id, deps).await?;
    let actor = authorize(&component, Action::Import, Subject::Fictions, actor, deps).await?;

    let origin = load_component(input.origin_component_id, deps).await?;
    let mut errors = ValidationErrors::new();
    if origin.id == component.id {
        errors.add("origin_component_id", "must be another component");
    }
    if origin.space_slug != component.space_slug {
        errors.add("origin_component_id", "must belong to the same space");
    }
    if input.states.is_empty() {
        errors.add("states", "select at least one state");
    }
    errors.into_result()?;

    let importable = deps
        .store
        .find_importable(origin.id, component.id, &input.states)
        .await?;

    let factory = FictionFactory::new(deps);
    let mut imported = Vec::with_capacity(importable.len());
    for original in &importable {
        let authors = if input.keep_authors {
            Authors::Copy
        } else {
            Authors::Assign(Coauthorship::new(Author::Organization))
        };
        let mut options = CopyOptions::new(authors)
            .into_component(component.id)
            .with_attachments()
            .by(Some(actor.user_id));
        options.overrides.published_at = Some(Utc::now());
        imported.push(factory.copy(original, options).await?);
    }

    deps.notifier.notify(FictionEvent::FictionsImported {
        component_id: component.id,
        origin_component_id: origin.id,
        count: imported.len(),
    });
    info!(count = imported.len(), "Fictions imported");
    Ok(imported)
}

/// Every published fiction of the component, with the state citizens see.
pub async fn export_fictions(
    component_id: ComponentId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<ExportRow>, ActionError> {
    info!(component_id = %component_id, "Exporting fictions");

    let component = load_component(component_id, deps).await?;
    authorize(&component, Action::Export, Subject::Fictions, actor, deps).await?;

    let mut rows = Vec::new();
    let mut query = FictionQuery {
        limit: MAX_LIMIT,
        ..Default::default()
    };
    loop {
        let page = deps.store.find_published(component.id, &query).await?;
        let page_len = page.len() as i64;
        for fiction in page {
            let authors = deps
                .store
                .coauthorships(fiction.id)
                .await?
                .into_iter()
                .map(|c| c.author)
                .collect();
            rows.push(ExportRow::new(fiction, authors));
        }
        if page_len < query.limit {
            break;
        }
        query.offset += query.limit;
    }
    Ok(rows)
}

pub async fn update_category(
    component_id: ComponentId,
    fiction_ids: &[FictionId],
    category_id: Option<CategoryId>,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<Fiction>, ActionError> {
    info!(component_id = %component_id, category_id = ?category_id, "Recategorizing fictions");

    let component = load_component(component_id, deps).await?;
    let actor =
        authorize(&component, Action::Update, Subject::FictionCategory, actor, deps).await?;

    let mut updated = Vec::new();
    for fiction in load_fictions(&component, fiction_ids, deps).await? {
        if fiction.category_id == category_id {
            continue;
        }
        let mut changed = fiction.clone();
        changed.category_id = category_id;
        updated.push(save_tracked(&fiction, &changed, Some(actor.user_id), deps).await?);
    }
    Ok(updated)
}

pub async fn update_scope(
    component_id: ComponentId,
    fiction_ids: &[FictionId],
    scope_id: Option<ScopeId>,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Vec<Fiction>, ActionError> {
    info!(component_id = %component_id, scope_id = ?scope_id, "Rescoping fictions");

    let component = load_component(component_id, deps).await?;
    let actor = authorize(&component, Action::Update, Subject::FictionScope, actor, deps).await?;

    let mut updated = Vec::new();
    for fiction in load_fictions(&component, fiction_ids, deps).await? {
        if fiction.scope_id == scope_id {
            continue;
        }
        let mut changed = fiction.clone();
        changed.scope_id = scope_id;
        updated.push(save_tracked(&fiction, &changed, Some(actor.user_id), deps).await?);
    }
    Ok(updated)
}
