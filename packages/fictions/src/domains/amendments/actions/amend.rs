use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId};
use crate::domains::amendments::models::{Amendment, AmendmentState};
use crate::domains::fictions::actions::support::{load_component, load_fiction};
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::factory::FictionFactory;
use crate::domains::fictions::mentions::MentionParser;
use crate::domains::fictions::models::{Coauthorship, NewFiction};
use crate::domains::fictions::validation::validate_fiction;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Text proposed by an emendation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmendationInput {
    pub title: String,
    pub body: String,
}

/// Propose a new text for a published fiction. The emendation is published
/// right away and the amendment waits in `evaluating` for the amendable's
/// authors.
pub async fn amend_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    input: EmendationInput,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Amendment, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Amending fiction");

    let component = load_component(component_id, deps).await?;
    let amendable = load_fiction(&component, fiction_id, deps).await?;
    if !amendable.is_published() {
        return Err(ActionError::NotFound("Fiction"));
    }

    let ctx = deps
        .permissions()
        .for_fiction(&component, &amendable, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(Action::Amend, Subject::Fiction))
        .on(&ctx)
        .check()?;

    if amendable.is_withdrawn() {
        return Err(ActionError::invalid("base", "is withdrawn"));
    }
    let mut errors = validate_fiction(&component.settings, &input.title, &input.body);
    if input.title.trim() == amendable.title && input.body.trim() == amendable.body {
        errors.add("body", "must change the amended text");
    }
    errors.into_result()?;

    let body = MentionParser::new(deps.store(), &deps.config)
        .rewrite(&input.body)
        .await?
        .text;
    let new = NewFiction::builder()
        .component_id(component.id)
        .title(input.title.trim())
        .body(body)
        .category_id(amendable.category_id)
        .scope_id(amendable.scope_id)
        .published_at(Utc::now())
        .build();
    let emendation = FictionFactory::new(deps)
        .create(&new, &[Coauthorship::user(actor.user_id)], Some(actor.user_id))
        .await?;

    let amendment = deps
        .store
        .insert_amendment(
            amendable.id,
            emendation.id,
            actor.user_id,
            AmendmentState::Evaluating,
        )
        .await?;

    deps.notifier.notify(FictionEvent::AmendmentCreated {
        component_id: component.id,
        amendment_id: amendment.id,
        amendable_id: amendable.id,
        emendation_id: emendation.id,
    });
    info!(amendment_id = %amendment.id, emendation_id = %emendation.id, "Amendment created");
    Ok(amendment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;
    use crate::domains::components::models::{ComponentSettings, StepSettings};
    use crate::kernel::test_dependencies::TestDependencies;

    #[tokio::test]
    async fn test_amend_creates_published_emendation() {
        let test = TestDependencies::new();
        let component = test.store.insert_component(
            "city",
            "Fictions",
            ComponentSettings {
                amendments_enabled: true,
                ..Default::default()
            },
            StepSettings::default(),
        );
        let amendable = test
            .published_fiction(component.id, Coauthorship::user(UserId::new(2)), "Cycle lane on Main Street")
            .await
            .unwrap();
        let amender = Actor::new(UserId::new(9), false);

        let unchanged = amend_fiction(
            component.id,
            amendable.id,
            EmendationInput {
                title: amendable.title.clone(),
                body: amendable.body.clone(),
            },
            &amender,
            &test.deps,
        )
        .await;
        assert!(matches!(unchanged, Err(ActionError::Invalid(_))));

        let amendment = amend_fiction(
            component.id,
            amendable.id,
            EmendationInput {
                title: "Protected cycle lane on Main Street".to_string(),
                body: "Separated from traffic by planters.".to_string(),
            },
            &amender,
            &test.deps,
        )
        .await
        .unwrap();

        assert_eq!(amendment.state, AmendmentState::Evaluating);
        let emendation = test
            .store
            .find_fiction(amendment.emendation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(emendation.is_published());
        assert_eq!(
            test.store.coauthorships(emendation.id).await.unwrap(),
            vec![Coauthorship::user(amender.user_id)]
        );
    }

    #[tokio::test]
    async fn test_amendments_disabled() {
        let test = TestDependencies::new();
        let component = test.store.insert_component(
            "city",
            "Fictions",
            ComponentSettings::default(),
            StepSettings::default(),
        );
        let amendable = test
            .published_fiction(component.id, Coauthorship::user(UserId::new(2)), "Cycle lane on Main Street")
            .await
            .unwrap();

        let result = amend_fiction(
            component.id,
            amendable.id,
            EmendationInput {
                title: "Protected cycle lane on Main Street".to_string(),
                body: "Separated from traffic by planters.".to_string(),
            },
            &Actor::new(UserId::new(9), false),
            &test.deps,
        )
        .await;
        assert!(matches!(result, Err(ActionError::NotAuthorized)));
    }
}
