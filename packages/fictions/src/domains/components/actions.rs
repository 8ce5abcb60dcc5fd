//! Component administration actions.

use tracing::info;

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId};
use crate::domains::components::events::settings_change_events;
use crate::domains::components::models::{Component, StepSettings};
use crate::domains::fictions::actions::support::load_component;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Replace the current step settings and announce the flags that turned on.
pub async fn update_step_settings(
    component_id: ComponentId,
    step_settings: StepSettings,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Component, ActionError> {
    info!(component_id = %component_id, user_id = %actor.user_id, "Updating step settings");

    let component = load_component(component_id, deps).await?;
    let ctx = deps.permissions().for_component(&component, Some(actor)).await?;
    actor
        .can(PermissionAction::admin(Action::Update, Subject::ComponentSettings))
        .on(&ctx)
        .check()?;

    let previous = component.step_settings.0.clone();
    let updated = deps
        .store
        .update_step_settings(component.id, &step_settings)
        .await?;

    let events = settings_change_events(updated.id, &previous, &updated.step_settings);
    info!(component_id = %updated.id, events = events.len(), "Step settings updated");
    deps.notifier.notify_all(events);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;
    use crate::domains::components::models::ComponentSettings;
    use crate::domains::fictions::events::FictionEvent;
    use crate::kernel::test_dependencies::TestDependencies;

    #[tokio::test]
    async fn test_enabling_votes_notifies() {
        let test = TestDependencies::new();
        let component = test.store.insert_component(
            "city",
            "Fictions",
            ComponentSettings::default(),
            StepSettings::default(),
        );

        let updated = update_step_settings(
            component.id,
            StepSettings {
                votes_enabled: true,
                ..Default::default()
            },
            &Actor::new(UserId::new(1), true),
            &test.deps,
        )
        .await
        .unwrap();

        assert!(updated.step_settings.voting_enabled());
        assert_eq!(
            test.events(),
            vec![FictionEvent::VotingEnabled {
                component_id: component.id
            }]
        );
    }

    #[tokio::test]
    async fn test_citizens_cannot_change_settings() {
        let test = TestDependencies::new();
        let component = test.store.insert_component(
            "city",
            "Fictions",
            ComponentSettings::default(),
            StepSettings::default(),
        );

        let result = update_step_settings(
            component.id,
            StepSettings::default(),
            &Actor::new(UserId::new(5), false),
            &test.deps,
        )
        .await;
        assert!(matches!(result, Err(ActionError::NotAuthorized)));
    }
}
