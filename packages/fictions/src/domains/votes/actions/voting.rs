use tracing::{debug, info};

use crate::common::auth::{Action, Actor, PermissionAction, Subject};
use crate::common::{ActionError, ComponentId, FictionId, StoreError};
use crate::domains::components::models::Component;
use crate::domains::fictions::actions::support::{load_component, load_fiction};
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::models::Fiction;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Loads a fiction that can receive supports: published and not withdrawn.
pub(super) async fn supportable(
    component_id: ComponentId,
    fiction_id: FictionId,
    deps: &ServerDeps,
) -> Result<(Component, Fiction), ActionError> {
    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    if !fiction.is_published() {
        return Err(ActionError::NotFound("Fiction"));
    }
    if fiction.is_withdrawn() {
        return Err(ActionError::invalid("base", "is withdrawn"));
    }
    Ok((component, fiction))
}

pub(super) async fn reload(fiction_id: FictionId, deps: &ServerDeps) -> Result<Fiction, ActionError> {
    deps.store
        .find_fiction(fiction_id)
        .await?
        .ok_or(ActionError::NotFound("Fiction"))
}

/// Cast the actor's vote. The vote limit is checked by the evaluator against
/// the votes already cast in the component.
pub async fn vote_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Voting fiction");

    let (component, fiction) = supportable(component_id, fiction_id, deps).await?;
    let ctx = deps
        .permissions()
        .for_fiction(&component, &fiction, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(Action::Vote, Subject::Fiction))
        .on(&ctx)
        .check()?;

    match deps.store.insert_vote(fiction.id, actor.user_id).await {
        Ok(_) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ActionError::invalid("base", "has already been supported"));
        }
        Err(e) => return Err(e.into()),
    }

    deps.notifier.notify(FictionEvent::FictionVoted {
        component_id: component.id,
        fiction_id: fiction.id,
        voter_id: actor.user_id,
    });
    reload(fiction.id, deps).await
}

pub async fn unvote_fiction(
    component_id: ComponentId,
    fiction_id: FictionId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<Fiction, ActionError> {
    info!(fiction_id = %fiction_id, user_id = %actor.user_id, "Removing vote");

    let component = load_component(component_id, deps).await?;
    let fiction = load_fiction(&component, fiction_id, deps).await?;
    let ctx = deps
        .permissions()
        .for_fiction(&component, &fiction, Some(actor))
        .await?;
    actor
        .can(PermissionAction::public(Action::Unvote, Subject::Fiction))
        .on(&ctx)
        .check()?;

    if !deps.store.delete_vote(fiction.id, actor.user_id).await? {
        debug!(fiction_id = %fiction.id, "no vote to remove");
    }
    reload(fiction.id, deps).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;
    use crate::domains::components::models::{ComponentSettings, StepSettings};
    use crate::domains::fictions::models::Coauthorship;
    use crate::kernel::test_dependencies::TestDependencies;

    fn voting_component(test: &TestDependencies, vote_limit: Option<u32>) -> Component {
        test.store.insert_component(
            "city",
            "Fictions",
            ComponentSettings {
                vote_limit,
                ..Default::default()
            },
            StepSettings {
                votes_enabled: true,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_vote_counts_and_notifies() {
        let test = TestDependencies::new();
        let component = voting_component(&test, None);
        let fiction = test
            .published_fiction(component.id, Coauthorship::user(UserId::new(2)), "Shade trees for the schoolyard")
            .await
            .unwrap();
        let voter = Actor::new(UserId::new(7), false);

        let voted = vote_fiction(component.id, fiction.id, &voter, &test.deps)
            .await
            .unwrap();
        assert_eq!(voted.vote_count, 1);
        assert_eq!(
            test.events(),
            vec![FictionEvent::FictionVoted {
                component_id: component.id,
                fiction_id: fiction.id,
                voter_id: voter.user_id,
            }]
        );

        let again = vote_fiction(component.id, fiction.id, &voter, &test.deps).await;
        assert!(matches!(again, Err(ActionError::Invalid(_))));

        let unvoted = unvote_fiction(component.id, fiction.id, &voter, &test.deps)
            .await
            .unwrap();
        assert_eq!(unvoted.vote_count, 0);
    }

    #[tokio::test]
    async fn test_vote_limit_spans_the_component() {
        let test = TestDependencies::new();
        let component = voting_component(&test, Some(1));
        let first = test
            .published_fiction(component.id, Coauthorship::user(UserId::new(2)), "Shade trees for the schoolyard")
            .await
            .unwrap();
        let second = test
            .published_fiction(component.id, Coauthorship::user(UserId::new(3)), "Water fountains in every park")
            .await
            .unwrap();
        let voter = Actor::new(UserId::new(7), false);

        vote_fiction(component.id, first.id, &voter, &test.deps)
            .await
            .unwrap();
        let result = vote_fiction(component.id, second.id, &voter, &test.deps).await;
        assert!(matches!(result, Err(ActionError::NotAuthorized)));
    }

    #[tokio::test]
    async fn test_withdrawn_fictions_take_no_votes() {
        let test = TestDependencies::new();
        let component = voting_component(&test, None);
        let fiction = test
            .published_fiction(component.id, Coauthorship::user(UserId::new(2)), "Shade trees for the schoolyard")
            .await
            .unwrap();
        let mut withdrawn = fiction.clone();
        withdrawn.internal_state = crate::domains::fictions::models::FictionState::Withdrawn;
        test.store.save_fiction(&withdrawn).await.unwrap();

        let result = vote_fiction(
            component.id,
            fiction.id,
            &Actor::new(UserId::new(7), false),
            &test.deps,
        )
        .await;
        assert!(matches!(result, Err(ActionError::Invalid(_))));
    }
}
